//! JSON seed-file loading for the batch inputs.

use crate::models::{Baseline, BaselineEntry, CharacterRef};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Load the enumeration step's character list. Without it the batch has
/// nothing to do, so a missing file is an error.
pub fn load_character_refs(path: &Path) -> Result<Vec<CharacterRef>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Missing character list {:?}", path))?;
    let refs: Vec<CharacterRef> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {:?}", path))?;
    info!("{} characters listed in {:?}", refs.len(), path);
    Ok(refs)
}

/// Load the baseline identity table. A missing or corrupt file means an empty
/// table: first runs have no prior output to stay consistent with.
pub fn load_baseline(path: &Path) -> Baseline {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            info!("No baseline at {:?}; ids will come from the source", path);
            return Baseline::default();
        }
    };

    match serde_json::from_str::<Vec<BaselineEntry>>(&raw) {
        Ok(entries) => {
            let table = Baseline::from_entries(entries);
            info!("Baseline: {} known names", table.len());
            table
        }
        Err(e) => {
            warn!("Ignoring corrupt baseline {:?}: {}", path, e);
            Baseline::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wiki-etl-test-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_character_refs() {
        let path = temp_file(
            "refs.json",
            r#"[{"character_id": 4073, "character_name": "纳西妲", "character_avatar": "https://x/a.png"}]"#,
        );
        let refs = load_character_refs(&path).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id().as_deref(), Some("4073"));
        assert_eq!(refs[0].character_name.as_deref(), Some("纳西妲"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_character_list_is_error() {
        assert!(load_character_refs(Path::new("/nonexistent/characters.json")).is_err());
    }

    #[test]
    fn test_baseline_missing_and_corrupt_tolerated() {
        assert!(load_baseline(Path::new("/nonexistent/base.json")).is_empty());

        let corrupt = temp_file("base-corrupt.json", "{ not json");
        assert!(load_baseline(&corrupt).is_empty());
        std::fs::remove_file(corrupt).ok();
    }

    #[test]
    fn test_baseline_loaded() {
        let path = temp_file(
            "base.json",
            r#"[{"id": "stable-1", "name": "纳西妲", "rarity": 5}]"#,
        );
        let table = load_baseline(&path);
        assert_eq!(table.id_for("纳西妲"), Some("stable-1"));
        assert_eq!(table.rarity_for("纳西妲"), Some(5));
        std::fs::remove_file(path).ok();
    }
}
