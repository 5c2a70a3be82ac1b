use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Category enums ────────────────────────────────────────────────────────────

/// Elemental affinity. Source documents carry the Chinese label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Element {
    Pyro,
    Hydro,
    Anemo,
    Electro,
    Dendro,
    Cryo,
    Geo,
}

impl Element {
    /// Translate the source label. Unknown labels map to None, never a guess.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "火" => Some(Self::Pyro),
            "水" => Some(Self::Hydro),
            "风" => Some(Self::Anemo),
            "雷" => Some(Self::Electro),
            "草" => Some(Self::Dendro),
            "冰" => Some(Self::Cryo),
            "岩" => Some(Self::Geo),
            _ => None,
        }
    }
}

/// Weapon class. Two source labels ("弓" and "弓箭") both mean Bow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponClass {
    Sword,
    Claymore,
    Polearm,
    Bow,
    Catalyst,
}

impl WeaponClass {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "单手剑" => Some(Self::Sword),
            "双手剑" => Some(Self::Claymore),
            "长柄武器" => Some(Self::Polearm),
            "弓" | "弓箭" => Some(Self::Bow),
            "法器" => Some(Self::Catalyst),
            _ => None,
        }
    }
}

// ── Canonical record ──────────────────────────────────────────────────────────

/// Normalized output entity for one character. Emitted only when a non-empty
/// display name was resolved; every other field may legitimately be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterRecord {
    /// Baseline stable id when the name is known, else the raw source id.
    pub id: String,
    pub name: String,
    pub element: Option<Element>,
    #[serde(rename = "weaponType")]
    pub weapon_type: Option<WeaponClass>,
    pub rarity: Option<u8>,
    pub region: Option<String>,
    pub affiliation: Option<String>,
    #[serde(rename = "visionAffiliation")]
    pub vision_affiliation: Option<String>,
    pub role: Option<String>,
    /// Label → body, document order, labels unique.
    pub talents: IndexMap<String, String>,
    pub constellations: IndexMap<String, String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

// ── Enumeration input ─────────────────────────────────────────────────────────

/// One entry of the character list produced by the enumeration step.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterRef {
    pub character_id: Option<serde_json::Value>,
    pub character_name: Option<String>,
    pub character_avatar: Option<String>,
    pub rarity: Option<u8>,
}

impl CharacterRef {
    /// The wiki entry-page id as a string, if present and non-empty.
    pub fn id(&self) -> Option<String> {
        match self.character_id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ── Baseline identity table ───────────────────────────────────────────────────

/// One record of a previous run's output. Only the identity fields matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct BaselineEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub rarity: Option<u8>,
}

/// Read-only name → (stable id, rarity) lookup built from a prior run.
/// Keeps ids stable across runs and backfills rarity missing from the live API.
#[derive(Debug, Default)]
pub struct Baseline {
    id_by_name: HashMap<String, String>,
    rarity_by_name: HashMap<String, u8>,
}

impl Baseline {
    pub fn from_entries(entries: Vec<BaselineEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            let Some(name) = entry.name.filter(|n| !n.is_empty()) else {
                continue;
            };
            if let Some(rarity) = entry.rarity {
                table.rarity_by_name.entry(name.clone()).or_insert(rarity);
            }
            if let Some(id) = entry.id.filter(|i| !i.is_empty()) {
                table.id_by_name.entry(name).or_insert(id);
            }
        }
        table
    }

    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.id_by_name.get(name).map(String::as_str)
    }

    pub fn rarity_for(&self, name: &str) -> Option<u8> {
        self.rarity_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.id_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_by_name.is_empty()
    }
}
