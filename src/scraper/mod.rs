pub mod http_client;

use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use self::http_client::HttpClient;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable document source abstraction.
#[async_trait]
pub trait WikiSource: Send + Sync {
    /// One raw document per entry-page id.
    async fn fetch_entry(&self, entry_page_id: &str) -> Result<Value>;
}

// ── HoYoWiki entry-page client ────────────────────────────────────────────────

pub struct HoyowikiClient {
    client: HttpClient,
    config: ScraperConfig,
}

impl HoyowikiClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            config: config.clone(),
        })
    }

    /// Entry-page URL. Scheme, host and the fixed query parameters come from
    /// configuration; the id is the only per-request variable.
    fn entry_url(&self, entry_page_id: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.config.base_url,
            &[
                ("app_sn", self.config.app_sn.as_str()),
                ("entry_page_id", entry_page_id),
                ("lang", self.config.lang.as_str()),
            ],
        )
        .with_context(|| format!("Invalid base_url {:?}", self.config.base_url))
    }
}

#[async_trait]
impl WikiSource for HoyowikiClient {
    async fn fetch_entry(&self, entry_page_id: &str) -> Result<Value> {
        let url = self.entry_url(entry_page_id)?;
        let doc = self
            .client
            .get_json(url.as_str())
            .await
            .with_context(|| format!("Failed to fetch entry {}", entry_page_id))?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_entry_url_carries_fixed_params() {
        let config = AppConfig::default().scraper;
        let client = HoyowikiClient::new(&config).unwrap();
        let url = client.entry_url("4073").unwrap();

        assert!(url.as_str().starts_with(&config.base_url));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("app_sn".into(), "ys_obc".into())));
        assert!(pairs.contains(&("entry_page_id".into(), "4073".into())));
        assert!(pairs.contains(&("lang".into(), "zh-cn".into())));
    }
}
