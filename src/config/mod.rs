use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

/// Wiki API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Entry-page endpoint; the only per-request variable is entry_page_id.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_app_sn")]
    pub app_sn: String,

    #[serde(default = "default_lang")]
    pub lang: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Seed-file locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Character list produced by the enumeration step.
    #[serde(default = "default_characters_file")]
    pub characters_file: PathBuf,

    /// Prior run's output, read-only; keeps ids stable and backfills rarity.
    #[serde(default = "default_baseline_file")]
    pub baseline_file: PathBuf,

    #[serde(default = "default_out_file")]
    pub out_file: PathBuf,

    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,
}

/// Batch behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Process only the first N characters (smoke runs). None = all.
    #[serde(default)]
    pub limit: Option<usize>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://act-api-takumi-static.mihoyo.com/hoyowiki/genshin/wapi/entry_page".to_string()
}
fn default_app_sn() -> String {
    "ys_obc".to_string()
}
fn default_lang() -> String {
    "zh-cn".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_request_delay_ms() -> u64 {
    300
}
fn default_jitter_ms() -> u64 {
    400
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_ms() -> u64 {
    800
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}
fn default_characters_file() -> PathBuf {
    PathBuf::from("data/characters.json")
}
fn default_baseline_file() -> PathBuf {
    PathBuf::from("data/characters.base.json")
}
fn default_out_file() -> PathBuf {
    PathBuf::from("data/characters.out.json")
}
fn default_report_file() -> PathBuf {
    PathBuf::from("data/run-report.json")
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("WIKI").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig {
                base_url: default_base_url(),
                app_sn: default_app_sn(),
                lang: default_lang(),
                timeout_secs: default_timeout_secs(),
                request_delay_ms: default_request_delay_ms(),
                jitter_ms: default_jitter_ms(),
                max_retries: default_max_retries(),
                retry_base_ms: default_retry_base_ms(),
                user_agent: default_user_agent(),
            },
            storage: StorageConfig {
                characters_file: default_characters_file(),
                baseline_file: default_baseline_file(),
                out_file: default_out_file(),
                report_file: default_report_file(),
            },
            pipeline: PipelineConfig { limit: None },
        }
    }
}
