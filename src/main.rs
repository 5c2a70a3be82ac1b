mod config;
mod extract;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::models::CharacterRef;
use crate::pipeline::Pipeline;
use crate::scraper::{HoyowikiClient, WikiSource};

#[derive(Parser)]
#[command(name = "wiki-etl", about = "HoYoWiki character data ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch details for every listed character and write the seed file
    Update,

    /// Fetch and print a single entry page as a stitched record (diagnostics)
    Probe {
        /// Wiki entry page id
        id: String,
    },

    /// Show statistics over the last written output
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "hoyowiki_etl=info,warn",
        1 => "hoyowiki_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Update => {
            let _t = utils::Timer::start("Character detail update");
            let stats = Pipeline::new(config).run().await?;
            tracing::info!(
                "Done: {} processed, {} written, {} failed",
                stats.processed,
                stats.written,
                stats.failed_ids.len()
            );
        }

        Command::Probe { id } => {
            let baseline = loader::load_baseline(&config.storage.baseline_file);
            let source = HoyowikiClient::new(&config.scraper)?;
            let doc = source.fetch_entry(&id).await?;
            let fields = extract::extract_fields(&doc);

            let placeholder = CharacterRef {
                character_id: Some(serde_json::Value::String(id.clone())),
                character_name: None,
                character_avatar: None,
                rarity: None,
            };
            let record = pipeline::stitch_record(&id, &placeholder, fields, &baseline)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Stats => {
            let records = storage::read_records(&config.storage.out_file)?;
            let with_element = records.iter().filter(|r| r.element.is_some()).count();
            let with_weapon = records.iter().filter(|r| r.weapon_type.is_some()).count();
            let with_rarity = records.iter().filter(|r| r.rarity.is_some()).count();
            let talents: usize = records.iter().map(|r| r.talents.len()).sum();
            let constellations: usize = records.iter().map(|r| r.constellations.len()).sum();

            println!("─────────────────────────────────");
            println!("  wiki-etl — Output Stats");
            println!("─────────────────────────────────");
            println!("  Records        : {}", records.len());
            println!("  With element   : {}", with_element);
            println!("  With weapon    : {}", with_weapon);
            println!("  With rarity    : {}", with_rarity);
            println!("  Talents        : {}", talents);
            println!("  Constellations : {}", constellations);
            println!("─────────────────────────────────");
        }
    }

    Ok(())
}
