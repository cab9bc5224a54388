//! Command-line interface: analyze a URL, run the HTTP server, or rebuild
//! the fingerprint database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use techscope::config::DEFAULT_SERVER_PORT;
use techscope::{Engine, LogLevel};

#[derive(Parser)]
#[command(name = "techscope", version, about = "Identify the technologies a website is built with")]
struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one URL and print the detection report as JSON
    Analyze {
        /// The URL to analyze (scheme defaults to https)
        url: String,
    },
    /// Run the HTTP analysis server
    Serve {
        /// Port to listen on (also honors the PORT environment variable)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Rebuild the fingerprint database from the upstream archive
    UpdateFingerprints {
        /// Output path for the fingerprint database
        #[arg(long, default_value = "assets/fingerprints_data.json")]
        fingerprints: PathBuf,
        /// Output path for the category table
        #[arg(long, default_value = "assets/categories_data.json")]
        categories: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    techscope::init_logger_with(cli.log_level.into());

    match cli.command {
        Command::Analyze { url } => {
            let url = if url.starts_with("http://") || url.starts_with("https://") {
                url
            } else {
                format!("https://{url}")
            };

            let engine = Engine::new().context("Failed to initialize the engine")?;
            let analysis = engine
                .analyze(&url)
                .await
                .with_context(|| format!("Failed to analyze {url}"))?;

            if let Some(warning) = &analysis.error {
                log::warn!("{warning}");
            }

            let categories = engine.categories(&analysis.technologies);
            let report = serde_json::json!({
                "url": url,
                "title": analysis.title,
                "technologies": analysis.technologies,
                "categories": categories,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve { port } => {
            let port = port
                .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
                .unwrap_or(DEFAULT_SERVER_PORT);
            let engine = Arc::new(Engine::new().context("Failed to initialize the engine")?);
            techscope::server::serve(engine, port).await?;
        }
        Command::UpdateFingerprints {
            fingerprints,
            categories,
        } => {
            techscope::pipeline::update_fingerprints(&fingerprints, &categories)
                .await
                .context("Fingerprint update failed")?;
        }
    }

    Ok(())
}
