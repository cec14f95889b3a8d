use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::dump::DumpCommand;
use crate::config::Config;
use crate::reviews::ProviderFactory;
use crate::tui;

/// Browse a paginated reviews feed in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "reviews-feed",
    version,
    about = "Browse a paginated reviews feed in the terminal",
    long_about = r#"Loads reviews page by page from an HTTP endpoint or a local JSON fixture.
The next page is prefetched as you scroll towards the end of the list.

Examples:
  reviews-feed --fixture reviews.json             # Browse a local fixture
  reviews-feed --url http://localhost:8080/reviews
  reviews-feed --fixture reviews.json dump -e     # Print every review in full"#
)]
pub struct Cli {
    /// Local JSON document with every review ({"items": [...], "count": N})
    #[arg(short = 'f', long = "fixture", global = true)]
    pub fixture: Option<PathBuf>,

    /// Endpoint serving pages for offset/limit queries
    #[arg(short = 'u', long = "url", global = true)]
    pub url: Option<String>,

    /// Reviews per page
    #[arg(short = 'p', long = "page-size", global = true)]
    pub page_size: Option<usize>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Write logs to this file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the feed interactively (default)
    View,
    /// Page through the whole feed and print it
    Dump(DumpCommand),
}

impl Cli {
    /// Whether the command takes over the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::View))
    }

    /// Layer command-line flags over the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(fixture) = &self.fixture {
            config.fixture_path = Some(fixture.clone());
        }
        if let Some(url) = &self.url {
            config.base_url = Some(url.clone());
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        config.validate()?;

        let provider = ProviderFactory::create_provider(&config)
            .await
            .context("Failed to set up the reviews provider")?;
        info!("Using {} provider with page size {}", provider.name(), config.page_size);

        match self.command {
            Some(Commands::Dump(dump_cmd)) => dump_cmd.execute(&config, provider).await,
            Some(Commands::View) | None => {
                info!("Starting interactive mode");
                tui::run(&config, provider).await
            }
        }
    }
}
