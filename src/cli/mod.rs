//! Command-line interface for reelay.
//!
//! Provides commands for running the bot, checking which links a text
//! contains, resolving a single link, and showing configuration.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::adapters::{CobaltClient, Resolver, TelegramClient};
use crate::bot::BotRunner;
use crate::config::{ConfigOverrides, ResolvedConfig};
use crate::core::{LinkExtractor, MediaRelay, Orchestrator};
use crate::domain::ResolutionResult;

/// reelay - Telegram relay for short-form video links
#[derive(Parser, Debug)]
#[command(name = "reelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: discover .reelay/config.yaml)
    #[arg(long, global = true, env = "REELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Telegram bot token
    #[arg(long, global = true, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Cobalt API base address
    #[arg(long, global = true, env = "COBALT_API_URL")]
    pub cobalt_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot
    Run,

    /// Print the supported links found in a text
    Links {
        /// Text to scan (reads from stdin if not provided)
        text: Option<String>,
    },

    /// Resolve one link through the cobalt API
    Resolve {
        /// Post URL
        url: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let overrides = ConfigOverrides {
            config_file: self.config,
            telegram_token: self.telegram_token,
            resolver_url: self.cobalt_url,
        };

        match self.command {
            Commands::Run => run_bot(overrides).await,
            Commands::Links { text } => print_links(text),
            Commands::Resolve { url } => resolve_link(overrides, &url).await,
            Commands::Config => show_config(overrides),
        }
    }
}

/// Start the Telegram bot
async fn run_bot(overrides: ConfigOverrides) -> Result<()> {
    let config = ResolvedConfig::load(overrides)?;
    let telegram = config.telegram()?;
    let resolver_url = config.resolver_url()?;

    let resolver = CobaltClient::new(resolver_url, config.limits.resolve_timeout());
    info!(resolver = resolver.name(), endpoint = %resolver.endpoint(), "Using resolver");
    if let Err(e) = resolver.health_check().await {
        warn!(error = %format!("{:#}", e), "Cobalt API is not reachable");
    }

    let client = Arc::new(TelegramClient::from_config(&telegram));
    match client.get_me().await {
        Ok(me) => info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or_default(),
            "Authenticated with Telegram"
        ),
        Err(e) => warn!(error = %format!("{:#}", e), "Failed to fetch bot account"),
    }

    let relay = MediaRelay::new(config.limits.clone(), config.scratch_dir.clone())?;
    let orchestrator = Orchestrator::new(LinkExtractor::new()?, Arc::new(resolver), relay);

    BotRunner::new(client, Arc::new(orchestrator), telegram.poll_timeout_seconds)
        .run()
        .await
}

/// Print extracted links, one per line
fn print_links(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    let extractor = LinkExtractor::new()?;
    let links = extractor.extract(&text);

    if links.is_empty() {
        eprintln!("No supported links found");
        return Ok(());
    }

    for link in links {
        println!("{}\t{}", link.category(), link);
    }
    Ok(())
}

/// Resolve one URL and print the candidates
async fn resolve_link(overrides: ConfigOverrides, url: &str) -> Result<()> {
    let config = ResolvedConfig::load(overrides)?;
    let resolver = CobaltClient::new(config.resolver_url()?, config.limits.resolve_timeout());

    match resolver.resolve(url).await {
        ResolutionResult::Resolved { candidates } if candidates.is_empty() => {
            anyhow::bail!("Resolver returned no media URL")
        }
        ResolutionResult::Resolved { candidates } => {
            for candidate in candidates {
                println!("{}", candidate.url);
            }
            Ok(())
        }
        ResolutionResult::Failed { message } => anyhow::bail!("Resolution failed: {}", message),
    }
}

/// Show the resolved configuration
fn show_config(overrides: ConfigOverrides) -> Result<()> {
    let config = ResolvedConfig::load(overrides)?;

    println!("reelay configuration");
    println!("====================");
    match &config.config_file {
        Some(path) => println!("Config file:    {}", path.display()),
        None => println!("Config file:    (none, using defaults)"),
    }
    println!(
        "Telegram token: {}",
        if config.telegram_token.is_some() { "set" } else { "NOT SET" }
    );
    println!(
        "Cobalt API:     {}",
        config.resolver_url.as_deref().unwrap_or("NOT SET")
    );
    println!("Scratch dir:    {}", config.scratch_dir.display());
    println!("Poll timeout:   {}s", config.poll_timeout_seconds);
    println!();
    println!("Relay limits:");
    print!(
        "{}",
        serde_yaml::to_string(&config.limits).context("Failed to render limits")?
    );

    Ok(())
}
