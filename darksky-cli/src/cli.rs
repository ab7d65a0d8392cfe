use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use darksky_core::{CancellationToken, Config, DEFAULT_BASE_URL};
use inquire::{Password, PasswordDisplayMode, Text};

use crate::render::{RenderOptions, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "darksky", version, about = "Dark Sky forecast CLI")]
pub struct Cli {
    /// Log request details to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and optional base URL in the config file.
    Configure,

    /// Show the forecast for a coordinate pair.
    Show {
        /// Latitude in degrees, negative for south.
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees, negative for west.
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Also list the hour-by-hour block.
        #[arg(long)]
        hourly: bool,

        /// Also list the day-by-day block.
        #[arg(long)]
        daily: bool,

        /// Print the decoded forecast as JSON instead.
        #[arg(long, conflicts_with_all = ["hourly", "daily"])]
        json: bool,

        /// Use this API key instead of the configured one.
        #[arg(long)]
        api_key: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { latitude, longitude, hourly, daily, json, api_key } => {
                let cfg = Config::load()?;
                let client = match api_key {
                    Some(key) => cfg.client_with_key(&key)?,
                    None => cfg.client()?,
                };
                tracing::debug!(base_url = client.base_url(), "forecast client ready");

                let cancel = CancellationToken::new();
                let on_interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        on_interrupt.cancel();
                    }
                });

                let forecast = client
                    .get_cancellable(latitude, longitude, &cancel)
                    .await
                    .with_context(|| format!("Failed to fetch forecast for {latitude},{longitude}"))?;

                if json {
                    let out = serde_json::to_string_pretty(&forecast)
                        .context("Failed to encode forecast as JSON")?;
                    println!("{out}");
                } else {
                    println!("{}", render(&forecast, RenderOptions { hourly, daily }));
                }

                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("Dark Sky API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let current = cfg.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Text::new("API base URL:")
        .with_default(&current)
        .prompt()
        .context("Failed to read base URL")?;
    let base_url = base_url.trim();

    cfg.base_url =
        (!base_url.is_empty() && base_url != DEFAULT_BASE_URL).then(|| base_url.to_string());
    cfg.set_api_key(api_key.to_string());

    // Refuse to persist settings that cannot produce a client.
    cfg.client()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
