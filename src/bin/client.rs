//! wsrelay Client
//!
//! Command-line peer for the relay:
//! - Chat interactively over WebSocket
//! - Publish a one-off message over HTTP
//! - Generate a default server config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use wsrelay::api::dto::PublishRequest;
use wsrelay::config::generate_default_config;
use wsrelay::{BroadcastReport, Envelope, EventKind, RelayClient};

#[derive(Parser)]
#[command(name = "wsrelay-client")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the wsrelay message relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a relay and chat: stdin lines are sent, relayed messages printed
    Connect {
        /// Relay WebSocket address (e.g. ws://localhost:8080)
        url: String,
    },

    /// Relay a single message through the HTTP API
    Publish {
        /// Message text
        message: String,
        /// API server URL
        #[arg(long, default_value = "http://localhost:8080")]
        api_url: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Connect { url } => chat(&url).await,
        Commands::Publish { message, api_url } => publish(&api_url, message).await,
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

async fn chat(url: &str) -> anyhow::Result<()> {
    let mut client = RelayClient::connect(url)
        .await
        .with_context(|| format!("Connection error: {}", url))?;
    println!("Connected to server");

    client
        .send(&Envelope::connection("New client connected"))
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            incoming = client.next_envelope() => match incoming {
                Some(Ok(envelope)) => match envelope.event {
                    EventKind::Message | EventKind::Connection => {
                        println!("New message: {}", envelope.message);
                    }
                },
                Some(Err(e)) => eprintln!("Failed to process incoming message: {}", e),
                None => {
                    println!("Server closed the connection");
                    break;
                }
            },
            line = lines.next_line() => match line? {
                Some(line) => client.send(&Envelope::message(line.trim())).await?,
                None => {
                    client.close().await?;
                    break;
                }
            },
        }
    }

    Ok(())
}

async fn publish(api_url: &str, message: String) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/messages", api_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&PublishRequest { message })
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Publish failed ({}): {}", status, body);
    }

    let report: BroadcastReport = response.json().await?;
    println!(
        "Delivered to {} peer(s) ({} skipped, {} failed)",
        report.delivered, report.skipped, report.failed
    );
    Ok(())
}
