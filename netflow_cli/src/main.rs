mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netflow_lib::{default_presets, load_presets, FlowClient, Preset};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "netflow")]
#[command(about = "Broker branch and investment trust net-flow overlap digests")]
struct Cli {
    /// Output format: table, json, csv, markdown or text
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// YAML preset file replacing the built-in presets
    #[arg(long, global = true)]
    presets: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Investment trust net-buy ranking
    TrustRank(commands::trust_rank::TrustRankArgs),
    /// One broker branch's flow page
    BrokerFlow(commands::broker_flow::BrokerFlowArgs),
    /// Overlap of a preset's sources
    Overlap(commands::overlap::OverlapArgs),
    /// Run digest cycles and print or push them
    Digest(commands::digest::DigestArgs),
    /// List configured presets
    Presets,
}

fn load_preset_config(path: Option<&str>) -> Result<Vec<Preset>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read preset file {}", path))?;
            Ok(load_presets(&content)?)
        }
        None => Ok(default_presets()?),
    }
}

fn make_client() -> FlowClient {
    match std::env::var("NETFLOW_BASE_URL") {
        Ok(base) if !base.trim().is_empty() => FlowClient::with_base_url(base.trim()),
        _ => FlowClient::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("netflow=info".parse()?)
                .add_directive("netflow_lib=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        "text" => OutputFormat::Text,
        _ => OutputFormat::Table,
    };

    let presets = load_preset_config(cli.presets.as_deref())?;
    let client = make_client();

    match &cli.command {
        Commands::TrustRank(args) => commands::trust_rank::run(args, &client, &format).await?,
        Commands::BrokerFlow(args) => commands::broker_flow::run(args, &client, &format).await?,
        Commands::Overlap(args) => commands::overlap::run(args, &presets, &client, &format).await?,
        Commands::Digest(args) => commands::digest::run(args, &presets, &client, &format).await?,
        Commands::Presets => commands::presets::run(&presets, &format)?,
    }

    Ok(())
}
