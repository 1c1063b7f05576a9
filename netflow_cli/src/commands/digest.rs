use std::future::Future;

use anyhow::{bail, Result};
use clap::Args;
use netflow_lib::{
    deliver_digest, find_preset, run_digest_cycle, taipei_today, validation, DeliveryError,
    DeliverySink, FlowClient, LineClient, Preset,
};

use crate::output::{print_json, OutputFormat};

/// Default preset for scheduled runs.
const DEFAULT_PRESET: &str = "ms-ubs-trust";

#[derive(Args)]
pub struct DigestArgs {
    /// Presets to run, in order (repeatable)
    #[arg(long = "preset", default_value = DEFAULT_PRESET)]
    pub presets: Vec<String>,

    /// Comma-separated lookback windows, each 1-60
    #[arg(long, default_value = "1,5")]
    pub days: String,

    /// Push each digest through LINE instead of printing it
    #[arg(long)]
    pub push: bool,

    /// LINE group/user id; defaults to LINE_GROUP_ID
    #[arg(long)]
    pub to: Option<String>,
}

/// Prints chunks to stdout, for dry runs.
pub struct StdoutSink;

impl DeliverySink for StdoutSink {
    fn deliver(
        &self,
        _destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        println!("{}\n", text);
        std::future::ready(Ok(()))
    }
}

fn line_client() -> Result<LineClient> {
    let token = match std::env::var("LINE_CHANNEL_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => token,
        _ => bail!("LINE_CHANNEL_ACCESS_TOKEN must be set to push digests"),
    };
    Ok(LineClient::new(token))
}

fn destination(args: &DigestArgs) -> Result<String> {
    let raw = match &args.to {
        Some(to) => to.clone(),
        None => std::env::var("LINE_GROUP_ID").unwrap_or_default(),
    };
    if raw.trim().is_empty() {
        bail!("no destination: pass --to or set LINE_GROUP_ID");
    }
    Ok(validation::validate_destination(&raw)?)
}

pub async fn run(
    args: &DigestArgs,
    presets: &[Preset],
    client: &FlowClient,
    format: &OutputFormat,
) -> Result<()> {
    let days = validation::parse_days(&args.days)?;
    let selected = args
        .presets
        .iter()
        .map(|name| find_preset(presets, name.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let push = if args.push {
        Some((line_client()?, destination(args)?))
    } else {
        None
    };

    let today = taipei_today();
    for preset in selected {
        for &day in &days {
            let report = run_digest_cycle(client, preset, day, today).await?;
            match &push {
                Some((line, to)) => {
                    let sent = deliver_digest(line, to, &report).await?;
                    eprintln!("Pushed '{}' ({} day) in {} message(s)", preset.name, day, sent);
                }
                None if *format == OutputFormat::Json => print_json(&report),
                None => {
                    deliver_digest(&StdoutSink, "stdout", &report).await?;
                }
            }
        }
    }
    Ok(())
}
