use anyhow::Result;
use clap::Args;
use netflow_lib::normalize::normalize_rows;
use netflow_lib::{validation, BrokerFlowQuery, FlowClient};

use crate::output::{print_flow, OutputFormat};

#[derive(Args)]
pub struct BrokerFlowArgs {
    /// Broker head office id (e.g. 1470)
    #[arg(long)]
    pub branch: String,

    /// Branch id; defaults to the head office id
    #[arg(long)]
    pub sub_branch: Option<String>,

    /// Ranking side: B (net buy) or S (net sell)
    #[arg(long)]
    pub side: Option<String>,

    /// Lookback window in trading days (1-60)
    #[arg(long, default_value = "1")]
    pub day: u32,
}

pub async fn run(args: &BrokerFlowArgs, client: &FlowClient, format: &OutputFormat) -> Result<()> {
    let branch = validation::validate_branch_id(&args.branch)?;
    let sub_branch = match &args.sub_branch {
        Some(sub) => validation::validate_branch_id(sub)?,
        None => branch.clone(),
    };
    let day = validation::validate_day(args.day)?;

    let mut query = BrokerFlowQuery::new(&branch, &sub_branch).with_day(day);
    if let Some(side) = &args.side {
        query = query.with_side(validation::validate_side(side)?);
    }

    let rows = client.broker_flow(&query).await?;
    let records = normalize_rows(&rows);
    let skipped = rows.len() - records.len();

    match rows.first().and_then(|r| r.date) {
        Some(date) => eprintln!(
            "Broker {}/{} ({} day) as of {}: {} rows",
            branch,
            sub_branch,
            day,
            date,
            records.len()
        ),
        None => eprintln!(
            "Broker {}/{} ({} day): report date unavailable, {} rows",
            branch,
            sub_branch,
            day,
            records.len()
        ),
    }
    if skipped > 0 {
        eprintln!("Skipped {} rows with unrecognized labels", skipped);
    }
    print_flow(&records, format)
}
