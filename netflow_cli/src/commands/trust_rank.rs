use anyhow::Result;
use clap::Args;
use netflow_lib::{taipei_today, validation, FlowClient, TrustRankQuery};

use crate::output::{print_trust_rank, OutputFormat};

#[derive(Args)]
pub struct TrustRankArgs {
    /// Market: listed (TWSE) or otc (TPEx)
    #[arg(long, default_value = "listed")]
    pub market: String,

    /// Lookback window in trading days (1-60)
    #[arg(long, default_value = "1")]
    pub day: u32,
}

pub async fn run(args: &TrustRankArgs, client: &FlowClient, format: &OutputFormat) -> Result<()> {
    let market = validation::validate_market(&args.market)?;
    let day = validation::validate_day(args.day)?;

    let query = TrustRankQuery::default().with_market(market).with_day(day);
    let rows = client.trust_rank(&query, taipei_today()).await?;

    if let Some(date) = rows.first().and_then(|r| r.date) {
        eprintln!("Investment trust ranking ({}, {} day) as of {}", market, day, date);
    } else {
        eprintln!("Investment trust ranking ({}, {} day): report date unavailable", market, day);
    }
    print_trust_rank(&rows, format)
}
