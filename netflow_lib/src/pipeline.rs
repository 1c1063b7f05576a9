//! One digest cycle: fetch every source of a preset, overlap, render.
//!
//! A cycle has no state of its own. Every call fetches all of its pages
//! again, and a source that fails after retries fails the whole cycle
//! rather than producing a smaller overlap.

use chrono::{FixedOffset, NaiveDate, Utc};
use futures::future::try_join_all;

use ebrokerdj_api::types::BrokerFlowRow;
use ebrokerdj_api::{BrokerFlowQuery, TrustRankQuery};

use crate::client::FlowClient;
use crate::delivery::{deliver_long_text, DeliverySink, DEFAULT_SEPARATOR};
use crate::digest::{DigestReport, DigestSource};
use crate::error::NetflowError;
use crate::estimate::trust_to_broker;
use crate::overlap::{consistent_date, overlap, prepare_source};
use crate::preset::{Preset, SourceKind, SourceSpec};
use crate::validation::validate_day;

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

/// Current calendar date in Taipei.
pub fn taipei_today() -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::east_opt(TAIPEI_OFFSET_SECS) {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.date_naive(),
    }
}

/// Fetches one source as broker flow rows. Ranking pages are converted to
/// estimated amounts.
pub async fn fetch_source(
    client: &FlowClient,
    source: &SourceSpec,
    day: u32,
    today: NaiveDate,
) -> Result<Vec<BrokerFlowRow>, NetflowError> {
    let rows = match &source.page {
        SourceKind::BrokerFlow {
            branch,
            sub_branch,
            side,
        } => {
            let mut query = BrokerFlowQuery::new(branch, sub_branch).with_day(day);
            if let Some(side) = side {
                query = query.with_side(*side);
            }
            client.broker_flow(&query).await?
        }
        SourceKind::TrustRank { market } => {
            let query = TrustRankQuery::default()
                .with_market(*market)
                .with_day(day);
            trust_to_broker(&client.trust_rank(&query, today).await?)
        }
    };
    tracing::debug!("source '{}' returned {} rows", source.label, rows.len());
    Ok(rows)
}

/// Fetches every source of `preset` concurrently, in preset order.
pub async fn fetch_sources(
    client: &FlowClient,
    preset: &Preset,
    day: u32,
    today: NaiveDate,
) -> Result<Vec<Vec<BrokerFlowRow>>, NetflowError> {
    try_join_all(
        preset
            .sources
            .iter()
            .map(|source| fetch_source(client, source, day, today)),
    )
    .await
}

/// Builds the digest for already fetched rows, one list per preset source.
pub fn build_report(preset: &Preset, day: u32, lists: &[Vec<BrokerFlowRow>]) -> DigestReport {
    let sources: Vec<_> = preset
        .sources
        .iter()
        .zip(lists)
        .map(|(spec, rows)| prepare_source(rows, spec.direction))
        .collect();
    let results = overlap(&sources, &preset.overlap_options());
    let date = consistent_date(lists);

    DigestReport {
        title: preset.title.clone(),
        day,
        sources: preset
            .sources
            .iter()
            .map(|s| DigestSource {
                label: s.label.clone(),
                estimated: s.page.estimated(),
            })
            .collect(),
        date,
        results,
    }
}

/// Runs one digest cycle for `preset` over a `day`-day lookback.
pub async fn run_digest_cycle(
    client: &FlowClient,
    preset: &Preset,
    day: u32,
    today: NaiveDate,
) -> Result<DigestReport, NetflowError> {
    let day = validate_day(day)?;
    tracing::info!(
        "Running digest '{}' for {} day(s) over {} sources",
        preset.name,
        day,
        preset.sources.len()
    );

    let lists = fetch_sources(client, preset, day, today).await?;
    let report = build_report(preset, day, &lists);

    if report.is_stale() {
        tracing::warn!("Digest '{}' ({} day): source dates missing or disagree", preset.name, day);
    }
    tracing::info!(
        "Digest '{}' ({} day): {} overlapping codes",
        preset.name,
        day,
        report.results.len()
    );
    Ok(report)
}

/// Renders `report` and delivers it in order-preserving chunks.
pub async fn deliver_digest<S>(
    sink: &S,
    destination: &str,
    report: &DigestReport,
) -> Result<usize, NetflowError>
where
    S: DeliverySink + Sync,
{
    let sent = deliver_long_text(sink, destination, &report.render(), DEFAULT_SEPARATOR).await?;
    tracing::info!("Delivered digest '{}' in {} message(s)", report.title, sent);
    Ok(sent)
}
