use anyhow::Result;
use netflow_lib::digest::fmt_amount;
use netflow_lib::types::TrustRankRow;
use netflow_lib::{NormalizedRecord, OverlapResult, Preset};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
    /// Rendered digest text. Commands without a digest print a table.
    Text,
}

#[derive(Tabled, Serialize)]
struct TrustRankTableRow {
    #[tabled(rename = "Rank")]
    #[serde(rename = "Rank")]
    rank: u32,
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Close")]
    #[serde(rename = "Close")]
    close: String,
    #[tabled(rename = "Change")]
    #[serde(rename = "Change")]
    change: String,
    #[tabled(rename = "Change %")]
    #[serde(rename = "Change %")]
    change_pct: String,
    #[tabled(rename = "Buy")]
    #[serde(rename = "Buy")]
    buy: String,
    #[tabled(rename = "Sell")]
    #[serde(rename = "Sell")]
    sell: String,
    #[tabled(rename = "Net")]
    #[serde(rename = "Net")]
    net: String,
}

#[derive(Tabled, Serialize)]
struct FlowTableRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Buy")]
    #[serde(rename = "Buy")]
    buy: String,
    #[tabled(rename = "Sell")]
    #[serde(rename = "Sell")]
    sell: String,
    #[tabled(rename = "Diff")]
    #[serde(rename = "Diff")]
    diff: String,
}

#[derive(Tabled, Serialize)]
struct OverlapTableRow {
    #[tabled(rename = "#")]
    #[serde(rename = "#")]
    position: usize,
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Sources")]
    #[serde(rename = "Sources")]
    sources: String,
    #[tabled(rename = "Sum Buy")]
    #[serde(rename = "Sum Buy")]
    sum_buy: String,
    #[tabled(rename = "Sum Sell")]
    #[serde(rename = "Sum Sell")]
    sum_sell: String,
    #[tabled(rename = "Sum Diff")]
    #[serde(rename = "Sum Diff")]
    sum_diff: String,
}

#[derive(Tabled, Serialize)]
struct PresetTableRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Mode")]
    #[serde(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Sort")]
    #[serde(rename = "Sort")]
    sort: String,
    #[tabled(rename = "Sources")]
    #[serde(rename = "Sources")]
    sources: String,
}

// -- Row builders --

fn build_trust_rank_rows(rows: &[TrustRankRow]) -> Vec<TrustRankTableRow> {
    rows.iter()
        .map(|r| TrustRankTableRow {
            rank: r.rank,
            code: r.code.clone(),
            name: r.name.clone(),
            close: format!("{:.2}", r.close),
            change: r.change.clone(),
            change_pct: r.change_pct.clone(),
            buy: fmt_amount(r.buy),
            sell: fmt_amount(r.sell),
            net: fmt_amount(r.net),
        })
        .collect()
}

fn build_flow_rows(records: &[NormalizedRecord]) -> Vec<FlowTableRow> {
    records
        .iter()
        .map(|r| FlowTableRow {
            code: r.code.clone(),
            name: r.name.clone(),
            buy: fmt_amount(r.buy_amt),
            sell: fmt_amount(r.sell_amt),
            diff: fmt_amount(r.diff),
        })
        .collect()
}

fn build_overlap_rows(results: &[OverlapResult]) -> Vec<OverlapTableRow> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| OverlapTableRow {
            position: i + 1,
            code: r.code.clone(),
            name: r.name.clone(),
            sources: r
                .per_source
                .iter()
                .map(|e| format!("{} {}", e.source_label, fmt_amount(e.buy_amt)))
                .collect::<Vec<_>>()
                .join(" | "),
            sum_buy: fmt_amount(r.sum_buy_amt),
            sum_sell: fmt_amount(r.sum_sell_amt),
            sum_diff: fmt_amount(r.sum_diff),
        })
        .collect()
}

fn build_preset_rows(presets: &[Preset]) -> Vec<PresetTableRow> {
    presets
        .iter()
        .map(|p| PresetTableRow {
            name: p.name.clone(),
            title: p.title.clone(),
            mode: p.overlap.mode.to_string(),
            sort: p.overlap.sort_by.to_string(),
            sources: p
                .sources
                .iter()
                .map(|s| {
                    if s.page.estimated() {
                        format!("{}*", s.label)
                    } else {
                        s.label.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

// -- Generic printers --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table | OutputFormat::Text => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_trust_rank(rows: &[TrustRankRow], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&rows);
            Ok(())
        }
        _ => print_rows(build_trust_rank_rows(rows), format),
    }
}

pub fn print_flow(records: &[NormalizedRecord], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&records);
            Ok(())
        }
        _ => print_rows(build_flow_rows(records), format),
    }
}

pub fn print_overlap(results: &[OverlapResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&results);
            Ok(())
        }
        _ => print_rows(build_overlap_rows(results), format),
    }
}

pub fn print_presets(presets: &[Preset], format: &OutputFormat) -> Result<()> {
    print_rows(build_preset_rows(presets), format)
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
