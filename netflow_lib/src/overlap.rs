//! Cross-source overlap of net-buy or net-sell codes.
//!
//! Each source is a [`MergedSource`] already filtered to one direction. A
//! code qualifies when the number of sources containing it meets the
//! threshold chosen by [`OverlapMode`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebrokerdj_api::types::BrokerFlowRow;

use crate::normalize::{merge_by_code, normalize_rows, MergedSource, NormalizedRecord};

/// Which side of the flow a source contributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "buy", alias = "net-buy")]
    NetBuy,
    #[serde(rename = "sell", alias = "net-sell")]
    NetSell,
}

impl Direction {
    pub fn accepts(&self, record: &NormalizedRecord) -> bool {
        match self {
            Direction::NetBuy => record.is_net_buy(),
            Direction::NetSell => record.is_net_sell(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::NetBuy => "buy",
            Direction::NetSell => "sell",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "net-buy" | "b" => Ok(Direction::NetBuy),
            "sell" | "net-sell" | "s" => Ok(Direction::NetSell),
            other => Err(format!("unknown direction '{}': expected buy or sell", other)),
        }
    }
}

/// Source-agreement policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapMode {
    /// Present in every source.
    All,
    /// Present in at least `min_appear` sources.
    #[default]
    #[serde(alias = "atLeast")]
    AtLeast,
    /// Present in as many sources as the best-agreeing code.
    Max,
}

impl fmt::Display for OverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverlapMode::All => "all",
            OverlapMode::AtLeast => "at-least",
            OverlapMode::Max => "max",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OverlapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(OverlapMode::All),
            "at-least" | "atLeast" | "atleast" => Ok(OverlapMode::AtLeast),
            "max" => Ok(OverlapMode::Max),
            other => Err(format!(
                "unknown overlap mode '{}': expected all, at-least or max",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Total buy amount across sources.
    #[default]
    Sum,
    /// Buy amount in the first source, then the total.
    First,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortBy::Sum => "sum",
            SortBy::First => "first",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sum" => Ok(SortBy::Sum),
            "first" => Ok(SortBy::First),
            other => Err(format!("unknown sort '{}': expected sum or first", other)),
        }
    }
}

pub const DEFAULT_MIN_APPEAR: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct OverlapOptions {
    pub mode: OverlapMode,
    pub min_appear: usize,
    pub sort_by: SortBy,
    /// Display label per source. Ignored unless one is given for every source.
    pub labels: Vec<String>,
}

impl Default for OverlapOptions {
    fn default() -> Self {
        Self {
            mode: OverlapMode::default(),
            min_appear: DEFAULT_MIN_APPEAR,
            sort_by: SortBy::default(),
            labels: Vec::new(),
        }
    }
}

impl OverlapOptions {
    pub fn with_mode(mut self, mode: OverlapMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_min_appear(mut self, min_appear: usize) -> Self {
        self.min_appear = min_appear;
        self
    }

    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }
}

/// One source's figures for an overlapping code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    pub source_label: String,
    pub buy_amt: f64,
    pub sell_amt: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapResult {
    pub code: String,
    pub name: String,
    /// One entry per input source, in input order. Missing sources are zeros.
    pub per_source: Vec<SourceEntry>,
    pub sum_buy_amt: f64,
    pub sum_sell_amt: f64,
    pub sum_diff: f64,
}

/// Normalizes, filters by direction and merges one source's rows.
pub fn prepare_source(rows: &[BrokerFlowRow], direction: Direction) -> MergedSource {
    merge_by_code(
        normalize_rows(rows)
            .into_iter()
            .filter(|record| direction.accepts(record)),
    )
}

/// Codes meeting the overlap threshold, sorted per `opts.sort_by`.
pub fn overlap(sources: &[MergedSource], opts: &OverlapOptions) -> Vec<OverlapResult> {
    if sources.is_empty() {
        return Vec::new();
    }

    // First-seen order across sources keeps ties deterministic.
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for source in sources {
        for code in source.codes() {
            let count = counts.entry(code).or_insert(0);
            if *count == 0 {
                order.push(code);
            }
            *count += 1;
        }
    }

    let observed_max = counts.values().copied().max().unwrap_or(0);
    let threshold = appearance_threshold(opts, sources.len(), observed_max);
    tracing::debug!(
        "overlap mode {} over {} sources: {} codes, threshold {}",
        opts.mode,
        sources.len(),
        order.len(),
        threshold
    );

    let labels = source_labels(opts, sources.len());
    let mut results: Vec<OverlapResult> = order
        .into_iter()
        .filter(|code| counts[code] >= threshold)
        .map(|code| build_result(code, sources, &labels))
        .collect();

    match opts.sort_by {
        SortBy::Sum => results.sort_by(|a, b| b.sum_buy_amt.total_cmp(&a.sum_buy_amt)),
        SortBy::First => results.sort_by(|a, b| {
            first_buy(b)
                .total_cmp(&first_buy(a))
                .then_with(|| b.sum_buy_amt.total_cmp(&a.sum_buy_amt))
        }),
    }
    results
}

/// Minimum number of sources a code must appear in.
///
/// `max` mode never goes below two sources when at least two are given, so
/// a run where no two sources agree yields nothing instead of every code.
pub fn appearance_threshold(opts: &OverlapOptions, n_sources: usize, observed_max: usize) -> usize {
    match opts.mode {
        OverlapMode::All => n_sources,
        OverlapMode::AtLeast => opts.min_appear.max(DEFAULT_MIN_APPEAR),
        OverlapMode::Max => observed_max.max(n_sources.min(2)),
    }
}

/// Report date shared by all non-empty row lists.
///
/// Rows without a date are ignored. Each list must then carry exactly one
/// distinct date and all lists must agree. Anything else means at least one
/// page has not been refreshed yet.
pub fn consistent_date(lists: &[Vec<BrokerFlowRow>]) -> Option<NaiveDate> {
    let mut shared: Option<NaiveDate> = None;

    for rows in lists.iter().filter(|rows| !rows.is_empty()) {
        let mut dates = rows.iter().filter_map(|row| row.date);
        let first = dates.next()?;
        if dates.any(|date| date != first) {
            return None;
        }
        match shared {
            Some(date) if date != first => return None,
            _ => shared = Some(first),
        }
    }
    shared
}

fn source_labels(opts: &OverlapOptions, n: usize) -> Vec<String> {
    if opts.labels.len() == n {
        opts.labels.clone()
    } else {
        (1..=n).map(|i| format!("#{}", i)).collect()
    }
}

fn build_result(code: &str, sources: &[MergedSource], labels: &[String]) -> OverlapResult {
    let name = sources
        .iter()
        .find_map(|s| s.get(code))
        .map(|r| r.name.clone())
        .unwrap_or_default();

    let per_source: Vec<SourceEntry> = sources
        .iter()
        .zip(labels)
        .map(|(source, label)| {
            let record = source
                .get(code)
                .cloned()
                .unwrap_or_else(|| NormalizedRecord::zero(code, &name));
            SourceEntry {
                source_label: label.clone(),
                buy_amt: record.buy_amt,
                sell_amt: record.sell_amt,
                diff: record.diff,
            }
        })
        .collect();

    OverlapResult {
        code: code.to_string(),
        name,
        sum_buy_amt: per_source.iter().map(|e| e.buy_amt).sum(),
        sum_sell_amt: per_source.iter().map(|e| e.sell_amt).sum(),
        sum_diff: per_source.iter().map(|e| e.diff).sum(),
        per_source,
    }
}

fn first_buy(result: &OverlapResult) -> f64 {
    result.per_source.first().map(|e| e.buy_amt).unwrap_or(0.0)
}
