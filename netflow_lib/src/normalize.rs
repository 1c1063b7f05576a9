//! Label parsing and per-source merging of broker flow rows.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use ebrokerdj_api::types::BrokerFlowRow;

static GEN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"GenLink2stk\(\s*'AS(\d+)'\s*,\s*'([^']+)'\s*\)").expect("valid regex")
});
static PLAIN_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4,5})\s+(.+)$").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeName {
    pub code: String,
    pub name: String,
}

/// A broker flow row keyed by stock code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub code: String,
    pub name: String,
    pub buy_amt: f64,
    pub sell_amt: f64,
    pub diff: f64,
}

impl NormalizedRecord {
    /// Placeholder for a source that has no record for `code`.
    pub fn zero(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            buy_amt: 0.0,
            sell_amt: 0.0,
            diff: 0.0,
        }
    }

    pub fn is_net_buy(&self) -> bool {
        self.diff > 0.0 || self.buy_amt > self.sell_amt
    }

    pub fn is_net_sell(&self) -> bool {
        self.diff < 0.0 || self.sell_amt > self.buy_amt
    }
}

/// One source's records, at most one per code, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSource {
    records: Vec<NormalizedRecord>,
    index: HashMap<String, usize>,
}

impl MergedSource {
    pub fn get(&self, code: &str) -> Option<&NormalizedRecord> {
        self.index.get(code).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }

    fn add(&mut self, record: NormalizedRecord) {
        match self.index.get(&record.code) {
            Some(&i) => {
                let existing = &mut self.records[i];
                existing.buy_amt += record.buy_amt;
                existing.sell_amt += record.sell_amt;
                existing.diff += record.diff;
                if existing.name.is_empty() && !record.name.is_empty() {
                    existing.name = record.name;
                }
            }
            None => {
                self.index.insert(record.code.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

impl FromIterator<NormalizedRecord> for MergedSource {
    fn from_iter<I: IntoIterator<Item = NormalizedRecord>>(iter: I) -> Self {
        let mut merged = MergedSource::default();
        for record in iter {
            merged.add(record);
        }
        merged
    }
}

/// Extracts a stock code and name from a broker flow label.
///
/// Accepts the `GenLink2stk('AS2330','台積電')` link annotation and plain
/// `2330 台積電` text (markup and comment markers removed first).
pub fn parse_code_name(label: &str) -> Option<CodeName> {
    let collapsed = WHITESPACE.replace_all(label, " ");

    if let Some(caps) = GEN_LINK.captures(&collapsed) {
        let name = caps[2].trim();
        return Some(CodeName {
            code: caps[1].to_string(),
            name: name.to_string(),
        });
    }

    let stripped = collapsed.replace("<!--", " ").replace("-->", " ");
    let stripped = TAG.replace_all(&stripped, " ");
    let text = WHITESPACE.replace_all(stripped.trim(), " ");
    let caps = PLAIN_LABEL.captures(&text)?;
    Some(CodeName {
        code: caps[1].to_string(),
        name: caps[2].trim().to_string(),
    })
}

/// Converts raw rows into records, dropping rows whose label has no code.
pub fn normalize_rows(rows: &[BrokerFlowRow]) -> Vec<NormalizedRecord> {
    rows.iter()
        .filter_map(|row| {
            let Some(CodeName { code, name }) = parse_code_name(&row.broker) else {
                tracing::debug!("dropping row with unrecognized label: {}", row.broker);
                return None;
            };
            Some(NormalizedRecord {
                code,
                name,
                buy_amt: row.buy_amt,
                sell_amt: row.sell_amt,
                diff: row.diff,
            })
        })
        .collect()
}

/// Sums records sharing a code, keeping the first non-empty name.
pub fn merge_by_code<I>(records: I) -> MergedSource
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    records.into_iter().collect()
}
