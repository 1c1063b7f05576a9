use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of an investment-trust net-buy ranking page.
///
/// `buy`, `sell` and `net` are traded lots, not currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrustRankRow {
    /// Report date shown on the page, if it could be found.
    pub date: Option<NaiveDate>,
    /// 1-based position as stated by the page.
    pub rank: u32,
    pub code: String,
    pub name: String,
    pub close: f64,
    /// Price change, kept as printed (e.g. `+5.00`).
    pub change: String,
    /// Percentage change, kept as printed (e.g. `+2.5%`).
    pub change_pct: String,
    pub buy: f64,
    pub sell: f64,
    pub net: f64,
}
