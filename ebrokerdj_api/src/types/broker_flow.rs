use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of a broker branch flow page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerFlowRow {
    /// Report date shown on the page, if it could be found.
    pub date: Option<NaiveDate>,
    /// Raw label cell. Usually markup wrapping a `GenLink2stk(...)` call
    /// rather than plain "code name" text.
    pub broker: String,
    pub buy_amt: f64,
    pub sell_amt: f64,
    /// Net amount as printed. Not necessarily `buy_amt - sell_amt`.
    pub diff: f64,
}
