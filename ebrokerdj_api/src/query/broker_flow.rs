use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::Query;

/// Which side of a broker's book the page ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "B", alias = "buy")]
    Buy,
    #[serde(rename = "S", alias = "sell")]
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Buy => "B",
            Side::Sell => "S",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "B" | "b" | "buy" => Ok(Side::Buy),
            "S" | "s" | "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}': expected B or S", other)),
        }
    }
}

/// Query for a single broker branch's flow page (`/z/zg/zgb/zgb0.djhtm`).
///
/// `branch` and `sub_branch` are the site's `a`/`b` parameters (head office
/// and branch ids; equal for a head office), `side` is `c`, `day` is `d`.
#[derive(Clone, Debug, Default)]
pub struct BrokerFlowQuery {
    pub branch: String,
    pub sub_branch: String,
    pub side: Option<Side>,
    pub day: Option<u32>,
}

impl Query for BrokerFlowQuery {
    fn path(&self) -> String {
        "/z/zg/zgb/zgb0.djhtm".to_string()
    }

    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("a", &self.branch)
            .append_pair("b", &self.sub_branch);
        if let Some(side) = self.side {
            url.query_pairs_mut().append_pair("c", &side.to_string());
        }
        if let Some(day) = self.day {
            url.query_pairs_mut().append_pair("d", &day.to_string());
        }
        url
    }

    fn day(&self) -> u32 {
        self.day.unwrap_or(1)
    }
}

impl BrokerFlowQuery {
    /// Query for a branch; a head office uses the same id for both parameters.
    pub fn new(branch: &str, sub_branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            sub_branch: sub_branch.to_string(),
            ..Default::default()
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }
}
