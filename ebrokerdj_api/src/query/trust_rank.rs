use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::Query;

/// Exchange segment of an investment-trust ranking page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// TWSE listed shares.
    #[default]
    Listed = 0,
    /// TPEx over-the-counter shares.
    Otc = 1,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Market::Listed => "listed",
            Market::Otc => "otc",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listed" | "twse" | "0" => Ok(Market::Listed),
            "otc" | "tpex" | "1" => Ok(Market::Otc),
            other => Err(format!("unknown market '{}': expected listed or otc", other)),
        }
    }
}

/// Query for the "investment trust net buy" ranking page.
///
/// Renders as `/z/zg/zg_DD_{market}_{day}.djhtm`; the page takes no query string.
#[derive(Clone, Debug)]
pub struct TrustRankQuery {
    pub market: Market,
    pub day: u32,
}

impl Default for TrustRankQuery {
    fn default() -> Self {
        Self {
            market: Market::Listed,
            day: 1,
        }
    }
}

impl Query for TrustRankQuery {
    fn path(&self) -> String {
        format!("/z/zg/zg_DD_{}_{}.djhtm", self.market as u8, self.day)
    }

    fn add_to_url(&self, url: &Url) -> Url {
        url.clone()
    }

    fn day(&self) -> u32 {
        self.day
    }
}

impl TrustRankQuery {
    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.day = day;
        self
    }
}
