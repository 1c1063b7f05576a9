mod common;
pub use self::common::Query;

mod trust_rank;
pub use self::trust_rank::{Market, TrustRankQuery};

mod broker_flow;
pub use self::broker_flow::{BrokerFlowQuery, Side};
