mod trust_rank;
pub use self::trust_rank::TrustRankRow;

mod broker_flow;
pub use self::broker_flow::BrokerFlowRow;
