//! CLI subcommand implementations.

pub mod broker_flow;
pub mod digest;
pub mod overlap;
pub mod presets;
pub mod trust_rank;
