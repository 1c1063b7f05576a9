//! Library layer for the net-flow digest: retrying page client, HTML table
//! extraction, row parsing, overlap computation, digest rendering and delivery.
//!
//! Wraps the `ebrokerdj_api` crate, which only fetches and decodes pages.

pub mod client;
pub mod delivery;
pub mod digest;
pub mod error;
pub mod estimate;
pub mod normalize;
pub mod overlap;
pub mod pipeline;
pub mod preset;
pub mod scrape;
pub mod table;
pub mod validation;

pub use ebrokerdj_api;
pub use ebrokerdj_api::types;
pub use ebrokerdj_api::{BrokerFlowQuery, Market, Query, Side, TrustRankQuery};

pub use client::{FlowClient, RetryConfig};
pub use delivery::{
    deliver_long_text, split_by_limit, DeliveryError, DeliverySink, LineClient, CHUNK_LIMIT,
    DEFAULT_SEPARATOR, LINE_TEXT_LIMIT,
};
pub use digest::{DigestReport, DigestSource};
pub use error::NetflowError;
pub use estimate::trust_to_broker;
pub use normalize::{merge_by_code, normalize_rows, parse_code_name, CodeName, MergedSource, NormalizedRecord};
pub use overlap::{
    consistent_date, overlap, prepare_source, Direction, OverlapMode, OverlapOptions,
    OverlapResult, SortBy, SourceEntry,
};
pub use pipeline::{build_report, deliver_digest, fetch_sources, run_digest_cycle, taipei_today};
pub use preset::{default_presets, find_preset, load_presets, Preset, PresetError, SourceKind, SourceSpec};
pub use table::{extract_table, RawTableRow};
