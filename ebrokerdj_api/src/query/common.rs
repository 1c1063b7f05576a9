//! Shared query infrastructure: the [`Query`] trait.

use url::Url;

/// Trait implemented by all report-page query builders.
///
/// A query knows which page it addresses (`path`) and which parameters it
/// appends to the URL. The site exposes 1-day, 5-day, ... variants of each
/// report, selected by the lookback `day`.
pub trait Query {
    /// Page path relative to the site root, starting with `/`.
    fn path(&self) -> String;

    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Lookback window in days.
    fn day(&self) -> u32;
}
