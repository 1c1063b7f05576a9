//! HTTP client for the report pages of the eBrokerDJ site.

use std::time::Duration;

use encoding_rs::{BIG5, UTF_8};
use url::Url;

use crate::{
    query::{BrokerFlowQuery, Query, TrustRankQuery},
    user_agent::get_user_agent,
    Error,
};

const DEFAULT_BASE_URL: &str = "https://fubon-ebrokerdj.fbs.com.tw";

/// Request timeout for a single page fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the eBrokerDJ report pages.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// Each call makes exactly one attempt; retrying is left to the caller.
/// Pages do not declare their charset reliably, so bodies are read as raw
/// bytes and decoded by [`decode_html`].
pub struct Client {
    /// Site root. Defaults to `https://fubon-ebrokerdj.fbs.com.tw`.
    base_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production site.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The site root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the absolute URL for a query.
    pub fn get_url(&self, query: &impl Query) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_url, query.path()).as_str()).map_err(
            |e| {
                tracing::error!("Invalid URL constructed: {}", e);
                Error::RequestFailed
            },
        )?;
        Ok(query.add_to_url(&url))
    }

    /// Fetches any URL and returns its decoded text.
    pub async fn fetch(&self, url: &Url) -> Result<String, Error> {
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let resp = client
            .get(url.clone())
            .header("referer", format!("{}/", DEFAULT_BASE_URL))
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "zh-TW,zh;q=0.9,en-US;q=0.8")
            .header("cache-control", "no-cache")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get {}: {}", url, e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&String::from_utf8_lossy(&bytes));
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        decode_html(&bytes)
    }

    /// Fetches an investment-trust ranking page.
    pub async fn get_trust_rank_page(&self, query: &TrustRankQuery) -> Result<String, Error> {
        let url = self.get_url(query)?;
        self.fetch(&url).await
    }

    /// Fetches a broker branch flow page.
    pub async fn get_broker_flow_page(&self, query: &BrokerFlowQuery) -> Result<String, Error> {
        let url = self.get_url(query)?;
        self.fetch(&url).await
    }
}

/// Decodes a page body: UTF-8 first, then cp950 if UTF-8 produced any
/// replacement characters.
///
/// Both passes work on the same raw bytes. An empty body or one containing
/// NUL bytes is not a page and is reported as [`Error::Decode`].
pub fn decode_html(bytes: &[u8]) -> Result<String, Error> {
    if bytes.is_empty() {
        return Err(Error::Decode("empty response body".into()));
    }
    if bytes.contains(&0) {
        return Err(Error::Decode("binary response body".into()));
    }

    let (text, _) = UTF_8.decode_without_bom_handling(bytes);
    if !text.contains('\u{FFFD}') {
        return Ok(text.into_owned());
    }

    let (text, had_errors) = BIG5.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::debug!("cp950 decode left unmappable bytes; keeping best effort");
    }
    Ok(text.into_owned())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    match body.char_indices().nth(MAX) {
        None => body.to_string(),
        Some((idx, _)) => format!("{}...[truncated]", &body[..idx]),
    }
}
