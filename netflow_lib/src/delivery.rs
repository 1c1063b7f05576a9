//! Message delivery and splitting of long digests.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

/// Hard per-message text limit of the LINE messaging API.
pub const LINE_TEXT_LIMIT: usize = 5000;
/// Chunk size used when splitting, kept below [`LINE_TEXT_LIMIT`].
pub const CHUNK_LIMIT: usize = 4800;
pub const DEFAULT_SEPARATOR: &str = "\n\n";
pub const LINE_API_BASE: &str = "https://api.line.me";

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("no delivery destination configured")]
    MissingDestination,

    #[error("message of {0} characters exceeds the 5000 character limit")]
    TooLong(usize),

    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery rejected with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Something that can push one text message to a destination.
pub trait DeliverySink {
    fn deliver(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Splits `text` and delivers the pieces one after another.
///
/// Returns the number of messages sent. Stops at the first failed piece.
pub async fn deliver_long_text<S>(
    sink: &S,
    destination: &str,
    text: &str,
    separator: &str,
) -> Result<usize, DeliveryError>
where
    S: DeliverySink + Sync,
{
    if destination.trim().is_empty() {
        return Err(DeliveryError::MissingDestination);
    }

    let chunks = split_by_limit(text, CHUNK_LIMIT, separator);
    let total = chunks.len();
    for (i, chunk) in chunks.iter().enumerate() {
        tracing::debug!("delivering chunk {}/{} ({} chars)", i + 1, total, chunk.chars().count());
        sink.deliver(destination, chunk).await?;
    }
    Ok(total)
}

/// Splits `text` into pieces of at most `limit` characters.
///
/// A cut goes at the last `separator` in the window when that falls past 60%
/// of the limit, otherwise at the last newline, otherwise exactly at the
/// limit. Pieces are trimmed and empty pieces dropped.
pub fn split_by_limit(text: &str, limit: usize, separator: &str) -> Vec<String> {
    let limit = limit.max(1);
    let separator: Vec<char> = if separator.is_empty() {
        vec!['\n']
    } else {
        separator.chars().collect()
    };
    let min_sep_idx = limit * 6 / 10;

    let mut pieces: Vec<String> = Vec::new();
    let mut remaining: Vec<char> = text.chars().collect();

    while remaining.len() > limit {
        let window = &remaining[..limit];
        let cut = match rfind(window, &separator) {
            Some(idx) if idx >= min_sep_idx => idx,
            _ => window.iter().rposition(|&c| c == '\n').unwrap_or(0),
        };
        let cut = if cut == 0 { limit } else { cut };

        pieces.push(remaining[..cut].iter().collect());
        remaining.drain(..cut);
    }
    pieces.push(remaining.into_iter().collect());

    pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Push-message client for the LINE messaging API.
pub struct LineClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl LineClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: LINE_API_BASE.to_string(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn push(&self, destination: &str, text: &str) -> Result<(), DeliveryError> {
        let len = text.chars().count();
        if len > LINE_TEXT_LIMIT {
            return Err(DeliveryError::TooLong(len));
        }

        let body = PushRequest {
            to: destination,
            messages: [TextMessage { kind: "text", text }],
        };
        let resp = self
            .http
            .post(format!("{}/v2/bot/message/push", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("LINE push failed with HTTP {}", status.as_u16());
            return Err(DeliveryError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl DeliverySink for LineClient {
    fn deliver(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        self.push(destination, text)
    }
}
