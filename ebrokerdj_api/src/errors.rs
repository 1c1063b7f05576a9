//! Error types for the report-site client.

/// Errors that can occur when fetching a report page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The site returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response payload could not be turned into page text.
    #[error("Unrecognized response payload: {0}")]
    Decode(String),
}

