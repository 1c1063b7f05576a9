//! Error types for the library layer.

use std::fmt;

use crate::delivery::DeliveryError;
use crate::preset::PresetError;

/// Errors produced by the library layer, wrapping site-client errors and
/// adding delivery, configuration and input validation failures.
///
/// Unparseable rows and labels never show up here; they are skipped where
/// they are read. A missing report date is not an error either.
#[derive(Debug)]
pub enum NetflowError {
    /// A page could not be fetched or decoded, even after retrying.
    Fetch(ebrokerdj_api::Error),
    /// The digest could not be pushed to its destination.
    Delivery(DeliveryError),
    /// Preset configuration is unreadable or inconsistent.
    Config(PresetError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for NetflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Delivery(e) => write!(f, "Delivery error: {}", e),
            Self::Config(e) => write!(f, "Config error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for NetflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Delivery(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ebrokerdj_api::Error> for NetflowError {
    fn from(e: ebrokerdj_api::Error) -> Self {
        Self::Fetch(e)
    }
}

impl From<DeliveryError> for NetflowError {
    fn from(e: DeliveryError) -> Self {
        Self::Delivery(e)
    }
}

impl From<PresetError> for NetflowError {
    fn from(e: PresetError) -> Self {
        Self::Config(e)
    }
}
