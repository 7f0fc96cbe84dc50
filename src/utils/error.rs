use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// Define error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid bounding box: min ({min_lon}, {min_lat}) exceeds max ({max_lon}, {max_lat})")]
    InvalidBoundingBox {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },
    #[error("Invalid coordinates")]
    InvalidCoordinates,
    #[error("Color scale needs at least one anchor color")]
    EmptyPalette,
    #[error("Unknown palette: {0}")]
    UnknownPalette(String),
    #[error("Missing tag: {0}")]
    MissingTag(String),
    #[error("Could not parse tag {key}={value}")]
    TagParse { key: String, value: String },
    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Provider answered with HTTP status {0}")]
    HttpStatus(u16),
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("Giving up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Error decoding JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a provider call that failed with this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout | Error::RateLimited { .. } => true,
            Error::HttpStatus(status) => *status >= 500,
            Error::Request(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
