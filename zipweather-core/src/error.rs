use reqwest::StatusCode;
use thiserror::Error;

/// Failures that can end a forecast chain.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Input was not exactly seven ASCII digits.
    #[error("postal code must be exactly 7 digits, got {0:?}")]
    InvalidPostalCode(String),

    /// The request never produced a response.
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("malformed {service} response: {source}")]
    Malformed {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The prefecture is not in the region table.
    #[error("no forecast region known for prefecture {0:?}")]
    UnmappedPrefecture(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
