use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Empty response body from {0}")]
    EmptyResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
