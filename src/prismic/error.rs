//! Content source errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Repository has no master ref")]
    MissingMasterRef,

    #[error("Preview token does not belong to this repository: {0}")]
    UntrustedPreview(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
