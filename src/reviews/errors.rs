//! Error types for fetching and decoding review pages

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a reviews provider while producing a raw page.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    StatusError { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// The payload did not match the page schema.
#[derive(Error, Debug)]
#[error("Malformed reviews page: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Everything that can make a single page fetch fail.
///
/// The controller treats every variant the same way: the fetch is
/// abandoned, nothing is applied and the page may be requested again.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Fetch task ended unexpectedly: {0}")]
    TaskFailed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
pub type FetchResult<T> = Result<T, FetchError>;
