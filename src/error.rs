use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup errors. The process refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env variable not defined")]
    Missing(&'static str),

    #[error("PORT is not a valid port number: {0:?}")]
    InvalidPort(String),

    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("cannot read channels file {}: {source}", .path.display())]
    ChannelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse channels file {}: {source}", .path.display())]
    ChannelParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A login attempt that never got an answer from upstream.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("login request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Failures of the catalog and stream calls, surfaced to the route handler.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("cannot parse live catalog: {source}")]
    CatalogParse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve stream: {0}")]
    StreamResolution(String),

    #[error("upstream session is not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Login(#[from] LoginError),
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;
