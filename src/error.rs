//! Error types for configuration loading and network fetches.
//!
//! Two families exist:
//! - [`ConfigError`]: the topic table or settings are invalid, or a lookup
//!   against them failed.
//! - [`FetchError`]: one HTTP call or payload decode failed. These never
//!   escape a crawl; the orchestrator turns them into error strings.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the topic table, the settings file, or lookups against them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("source `{source_name}`: {reason}")]
    InvalidSource { source_name: String, reason: String },

    #[error("topic `{topic}`: {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("no crawler configuration for topic: {0}")]
    TopicNotFound(String),

    #[error("source `{0}` not found")]
    SourceNotFound(String),
}

/// A single request or payload decode that went wrong.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request timeout")]
    Timeout,

    #[error("http {status} for {url}")]
    Http { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("unparseable payload: {0}")]
    Payload(String),
}

impl FetchError {
    /// Classify a `reqwest` failure from either sending the request or
    /// reading its body. Timeouts map to [`FetchError::Timeout`] on both.
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
