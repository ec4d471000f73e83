// src/error.rs
//! Application error types with structured error handling.
//!
//! Each stage of a relay has its own vocabulary of failure: rendering,
//! splitting, and transport. `RelayError` tags which stage failed and, for
//! delivery failures, carries the outcomes recorded before the failure so a
//! caller can tell exactly how far the request got.

use crate::model::{DeliveryOutcome, DocumentError};
use crate::types::ValidationError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The template could not turn a notification into a card.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to template alerts with {name}: {message}")]
    Template { name: String, message: String },

    #[error("template produced malformed JSON: {source}")]
    MalformedCard {
        #[source]
        source: serde_json::Error,
    },

    #[error("template produced an invalid card: {0}")]
    InvalidCard(#[from] DocumentError),
}

/// A rendered card cannot be partitioned into deliverable fragments.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("card fields without sections take {base_bytes} bytes, above the {max_bytes} byte limit")]
    BaseTooLarge { base_bytes: usize, max_bytes: usize },

    #[error("failed to serialize card: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A card could not be posted: no HTTP response was obtained.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http client failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("failed to encode card: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("delivery cancelled before a response was received")]
    Cancelled,
}

// reqwest errors name the full request URL, webhook secret included
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err.without_url())
    }
}

/// Where a relay request was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    Rendering,
    Splitting,
    Delivering { fragment: usize },
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rendering => write!(f, "rendering"),
            Self::Splitting => write!(f, "splitting"),
            Self::Delivering { fragment } => write!(f, "delivering fragment {}", fragment + 1),
        }
    }
}

/// Failure of one relay request.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to render card: {0}")]
    Render(#[from] RenderError),

    #[error("failed to split card: {0}")]
    Split(#[from] SplitError),

    #[error("request cancelled while {stage}")]
    Cancelled { stage: RelayStage },

    #[error("delivery of fragment {} of {total} failed: {source}", .fragment + 1)]
    Delivery {
        fragment: usize,
        total: usize,
        outcomes: Vec<DeliveryOutcome>,
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    /// Stage the request had reached when it failed.
    pub fn stage(&self) -> RelayStage {
        match self {
            Self::Render(_) => RelayStage::Rendering,
            Self::Split(_) => RelayStage::Splitting,
            Self::Cancelled { stage } => *stage,
            Self::Delivery { fragment, .. } => RelayStage::Delivering {
                fragment: *fragment,
            },
        }
    }

    /// Outcomes recorded before the failure, including the failed attempt.
    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        match self {
            Self::Delivery { outcomes, .. } => outcomes,
            _ => &[],
        }
    }

    /// Consumes the error, keeping the recorded outcomes.
    pub fn into_outcomes(self) -> Vec<DeliveryOutcome> {
        match self {
            Self::Delivery { outcomes, .. } => outcomes,
            _ => Vec::new(),
        }
    }

    /// True once at least one fragment was sent.
    pub fn attempted_delivery(&self) -> bool {
        !self.outcomes().is_empty()
    }
}

/// An inbound webhook request could not be relayed.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("failed to decode alert notification: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid destination webhook: {0}")]
    Destination(#[source] ValidationError),

    #[error("no destination webhook in request path or Authorization header")]
    MissingDestination,

    #[error("no connector named '{0}'")]
    UnknownConnector(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Startup configuration is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ConfigFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigFileInvalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("template file {path} does not exist: {source}")]
    TemplateNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template {path}: {message}")]
    TemplateInvalid { path: PathBuf, message: String },

    #[error("the {field} is required for request_path '{request_path}'")]
    MissingField {
        field: &'static str,
        request_path: String,
    },

    #[error("found duplicate use of request path '{0}'")]
    DuplicateRequestPath(String),

    #[error("request path '{0}' is reserved")]
    ReservedRequestPath(String),

    #[error("fallback connector '{0}' is not a configured request path")]
    UnknownFallbackConnector(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[source] anyhow::Error),
}
