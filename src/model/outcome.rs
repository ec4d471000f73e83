// src/model/outcome.rs
//! The recorded result of posting one card fragment.

use crate::types::WebhookUrl;
use serde::{Deserialize, Serialize};

/// Result of one delivery attempt. Immutable once recorded.
///
/// `status` is absent when no HTTP response was obtained; `message` then
/// holds the transport error. Otherwise it holds the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub webhook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl DeliveryOutcome {
    /// The destination answered, with any status.
    pub fn delivered(destination: &WebhookUrl, status: u16, body: impl Into<String>) -> Self {
        Self {
            webhook_url: destination.as_str().to_string(),
            status: Some(status),
            message: body.into(),
        }
    }

    /// No response was obtained.
    pub fn failed(destination: &WebhookUrl, error: impl ToString) -> Self {
        Self {
            webhook_url: destination.as_str().to_string(),
            status: None,
            message: error.to_string(),
        }
    }

    /// The destination answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    /// The destination answered, but refused the card.
    pub fn is_rejected(&self) -> bool {
        matches!(self.status, Some(status) if !(200..=299).contains(&status))
    }
}
