// src/pipeline.rs
//! Capability traits for the three stages of a relay: render, split, send.
//!
//! Each trait describes a single capability, so every stage can be swapped
//! or mocked in isolation. `DeliveryService` depends only on these.

use crate::card::{split_card, CardLimits};
use crate::error::{RenderError, SplitError, TransportError};
use crate::model::{RenderedDocument, WebhookMessage};
use crate::types::WebhookUrl;

/// Turns a notification into a card. Must be deterministic and must have
/// already escaped any text-formatting concerns.
pub trait CardRenderer: Send + Sync {
    fn render(&self, message: &WebhookMessage) -> Result<RenderedDocument, RenderError>;
}

/// Partitions a card into fragments the destination will accept.
pub trait CardSplitter: Send + Sync {
    fn split(&self, card: &RenderedDocument) -> Result<Vec<RenderedDocument>, SplitError>;
}

impl CardSplitter for CardLimits {
    fn split(&self, card: &RenderedDocument) -> Result<Vec<RenderedDocument>, SplitError> {
        split_card(card, *self)
    }
}

/// What the destination answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub status: u16,
    pub body: String,
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Posts one card to one destination.
///
/// `Err` means no response was obtained. A non-2xx answer is still `Ok`:
/// the destination was reached and rejected the card.
#[async_trait::async_trait]
pub trait CardSender: Send + Sync {
    async fn send(
        &self,
        card: &RenderedDocument,
        destination: &WebhookUrl,
    ) -> Result<SendResponse, TransportError>;
}
