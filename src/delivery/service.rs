// src/delivery/service.rs
//! Turns one inbound notification into an ordered list of delivery outcomes.
//!
//! A relay runs `Rendering → Splitting → Delivering[0..n] → Done`. Fragments
//! are posted strictly one after another: fragment `i + 1` is never sent
//! before the outcome of fragment `i` is known. A rejected fragment (non-2xx)
//! is recorded and the loop moves on; a transport failure is recorded and
//! ends the relay, so no fragment after it was ever sent.

use crate::card::CardLimits;
use crate::delivery::client::preview;
use crate::error::{RelayError, RelayStage, TransportError};
use crate::model::{DeliveryOutcome, WebhookMessage};
use crate::pipeline::{CardRenderer, CardSender, CardSplitter};
use crate::types::WebhookUrl;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Relays notifications through one renderer to any destination.
///
/// Cheap to clone; the collaborators are shared.
#[derive(Clone)]
pub struct DeliveryService {
    renderer: Arc<dyn CardRenderer>,
    splitter: Arc<dyn CardSplitter>,
    sender: Arc<dyn CardSender>,
}

impl DeliveryService {
    /// A service that splits against the Teams card limits.
    pub fn new(renderer: Arc<dyn CardRenderer>, sender: Arc<dyn CardSender>) -> Self {
        Self {
            renderer,
            splitter: Arc::new(CardLimits::TEAMS),
            sender,
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn CardSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Renders, splits and delivers `message` to `destination`.
    ///
    /// On success every fragment was attempted and the outcomes are in
    /// fragment order. A transport failure returns `RelayError::Delivery`
    /// carrying the outcomes recorded so far, the failed one last.
    pub async fn relay(
        &self,
        message: &WebhookMessage,
        destination: &WebhookUrl,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeliveryOutcome>, RelayError> {
        let started = Instant::now();

        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled {
                stage: RelayStage::Rendering,
            });
        }
        let card = self.renderer.render(message)?;

        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled {
                stage: RelayStage::Splitting,
            });
        }
        let fragments = self.splitter.split(&card)?;
        let total = fragments.len();
        if total > 1 {
            log::info!(
                "Card with {} sections split into {} fragments for {}",
                card.section_count(),
                total,
                destination
            );
        }

        let mut outcomes = Vec::with_capacity(total);
        for (index, fragment) in fragments.iter().enumerate() {
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Cancelled),
                result = self.sender.send(fragment, destination) => result,
            };

            match attempt {
                Ok(response) => {
                    let outcome =
                        DeliveryOutcome::delivered(destination, response.status, response.body);
                    if outcome.is_rejected() {
                        log::warn!(
                            "Fragment {}/{} rejected by {} with status {}: {}",
                            index + 1,
                            total,
                            destination,
                            response.status,
                            preview(&outcome.message)
                        );
                    } else {
                        log::debug!(
                            "Fragment {}/{} delivered to {} ({})",
                            index + 1,
                            total,
                            destination,
                            response.status
                        );
                    }
                    outcomes.push(outcome);
                }
                Err(source) => {
                    log::error!(
                        "Fragment {}/{} could not be sent to {}: {}",
                        index + 1,
                        total,
                        destination,
                        source
                    );
                    outcomes.push(DeliveryOutcome::failed(destination, &source));
                    return Err(RelayError::Delivery {
                        fragment: index,
                        total,
                        outcomes,
                        source,
                    });
                }
            }
        }

        log::info!(
            "Relayed {} alerts for receiver '{}' to {} in {} fragment(s) in {:?}",
            message.alerts.len(),
            message.receiver,
            destination,
            total,
            started.elapsed()
        );

        Ok(outcomes)
    }
}
