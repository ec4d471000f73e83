// src/delivery/retry.rs
//! Retry with exponential backoff around any card sender.

use crate::constants::{RETRY_INITIAL_BACKOFF, RETRY_MAX_BACKOFF};
use crate::error::TransportError;
use crate::model::RenderedDocument;
use crate::pipeline::{CardSender, SendResponse};
use crate::types::WebhookUrl;
use std::time::Duration;

/// How often and how patiently to retry a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one. Zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: RETRY_INITIAL_BACKOFF,
            max_backoff: RETRY_MAX_BACKOFF,
        }
    }
}

/// Wraps a sender, retrying attempts that may succeed on a second try.
///
/// Retried: transport failures other than encoding and cancellation, HTTP
/// 429, and 5xx except 501. The result of the last attempt is returned as-is.
pub struct RetryingSender<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: CardSender> RetryingSender<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<S: CardSender> CardSender for RetryingSender<S> {
    async fn send(
        &self,
        card: &RenderedDocument,
        destination: &WebhookUrl,
    ) -> Result<SendResponse, TransportError> {
        let max_attempts = self.policy.max_retries + 1;
        let mut delay = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            let result = self.inner.send(card, destination).await;
            if attempt >= max_attempts || !should_retry(&result) {
                return result;
            }

            match &result {
                Ok(response) => log::warn!(
                    "Attempt {} to {} answered {}, retrying after {:?}",
                    attempt,
                    destination,
                    response.status,
                    delay
                ),
                Err(e) => log::warn!(
                    "Attempt {} to {} failed: {}, retrying after {:?}",
                    attempt,
                    destination,
                    e,
                    delay
                ),
            }

            tokio::time::sleep(delay).await;
            delay = std::cmp::min(delay * 2, self.policy.max_backoff);
            attempt += 1;
        }
    }
}

fn should_retry(result: &Result<SendResponse, TransportError>) -> bool {
    match result {
        Ok(response) => {
            response.status == 429 || (response.status >= 500 && response.status != 501)
        }
        Err(TransportError::Encode(_)) | Err(TransportError::Cancelled) => false,
        Err(_) => true,
    }
}
