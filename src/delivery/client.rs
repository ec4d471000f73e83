// src/delivery/client.rs
//! HTTP transport for posting cards to an incoming webhook.
//!
//! One `reqwest::Client` is built at startup and shared by every request;
//! its connection pool is the only long-lived delivery state.

use crate::constants::RESPONSE_PREVIEW_LENGTH;
use crate::error::TransportError;
use crate::model::RenderedDocument;
use crate::pipeline::{CardSender, SendResponse};
use crate::types::WebhookUrl;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Connection pool settings for the outbound client.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections kept per destination host
    pub max_idle_per_host: usize,
    /// How long an idle connection stays in the pool
    pub idle_timeout: Duration,
    /// Time allowed to establish a connection, TLS handshake included
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 100,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Posts cards as JSON over a pooled HTTP client.
#[derive(Debug, Clone)]
pub struct HttpCardSender {
    client: Client,
}

impl HttpCardSender {
    pub fn new(config: &PoolConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Self::build_client(config)?,
        })
    }

    fn build_client(config: &PoolConfig) -> Result<Client, reqwest::Error> {
        ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
    }
}

#[async_trait::async_trait]
impl CardSender for HttpCardSender {
    async fn send(
        &self,
        card: &RenderedDocument,
        destination: &WebhookUrl,
    ) -> Result<SendResponse, TransportError> {
        let body = card.to_json_bytes()?;
        log::debug!("Posting {} byte card to {}", body.len(), destination);

        let response = self
            .client
            .post(destination.as_url().clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        // the status arrived, so a body read failure is not a transport failure
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                log::warn!(
                    "{} answered {} but the body could not be read: {}",
                    destination,
                    status,
                    e
                );
                format!("failed reading response body: {}", e)
            }
        };

        log::debug!(
            "{} answered {}: {}",
            destination,
            status,
            preview(&body)
        );

        Ok(SendResponse { status, body })
    }
}

/// Truncates a response body for logging.
pub(crate) fn preview(body: &str) -> String {
    if body.chars().count() <= RESPONSE_PREVIEW_LENGTH {
        body.to_string()
    } else {
        let head: String = body.chars().take(RESPONSE_PREVIEW_LENGTH).collect();
        format!("{}...", head)
    }
}
