// src/server/mod.rs
//! Inbound HTTP surface: one route per connector plus the dynamic, by-label
//! and config routes.

pub mod handlers;
pub mod middleware;

use crate::constants::{BY_LABEL_ROUTE, CONFIG_ROUTE, DYNAMIC_WEBHOOK_PREFIX};
use crate::delivery::DeliveryService;
use crate::model::WebhookMessage;
use crate::types::{RequestPath, WebhookUrl};
use axum::routing::{get, post};
use axum::Router;
use indexmap::IndexMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// A configured inbound route and the destination it relays to.
#[derive(Clone)]
pub struct Connector {
    pub request_path: RequestPath,
    pub webhook_url: WebhookUrl,
    pub template_file: PathBuf,
    pub service: DeliveryService,
}

/// Selects a connector from a common label of the alert group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRouting {
    /// Common label whose value names the connector
    pub label: String,
    /// Connector used when the label is absent
    pub fallback: String,
}

/// Everything the handlers share. Built once at startup, read-only after.
pub struct RelayState {
    connectors: IndexMap<String, Connector>,
    dynamic: DeliveryService,
    label_routing: Option<LabelRouting>,
    request_timeout: Option<Duration>,
}

impl RelayState {
    /// `dynamic` relays requests whose destination comes from the request.
    pub fn new(dynamic: DeliveryService) -> Self {
        Self {
            connectors: IndexMap::new(),
            dynamic,
            label_routing: None,
            request_timeout: None,
        }
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connectors
            .insert(connector.request_path.as_str().to_string(), connector);
        self
    }

    pub fn with_label_routing(mut self, routing: Option<LabelRouting>) -> Self {
        self.label_routing = routing;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn connector(&self, request_path: &str) -> Option<&Connector> {
        self.connectors.get(request_path)
    }

    /// Looks a connector up by name, with or without the leading slash.
    pub fn connector_named(&self, name: &str) -> Option<&Connector> {
        let path = RequestPath::new(name).ok()?;
        self.connectors.get(path.as_str())
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn dynamic_service(&self) -> &DeliveryService {
        &self.dynamic
    }

    pub fn label_routing(&self) -> Option<&LabelRouting> {
        self.label_routing.as_ref()
    }

    /// Name of the connector `message` should go to under label routing.
    pub fn connector_for(&self, message: &WebhookMessage) -> Option<String> {
        let routing = self.label_routing.as_ref()?;
        match message.common_label(&routing.label) {
            Some(name) => Some(name.to_string()),
            None => {
                log::debug!(
                    "No '{}' label on alert group, using fallback connector '{}'",
                    routing.label,
                    routing.fallback
                );
                Some(routing.fallback.clone())
            }
        }
    }

    /// A token for one request, cancelled when the request deadline passes.
    ///
    /// The caller must cancel the token when the request ends so the
    /// deadline watchdog exits.
    pub(crate) fn request_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(deadline) = self.request_timeout {
            let watchdog = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        log::warn!("Request deadline of {:?} passed, cancelling delivery", deadline);
                        watchdog.cancel();
                    }
                    _ = watchdog.cancelled() => {}
                }
            });
        }
        token
    }
}

/// Builds the router for `state`.
pub fn router(state: Arc<RelayState>) -> Router {
    let mut router = Router::new()
        .route(CONFIG_ROUTE, get(handlers::show_config))
        .route(DYNAMIC_WEBHOOK_PREFIX, post(handlers::relay_dynamic))
        .route(
            &format!("{}/*webhook", DYNAMIC_WEBHOOK_PREFIX),
            post(handlers::relay_dynamic),
        );

    if state.label_routing().is_some() {
        router = router.route(BY_LABEL_ROUTE, post(handlers::relay_by_label));
    }

    for connector in state.connectors() {
        log::debug!(
            "Adding request path {} -> {} (template {})",
            connector.request_path,
            connector.webhook_url,
            connector.template_file.display()
        );
        router = router.route(connector.request_path.as_str(), post(handlers::relay_connector));
    }

    router
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: Arc<RelayState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
