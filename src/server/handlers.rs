// src/server/handlers.rs
//! Route handlers: decode the notification, pick a destination, relay.

use super::RelayState;
use crate::constants::WEBHOOK_AUTH_SCHEME;
use crate::delivery::DeliveryService;
use crate::error::RequestError;
use crate::model::{DeliveryOutcome, WebhookMessage};
use crate::types::WebhookUrl;
use axum::body::Bytes;
use axum::extract::{MatchedPath, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use indexmap::IndexMap;
use std::sync::Arc;

type RelayResponse = Result<Json<Vec<DeliveryOutcome>>, RequestError>;

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        log::error!("{}", self);
        let status = match &self {
            RequestError::UnknownConnector(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// `POST <request_path>` of a configured connector.
pub async fn relay_connector(
    State(state): State<Arc<RelayState>>,
    matched: MatchedPath,
    body: Bytes,
) -> RelayResponse {
    let connector = state
        .connector(matched.as_str())
        .ok_or_else(|| RequestError::UnknownConnector(matched.as_str().to_string()))?;
    let message = decode(&body)?;

    relay(&state, &connector.service, &message, &connector.webhook_url).await
}

/// `POST /_dynamicwebhook/<host/path>`, or with an `Authorization: webhook <url>` header.
pub async fn relay_dynamic(
    State(state): State<Arc<RelayState>>,
    webhook: Option<Path<String>>,
    headers: HeaderMap,
    body: Bytes,
) -> RelayResponse {
    let destination = dynamic_destination(webhook.as_deref().map(String::as_str), &headers)?;
    let message = decode(&body)?;

    relay(&state, state.dynamic_service(), &message, &destination).await
}

/// `POST /_by-label`: the connector is named by a common label of the alert group.
pub async fn relay_by_label(State(state): State<Arc<RelayState>>, body: Bytes) -> RelayResponse {
    let message = decode(&body)?;
    let name = state.connector_for(&message).ok_or(RequestError::MissingDestination)?;
    log::debug!("Routing by label to connector '{}'", name);

    let connector = state
        .connector_named(&name)
        .ok_or_else(|| RequestError::UnknownConnector(name.clone()))?;

    relay(&state, &connector.service, &message, &connector.webhook_url).await
}

/// `GET /config`: every connector as a `{request_path: webhook_url}` map.
pub async fn show_config(State(state): State<Arc<RelayState>>) -> Json<Vec<IndexMap<String, String>>> {
    Json(
        state
            .connectors()
            .map(|c| {
                let mut entry = IndexMap::new();
                entry.insert(c.request_path.to_string(), c.webhook_url.as_str().to_string());
                entry
            })
            .collect(),
    )
}

fn decode(body: &[u8]) -> Result<WebhookMessage, RequestError> {
    serde_json::from_slice(body).map_err(RequestError::Decode)
}

/// The header wins over the path. Both must look like a Teams incoming webhook.
fn dynamic_destination(path: Option<&str>, headers: &HeaderMap) -> Result<WebhookUrl, RequestError> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(WEBHOOK_AUTH_SCHEME))
        .map(|(_, url)| url.trim().to_string());

    let candidate = match (from_header, path) {
        (Some(url), _) => url,
        (None, Some(path)) if !path.is_empty() => format!("https://{}", path.trim_start_matches('/')),
        _ => return Err(RequestError::MissingDestination),
    };

    WebhookUrl::parse_teams_incoming(&candidate).map_err(RequestError::Destination)
}

async fn relay(
    state: &RelayState,
    service: &DeliveryService,
    message: &WebhookMessage,
    destination: &WebhookUrl,
) -> RelayResponse {
    let cancel = state.request_token();
    // cancels the deadline watchdog, and any in-flight send if the client goes away
    let _cancel_on_drop = cancel.clone().drop_guard();

    match service.relay(message, destination, &cancel).await {
        Ok(outcomes) => Ok(Json(outcomes)),
        Err(err) if err.attempted_delivery() => {
            log::error!("Relay to {} stopped early: {}", destination, err);
            Ok(Json(err.into_outcomes()))
        }
        Err(err) => Err(err.into()),
    }
}
