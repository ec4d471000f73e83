// tests/integration/relay_end_to_end.rs
//! Full relay path over real sockets: inbound server, HTTP transport with
//! retries, and a local stand-in for the Teams incoming webhook.

use super::{default_template_path, fixture_path};
use alert2teams::{
    router, CardSender, CommandLineInput, ConnectorsFile, DeliveryOutcome, HttpCardSender,
    PoolConfig, RelayConfig, RetryPolicy, RetryingSender,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use clap::Parser;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake Teams endpoint received, and how it answers.
#[derive(Default)]
struct Destination {
    cards: Mutex<Vec<Value>>,
    /// Status per request, in order; 200 once exhausted.
    statuses: Mutex<Vec<u16>>,
}

async fn receive_card(State(destination): State<Arc<Destination>>, body: String) -> (StatusCode, String) {
    let card: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    destination.cards.lock().unwrap().push(card);
    let status = {
        let mut statuses = destination.statuses.lock().unwrap();
        if statuses.is_empty() {
            200
        } else {
            statuses.remove(0)
        }
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    let body = if status.is_success() { "1".to_string() } else { format!("rejected with {}", status.as_u16()) };
    (status, body)
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_destination(statuses: Vec<u16>) -> (Arc<Destination>, String) {
    let destination = Arc::new(Destination {
        statuses: Mutex::new(statuses),
        ..Destination::default()
    });
    let app = Router::new()
        .route("/hook", post(receive_card))
        .with_state(destination.clone());
    let base = spawn(app).await;
    (destination, format!("{}/hook", base))
}

/// Starts the relay with one `/alertmanager` connector posting to `webhook_url`.
async fn spawn_relay(webhook_url: &str, max_retries: u32) -> String {
    let template = default_template_path();
    let cli = CommandLineInput::try_parse_from([
        "alert2teams",
        "--teams-request-uri",
        "alertmanager",
        "--teams-incoming-webhook-url",
        webhook_url,
        "--template-file",
        template.to_str().unwrap(),
    ])
    .unwrap();
    let config = RelayConfig::from_parts(cli, ConnectorsFile::default()).unwrap();

    let transport = HttpCardSender::new(&PoolConfig::default()).unwrap();
    let policy = RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    };
    let sender: Arc<dyn CardSender> = Arc::new(RetryingSender::new(transport, policy));
    let state = Arc::new(config.build_state(sender).unwrap());

    spawn(router(state)).await
}

fn fixture_body() -> String {
    std::fs::read_to_string(fixture_path("prom_post_request.json")).unwrap()
}

async fn post_alerts(relay: &str, body: String) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/alertmanager", relay))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn oversized_group_arrives_as_ordered_fragments() {
    let (destination, webhook) = spawn_destination(vec![]).await;
    let relay = spawn_relay(&webhook, 0).await;

    let response = post_alerts(&relay, fixture_body()).await;

    assert_eq!(response.status(), 200);
    let outcomes: Vec<DeliveryOutcome> = response.json().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == Some(200) && o.message == "1"));
    assert!(outcomes.iter().all(|o| o.webhook_url == webhook));

    let cards = destination.cards.lock().unwrap();
    let counts: Vec<usize> = cards
        .iter()
        .map(|c| c["sections"].as_array().unwrap().len())
        .collect();
    assert_eq!(counts, vec![10, 2]);
    assert_eq!(cards[0]["title"], cards[1]["title"]);
    let last_instance = cards[1]["sections"][1]["facts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "instance")
        .map(|f| f["value"].clone())
        .unwrap();
    assert_eq!(last_instance, "node\\_12.prod:9100");
}

#[tokio::test]
async fn rejected_fragment_does_not_stop_the_rest() {
    let (destination, webhook) = spawn_destination(vec![400]).await;
    let relay = spawn_relay(&webhook, 0).await;

    let response = post_alerts(&relay, fixture_body()).await;

    assert_eq!(response.status(), 200);
    let outcomes: Vec<DeliveryOutcome> = response.json().await.unwrap();
    let statuses: Vec<Option<u16>> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(statuses, vec![Some(400), Some(200)]);
    assert_eq!(outcomes[0].message, "rejected with 400");
    assert_eq!(destination.cards.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn transient_errors_are_retried_by_the_transport() {
    let (destination, webhook) = spawn_destination(vec![503, 429]).await;
    let relay = spawn_relay(&webhook, 3).await;

    let response = post_alerts(&relay, fixture_body()).await;

    assert_eq!(response.status(), 200);
    let outcomes: Vec<DeliveryOutcome> = response.json().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == Some(200)));
    // two refusals, then both fragments
    assert_eq!(destination.cards.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn unreachable_destination_reports_the_failed_attempt() {
    // a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let webhook = format!("http://{}/hook", listener.local_addr().unwrap());
    drop(listener);
    let relay = spawn_relay(&webhook, 0).await;

    let response = post_alerts(&relay, fixture_body()).await;

    assert_eq!(response.status(), 200);
    let outcomes: Vec<DeliveryOutcome> = response.json().await.unwrap();
    assert_eq!(outcomes.len(), 1, "delivery must stop at the first transport failure");
    assert_eq!(outcomes[0].status, None);
    assert!(outcomes[0].message.starts_with("http client failed"));
}

#[tokio::test]
async fn malformed_notification_is_a_plain_text_500() {
    let (destination, webhook) = spawn_destination(vec![]).await;
    let relay = spawn_relay(&webhook, 0).await;

    let response = post_alerts(&relay, "{\"alerts\": 5}".to_string()).await;

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(body.starts_with("failed to decode alert notification"));
    assert!(destination.cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn config_route_lists_the_connector() {
    let (_destination, webhook) = spawn_destination(vec![]).await;
    let relay = spawn_relay(&webhook, 0).await;

    let config: Value = reqwest::get(format!("{}/config", relay))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(config, serde_json::json!([{ "/alertmanager": webhook }]));
}
