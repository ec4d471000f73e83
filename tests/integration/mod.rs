// tests/integration/mod.rs
//! Integration tests for alert2teams
//!
//! Integration tests verify that multiple components work together correctly:
//! the default template against real Alertmanager payloads, the splitter's
//! ordering and size guarantees, and the full HTTP relay path.

#[cfg(test)]
mod card_splitting;

#[cfg(test)]
mod default_template;

#[cfg(test)]
mod relay_end_to_end;

use alert2teams::WebhookMessage;
use std::path::PathBuf;

/// Path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Path of the default card template shipped with the crate.
pub fn default_template_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("templates")
        .join("default-message-card.hbs")
}

/// The Alertmanager payload with twelve firing alerts.
pub fn twelve_alerts() -> WebhookMessage {
    let text = std::fs::read_to_string(fixture_path("prom_post_request.json"))
        .expect("fixture should be readable");
    serde_json::from_str(&text).expect("fixture should decode")
}
