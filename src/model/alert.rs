// src/model/alert.rs
//! The Alertmanager webhook payload, as posted by a `webhook_config` receiver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label or annotation set. Sorted so templates iterate deterministically.
pub type Kv = BTreeMap<String, String>;

/// One notification event: a group of alerts sharing a receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookMessage {
    pub version: String,
    pub group_key: String,
    pub truncated_alerts: u64,
    pub status: String,
    pub receiver: String,
    pub group_labels: Kv,
    pub common_labels: Kv,
    pub common_annotations: Kv,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub alerts: Vec<Alert>,
}

/// A single alert within a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    pub status: String,
    pub labels: Kv,
    pub annotations: Kv,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

impl WebhookMessage {
    /// Returns a copy whose label and annotation values have `_` escaped as `\_`.
    ///
    /// Teams renders card text as markdown, where a bare underscore starts
    /// italics. Only values are touched; keys and URLs pass through.
    pub fn with_escaped_underscores(&self) -> WebhookMessage {
        let mut escaped = self.clone();
        escape_values(&mut escaped.group_labels);
        escape_values(&mut escaped.common_labels);
        escape_values(&mut escaped.common_annotations);
        for alert in &mut escaped.alerts {
            escape_values(&mut alert.labels);
            escape_values(&mut alert.annotations);
        }
        escaped
    }

    /// Number of alerts currently firing.
    pub fn firing_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.status == "firing").count()
    }

    /// Looks up a common label, used for label-based connector selection.
    pub fn common_label(&self, name: &str) -> Option<&str> {
        self.common_labels.get(name).map(String::as_str)
    }
}

fn escape_values(kv: &mut Kv) {
    for value in kv.values_mut() {
        if value.contains('_') {
            *value = value.replace('_', "\\_");
        }
    }
}
