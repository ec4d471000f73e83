// tests/integration/default_template.rs
//! The shipped default template against realistic Alertmanager payloads.

use super::{default_template_path, twelve_alerts};
use alert2teams::{split_card, Alert, CardLimits, CardRenderer, TemplatedCard, WebhookMessage};
use pretty_assertions::assert_eq;
use serde_json::json;

fn renderer(escape_underscores: bool) -> TemplatedCard {
    TemplatedCard::from_file(default_template_path(), escape_underscores)
        .expect("default template should load")
}

fn disk_full() -> WebhookMessage {
    WebhookMessage {
        status: "firing".to_string(),
        receiver: "teams".to_string(),
        common_labels: [
            ("alertname".to_string(), "DiskFull".to_string()),
            ("severity".to_string(), "critical".to_string()),
        ]
        .into(),
        common_annotations: [("summary".to_string(), "Disk is full".to_string())].into(),
        external_url: "http://alertmanager:9093".to_string(),
        alerts: vec![Alert {
            status: "firing".to_string(),
            labels: [
                ("alertname".to_string(), "DiskFull".to_string()),
                ("instance".to_string(), "node_1".to_string()),
            ]
            .into(),
            annotations: [("description".to_string(), "Root at 99%".to_string())].into(),
            ..Alert::default()
        }],
        ..WebhookMessage::default()
    }
}

#[test]
fn renders_message_card_snapshot() {
    let card = renderer(true).render(&disk_full()).unwrap();

    insta::assert_json_snapshot!(card, @r###"
    {
      "@type": "MessageCard",
      "@context": "http://schema.org/extensions",
      "themeColor": "8C1A1A",
      "summary": "Disk is full",
      "title": "Prometheus Alert (firing)",
      "sections": [
        {
          "activityTitle": "[Root at 99%](http://alertmanager:9093)",
          "facts": [
            {
              "name": "status",
              "value": "firing"
            },
            {
              "name": "alertname",
              "value": "DiskFull"
            },
            {
              "name": "instance",
              "value": "node\\_1"
            },
            {
              "name": "description",
              "value": "Root at 99%"
            }
          ],
          "markdown": true
        }
      ]
    }
    "###);
}

#[test]
fn one_section_per_alert_in_order() {
    let message = twelve_alerts();
    let card = renderer(false).render(&message).unwrap();

    assert_eq!(card.section_count(), 12);
    assert_eq!(card.fields()["summary"], json!("High CPU usage"));
    assert_eq!(card.fields()["themeColor"], json!("FFA500"));
    for (i, section) in card.sections().iter().enumerate() {
        let instance = format!("node_{:02}.prod:9100", i + 1);
        assert!(section["facts"]
            .as_array()
            .unwrap()
            .contains(&json!({"name": "instance", "value": instance})));
    }
}

#[test]
fn twelve_alerts_split_by_section_count() {
    let card = renderer(true).render(&twelve_alerts()).unwrap();
    let fragments = split_card(&card, CardLimits::TEAMS).unwrap();

    let counts: Vec<usize> = fragments.iter().map(|f| f.section_count()).collect();
    assert_eq!(counts, vec![10, 2]);
    for fragment in &fragments {
        assert!(fragment.serialized_len().unwrap() <= CardLimits::TEAMS.max_bytes);
        assert_eq!(fragment.fields(), card.fields());
    }
}

#[test]
fn resolved_group_is_green() {
    let mut message = disk_full();
    message.status = "resolved".to_string();
    message.alerts[0].status = "resolved".to_string();

    let card = renderer(true).render(&message).unwrap();
    assert_eq!(card.fields()["themeColor"], json!("2DC72D"));
    assert_eq!(card.fields()["title"], json!("Prometheus Alert (resolved)"));
}

#[test]
fn alert_without_annotations_uses_alertname() {
    let mut message = disk_full();
    message.alerts[0].annotations.clear();
    message.common_annotations.clear();

    let card = renderer(false).render(&message).unwrap();
    assert_eq!(card.fields()["summary"], json!("DiskFull"));
    assert_eq!(
        card.sections()[0]["activityTitle"],
        json!("[DiskFull](http://alertmanager:9093)")
    );
    assert_eq!(card.sections()[0]["facts"].as_array().unwrap().len(), 3);
}

#[test]
fn hostile_label_values_stay_valid_json() {
    let mut message = disk_full();
    message.alerts[0].labels.insert(
        "query".to_string(),
        "rate(x{job=\"api\"}[5m]) > 0\n\\ done".to_string(),
    );

    let card = renderer(false).render(&message).unwrap();
    assert!(card.sections()[0]["facts"]
        .as_array()
        .unwrap()
        .contains(&json!({"name": "query", "value": "rate(x{job=\"api\"}[5m]) > 0\n\\ done"})));
}

#[test]
fn empty_group_renders_no_sections() {
    let mut message = disk_full();
    message.alerts.clear();

    let card = renderer(true).render(&message).unwrap();
    assert_eq!(card.section_count(), 0);
    assert_eq!(split_card(&card, CardLimits::TEAMS).unwrap().len(), 1);
}
