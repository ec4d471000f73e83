// src/types/domain_types.rs
//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Shape of an Office 365 incoming webhook, legacy and current hosts.
static TEAMS_INCOMING_WEBHOOK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https://[A-Za-z0-9.-]*\.?(webhook\.office\.com|outlook\.office\.com)/webhook(b2)?/[^/\s]+/IncomingWebhook/[^/\s]+/[^/\s]+(/[^/\s]+)?$",
    )
    .expect("Teams webhook pattern should compile")
});

/// Destination webhook a card is posted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebhookUrl(Url);

impl Serialize for WebhookUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WebhookUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        WebhookUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl WebhookUrl {
    /// Parses an absolute HTTP or HTTPS URL.
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyField("webhook_url"));
        }
        match Url::parse(url) {
            Ok(parsed_url) => {
                if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
                    return Err(ValidationError::InvalidUrl {
                        url: redact(url),
                        reason: "Only HTTP and HTTPS URLs are supported".to_string(),
                    });
                }
                Ok(Self(parsed_url))
            }
            Err(e) => Err(ValidationError::InvalidUrl {
                url: redact(url),
                reason: e.to_string(),
            }),
        }
    }

    /// Parses a URL that must look like a Teams incoming webhook.
    ///
    /// Used for destinations supplied by the caller at request time, where
    /// the relay must not become an open proxy to arbitrary hosts.
    pub fn parse_teams_incoming(url: &str) -> Result<Self, ValidationError> {
        if !TEAMS_INCOMING_WEBHOOK.is_match(url) {
            return Err(ValidationError::InvalidUrl {
                url: redact(url),
                reason: "not a Microsoft Teams incoming webhook".to_string(),
            });
        }
        Self::parse(url)
    }

    /// The full URL, secret path included.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

/// Shows only scheme, host and port. The path of an incoming webhook is its
/// credential, so logs and error messages never carry it.
impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.0.scheme(), self.0.host_str().unwrap_or_default())?;
        if let Some(port) = self.0.port() {
            write!(f, ":{}", port)?;
        }
        write!(f, "/...")
    }
}

/// Redacted form of a URL that may not even parse.
fn redact(url: &str) -> String {
    match url.trim().split_once("://") {
        Some((scheme, rest)) => {
            let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
            // drop userinfo
            let host = authority.rsplit('@').next().unwrap_or_default();
            format!("{}://{}/...", scheme, host)
        }
        None => "<not a URL>".to_string(),
    }
}

/// Inbound route a connector listens on. Always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestPath(String);

impl RequestPath {
    /// Normalizes `alertmanager` and `/alertmanager` to the same path.
    pub fn new(path: impl Into<String>) -> Result<Self, ValidationError> {
        let path = path.into();
        let trimmed = path.trim();

        if trimmed.is_empty() || trimmed == "/" {
            return Err(ValidationError::EmptyField("request_path"));
        }

        if trimmed.chars().any(|c| c.is_whitespace() || c == '*' || c == ':' || c == '{') {
            return Err(ValidationError::InvalidRequestPath {
                path: path.clone(),
                reason: "must not contain whitespace, wildcards or captures".to_string(),
            });
        }

        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
