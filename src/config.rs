// src/config.rs
//! Command line, environment and connectors-file configuration.
//!
//! Everything is resolved and validated once at startup into a `RelayConfig`;
//! nothing is re-read while serving.

use crate::card::TemplatedCard;
use crate::constants::{
    BY_LABEL_ROUTE, CONFIG_ROUTE, DEFAULT_HTTP_ADDR, DEFAULT_TEMPLATE_FILE, DYNAMIC_WEBHOOK_PREFIX,
};
use crate::delivery::{DeliveryService, PoolConfig, RetryPolicy};
use crate::error::ConfigError;
use crate::pipeline::{CardRenderer, CardSender};
use crate::server::{Connector, LabelRouting, RelayState};
use crate::types::{RequestPath, WebhookUrl};
use clap::Parser;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Parsed command-line input. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Address the webhook server listens on
    #[arg(long, env = "HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Request path of the connector given on the command line (e.g. "alertmanager")
    #[arg(long, env = "TEAMS_REQUEST_URI")]
    pub teams_request_uri: Option<String>,

    /// Teams incoming webhook the command-line connector posts to
    #[arg(long, env = "TEAMS_INCOMING_WEBHOOK_URL")]
    pub teams_incoming_webhook_url: Option<String>,

    /// Card template used by connectors without a custom template
    #[arg(long, env = "TEMPLATE_FILE", default_value = DEFAULT_TEMPLATE_FILE)]
    pub template_file: PathBuf,

    /// Escape underscores in label and annotation values for the default template
    #[arg(long, env = "AUTO_ESCAPE_UNDERSCORES", default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_escape_underscores: bool,

    /// YAML file listing connectors
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// How long an idle outbound connection is kept
    #[arg(long, env = "IDLE_CONN_TIMEOUT", default_value = "90s", value_parser = humantime::parse_duration)]
    pub idle_conn_timeout: Duration,

    /// Time allowed to connect to a destination, TLS handshake included
    #[arg(long, env = "TLS_HANDSHAKE_TIMEOUT", default_value = "30s", value_parser = humantime::parse_duration)]
    pub tls_handshake_timeout: Duration,

    /// Maximum idle outbound connections kept per destination host
    #[arg(long, env = "MAX_IDLE_CONNS", default_value_t = 100)]
    pub max_idle_conns: usize,

    /// Extra attempts for a delivery that failed transiently
    #[arg(long, env = "MAX_RETRY_COUNT", default_value_t = 3)]
    pub max_retry_count: u32,

    /// Deadline for relaying one inbound request ("0s" disables it)
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "60s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// Common label whose value names the connector for /_by-label (e.g. "msteams_connector")
    #[arg(long, env = "CONNECTOR_LABEL")]
    pub connector_label: Option<String>,

    /// Connector used by /_by-label when the label is missing
    #[arg(long, env = "FALLBACK_CONNECTOR")]
    pub fallback_connector: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, env = "DEBUG", default_value_t = false)]
    pub debug: bool,

    /// Also write debug-level logs to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// The YAML connectors file.
///
/// ```yaml
/// connectors:
///   - alertmanager: https://outlook.office.com/webhook/...
/// connectors_with_custom_templates:
///   - request_path: /alert2
///     template_file: ./templates/custom.hbs
///     webhook_url: https://outlook.office.com/webhook/...
///     escape_underscores: true
/// label: msteams_connector
/// fallback: alertmanager
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorsFile {
    pub connectors: Vec<IndexMap<String, String>>,
    pub connectors_with_custom_templates: Vec<TemplatedConnectorEntry>,
    pub label: Option<String>,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplatedConnectorEntry {
    pub request_path: String,
    pub template_file: Option<PathBuf>,
    pub webhook_url: String,
    pub escape_underscores: bool,
}

impl ConnectorsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigError::ConfigFileInvalid {
            path: origin.to_path_buf(),
            source: e,
        })
    }
}

/// One validated connector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorConfig {
    pub request_path: RequestPath,
    pub webhook_url: WebhookUrl,
    /// `None` uses the default template.
    pub template_file: Option<PathBuf>,
    pub escape_underscores: bool,
}

/// Resolved relay configuration, validated and ready to serve.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub http_addr: String,
    pub default_template: PathBuf,
    pub escape_underscores: bool,
    pub connectors: Vec<ConnectorConfig>,
    pub label_routing: Option<LabelRouting>,
    pub pool: PoolConfig,
    pub retry: RetryPolicy,
    pub request_timeout: Option<Duration>,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

impl RelayConfig {
    /// Resolves the configuration from the command line and the connectors file it names.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, ConfigError> {
        let file = match &cli.config_file {
            Some(path) => ConnectorsFile::load(path)?,
            None => ConnectorsFile::default(),
        };
        Self::from_parts(cli, file)
    }

    /// Combines command-line input with an already parsed connectors file.
    pub fn from_parts(cli: CommandLineInput, file: ConnectorsFile) -> Result<Self, ConfigError> {
        let mut connectors = Vec::new();

        if let (Some(path), Some(url)) = (&cli.teams_request_uri, &cli.teams_incoming_webhook_url) {
            if !path.trim().is_empty() && !url.trim().is_empty() {
                connectors.push(ConnectorConfig {
                    request_path: RequestPath::new(path.as_str())?,
                    webhook_url: WebhookUrl::parse(url)?,
                    template_file: None,
                    escape_underscores: cli.auto_escape_underscores,
                });
            }
        }

        for entry in &file.connectors {
            for (path, url) in entry {
                connectors.push(ConnectorConfig {
                    request_path: RequestPath::new(path.as_str())?,
                    webhook_url: WebhookUrl::parse(url)?,
                    template_file: None,
                    escape_underscores: cli.auto_escape_underscores,
                });
            }
        }

        for entry in &file.connectors_with_custom_templates {
            connectors.push(templated_connector(entry)?);
        }

        check_request_paths(&connectors)?;

        let label = cli.connector_label.clone().or(file.label);
        let fallback = cli.fallback_connector.clone().or(file.fallback);
        let label_routing = match (label, fallback) {
            (Some(label), Some(fallback)) if !label.is_empty() && !fallback.is_empty() => {
                let fallback_path = RequestPath::new(fallback.as_str())
                    .map_err(|_| ConfigError::UnknownFallbackConnector(fallback.clone()))?;
                if !connectors.iter().any(|c| c.request_path == fallback_path) {
                    return Err(ConfigError::UnknownFallbackConnector(fallback));
                }
                Some(LabelRouting { label, fallback })
            }
            _ => None,
        };

        let request_timeout = Some(cli.request_timeout).filter(|d| !d.is_zero());

        Ok(RelayConfig {
            http_addr: cli.http_addr,
            default_template: cli.template_file,
            escape_underscores: cli.auto_escape_underscores,
            connectors,
            label_routing,
            pool: PoolConfig {
                max_idle_per_host: cli.max_idle_conns,
                idle_timeout: cli.idle_conn_timeout,
                connect_timeout: cli.tls_handshake_timeout,
            },
            retry: RetryPolicy::new(cli.max_retry_count),
            request_timeout,
            debug: cli.debug,
            log_file: cli.log_file,
        })
    }

    /// Loads every template and wires each connector to a delivery service.
    ///
    /// Connectors without a custom template share one default renderer,
    /// which also serves the dynamic webhook route.
    pub fn build_state(&self, sender: Arc<dyn CardSender>) -> Result<RelayState, ConfigError> {
        let default_renderer: Arc<dyn CardRenderer> = Arc::new(TemplatedCard::from_file(
            &self.default_template,
            self.escape_underscores,
        )?);
        log::info!("Loaded default template {}", self.default_template.display());

        let mut state = RelayState::new(DeliveryService::new(default_renderer.clone(), sender.clone()))
            .with_label_routing(self.label_routing.clone())
            .with_request_timeout(self.request_timeout);

        for connector in &self.connectors {
            let (renderer, template_file) = match &connector.template_file {
                Some(path) => {
                    let renderer: Arc<dyn CardRenderer> =
                        Arc::new(TemplatedCard::from_file(path, connector.escape_underscores)?);
                    (renderer, path.clone())
                }
                None => (default_renderer.clone(), self.default_template.clone()),
            };

            log::info!(
                "Connector {} -> {} using template {}",
                connector.request_path,
                connector.webhook_url,
                template_file.display()
            );

            state = state.with_connector(Connector {
                request_path: connector.request_path.clone(),
                webhook_url: connector.webhook_url.clone(),
                template_file,
                service: DeliveryService::new(renderer, sender.clone()),
            });
        }

        if let Some(routing) = &self.label_routing {
            log::info!(
                "Using the alert label '{}' for connector selection, '{}' when it is missing",
                routing.label,
                routing.fallback
            );
        }

        Ok(state)
    }
}

fn templated_connector(entry: &TemplatedConnectorEntry) -> Result<ConnectorConfig, ConfigError> {
    if entry.request_path.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "request_path",
            request_path: String::new(),
        });
    }
    if entry.webhook_url.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "webhook_url",
            request_path: entry.request_path.clone(),
        });
    }
    let template_file = entry
        .template_file
        .clone()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: "template_file",
            request_path: entry.request_path.clone(),
        })?;

    Ok(ConnectorConfig {
        request_path: RequestPath::new(entry.request_path.as_str())?,
        webhook_url: WebhookUrl::parse(&entry.webhook_url)?,
        template_file: Some(template_file),
        escape_underscores: entry.escape_underscores,
    })
}

fn check_request_paths(connectors: &[ConnectorConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for connector in connectors {
        let path = connector.request_path.as_str();
        if is_reserved(path) {
            return Err(ConfigError::ReservedRequestPath(path.to_string()));
        }
        if !seen.insert(path) {
            return Err(ConfigError::DuplicateRequestPath(path.to_string()));
        }
    }
    Ok(())
}

fn is_reserved(path: &str) -> bool {
    path == CONFIG_ROUTE
        || path == BY_LABEL_ROUTE
        || path == DYNAMIC_WEBHOOK_PREFIX
        || path.starts_with(&format!("{}/", DYNAMIC_WEBHOOK_PREFIX))
}
