// src/card/template.rs
//! Renders a notification into a card with a Handlebars template.
//!
//! The template writes JSON text. Every `{{value}}` is escaped as the body of
//! a JSON string, so label values containing quotes, backslashes or newlines
//! cannot break the card. Use `{{{toJson value}}}` to embed a whole value.

use crate::constants::CARD_TEMPLATE_NAME;
use crate::error::{ConfigError, RenderError};
use crate::model::{RenderedDocument, WebhookMessage};
use crate::pipeline::CardRenderer;
use handlebars::{handlebars_helper, Handlebars};
use std::path::{Path, PathBuf};
use std::time::Instant;

handlebars_helper!(to_json: |value: Json| serde_json::to_string(value).unwrap_or_default());

/// A card renderer backed by one Handlebars template.
pub struct TemplatedCard {
    registry: Handlebars<'static>,
    source: PathBuf,
    escape_underscores: bool,
}

impl TemplatedCard {
    /// Loads and registers the template at `path`.
    pub fn from_file(path: impl AsRef<Path>, escape_underscores: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_template_str(&template, path, escape_underscores)
    }

    /// Registers template text; `origin` names it in errors and logs.
    pub fn from_template_str(
        template: &str,
        origin: impl Into<PathBuf>,
        escape_underscores: bool,
    ) -> Result<Self, ConfigError> {
        let source = origin.into();
        let mut registry = Handlebars::new();
        registry.register_escape_fn(escape_json_string);
        registry.register_helper("toJson", Box::new(to_json));
        registry
            .register_template_string(CARD_TEMPLATE_NAME, template)
            .map_err(|e| ConfigError::TemplateInvalid {
                path: source.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            registry,
            source,
            escape_underscores,
        })
    }

    fn execute_template(&self, message: &WebhookMessage) -> Result<String, RenderError> {
        let escaped;
        let message = if self.escape_underscores {
            escaped = message.with_escaped_underscores();
            &escaped
        } else {
            message
        };

        let mut data = serde_json::to_value(message).map_err(|e| RenderError::Template {
            name: self.source.display().to_string(),
            message: e.to_string(),
        })?;
        data["firingCount"] = serde_json::json!(message.firing_count());

        self.registry
            .render(CARD_TEMPLATE_NAME, &data)
            .map_err(|e| RenderError::Template {
                name: self.source.display().to_string(),
                message: e.to_string(),
            })
    }
}

impl CardRenderer for TemplatedCard {
    fn render(&self, message: &WebhookMessage) -> Result<RenderedDocument, RenderError> {
        let started = Instant::now();
        let text = self.execute_template(message)?;
        log::debug!("Alert rendered with {}: {}", self.source.display(), text);

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| RenderError::MalformedCard { source })?;
        let card = RenderedDocument::from_value(value)?;

        log::info!(
            "Rendered card for receiver '{}': {} alerts, {} sections, {} bytes template output in {:?}",
            message.receiver,
            message.alerts.len(),
            card.section_count(),
            text.len(),
            started.elapsed()
        );

        Ok(card)
    }
}

/// Escapes text for the inside of a JSON string literal.
fn escape_json_string(raw: &str) -> String {
    serde_json::to_string(raw)
        .map(|quoted| quoted[1..quoted.len() - 1].to_string())
        .unwrap_or_default()
}
