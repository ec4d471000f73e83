// src/constants.rs
//! Domain constants that define the operational boundaries of the relay.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. The Teams limits are fixed by the platform; the rest are
//! defaults that the command line can override.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Microsoft Teams card boundaries
// ---------------------------------------------------------------------------

/// Largest serialized (compact JSON) card Teams accepts, in bytes.
pub const TEAMS_MAX_CARD_BYTES: usize = 14336;

/// Largest number of `sections` a single Teams message card may carry.
///
/// See the notes on the Office 365 connector card in the Teams card reference.
pub const TEAMS_MAX_CARD_SECTIONS: usize = 10;

/// Key of the distinguished section array within a rendered card.
pub const SECTIONS_KEY: &str = "sections";

// ---------------------------------------------------------------------------
// Template rendering
// ---------------------------------------------------------------------------

/// Name under which the card template is registered with Handlebars.
pub const CARD_TEMPLATE_NAME: &str = "teams.card";

/// Template used when neither the command line nor a connector names one.
pub const DEFAULT_TEMPLATE_FILE: &str = "./templates/default-message-card.hbs";

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

/// Default listen address for the inbound webhook server.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:2000";

/// Route that exposes the configured connectors.
pub const CONFIG_ROUTE: &str = "/config";

/// Route that picks a connector from an alert label.
pub const BY_LABEL_ROUTE: &str = "/_by-label";

/// Prefix of the route whose remaining path is the destination webhook.
pub const DYNAMIC_WEBHOOK_PREFIX: &str = "/_dynamicwebhook";

/// Scheme of an `Authorization` header that carries the destination webhook.
pub const WEBHOOK_AUTH_SCHEME: &str = "webhook";

// ---------------------------------------------------------------------------
// Delivery transport
// ---------------------------------------------------------------------------

/// First pause between delivery retries. Doubles on each further attempt.
pub const RETRY_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound on the pause between delivery retries.
pub const RETRY_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Maximum characters of a destination response body kept in logs.
pub const RESPONSE_PREVIEW_LENGTH: usize = 200;
