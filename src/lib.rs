// src/lib.rs
//! alert2teams library: relays Alertmanager notifications to Microsoft Teams
//! incoming webhooks, splitting cards that exceed the Teams size limits.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `RelayError`, `RenderError`, `SplitError`, `TransportError`
//! - **Configuration**: `CommandLineInput`, `RelayConfig`, `ConnectorsFile`
//! - **Domain model**: `WebhookMessage`, `Alert`, `RenderedDocument`, `DeliveryOutcome`
//! - **Domain types**: `WebhookUrl`, `RequestPath`
//! - **Card production**: `TemplatedCard`, `split_card`, `CardLimits`
//! - **Delivery**: `DeliveryService`, `HttpCardSender`, `RetryingSender`
//! - **Server**: `RelayState`, `router`, `serve`

pub mod card;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod types;

// --- Error Handling ---
pub use crate::error::{
    AppError, ConfigError, RelayError, RelayStage, RenderError, RequestError, SplitError,
    TransportError,
};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ConnectorConfig, ConnectorsFile, RelayConfig};

// --- Domain Model ---
pub use crate::model::{Alert, DeliveryOutcome, Kv, RenderedDocument, Section, WebhookMessage};

// --- Domain Types ---
pub use crate::types::{RequestPath, WebhookUrl};

// --- Card Production ---
pub use crate::card::{split_card, CardLimits, TemplatedCard};

// --- Delivery ---
pub use crate::delivery::{DeliveryService, HttpCardSender, PoolConfig, RetryPolicy, RetryingSender};

// --- Pipeline Traits ---
pub use crate::pipeline::{CardRenderer, CardSender, CardSplitter, SendResponse};

// --- Server ---
pub use crate::server::{router, serve, Connector, LabelRouting, RelayState};
