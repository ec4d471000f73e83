// src/model/mod.rs
//! Data types that flow through the relay: the inbound alert notification,
//! the rendered card, and the per-fragment delivery outcome.

pub mod alert;
pub mod document;
pub mod outcome;

pub use alert::{Alert, Kv, WebhookMessage};
pub use document::{DocumentError, RenderedDocument, Section};
pub use outcome::DeliveryOutcome;
