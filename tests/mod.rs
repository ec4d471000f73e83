// tests/mod.rs
//! Test suite organization for alert2teams
//!
//! Unit tests live beside the code they cover. The tests here drive the
//! public API end to end: rendering real payloads, splitting, and relaying
//! through the HTTP server to a local destination.

#[cfg(test)]
pub mod integration;
