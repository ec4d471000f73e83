// src/delivery/mod.rs
//! Delivery of rendered cards: the HTTP transport, its retry wrapper, and
//! the service that drives a notification through render, split and send.

pub mod client;
pub mod retry;
pub mod service;

pub use client::{HttpCardSender, PoolConfig};
pub use retry::{RetryPolicy, RetryingSender};
pub use service::DeliveryService;
