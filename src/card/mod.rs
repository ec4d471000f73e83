// src/card/mod.rs
//! Card production: rendering a notification into a card and splitting it
//! into fragments the destination accepts.

pub mod splitter;
pub mod template;

pub use splitter::{split_card, CardLimits};
pub use template::TemplatedCard;
