use thiserror::Error;

mod domain_types;

pub use domain_types::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid request path: {path} - {reason}")]
    InvalidRequestPath { path: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),
}
