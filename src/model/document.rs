// src/model/document.rs
//! In-memory form of a rendered card, before and after splitting.
//!
//! A card is a set of top-level fields (title, theme colour, summary, ...)
//! plus the ordered `sections` array. Only `sections` is ever partitioned;
//! every other field is copied verbatim into each fragment.

use crate::constants::SECTIONS_KEY;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// One opaque section. Never inspected, never split internally.
pub type Section = Value;

/// Why a JSON value could not be read as a card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("card must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("card field `sections` must be an array, found {0}")]
    SectionsNotAnArray(&'static str),
}

/// A rendered card: ordered top-level fields plus ordered sections.
///
/// Serializes as a single JSON object with the top-level fields in their
/// original order followed by `"sections": [...]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedDocument {
    fields: IndexMap<String, Value>,
    sections: Vec<Section>,
}

impl RenderedDocument {
    /// Builds a document. A `sections` entry in `fields` is discarded.
    pub fn new(mut fields: IndexMap<String, Value>, sections: Vec<Section>) -> Self {
        fields.shift_remove(SECTIONS_KEY);
        Self { fields, sections }
    }

    /// Reads a card from a parsed JSON value.
    ///
    /// An absent or `null` `sections` field yields an empty section list.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(map) = value else {
            return Err(DocumentError::NotAnObject(json_kind(&value)));
        };

        let mut fields: IndexMap<String, Value> = map.into_iter().collect();
        let sections = match fields.shift_remove(SECTIONS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(sections)) => sections,
            Some(other) => return Err(DocumentError::SectionsNotAnArray(json_kind(&other))),
        };

        Ok(Self { fields, sections })
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// A copy of this document's top-level fields with different sections.
    pub fn with_sections(&self, sections: Vec<Section>) -> Self {
        Self {
            fields: self.fields.clone(),
            sections,
        }
    }

    /// Compact JSON encoding, the form posted to the destination.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Size of the compact JSON encoding, in bytes.
    pub fn serialized_len(&self) -> Result<usize, serde_json::Error> {
        Ok(self.to_json_bytes()?.len())
    }
}

impl Serialize for RenderedDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(SECTIONS_KEY, &self.sections)?;
        map.end()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
