//! Polymorphic payload decoding
//!
//! Event payloads and the validation issues nested in them are closed families
//! selected by a discriminator field. Decoding peeks at that field first, then
//! deserializes the whole payload into the shape the discriminator names.

use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

pub mod event;
pub mod guid;
pub mod validation;

pub use event::{decode_event, EventPayload, ValidationPayload};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Missing discriminator field '{0}'")]
    MissingDiscriminator(&'static str),

    #[error("No {kind} is implemented for discriminator {value}")]
    Unimplemented { kind: &'static str, value: String },

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl DecodeError {
    /// The payload itself is at fault, as opposed to an unimplemented variant
    pub fn is_malformed(&self) -> bool {
        !matches!(self, DecodeError::Unimplemented { .. })
    }
}

/// Finds a field by case-insensitive name
pub fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Reads a discriminator given as an integer or as a variant name
pub fn peek_discriminator<T: FromStr>(
    object: &Map<String, Value>,
    name: &'static str,
    kind: &'static str,
) -> Result<T, DecodeError> {
    let raw = match field(object, name) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(DecodeError::MissingDiscriminator(name)),
    };

    raw.parse()
        .map_err(|_| DecodeError::Unimplemented { kind, value: raw })
}
