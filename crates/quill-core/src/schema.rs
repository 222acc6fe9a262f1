//! Typed parse functions for server payloads.
//!
//! Every cached entity implements [`Schema`]. Parsing returns a tagged
//! result instead of panicking, so fetch code can branch on `Ok`/`Err`
//! and discard malformed payloads before they reach the store.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::entity::{Entity, EntityKind};

/// A payload that failed to match an entity schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} payload: {message}")]
pub struct ValidationError {
    pub kind: EntityKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: EntityKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates raw JSON into an entity.
pub trait Schema: Entity + Sized {
    /// Parses and validates a server payload.
    fn parse(value: &Value) -> Result<Self, ValidationError>;

    /// Parses a payload requested for `id`.
    ///
    /// A payload describing any other entity is rejected, so it can never be
    /// cached under the wrong key.
    fn parse_for(value: &Value, id: &str) -> Result<Self, ValidationError> {
        let entity = Self::parse(value)?;
        require_match(Self::KIND, id, entity.id())?;
        Ok(entity)
    }
}

/// Deserializes `value` with serde, tagging failures with `kind`.
pub fn from_json<T: DeserializeOwned>(kind: EntityKind, value: &Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| ValidationError::new(kind, e.to_string()))
}

/// Rejects blank identifiers.
pub fn require_id(kind: EntityKind, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::new(kind, "id must not be empty"));
    }
    Ok(())
}

/// Rejects an entity whose id differs from the one requested.
pub fn require_match(kind: EntityKind, expected: &str, actual: &str) -> Result<(), ValidationError> {
    if expected != actual {
        return Err(ValidationError::new(
            kind,
            format!("expected id '{expected}', got '{actual}'"),
        ));
    }
    Ok(())
}

/// Picks the entry for `id` out of a `relationships` list.
///
/// A bare object is accepted as-is; a list without a matching entry is a
/// validation failure.
pub fn entry_for<'a>(kind: EntityKind, value: &'a Value, id: &str) -> Result<&'a Value, ValidationError> {
    match value {
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| ValidationError::new(kind, format!("no entry for id '{id}'"))),
        other => Ok(other),
    }
}

/// Unwraps the single-element lists returned by the `relationships` endpoints.
///
/// A bare object is accepted as-is; an empty list is a validation failure.
pub fn first_of_list(kind: EntityKind, value: &Value) -> Result<&Value, ValidationError> {
    match value {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| ValidationError::new(kind, "expected a non-empty list")),
        other => Ok(other),
    }
}
