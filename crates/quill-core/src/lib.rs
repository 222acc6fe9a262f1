//! Domain layer for Quill.
//!
//! Entities, their schemas, the error taxonomy and the HTTP client port.
//! Nothing here performs I/O.

pub mod account;
pub mod api;
pub mod entity;
pub mod error;
pub mod features;
pub mod federation;
pub mod group;
pub mod schema;

// Re-export common types
pub use api::{ApiClient, Method};
pub use entity::{CacheKey, Entity, EntityKind};
pub use error::{QuillError, Result};
pub use features::Features;
pub use schema::{Schema, ValidationError};
