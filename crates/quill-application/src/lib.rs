//! Application layer for Quill.
//!
//! The entity store and the hooks that sit between the REST API and UI
//! consumers: fetch-or-read with request de-duplication, write-through
//! mutations, and composition of independently cached entities.

pub mod accounts;
pub mod groups;
pub mod hooks;
pub mod scope;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use hooks::{EntityActions, EntityFetcher, EntityQuery, EntityState, Endpoints, FetchStatus, UseEntity};
pub use scope::Scope;
pub use session::{Session, SessionConfig};
pub use store::{EntityStore, EntitySubscription, StoreConfig};
