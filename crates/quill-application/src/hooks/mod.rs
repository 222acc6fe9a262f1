//! Generic hooks over the entity store.

mod actions;
mod entity;

pub use actions::{EntityActions, Endpoints};
pub use entity::{EntityFetcher, EntityQuery, EntityState, FetchStatus, UseEntity};
