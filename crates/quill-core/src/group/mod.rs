//! Group domain: groups and the viewer's membership in them.

mod model;
mod relationship;

pub use model::{Group, GroupVisibility};
pub use relationship::{GroupRelationship, GroupRole};
