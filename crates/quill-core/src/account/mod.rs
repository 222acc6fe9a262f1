//! Account domain: accounts and the viewer's relationship to them.

mod model;
mod relationship;

pub use model::Account;
pub use relationship::Relationship;
