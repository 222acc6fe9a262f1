//! Consumer lifetimes.
//!
//! A [`Scope`] stands for a mounted UI component. Hooks created inside a
//! scope stop delivering state once it is cancelled, while any request
//! they started keeps running and still writes to the store.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A nested scope, cancelled together with its parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Unmounts the consumer.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_follows_parent() {
        let parent = Scope::new();
        let child = parent.child();

        parent.cancel();

        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = Scope::new();
        let child = parent.child();

        child.cancel();

        assert!(!parent.is_cancelled());
    }
}
