//! Cooperative cancellation for long traversals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::FetchError;

/// A cloneable cancellation token.
///
/// Traversals call [`check`](Self::check) between nodes; any clone can
/// [`trigger`](Self::trigger) it from another thread.
///
/// # Example
///
/// ```rust
/// use inputfs::{FetchError, Interrupt};
///
/// let token = Interrupt::new();
/// let remote = token.clone();
/// assert!(token.check().is_ok());
/// remote.trigger();
/// assert!(matches!(token.check(), Err(FetchError::Interrupted)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Create a token that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that traversals holding this token stop.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`trigger`](Self::trigger) was called on any clone.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fail with [`FetchError::Interrupted`] if triggered.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_triggered() {
            return Err(FetchError::Interrupted);
        }
        Ok(())
    }
}
