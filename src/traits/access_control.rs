//! Allowlist management for sandboxed accessors.

use crate::{CanonPath, FetchError};

/// Allowlist management for sandboxed accessors.
///
/// An accessor without an allowlist is unrestricted: every path inside its
/// root is permitted and [`allow_path`](Self::allow_path) does nothing.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. [`allow_path`](Self::allow_path)
/// takes `&self`; implementations synchronize the allowlist internally so it
/// can be called while other threads read through the same accessor.
pub trait AccessControl: Send + Sync {
    /// Fail if the sandbox refuses `path`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::PermissionDenied`] if `path` is outside the root or not allowed
    fn check_allowed(&self, path: &CanonPath) -> Result<(), FetchError>;

    /// Permit `path` (and thereby its ancestors and descendants).
    ///
    /// Monotonic: the allowlist only grows. No-op when unrestricted.
    fn allow_path(&self, path: CanonPath);

    /// Returns `true` iff an allowlist is configured.
    fn has_access_control(&self) -> bool;
}
