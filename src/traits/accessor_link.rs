//! Symlink operations for input accessors.

use crate::{CanonPath, FetchError};

/// Symlink operations for an input accessor.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn AccessorLink`.
pub trait AccessorLink: Send + Sync {
    /// Read the target of a symbolic link.
    ///
    /// Returns the raw link text; it is not resolved or canonicalized.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] if `path` does not exist
    /// - [`FetchError::WrongType`] if `path` is not a symlink
    /// - [`FetchError::PermissionDenied`] if a sandbox refuses the path
    fn read_link(&self, path: &CanonPath) -> Result<String, FetchError>;
}
