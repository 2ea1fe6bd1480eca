//! Read operations for input accessors.

use crate::{CanonPath, FetchError, Stat};

/// Read operations for an input accessor.
///
/// All paths are virtual: they are interpreted relative to the accessor's own
/// root, never as host paths.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn AccessorRead`.
pub trait AccessorRead: Send + Sync {
    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] if the path does not exist or is not a regular file
    /// - [`FetchError::PermissionDenied`] if a sandbox refuses the path
    fn read_file(&self, path: &CanonPath) -> Result<Vec<u8>, FetchError>;

    /// Check if a path exists.
    ///
    /// Never fails: anything inaccessible (including sandbox refusals) is
    /// reported as `false`.
    fn path_exists(&self, path: &CanonPath) -> bool;

    /// Get the type of a path without following a terminal symlink.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] if the path does not exist
    /// - [`FetchError::PermissionDenied`] if a sandbox refuses the path
    /// - [`FetchError::NotImplemented`] if the accessor has no notion of types
    fn lstat(&self, path: &CanonPath) -> Result<Stat, FetchError>;
}
