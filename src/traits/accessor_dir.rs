//! Directory listing for input accessors.

use crate::{CanonPath, DirEntries, FetchError};

/// Directory listing for an input accessor.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn AccessorDir`.
pub trait AccessorDir: Send + Sync {
    /// List directory contents.
    ///
    /// The order of the returned entries is unspecified. Sandboxed accessors
    /// leave out entries they would refuse instead of failing the listing.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] if the path does not exist or is not a directory
    /// - [`FetchError::PermissionDenied`] if the directory itself is refused
    fn read_directory(&self, path: &CanonPath) -> Result<DirEntries, FetchError>;
}
