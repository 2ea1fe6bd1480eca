//! # Accessor Traits
//!
//! The capability traits every input accessor implements.
//!
//! ## Trait Layers
//!
//! ```text
//! AccessorRead + AccessorDir + AccessorLink + id/show_path = InputAccessor
//!                                                                 +
//!                                     AccessControl (sandboxed accessors only)
//! ```
//!
//! ## Quick Reference
//!
//! | Trait | Methods | Implemented by |
//! |-------|---------|----------------|
//! | [`AccessorRead`] | `read_file`, `path_exists`, `lstat` | all accessors |
//! | [`AccessorDir`] | `read_directory` | all accessors |
//! | [`AccessorLink`] | `read_link` | all accessors |
//! | [`InputAccessor`] | `id`, `show_path`, `dump_path` | all accessors |
//! | [`AccessControl`] | `check_allowed`, `allow_path`, `has_access_control` | [`FsInputAccessor`](crate::FsInputAccessor) |
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self`; accessors are
//! shared as `Arc<dyn InputAccessor>` and use interior mutability for any
//! mutable state.
//!
//! ## Object Safety
//!
//! All traits are object-safe:
//!
//! ```rust
//! use inputfs::{CanonPath, InputAccessor};
//!
//! fn describe(accessor: &dyn InputAccessor) -> String {
//!     accessor.show_path(&CanonPath::new("/flake.nix"))
//! }
//! ```

mod access_control;
mod accessor_dir;
mod accessor_link;
mod accessor_read;

pub use access_control::AccessControl;
pub use accessor_dir::AccessorDir;
pub use accessor_link::AccessorLink;
pub use accessor_read::AccessorRead;

use std::io::Write;

use crate::archive::{self, ArchiveOptions, PathFilter};
use crate::{AccessorId, CanonPath, FetchError, Interrupt};

/// A read-only virtual filesystem over some input's content.
///
/// Combines reading ([`AccessorRead`]), listing ([`AccessorDir`]) and symlink
/// access ([`AccessorLink`]) with an identity used for diagnostics.
///
/// # Example
///
/// ```rust
/// use inputfs::{CanonPath, FetchError, InputAccessor};
///
/// fn flake_source(accessor: &dyn InputAccessor) -> Result<Option<Vec<u8>>, FetchError> {
///     let path = CanonPath::new("/flake.nix");
///     if !accessor.path_exists(&path) {
///         return Ok(None);
///     }
///     accessor.read_file(&path).map(Some)
/// }
/// ```
pub trait InputAccessor: AccessorRead + AccessorDir + AccessorLink {
    /// The process-unique number assigned at construction.
    fn id(&self) -> AccessorId;

    /// Render a path for diagnostics. Never fails.
    ///
    /// The default is `/virtual/<id><path>`; accessors backed by real storage
    /// show the real location instead.
    fn show_path(&self, path: &CanonPath) -> String {
        format!("/virtual/{}{}", self.id(), path)
    }

    /// Write the canonical archive of the subtree at `path` to `sink`.
    ///
    /// On error, whatever was already written to `sink` is incomplete and
    /// must be discarded.
    fn dump_path(
        &self,
        path: &CanonPath,
        sink: &mut dyn Write,
        filter: &PathFilter<'_>,
        options: &ArchiveOptions,
        interrupt: &Interrupt,
    ) -> Result<(), FetchError> {
        archive::dump_path(self, path, sink, filter, options, interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_accessor_is_object_safe() {
        fn _check(_: &dyn InputAccessor) {}
    }

    #[test]
    fn input_accessor_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<dyn InputAccessor>();
    }
}
