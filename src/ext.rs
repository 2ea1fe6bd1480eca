//! # Extension Traits
//!
//! Convenience methods layered over the accessor traits.
//!
//! ## Overview
//!
//! [`AccessorExt`] collects helpers that callers keep re-deriving from
//! `lstat` and `read_file`. They are default methods with a blanket
//! implementation, so every [`InputAccessor`] (including `dyn InputAccessor`)
//! gets them for free.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`maybe_lstat`](AccessorExt::maybe_lstat) | `lstat` with missing paths as `None` |
//! | [`is_file`](AccessorExt::is_file) | Check if path is a regular file |
//! | [`is_dir`](AccessorExt::is_dir) | Check if path is a directory |
//! | [`is_symlink`](AccessorExt::is_symlink) | Check if path is a symlink (not followed) |
//! | [`read_to_string`](AccessorExt::read_to_string) | Read a UTF-8 file |
//! | [`read_json`](AccessorExt::read_json) | Read and deserialize a JSON file |

use serde::de::DeserializeOwned;

use crate::{CanonPath, FetchError, InputAccessor, Stat};

/// Extension methods for any input accessor.
///
/// # Example
///
/// ```rust
/// use inputfs::{AccessorExt, CanonPath, FetchError, InputAccessor};
///
/// fn lock_file(accessor: &dyn InputAccessor) -> Result<Option<serde_json::Value>, FetchError> {
///     let path = CanonPath::new("/flake.lock");
///     if !accessor.is_file(&path)? {
///         return Ok(None);
///     }
///     accessor.read_json(&path).map(Some)
/// }
/// ```
pub trait AccessorExt: InputAccessor {
    /// `lstat`, mapping a missing path to `Ok(None)`.
    fn maybe_lstat(&self, path: &CanonPath) -> Result<Option<Stat>, FetchError> {
        match self.lstat(path) {
            Ok(st) => Ok(Some(st)),
            Err(FetchError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the path is a regular file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist; `Err` only for real
    /// failures such as a denied path.
    fn is_file(&self, path: &CanonPath) -> Result<bool, FetchError> {
        Ok(self.maybe_lstat(path)?.is_some_and(|st| st.is_file()))
    }

    /// Check if the path is a directory. Missing paths are `Ok(false)`.
    fn is_dir(&self, path: &CanonPath) -> Result<bool, FetchError> {
        Ok(self.maybe_lstat(path)?.is_some_and(|st| st.is_dir()))
    }

    /// Check if the path itself is a symlink. Missing paths are `Ok(false)`.
    fn is_symlink(&self, path: &CanonPath) -> Result<bool, FetchError> {
        Ok(self.maybe_lstat(path)?.is_some_and(|st| st.is_symlink()))
    }

    /// Read a file as UTF-8.
    ///
    /// # Errors
    ///
    /// - Whatever [`read_file`](crate::AccessorRead::read_file) returns
    /// - [`FetchError::InvalidData`] if the contents are not UTF-8
    fn read_to_string(&self, path: &CanonPath) -> Result<String, FetchError> {
        let data = self.read_file(path)?;
        String::from_utf8(data).map_err(|e| FetchError::InvalidData {
            path: self.show_path(path),
            details: e.to_string(),
        })
    }

    /// Read a file and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// - `FetchError::NotFound`: file doesn't exist
    /// - `FetchError::InvalidData`: file isn't valid UTF-8
    /// - `FetchError::Deserialization`: JSON parsing failed
    fn read_json<T: DeserializeOwned>(&self, path: &CanonPath) -> Result<T, FetchError> {
        let data = self.read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

impl<A: InputAccessor + ?Sized> AccessorExt for A {}
