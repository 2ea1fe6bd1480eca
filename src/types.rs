//! Core types shared by all input accessors.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Type of an entry inside an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else (sockets, devices, FIFOs).
    Other,
}

/// Result of [`lstat`](crate::AccessorRead::lstat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Type of the entry. Symlinks are reported as such, never followed.
    pub file_type: FileType,
    /// Whether a regular file carries the owner-execute bit.
    pub is_executable: bool,
}

impl Stat {
    /// Stat for a regular file.
    pub const fn regular(is_executable: bool) -> Self {
        Self {
            file_type: FileType::Regular,
            is_executable,
        }
    }

    /// Stat for a directory.
    pub const fn directory() -> Self {
        Self {
            file_type: FileType::Directory,
            is_executable: false,
        }
    }

    /// Stat for a symbolic link.
    pub const fn symlink() -> Self {
        Self {
            file_type: FileType::Symlink,
            is_executable: false,
        }
    }

    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }
}

/// Directory listing returned from [`read_directory`](crate::AccessorDir::read_directory).
///
/// Maps entry names to their type, which is `None` when the underlying
/// filesystem did not report one. Iteration order is unspecified; callers
/// that need an order (the archive serializer) sort explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntries(HashMap<String, Option<FileType>>);

impl DirEntries {
    /// Create an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, file_type: Option<FileType>) {
        self.0.insert(name.into(), file_type);
    }

    /// Look up an entry. The outer `Option` is presence, the inner the type.
    pub fn get(&self, name: &str) -> Option<Option<FileType>> {
        self.0.get(name).copied()
    }

    /// Returns `true` if an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the listing is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<FileType>)> {
        self.0.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Entry names in ascending byte order.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Option<FileType>)> for DirEntries {
    fn from_iter<I: IntoIterator<Item = (String, Option<FileType>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DirEntries {
    type Item = (String, Option<FileType>);
    type IntoIter = hash_map::IntoIter<String, Option<FileType>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

static NEXT_ACCESSOR_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique accessor number, used only in diagnostic paths.
///
/// Carries no ownership or access-control meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessorId(u64);

impl AccessorId {
    /// Allocate the next number. Numbering starts at 1.
    pub fn next() -> Self {
        Self(NEXT_ACCESSOR_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The raw number.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
