//! Synthetic accessor whose files live in memory.
//!
//! Only files are modelled: there are no directories, no symlinks and no
//! metadata, which is enough for generated inputs such as a lock file or a
//! synthesized `flake.nix`.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{
    AccessorDir, AccessorId, AccessorLink, AccessorRead, CanonPath, DirEntries, FetchError,
    InputAccessor, Stat,
};

/// An accessor over files added at runtime with [`add_file`](Self::add_file).
///
/// ```rust
/// use inputfs::{AccessorDir, AccessorRead, CanonPath, MemoryInputAccessor};
///
/// let accessor = MemoryInputAccessor::new();
/// accessor.add_file(CanonPath::new("/flake.nix"), "{}");
///
/// assert!(accessor.path_exists(&CanonPath::new("/flake.nix")));
/// assert!(!accessor.path_exists(&CanonPath::new("/other")));
/// assert!(accessor.read_directory(&CanonPath::root()).unwrap().is_empty());
/// ```
pub struct MemoryInputAccessor {
    id: AccessorId,
    files: RwLock<HashMap<CanonPath, Vec<u8>>>,
}

impl MemoryInputAccessor {
    /// Create an empty accessor.
    pub fn new() -> Self {
        Self {
            id: AccessorId::next(),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a file, replacing any previous contents at `path`.
    pub fn add_file(&self, path: CanonPath, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path, contents.into());
    }
}

impl Default for MemoryInputAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorRead for MemoryInputAccessor {
    fn read_file(&self, path: &CanonPath) -> Result<Vec<u8>, FetchError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: self.show_path(path),
            })
    }

    fn path_exists(&self, path: &CanonPath) -> bool {
        self.files.read().contains_key(path)
    }

    fn lstat(&self, path: &CanonPath) -> Result<Stat, FetchError> {
        Err(FetchError::NotImplemented {
            operation: "lstat",
            path: self.show_path(path),
        })
    }
}

impl AccessorDir for MemoryInputAccessor {
    fn read_directory(&self, _path: &CanonPath) -> Result<DirEntries, FetchError> {
        Ok(DirEntries::new())
    }
}

impl AccessorLink for MemoryInputAccessor {
    fn read_link(&self, path: &CanonPath) -> Result<String, FetchError> {
        Err(FetchError::NotImplemented {
            operation: "read_link",
            path: self.show_path(path),
        })
    }
}

impl InputAccessor for MemoryInputAccessor {
    fn id(&self) -> AccessorId {
        self.id
    }
}

impl std::fmt::Debug for MemoryInputAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryInputAccessor")
            .field("id", &self.id)
            .field("files", &self.files.read().len())
            .finish()
    }
}
