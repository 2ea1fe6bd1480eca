//! # Sandboxed real-filesystem accessor
//!
//! Exposes a host directory as an input accessor, refusing anything that
//! escapes the root and, optionally, anything not on an allowlist.
//!
//! ## Responsibility
//! - Map virtual paths onto host paths below `root`
//! - Enforce the root boundary and the optional allowlist
//! - Translate host metadata into [`Stat`] / [`DirEntries`]
//!
//! ## Usage
//!
//! ```rust
//! use inputfs::{AccessControl, AccessorRead, CanonPath, FetchError, FsInputAccessor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("a.txt"), "a")?;
//! std::fs::write(dir.path().join("b.txt"), "b")?;
//!
//! let accessor = FsInputAccessor::with_allowlist(dir.path(), [CanonPath::new("/a.txt")]);
//! assert_eq!(accessor.read_file(&CanonPath::new("/a.txt"))?, b"a");
//! assert!(matches!(
//!     accessor.read_file(&CanonPath::new("/b.txt")),
//!     Err(FetchError::PermissionDenied { .. })
//! ));
//!
//! accessor.allow_path(CanonPath::new("/b.txt"));
//! assert_eq!(accessor.read_file(&CanonPath::new("/b.txt"))?, b"b");
//! # Ok(()) }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;
use tracing::trace;

use crate::{
    AccessControl, AccessorDir, AccessorId, AccessorLink, AccessorRead, CanonPath, DirEntries,
    FetchError, FileType, InputAccessor, Stat,
};

/// Accessor over a host directory, sandboxed to that directory.
///
/// With an allowlist configured, only allowed paths (plus the directories
/// leading to them and everything below them) are visible; without one,
/// everything below `root` is.
///
/// # Thread Safety
///
/// The allowlist sits behind a `RwLock`, so [`allow_path`](AccessControl::allow_path)
/// may run concurrently with reads on the same shared accessor.
pub struct FsInputAccessor {
    id: AccessorId,
    root: PathBuf,
    allowed_paths: RwLock<Option<BTreeSet<CanonPath>>>,
}

impl FsInputAccessor {
    /// Create an accessor rooted at `root`.
    ///
    /// `root` is resolved through symlinks if possible; `allowed_paths` of
    /// `None` disables access control.
    pub fn new(root: impl Into<PathBuf>, allowed_paths: Option<BTreeSet<CanonPath>>) -> Self {
        let root = root.into();
        let root = fs::canonicalize(&root).unwrap_or(root);
        Self {
            id: AccessorId::next(),
            root,
            allowed_paths: RwLock::new(allowed_paths),
        }
    }

    /// Create an accessor without access control.
    pub fn unrestricted(root: impl Into<PathBuf>) -> Self {
        Self::new(root, None)
    }

    /// Create an accessor that only permits `allowed` (relative to `root`).
    pub fn with_allowlist(
        root: impl Into<PathBuf>,
        allowed: impl IntoIterator<Item = CanonPath>,
    ) -> Self {
        Self::new(root, Some(allowed.into_iter().collect()))
    }

    /// The host directory this accessor is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn join_root(&self, path: &CanonPath) -> PathBuf {
        if path.is_root() {
            self.root.clone()
        } else {
            self.root.join(path.rel())
        }
    }

    /// Host path for `path`, with symlinks resolved where possible.
    ///
    /// Resolution is best effort: if it fails the unresolved path is returned
    /// and the real error surfaces at the I/O call.
    pub fn to_host_path(&self, path: &CanonPath) -> PathBuf {
        let joined = self.join_root(path);
        fs::canonicalize(&joined).unwrap_or(joined)
    }

    /// Like [`to_host_path`](Self::to_host_path), but leaves the final
    /// component unresolved so a terminal symlink is seen as itself.
    fn to_host_path_nofollow(&self, path: &CanonPath) -> PathBuf {
        match (path.parent(), path.base_name()) {
            (Some(parent), Some(name)) => self.to_host_path(&parent).join(name),
            _ => self.to_host_path(path),
        }
    }

    /// Returns `true` if the sandbox permits the host path `host`.
    ///
    /// Paths outside `root` are never permitted, whatever the allowlist says.
    pub fn is_allowed(&self, host: &Path) -> bool {
        let Ok(rel) = host.strip_prefix(&self.root) else {
            trace!(path = %host.display(), root = %self.root.display(), "path escapes accessor root");
            return false;
        };

        let mut names = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => names.push(name.to_string_lossy()),
                _ => {
                    trace!(path = %host.display(), "path is not normalized below accessor root");
                    return false;
                }
            }
        }

        match &*self.allowed_paths.read() {
            None => true,
            Some(allowed) => CanonPath::new(&names.join("/")).is_allowed(allowed),
        }
    }

    fn check_allowed_host(&self, host: &Path) -> Result<(), FetchError> {
        if !self.is_allowed(host) {
            trace!(path = %host.display(), "access to path forbidden");
            return Err(FetchError::PermissionDenied {
                path: host.display().to_string(),
            });
        }
        Ok(())
    }
}

fn host_file_type(ft: fs::FileType) -> Option<FileType> {
    if ft.is_file() {
        Some(FileType::Regular)
    } else if ft.is_dir() {
        Some(FileType::Directory)
    } else if ft.is_symlink() {
        Some(FileType::Symlink)
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

impl AccessorRead for FsInputAccessor {
    fn read_file(&self, path: &CanonPath) -> Result<Vec<u8>, FetchError> {
        let host = self.to_host_path(path);
        self.check_allowed_host(&host)?;
        let shown = || host.display().to_string();
        let meta = fs::metadata(&host).map_err(|e| FetchError::from_io("read file", shown(), e))?;
        if !meta.is_file() {
            return Err(FetchError::NotFound { path: shown() });
        }
        fs::read(&host).map_err(|e| FetchError::from_io("read file", shown(), e))
    }

    fn path_exists(&self, path: &CanonPath) -> bool {
        let host = self.to_host_path(path);
        self.is_allowed(&host) && fs::symlink_metadata(&host).is_ok()
    }

    fn lstat(&self, path: &CanonPath) -> Result<Stat, FetchError> {
        let host = self.to_host_path_nofollow(path);
        self.check_allowed_host(&host)?;
        let meta = fs::symlink_metadata(&host)
            .map_err(|e| FetchError::from_io("lstat", host.display().to_string(), e))?;
        let file_type = host_file_type(meta.file_type()).unwrap_or(FileType::Other);
        Ok(Stat {
            file_type,
            is_executable: file_type == FileType::Regular && is_executable(&meta),
        })
    }
}

impl AccessorDir for FsInputAccessor {
    fn read_directory(&self, path: &CanonPath) -> Result<DirEntries, FetchError> {
        let host = self.to_host_path(path);
        self.check_allowed_host(&host)?;
        let shown = || host.display().to_string();

        let meta = fs::metadata(&host)
            .map_err(|e| FetchError::from_io("read directory", shown(), e))?;
        if !meta.is_dir() {
            return Err(FetchError::NotFound { path: shown() });
        }

        let mut entries = DirEntries::new();
        for entry in
            fs::read_dir(&host).map_err(|e| FetchError::from_io("read directory", shown(), e))?
        {
            let entry = entry.map_err(|e| FetchError::from_io("read directory", shown(), e))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|raw| FetchError::InvalidData {
                    path: host.join(&raw).display().to_string(),
                    details: "file name is not valid UTF-8".into(),
                })?;
            if !self.is_allowed(&host.join(&name)) {
                continue;
            }
            let file_type = entry.file_type().ok().and_then(host_file_type);
            entries.insert(name, file_type);
        }
        Ok(entries)
    }
}

impl AccessorLink for FsInputAccessor {
    fn read_link(&self, path: &CanonPath) -> Result<String, FetchError> {
        let host = self.to_host_path_nofollow(path);
        self.check_allowed_host(&host)?;
        let shown = || host.display().to_string();

        let meta =
            fs::symlink_metadata(&host).map_err(|e| FetchError::from_io("read link", shown(), e))?;
        if !meta.file_type().is_symlink() {
            return Err(FetchError::WrongType {
                path: shown(),
                expected: "symlink",
            });
        }
        fs::read_link(&host)
            .map_err(|e| FetchError::from_io("read link", shown(), e))?
            .into_os_string()
            .into_string()
            .map_err(|_| FetchError::InvalidData {
                path: shown(),
                details: "link target is not valid UTF-8".into(),
            })
    }
}

impl AccessControl for FsInputAccessor {
    fn check_allowed(&self, path: &CanonPath) -> Result<(), FetchError> {
        self.check_allowed_host(&self.to_host_path(path))
    }

    fn allow_path(&self, path: CanonPath) {
        if let Some(allowed) = self.allowed_paths.write().as_mut() {
            allowed.insert(path);
        }
    }

    fn has_access_control(&self) -> bool {
        self.allowed_paths.read().is_some()
    }
}

impl InputAccessor for FsInputAccessor {
    fn id(&self) -> AccessorId {
        self.id
    }

    fn show_path(&self, path: &CanonPath) -> String {
        self.join_root(path).display().to_string()
    }
}

impl std::fmt::Debug for FsInputAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsInputAccessor")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("has_access_control", &self.has_access_control())
            .finish()
    }
}
