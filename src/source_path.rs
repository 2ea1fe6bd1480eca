//! A location inside some accessor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::sync::Arc;

use crate::archive::{self, ArchiveOptions, PathFilter};
use crate::{
    AccessorExt, CanonPath, DirEntries, FetchError, InputAccessor, Interrupt, NarHash, Stat,
};

/// An accessor paired with a path inside it.
///
/// Cloning is cheap: the accessor is shared, so every location derived from a
/// `SourcePath` reads from the same underlying tree.
///
/// Two source paths are equal when they point into the same accessor
/// instance (by [`id`](InputAccessor::id)) at the same path.
///
/// ```rust
/// use std::sync::Arc;
/// use inputfs::{CanonPath, MemoryInputAccessor, SourcePath};
///
/// let accessor = Arc::new(MemoryInputAccessor::new());
/// accessor.add_file(CanonPath::new("/flake.nix"), "{}");
///
/// let root = SourcePath::root(accessor);
/// let flake = root.join("flake.nix");
/// assert_eq!(flake.read_file().unwrap(), b"{}");
/// assert_eq!(flake.parent(), Some(root.clone()));
/// assert_eq!(root.base_name(), "source");
/// ```
#[derive(Clone)]
pub struct SourcePath {
    accessor: Arc<dyn InputAccessor>,
    path: CanonPath,
}

impl SourcePath {
    /// Location `path` inside `accessor`.
    pub fn new(accessor: Arc<dyn InputAccessor>, path: CanonPath) -> Self {
        Self { accessor, path }
    }

    /// The root of `accessor`.
    pub fn root(accessor: Arc<dyn InputAccessor>) -> Self {
        Self::new(accessor, CanonPath::root())
    }

    /// The shared accessor.
    pub fn accessor(&self) -> &Arc<dyn InputAccessor> {
        &self.accessor
    }

    /// The path inside the accessor.
    pub fn path(&self) -> &CanonPath {
        &self.path
    }

    /// Last path component, or `"source"` at the root.
    pub fn base_name(&self) -> &str {
        self.path.base_name().unwrap_or("source")
    }

    /// The parent location in the same accessor; `None` at the root.
    pub fn parent(&self) -> Option<SourcePath> {
        self.path
            .parent()
            .map(|path| Self::new(Arc::clone(&self.accessor), path))
    }

    /// Child location `rel` (one or more components) in the same accessor.
    pub fn join(&self, rel: &str) -> SourcePath {
        Self::new(Arc::clone(&self.accessor), self.path.join_str(rel))
    }

    /// See [`AccessorRead::read_file`](crate::AccessorRead::read_file).
    pub fn read_file(&self) -> Result<Vec<u8>, FetchError> {
        self.accessor.read_file(&self.path)
    }

    /// See [`AccessorRead::path_exists`](crate::AccessorRead::path_exists).
    pub fn path_exists(&self) -> bool {
        self.accessor.path_exists(&self.path)
    }

    /// See [`AccessorRead::lstat`](crate::AccessorRead::lstat).
    pub fn lstat(&self) -> Result<Stat, FetchError> {
        self.accessor.lstat(&self.path)
    }

    /// See [`AccessorExt::maybe_lstat`].
    pub fn maybe_lstat(&self) -> Result<Option<Stat>, FetchError> {
        self.accessor.maybe_lstat(&self.path)
    }

    /// See [`AccessorDir::read_directory`](crate::AccessorDir::read_directory).
    pub fn read_directory(&self) -> Result<DirEntries, FetchError> {
        self.accessor.read_directory(&self.path)
    }

    /// See [`AccessorLink::read_link`](crate::AccessorLink::read_link).
    pub fn read_link(&self) -> Result<String, FetchError> {
        self.accessor.read_link(&self.path)
    }

    /// Write the archive of this location to `sink`.
    pub fn dump(
        &self,
        sink: &mut dyn Write,
        filter: &PathFilter<'_>,
        options: &ArchiveOptions,
        interrupt: &Interrupt,
    ) -> Result<(), FetchError> {
        self.accessor
            .dump_path(&self.path, sink, filter, options, interrupt)
    }

    /// Content hash of the archive of this location.
    pub fn hash(
        &self,
        filter: &PathFilter<'_>,
        options: &ArchiveOptions,
        interrupt: &Interrupt,
    ) -> Result<NarHash, FetchError> {
        archive::hash_path(&*self.accessor, &self.path, filter, options, interrupt)
    }
}

impl PartialEq for SourcePath {
    fn eq(&self, other: &Self) -> bool {
        self.accessor.id() == other.accessor.id() && self.path == other.path
    }
}

impl Eq for SourcePath {}

impl Hash for SourcePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.accessor.id().hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accessor.show_path(&self.path))
    }
}

impl fmt::Debug for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePath")
            .field("accessor", &self.accessor.id())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryInputAccessor;
    use crate::mock::TreeAccessor;

    fn tree() -> Arc<dyn InputAccessor> {
        let acc = TreeAccessor::new();
        acc.add_dir("/src");
        acc.add_file("/src/main.rs", b"fn main() {}", false);
        acc.add_symlink("/src/link", "main.rs");
        Arc::new(acc)
    }

    #[test]
    fn parent_and_base_name() {
        let root = SourcePath::root(tree());
        assert_eq!(root.base_name(), "source");
        assert_eq!(root.parent(), None);

        let main = root.join("src/main.rs");
        assert_eq!(main.base_name(), "main.rs");
        assert_eq!(main.parent().unwrap().path(), &CanonPath::new("/src"));
        assert_eq!(main.parent().unwrap().parent(), Some(root));
    }

    #[test]
    fn delegates_reads() {
        let src = SourcePath::root(tree()).join("src");
        assert!(src.path_exists());
        assert!(src.lstat().unwrap().is_dir());
        assert_eq!(src.read_directory().unwrap().sorted_names(), vec!["link", "main.rs"]);
        assert_eq!(src.join("link").read_link().unwrap(), "main.rs");
        assert_eq!(src.join("main.rs").read_file().unwrap(), b"fn main() {}");
        assert_eq!(src.join("nope").maybe_lstat().unwrap(), None);
    }

    #[test]
    fn equality_uses_accessor_identity() {
        let a = tree();
        let b = tree();
        assert_eq!(SourcePath::root(Arc::clone(&a)), SourcePath::root(Arc::clone(&a)));
        assert_ne!(SourcePath::root(a), SourcePath::root(b));
    }

    #[test]
    fn hash_matches_dump() {
        let root = SourcePath::root(tree());
        let opts = ArchiveOptions::default();
        let interrupt = Interrupt::new();
        let mut bytes = Vec::new();
        root.dump(&mut bytes, &archive::accept_all, &opts, &interrupt)
            .unwrap();
        let hash = root.hash(&archive::accept_all, &opts, &interrupt).unwrap();
        assert_eq!(hash, NarHash::compute(&bytes));
    }

    #[test]
    fn display_uses_show_path() {
        let acc = Arc::new(MemoryInputAccessor::new());
        let id = acc.id();
        let p = SourcePath::new(acc, CanonPath::new("/x/y"));
        assert_eq!(p.to_string(), format!("/virtual/{id}/x/y"));
    }
}
