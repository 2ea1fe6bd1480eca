//! In-crate test doubles: a tree-shaped accessor, a scheme and a store.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use url::Url;

use crate::archive::{ArchiveOptions, PathFilter};
use crate::{
    AccessorDir, AccessorId, AccessorLink, AccessorRead, Attrs, CanonPath, DirEntries,
    FetchError, FileType, Input, InputAccessor, InputScheme, Interrupt, SourcePath, Stat, Store,
    StorePath,
};

#[derive(Clone)]
enum MockNode {
    File { contents: Vec<u8>, executable: bool },
    Directory,
    Symlink(String),
    Other,
}

/// Tree-shaped accessor for unit tests. Parents must be added before children.
pub(crate) struct TreeAccessor {
    id: AccessorId,
    nodes: RwLock<BTreeMap<CanonPath, MockNode>>,
}

impl TreeAccessor {
    pub(crate) fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(CanonPath::root(), MockNode::Directory);
        Self {
            id: AccessorId::next(),
            nodes: RwLock::new(nodes),
        }
    }

    pub(crate) fn add_file(&self, path: &str, contents: &[u8], executable: bool) {
        self.nodes.write().insert(
            CanonPath::new(path),
            MockNode::File {
                contents: contents.to_vec(),
                executable,
            },
        );
    }

    pub(crate) fn add_dir(&self, path: &str) {
        self.nodes
            .write()
            .insert(CanonPath::new(path), MockNode::Directory);
    }

    pub(crate) fn add_symlink(&self, path: &str, target: &str) {
        self.nodes
            .write()
            .insert(CanonPath::new(path), MockNode::Symlink(target.to_string()));
    }

    pub(crate) fn add_other(&self, path: &str) {
        self.nodes.write().insert(CanonPath::new(path), MockNode::Other);
    }

    fn get(&self, path: &CanonPath) -> Result<MockNode, FetchError> {
        self.nodes
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: self.show_path(path),
            })
    }
}

impl AccessorRead for TreeAccessor {
    fn read_file(&self, path: &CanonPath) -> Result<Vec<u8>, FetchError> {
        match self.get(path)? {
            MockNode::File { contents, .. } => Ok(contents),
            _ => Err(FetchError::NotFound {
                path: self.show_path(path),
            }),
        }
    }

    fn path_exists(&self, path: &CanonPath) -> bool {
        self.nodes.read().contains_key(path)
    }

    fn lstat(&self, path: &CanonPath) -> Result<Stat, FetchError> {
        Ok(match self.get(path)? {
            MockNode::File { executable, .. } => Stat::regular(executable),
            MockNode::Directory => Stat::directory(),
            MockNode::Symlink(_) => Stat::symlink(),
            MockNode::Other => Stat {
                file_type: FileType::Other,
                is_executable: false,
            },
        })
    }
}

impl AccessorDir for TreeAccessor {
    fn read_directory(&self, path: &CanonPath) -> Result<DirEntries, FetchError> {
        if !matches!(self.get(path)?, MockNode::Directory) {
            return Err(FetchError::NotFound {
                path: self.show_path(path),
            });
        }
        let nodes = self.nodes.read();
        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent().as_ref() == Some(path))
            .filter_map(|(child, node)| {
                let ty = match node {
                    MockNode::File { .. } => Some(FileType::Regular),
                    MockNode::Directory => Some(FileType::Directory),
                    MockNode::Symlink(_) => Some(FileType::Symlink),
                    MockNode::Other => None,
                };
                child.base_name().map(|name| (name.to_string(), ty))
            })
            .collect())
    }
}

impl AccessorLink for TreeAccessor {
    fn read_link(&self, path: &CanonPath) -> Result<String, FetchError> {
        match self.get(path)? {
            MockNode::Symlink(target) => Ok(target),
            _ => Err(FetchError::WrongType {
                path: self.show_path(path),
                expected: "symlink",
            }),
        }
    }
}

impl InputAccessor for TreeAccessor {
    fn id(&self) -> AccessorId {
        self.id
    }
}

/// Revision every [`MockScheme`] fetch reports.
pub(crate) const MOCK_REV: &str = "0123abcd";

/// Scheme recognizing `<name>:` URLs and `{"type": "<name>"}` bags.
///
/// Fetching yields a tree holding `/flake.nix` and locks the input to
/// [`MOCK_REV`].
pub(crate) struct MockScheme {
    name: &'static str,
    drop_locks: bool,
}

impl MockScheme {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            drop_locks: false,
        }
    }

    /// Make `apply_overrides` discard `rev`/`narHash` unconditionally.
    pub(crate) fn dropping_locks(mut self) -> Self {
        self.drop_locks = true;
        self
    }
}

impl InputScheme for MockScheme {
    fn scheme_name(&self) -> &str {
        self.name
    }

    fn input_from_url(&self, url: &Url) -> Result<Option<Input>, FetchError> {
        if url.scheme() != self.name {
            return Ok(None);
        }
        let mut attrs = Attrs::new();
        attrs.insert("type", self.name);
        attrs.insert("url", url.as_str());
        Ok(Some(Input::new(attrs)))
    }

    fn input_from_attrs(&self, attrs: &Attrs) -> Result<Option<Input>, FetchError> {
        Ok((attrs.maybe_get_str("type")? == Some(self.name)).then(|| Input::new(attrs.clone())))
    }

    fn to_url(&self, input: &Input) -> Result<Url, FetchError> {
        let raw = input.attrs().get_str("url")?;
        Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
            url: raw.to_string(),
            source,
        })
    }

    fn apply_overrides(
        &self,
        input: &Input,
        git_ref: Option<&str>,
        rev: Option<&str>,
    ) -> Result<Input, FetchError> {
        let mut attrs = input.to_attrs();
        if self.drop_locks {
            attrs.remove("rev");
            attrs.remove("narHash");
        }
        if let Some(git_ref) = git_ref {
            attrs.insert("ref", git_ref);
            attrs.remove("rev");
        }
        if let Some(rev) = rev {
            attrs.insert("rev", rev);
        }
        Ok(Input::new(attrs))
    }

    fn get_accessor(
        &self,
        _store: &dyn Store,
        input: &Input,
    ) -> Result<(Arc<dyn InputAccessor>, Input), FetchError> {
        let tree = TreeAccessor::new();
        tree.add_file("/flake.nix", b"{}", false);
        let mut attrs = input.to_attrs();
        attrs.insert("rev", MOCK_REV);
        Ok((Arc::new(tree), Input::new(attrs)))
    }

    fn is_locked(&self, input: &Input) -> bool {
        input.attrs().contains_key("rev") || input.attrs().contains_key("narHash")
    }
}

/// Store that keeps the archive of everything imported into it.
#[derive(Default)]
pub(crate) struct RecordingStore {
    imports: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingStore {
    pub(crate) fn imports(&self) -> Vec<(String, Vec<u8>)> {
        self.imports.lock().clone()
    }
}

impl Store for RecordingStore {
    fn add_to_store(
        &self,
        name: &str,
        source: &SourcePath,
        filter: &PathFilter<'_>,
    ) -> Result<StorePath, FetchError> {
        let mut bytes = Vec::new();
        source.dump(&mut bytes, filter, &ArchiveOptions::default(), &Interrupt::new())?;
        self.imports.lock().push((name.to_string(), bytes));
        Ok(StorePath::new(format!("/store/{name}")))
    }
}
