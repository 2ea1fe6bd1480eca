//! # Inputs
//!
//! [`Input`] is the uniform value every fetcher-specific description is
//! normalized into: an attribute bag plus, usually, the scheme that
//! recognized it. Operations on an input delegate to its scheme; inputs
//! without one still compare and display but cannot be fetched.
//!
//! ## Locking
//!
//! ```text
//!   unlocked ──get_accessor / fetch_to_store──▶ locked
//!      ▲                                          │
//!      └──── apply_overrides(ref or rev given) ───┘
//! ```
//!
//! A locked input carries a revision or content hash. It only becomes
//! unlocked again through an explicit override; overrides that silently drop
//! the lock fail with [`FetchError::LockLost`].

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::archive::{self, ArchiveOptions, PathFilter};
use crate::{
    Attrs, CanonPath, FetchError, InputAccessor, InputScheme, Interrupt, NarHash, SourcePath, registry,
};

/// Name of an imported tree in the external store.
///
/// Opaque to this crate: the store decides its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorePath(String);

impl StorePath {
    /// Wrap a store-provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persistent content-addressed store, as far as fetching needs it.
pub trait Store: Send + Sync {
    /// Import the tree at `source` (entries rejected by `filter` excluded)
    /// under `name`.
    fn add_to_store(
        &self,
        name: &str,
        source: &SourcePath,
        filter: &PathFilter<'_>,
    ) -> Result<StorePath, FetchError>;
}

/// A source description, normalized.
///
/// Equality and hashing consider the attributes only; the bound scheme is
/// derived from them.
#[derive(Clone)]
pub struct Input {
    scheme: Option<Arc<dyn InputScheme>>,
    attrs: Attrs,
}

impl Input {
    /// An input not bound to any scheme.
    ///
    /// Schemes return these from their recognizers and the registry binds
    /// them. Constructed directly, the input is an opaque comparable value.
    pub fn new(attrs: Attrs) -> Self {
        Self {
            scheme: None,
            attrs,
        }
    }

    pub(crate) fn bind(mut self, scheme: &Arc<dyn InputScheme>) -> Self {
        self.scheme = Some(Arc::clone(scheme));
        self
    }

    /// Recognize `url` using the process-wide registry.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` does not parse
    /// - [`FetchError::NoMatchingScheme`] if no scheme recognizes it
    /// - any error a scheme raised while recognizing it
    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        registry::snapshot().input_from_url(url)
    }

    /// Recognize an already-parsed URL using the process-wide registry.
    pub fn from_parsed_url(url: &Url) -> Result<Self, FetchError> {
        registry::snapshot().input_from_parsed_url(url)
    }

    /// Recognize `attrs` using the process-wide registry.
    pub fn from_attrs(attrs: Attrs) -> Result<Self, FetchError> {
        registry::snapshot().input_from_attrs(attrs)
    }

    /// The scheme that recognized this input, if any.
    pub fn scheme(&self) -> Option<&Arc<dyn InputScheme>> {
        self.scheme.as_ref()
    }

    /// The attribute bag.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// A copy of the attribute bag.
    pub fn to_attrs(&self) -> Attrs {
        self.attrs.clone()
    }

    /// Canonical JSON of the attribute bag.
    pub fn to_attrs_string(&self) -> String {
        self.attrs.to_json_string()
    }

    fn require_scheme(&self, operation: &'static str) -> Result<&Arc<dyn InputScheme>, FetchError> {
        self.scheme
            .as_ref()
            .ok_or_else(|| FetchError::UnsupportedOperation {
                operation,
                input: self.to_attrs_string(),
            })
    }

    /// Render as a URL.
    pub fn to_url(&self) -> Result<Url, FetchError> {
        self.require_scheme("convert to a URL")?.to_url(self)
    }

    /// Render as a URL string, appending `extra_query` parameters.
    pub fn to_url_string(&self, extra_query: &BTreeMap<String, String>) -> Result<String, FetchError> {
        let mut url = self.to_url()?;
        if !extra_query.is_empty() {
            url.query_pairs_mut().extend_pairs(extra_query);
        }
        Ok(url.to_string())
    }

    /// Whether the input is fetched directly (not through an indirection).
    pub fn is_direct(&self) -> bool {
        self.scheme.as_ref().is_none_or(|s| s.is_direct(self))
    }

    /// Whether the input pins its content.
    pub fn is_locked(&self) -> bool {
        self.scheme.as_ref().is_some_and(|s| s.is_locked(self))
    }

    /// For relative path-like inputs, the relative path.
    pub fn is_relative(&self) -> Option<String> {
        self.scheme.as_ref().and_then(|s| s.is_relative(self))
    }

    /// Whether `other` is this input, possibly with a `ref`/`rev` added.
    pub fn contains(&self, other: &Input) -> bool {
        if self == other {
            return true;
        }
        let mut stripped = other.attrs.clone();
        stripped.remove("ref");
        stripped.remove("rev");
        self.attrs == stripped
    }

    /// A new input with the given branch/tag and/or revision.
    ///
    /// Without a scheme the input is returned unchanged.
    ///
    /// # Errors
    ///
    /// - whatever the scheme raises for unsupported overrides
    /// - [`FetchError::LockLost`] if a locked input would come back unlocked
    ///   although neither `git_ref` nor `rev` was given
    pub fn apply_overrides(
        &self,
        git_ref: Option<&str>,
        rev: Option<&str>,
    ) -> Result<Input, FetchError> {
        let Some(scheme) = &self.scheme else {
            return Ok(self.clone());
        };
        let result = scheme.apply_overrides(self, git_ref, rev)?.bind(scheme);
        if self.is_locked() && !result.is_locked() && git_ref.is_none() && rev.is_none() {
            return Err(FetchError::LockLost {
                input: self.to_string(),
            });
        }
        Ok(result)
    }

    /// Check out a working copy into `dest_dir`.
    pub fn clone_to(&self, dest_dir: &Path) -> Result<(), FetchError> {
        debug!(input = %self, dest = %dest_dir.display(), "cloning input");
        self.require_scheme("clone")?.clone_to(self, dest_dir)
    }

    /// Write `contents` to `path` in the source this input comes from.
    ///
    /// Versioned schemes commit the change with `commit_msg`.
    pub fn put_file(
        &self,
        path: &CanonPath,
        contents: &[u8],
        commit_msg: Option<&str>,
    ) -> Result<(), FetchError> {
        self.require_scheme("write a file into")?
            .put_file(self, path, contents, commit_msg)
    }

    /// Stable content identity, when the input can be pinned.
    pub fn get_fingerprint(&self, store: &dyn Store) -> Option<String> {
        self.scheme
            .as_ref()
            .and_then(|s| s.get_fingerprint(store, self))
    }

    /// An accessor over the content, plus the input as fetched.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnsupportedOperation`] without a scheme
    /// - [`FetchError::LockMismatch`] if the fetched input contradicts a lock
    /// - any error the scheme raised
    pub fn get_accessor(
        &self,
        store: &dyn Store,
    ) -> Result<(Arc<dyn InputAccessor>, Input), FetchError> {
        let scheme = self.require_scheme("get an accessor for")?;
        let (accessor, fetched) = scheme.get_accessor(store, self)?;
        let fetched = fetched.bind(scheme);
        scheme.check_locks(self, &fetched)?;
        debug!(input = %self, accessor = %accessor.id(), "got accessor");
        Ok((accessor, fetched))
    }

    /// Fetch the whole input into `store`.
    ///
    /// The content hash of the fetched tree is recorded as `narHash` in the
    /// returned input before the locks are checked again, so a specified
    /// `narHash` is verified against the actual content.
    pub fn fetch_to_store(&self, store: &dyn Store) -> Result<(StorePath, Input), FetchError> {
        let scheme = self.require_scheme("fetch")?;
        let (accessor, mut fetched) = self.get_accessor(store)?;
        let source = SourcePath::root(accessor);

        let nar_hash = source.hash(
            &archive::accept_all,
            &ArchiveOptions::default(),
            &Interrupt::new(),
        )?;
        fetched.attrs.insert("narHash", nar_hash.to_sri());
        scheme.check_locks(self, &fetched)?;

        let store_path = store.add_to_store(fetched.get_name()?, &source, &archive::accept_all)?;
        debug!(input = %self, %nar_hash, store_path = %store_path, "fetched input to store");
        Ok((store_path, fetched))
    }

    /// The `type` attribute.
    pub fn get_type(&self) -> Result<&str, FetchError> {
        self.attrs.get_str("type")
    }

    /// The `name` attribute, `"source"` if unset.
    pub fn get_name(&self) -> Result<&str, FetchError> {
        Ok(self.attrs.maybe_get_str("name")?.unwrap_or("source"))
    }

    /// The `ref` attribute (branch or tag).
    pub fn get_ref(&self) -> Result<Option<&str>, FetchError> {
        self.attrs.maybe_get_str("ref")
    }

    /// The `rev` attribute.
    pub fn get_rev(&self) -> Result<Option<&str>, FetchError> {
        self.attrs.maybe_get_str("rev")
    }

    /// The `narHash` attribute, parsed.
    pub fn get_nar_hash(&self) -> Result<Option<NarHash>, FetchError> {
        self.attrs
            .maybe_get_str("narHash")?
            .map(NarHash::parse_sri)
            .transpose()
    }

    /// The `revCount` attribute.
    pub fn get_rev_count(&self) -> Result<Option<u64>, FetchError> {
        self.attrs.maybe_get_int("revCount")
    }

    /// The `lastModified` attribute (seconds since the epoch).
    pub fn get_last_modified(&self) -> Result<Option<u64>, FetchError> {
        self.attrs.maybe_get_int("lastModified")
    }

    /// Check the attributes every input shares.
    pub(crate) fn validate(&self) -> Result<(), FetchError> {
        self.get_type()?;
        self.get_name()?;
        self.get_ref()?;
        self.get_rev()?;
        self.get_nar_hash()?;
        self.get_rev_count()?;
        self.get_last_modified()?;
        Ok(())
    }
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.attrs == other.attrs
    }
}

impl Eq for Input {}

impl Hash for Input {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attrs.hash(state);
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_url() {
            Ok(url) => write!(f, "{url}"),
            Err(_) => f.write_str(&self.to_attrs_string()),
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("scheme", &self.scheme.as_ref().map(|s| s.scheme_name()))
            .field("attrs", &self.attrs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::Attr;
    use crate::mock::{MockScheme, RecordingStore};

    fn attrs(pairs: &[(&str, Attr)]) -> Attrs {
        pairs.iter().cloned().collect()
    }

    fn bound(scheme: MockScheme, pairs: &[(&str, Attr)]) -> Input {
        let scheme: Arc<dyn InputScheme> = Arc::new(scheme);
        Input::new(attrs(pairs)).bind(&scheme)
    }

    #[test]
    fn equality_ignores_scheme() {
        let a = Input::new(attrs(&[("type", "mock".into())]));
        let b = bound(MockScheme::new("mock"), &[("type", "mock".into())]);
        assert_eq!(a, b);

        let set: HashSet<Input> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn unbound_input_defaults() {
        let store = RecordingStore::default();
        let i = Input::new(attrs(&[("type", "unknown".into())]));
        assert!(i.is_direct());
        assert!(!i.is_locked());
        assert_eq!(i.is_relative(), None);
        assert_eq!(i.get_fingerprint(&store), None);
        assert_eq!(i.apply_overrides(Some("main"), None).unwrap(), i);
        assert!(matches!(
            i.to_url(),
            Err(FetchError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            i.get_accessor(&store),
            Err(FetchError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            i.fetch_to_store(&store),
            Err(FetchError::UnsupportedOperation { .. })
        ));
        assert_eq!(i.to_string(), r#"{"type":"unknown"}"#);
    }

    #[test]
    fn clone_and_put_file_delegate_to_scheme() {
        let unbound = Input::new(attrs(&[("type", "unknown".into())]));
        assert!(matches!(
            unbound.clone_to(Path::new("/tmp/checkout")),
            Err(FetchError::UnsupportedOperation { operation: "clone", .. })
        ));
        assert!(matches!(
            unbound.put_file(&CanonPath::new("/flake.lock"), b"{}", None),
            Err(FetchError::UnsupportedOperation { operation: "write a file into", .. })
        ));

        let i = bound(MockScheme::new("mock"), &[("type", "mock".into())]);
        assert!(matches!(
            i.clone_to(Path::new("/tmp/checkout")),
            Err(FetchError::UnsupportedOperation { operation: "clone", ref input })
                if input == r#"{"type":"mock"}"#
        ));
        assert!(matches!(
            i.put_file(&CanonPath::new("/flake.lock"), b"{}", Some("update lock")),
            Err(FetchError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn getters() {
        let hash = NarHash::compute(b"x");
        let i = Input::new(attrs(&[
            ("type", "git".into()),
            ("ref", "main".into()),
            ("rev", "abc".into()),
            ("narHash", hash.to_sri().into()),
            ("revCount", 7u64.into()),
            ("lastModified", 1700000000u64.into()),
        ]));
        assert_eq!(i.get_type().unwrap(), "git");
        assert_eq!(i.get_name().unwrap(), "source");
        assert_eq!(i.get_ref().unwrap(), Some("main"));
        assert_eq!(i.get_rev().unwrap(), Some("abc"));
        assert_eq!(i.get_nar_hash().unwrap(), Some(hash));
        assert_eq!(i.get_rev_count().unwrap(), Some(7));
        assert_eq!(i.get_last_modified().unwrap(), Some(1700000000));
        assert!(i.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_shared_attributes() {
        for bad in [
            attrs(&[("type", 1u64.into())]),
            attrs(&[("type", "git".into()), ("rev", true.into())]),
            attrs(&[("type", "git".into()), ("narHash", "md5-xyz".into())]),
            attrs(&[("type", "git".into()), ("revCount", "7".into())]),
            attrs(&[("type", "git".into()), ("name", 3u64.into())]),
        ] {
            assert!(Input::new(bad).validate().is_err());
        }
        assert!(matches!(
            Input::new(Attrs::new()).validate(),
            Err(FetchError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn contains_ignores_added_ref_and_rev() {
        let base = Input::new(attrs(&[("type", "git".into()), ("url", "u".into())]));
        let pinned = Input::new(attrs(&[
            ("type", "git".into()),
            ("url", "u".into()),
            ("ref", "main".into()),
            ("rev", "abc".into()),
        ]));
        assert!(base.contains(&base));
        assert!(base.contains(&pinned));
        assert!(!pinned.contains(&base));
    }

    #[test]
    fn to_url_string_appends_query() {
        let i = bound(
            MockScheme::new("mock"),
            &[("type", "mock".into()), ("url", "mock:thing".into())],
        );
        let extra: BTreeMap<String, String> = [("dir".to_string(), "sub".to_string())].into();
        assert_eq!(i.to_url_string(&BTreeMap::new()).unwrap(), "mock:thing");
        assert_eq!(i.to_url_string(&extra).unwrap(), "mock:thing?dir=sub");
        assert_eq!(i.to_string(), "mock:thing");
    }

    #[test]
    fn overrides_may_unlock_when_asked() {
        let i = bound(
            MockScheme::new("mock"),
            &[("type", "mock".into()), ("rev", "abc".into())],
        );
        assert!(i.is_locked());
        let moved = i.apply_overrides(Some("dev"), None).unwrap();
        assert!(!moved.is_locked());
        assert_eq!(moved.get_ref().unwrap(), Some("dev"));
        assert!(moved.scheme().is_some());
    }

    #[test]
    fn overrides_cannot_silently_unlock() {
        let i = bound(
            MockScheme::new("mock").dropping_locks(),
            &[("type", "mock".into()), ("rev", "abc".into())],
        );
        assert!(matches!(
            i.apply_overrides(None, None),
            Err(FetchError::LockLost { .. })
        ));
    }

    #[test]
    fn get_accessor_locks_and_checks() {
        let store = RecordingStore::default();
        let i = bound(MockScheme::new("mock"), &[("type", "mock".into())]);
        let (accessor, fetched) = i.get_accessor(&store).unwrap();
        assert!(accessor.path_exists(&crate::CanonPath::new("/flake.nix")));
        assert!(fetched.is_locked());
        assert!(fetched.scheme().is_some());

        let wrong = bound(
            MockScheme::new("mock"),
            &[("type", "mock".into()), ("rev", "other".into())],
        );
        assert!(matches!(
            wrong.get_accessor(&store),
            Err(FetchError::LockMismatch { attribute: "rev", .. })
        ));
    }

    #[test]
    fn fetch_to_store_records_nar_hash() {
        let store = RecordingStore::default();
        let i = bound(
            MockScheme::new("mock"),
            &[("type", "mock".into()), ("name", "demo".into())],
        );
        let (path, fetched) = i.fetch_to_store(&store).unwrap();

        let imports = store.imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].0, "demo");
        assert_eq!(path, StorePath::new("/store/demo"));

        let expected = NarHash::compute(&imports[0].1);
        assert_eq!(fetched.get_nar_hash().unwrap(), Some(expected));
        assert_eq!(fetched.get_fingerprint(&store), Some(expected.to_sri()));
    }

    #[test]
    fn fetch_to_store_verifies_specified_nar_hash() {
        let store = RecordingStore::default();
        let bogus = NarHash::compute(b"not the tree").to_sri();
        let i = bound(
            MockScheme::new("mock"),
            &[("type", "mock".into()), ("narHash", bogus.into())],
        );
        assert!(matches!(
            i.fetch_to_store(&store),
            Err(FetchError::LockMismatch { attribute: "narHash", .. })
        ));
        assert!(store.imports().is_empty());
    }
}
