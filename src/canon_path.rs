//! # CanonPath
//!
//! Normalized, always-absolute, slash-separated path value.
//!
//! ## Responsibility
//! - Lexical normalization (`.`, `..`, repeated slashes) without filesystem access
//! - Parent / base name / containment / prefix removal / concatenation
//! - Allowlist membership checks used by the sandboxed accessor
//!
//! ## Usage
//!
//! ```rust
//! use inputfs::CanonPath;
//!
//! let p = CanonPath::new("foo//bar/./baz/../qux");
//! assert_eq!(p.abs(), "/foo/bar/qux");
//! assert_eq!(p.base_name(), Some("qux"));
//! assert!(p.is_within(&CanonPath::new("/foo")));
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Type Definition
// ============================================================================

/// A normalized absolute path inside some accessor (or on the host).
///
/// Invariants, established by every constructor:
/// - starts with `/`
/// - never ends with `/` unless it is the root
/// - contains no empty, `.` or `..` segments
///
/// # Ordering
///
/// Paths are ordered bytewise except that `/` sorts before every other byte.
/// This puts a directory's descendants immediately after the directory
/// itself, which [`is_allowed`](Self::is_allowed) relies on.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CanonPath {
    path: String,
}

impl CanonPath {
    /// Normalize `raw` into a canonical path.
    ///
    /// Relative input is interpreted relative to `/`; `..` at the root stays at
    /// the root.
    pub fn new(raw: &str) -> Self {
        let mut path = String::with_capacity(raw.len() + 1);
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if let Some(pos) = path.rfind('/') {
                        path.truncate(pos);
                    }
                }
                name => {
                    path.push('/');
                    path.push_str(name);
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Self { path }
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            path: String::from("/"),
        }
    }

    /// Returns `true` if this is `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.path.len() == 1
    }

    /// The absolute form, always starting with `/`.
    #[inline]
    pub fn abs(&self) -> &str {
        &self.path
    }

    /// The path without its leading `/` (empty for the root).
    #[inline]
    pub fn rel(&self) -> &str {
        &self.path[1..]
    }

    /// Iterate over the path's components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.rel().split('/').filter(|s| !s.is_empty())
    }

    /// The last component, or `None` for the root.
    pub fn base_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.path.rfind('/').map(|pos| &self.path[pos + 1..])
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<CanonPath> {
        if self.is_root() {
            return None;
        }
        let mut parent = self.clone();
        parent.pop();
        Some(parent)
    }

    /// Remove the last component (no-op at the root).
    pub fn pop(&mut self) {
        if let Some(pos) = self.path.rfind('/') {
            self.path.truncate(pos.max(1));
        }
    }

    /// Append a single component.
    ///
    /// `name` is normalized as a relative path, so `push("a/b")` appends two
    /// components and `push("..")` goes up one level.
    pub fn push(&mut self, name: &str) {
        *self = self.join_str(name);
    }

    /// Concatenate another canonical path below this one.
    pub fn join(&self, other: &CanonPath) -> CanonPath {
        if other.is_root() {
            return self.clone();
        }
        if self.is_root() {
            return other.clone();
        }
        let mut path = String::with_capacity(self.path.len() + other.path.len());
        path.push_str(&self.path);
        path.push_str(&other.path);
        CanonPath { path }
    }

    /// Append a (possibly multi-component) relative string and normalize.
    pub fn join_str(&self, name: &str) -> CanonPath {
        CanonPath::new(&format!("{}/{}", self.path, name))
    }

    /// Returns `true` if `self` equals `parent` or lies below it.
    pub fn is_within(&self, parent: &CanonPath) -> bool {
        if parent.is_root() {
            return true;
        }
        match self.path.strip_prefix(parent.path.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// Strip `prefix` from this path, returning the remainder as an absolute path.
    ///
    /// Returns `None` if `self` is not within `prefix`.
    pub fn remove_prefix(&self, prefix: &CanonPath) -> Option<CanonPath> {
        if !self.is_within(prefix) {
            return None;
        }
        if prefix.is_root() {
            return Some(self.clone());
        }
        let rest = &self.path[prefix.path.len()..];
        Some(if rest.is_empty() {
            CanonPath::root()
        } else {
            CanonPath {
                path: rest.to_string(),
            }
        })
    }

    /// Check this path against an allowlist.
    ///
    /// A path is allowed if it is in `allowed`, if one of its ancestors is, or
    /// if it is an ancestor of an allowed path (so the directories leading to
    /// an allowed file can be listed).
    pub fn is_allowed(&self, allowed: &BTreeSet<CanonPath>) -> bool {
        // Descendants of `self` sort immediately after it.
        if let Some(next) = allowed.range(self.clone()..).next() {
            if next.is_within(self) {
                return true;
            }
        }

        let mut path = self.clone();
        while !path.is_root() {
            path.pop();
            if allowed.contains(&path) {
                return true;
            }
        }

        false
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl Ord for CanonPath {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |b: &u8| if *b == b'/' { 0 } else { u16::from(*b) + 1 };
        self.path
            .as_bytes()
            .iter()
            .map(key)
            .cmp(other.path.as_bytes().iter().map(key))
    }
}

impl PartialOrd for CanonPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for CanonPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for CanonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for CanonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonPath({:?})", self.path)
    }
}

impl AsRef<str> for CanonPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl FromStr for CanonPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for CanonPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for CanonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for CanonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

// ============================================================================
// Tests
// ============================================================================
