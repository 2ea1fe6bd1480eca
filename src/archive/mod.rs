//! # Canonical Archive
//!
//! Deterministic serialization of an accessor subtree, used as the preimage
//! for content hashing and as the import format of the external store.
//!
//! ## Format
//!
//! ```text
//! archive   = "nix-archive-1" node
//! node      = "(" "type" ( regular | directory | symlink ) ")"
//! regular   = "regular" [ "executable" "" ] "contents" <bytes>
//! directory = "directory" { "entry" "(" "name" <name> "node" node ")" }
//! symlink   = "symlink" "target" <target>
//! ```
//!
//! Every token is framed as a little-endian `u64` length, the bytes, and zero
//! padding to a multiple of 8. Directory entries are emitted in ascending
//! byte order of their names regardless of how the accessor lists them.
//!
//! ## Usage
//!
//! ```rust
//! use inputfs::archive::{self, ArchiveNode};
//! use inputfs::{ArchiveOptions, CanonPath, FsInputAccessor, Interrupt};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::write(dir.path().join("hello.txt"), "hi")?;
//!
//! let accessor = FsInputAccessor::unrestricted(dir.path());
//! let bytes = archive::dump_to_vec(
//!     &accessor,
//!     &CanonPath::root(),
//!     &archive::accept_all,
//!     &ArchiveOptions::default(),
//!     &Interrupt::new(),
//! )?;
//!
//! let ArchiveNode::Directory(entries) = archive::parse_archive(&bytes)? else {
//!     panic!("root is a directory");
//! };
//! assert!(entries.contains_key("hello.txt"));
//! # Ok(()) }
//! ```

mod dump;
mod parse;
mod wire;

pub use dump::{dump_path, dump_to_vec, hash_path};
pub use parse::{ArchiveNode, parse_archive};

use serde::{Deserialize, Serialize};

/// Format-version magic emitted once before the root node.
pub const ARCHIVE_VERSION_MAGIC: &str = "nix-archive-1";

/// Suffix a producer on a case-insensitive host appends to colliding names.
pub const CASE_HACK_SUFFIX: &str = "~nix~case~hack~";

/// Predicate over absolute virtual paths; `false` excludes the entry and its subtree.
pub type PathFilter<'a> = dyn Fn(&str) -> bool + 'a;

/// A [`PathFilter`] that keeps everything.
pub fn accept_all(_path: &str) -> bool {
    true
}

/// Serializer policy.
///
/// Deserializable so hosts can load it from their own configuration.
///
/// ```rust
/// use inputfs::ArchiveOptions;
///
/// let opts: ArchiveOptions = serde_json::from_str(r#"{"use-case-hack": true}"#).unwrap();
/// assert!(opts.use_case_hack);
/// assert!(!ArchiveOptions::default().use_case_hack);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArchiveOptions {
    /// Strip [`CASE_HACK_SUFFIX`] from directory entry names before emitting
    /// them. Off by default.
    pub use_case_hack: bool,
}
