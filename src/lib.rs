//! # inputfs
//!
//! Source inputs for a package/build tool: recognizing heterogeneous source
//! descriptions, reading their content through sandboxed virtual
//! filesystems, and hashing that content deterministically.
//!
//! ---
//!
//! ## Quick Start
//!
//! Register the fetchers ("input schemes") once, then turn URLs or
//! attribute bags into [`Input`]s and fetch them:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inputfs::{register_input_scheme, FetchError, Input, InputScheme, Store};
//!
//! fn fetch(
//!     scheme: Arc<dyn InputScheme>,
//!     store: &dyn Store,
//! ) -> Result<(), FetchError> {
//!     register_input_scheme(scheme);
//!
//!     let input = Input::from_url("path:/srv/project")?;
//!     let (store_path, locked) = input.fetch_to_store(store)?;
//!     println!("{input} -> {store_path} ({:?})", locked.get_nar_hash()?);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Input`] | Normalized source description; delegates to its scheme |
//! | [`InputScheme`] | Fetcher plugin contract |
//! | [`Registry`] | Ordered, first-match-wins scheme list |
//! | [`InputAccessor`] | Read-only virtual filesystem over an input's content |
//! | [`FsInputAccessor`] | Accessor over a host directory, with an optional allowlist |
//! | [`MemoryInputAccessor`] | Accessor over files held in memory |
//! | [`SourcePath`] | An accessor plus a path inside it |
//! | [`CanonPath`] | Normalized absolute virtual path |
//! | [`NarHash`] | SHA-256 of a canonical archive |
//! | [`FetchError`] | Error type with context |
//!
//! ---
//!
//! ## Accessor Traits
//!
//! ```text
//! AccessorRead + AccessorDir + AccessorLink + id/show_path = InputAccessor
//!                                                            + AccessControl (sandboxed)
//! ```
//!
//! [`AccessorExt`] adds `is_file`, `read_to_string`, `read_json` and friends
//! to every accessor.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FetchError>`. Errors carry the path or
//! input they concern:
//!
//! ```rust
//! use inputfs::FetchError;
//!
//! let err = FetchError::PermissionDenied { path: "/repo/secret".into() };
//! assert_eq!(err.to_string(), "access to path '/repo/secret' is forbidden");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Accessors are shared as
//! `Arc<dyn InputAccessor>`; mutable state such as the allowlist uses
//! interior locking, so allowing paths while other threads read is safe.
//!
//! ---
//!
//! ## Logging
//!
//! The crate emits `tracing` events (registration, dispatch, sandbox
//! denials, fetches) and never installs a subscriber.

// Private modules
mod attrs;
mod canon_path;
mod error;
mod ext;
mod fs_accessor;
mod hash;
mod input;
mod interrupt;
mod memory_accessor;
mod registry;
mod scheme;
mod source_path;
mod traits;
mod types;

#[cfg(test)]
mod mock;

pub mod archive;

// Public re-exports - error types
pub use error::FetchError;

// Public re-exports - core types
pub use attrs::{Attr, Attrs};
pub use canon_path::CanonPath;
pub use hash::{NarHash, NarHasher};
pub use interrupt::Interrupt;
pub use types::{AccessorId, DirEntries, FileType, Stat};

// Public re-exports - accessor traits
pub use traits::{AccessControl, AccessorDir, AccessorLink, AccessorRead, InputAccessor};

// Public re-exports - accessors
pub use fs_accessor::FsInputAccessor;
pub use memory_accessor::MemoryInputAccessor;
pub use source_path::SourcePath;

// Public re-exports - inputs and schemes
pub use input::{Input, Store, StorePath};
pub use registry::{Registry, register_input_scheme};
pub use scheme::{InputScheme, check_locks};

// Public re-exports - infrastructure
pub use archive::{ArchiveOptions, PathFilter};
pub use ext::AccessorExt;
