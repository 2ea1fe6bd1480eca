//! Archive writer.

use std::collections::BTreeMap;
use std::io::{self, Write};

use tracing::{debug, trace};

use super::wire::{write_token, write_tokens};
use super::{ARCHIVE_VERSION_MAGIC, ArchiveOptions, CASE_HACK_SUFFIX, PathFilter};
use crate::{CanonPath, DirEntries, FetchError, FileType, InputAccessor, Interrupt, NarHash};

/// Write the canonical archive of `path` to `sink`.
///
/// This is the default behind [`InputAccessor::dump_path`]; call that instead
/// so accessor overrides are honored.
///
/// The interrupt token is checked before every node. On any error the bytes
/// already written to `sink` are incomplete and must be discarded.
///
/// # Errors
///
/// - [`FetchError::UnsupportedType`] for sockets, devices and the like
/// - [`FetchError::NameCollision`] if case-hack stripping makes two names equal
/// - [`FetchError::Interrupted`] if the token was triggered
/// - any accessor error (`NotFound`, `PermissionDenied`, `NotImplemented`, ...)
pub fn dump_path<A: InputAccessor + ?Sized>(
    accessor: &A,
    path: &CanonPath,
    sink: &mut dyn Write,
    filter: &PathFilter<'_>,
    options: &ArchiveOptions,
    interrupt: &Interrupt,
) -> Result<(), FetchError> {
    trace!(path = %accessor.show_path(path), "dumping path");
    let mut dumper = Dumper {
        accessor,
        sink,
        filter,
        options,
        interrupt,
    };
    dumper.emit(path, &[ARCHIVE_VERSION_MAGIC.as_bytes()])?;
    dumper.node(path)
}

/// Serialize into memory, returning the bytes only if the whole walk succeeded.
pub fn dump_to_vec<A: InputAccessor + ?Sized>(
    accessor: &A,
    path: &CanonPath,
    filter: &PathFilter<'_>,
    options: &ArchiveOptions,
    interrupt: &Interrupt,
) -> Result<Vec<u8>, FetchError> {
    let mut buf = Vec::new();
    accessor.dump_path(path, &mut buf, filter, options, interrupt)?;
    Ok(buf)
}

/// Hash the archive of `path` without buffering it.
pub fn hash_path<A: InputAccessor + ?Sized>(
    accessor: &A,
    path: &CanonPath,
    filter: &PathFilter<'_>,
    options: &ArchiveOptions,
    interrupt: &Interrupt,
) -> Result<NarHash, FetchError> {
    let mut hasher = NarHash::hasher();
    accessor.dump_path(path, &mut hasher, filter, options, interrupt)?;
    Ok(hasher.finalize())
}

struct Dumper<'a, 'w, A: ?Sized> {
    accessor: &'a A,
    sink: &'w mut dyn Write,
    filter: &'a PathFilter<'a>,
    options: &'a ArchiveOptions,
    interrupt: &'a Interrupt,
}

impl<A: InputAccessor + ?Sized> Dumper<'_, '_, A> {
    fn emit(&mut self, path: &CanonPath, tokens: &[&[u8]]) -> Result<(), FetchError> {
        write_tokens(self.sink, tokens).map_err(|e| self.sink_error(path, e))
    }

    fn sink_error(&self, path: &CanonPath, source: io::Error) -> FetchError {
        FetchError::Io {
            operation: "write archive",
            path: self.accessor.show_path(path),
            source,
        }
    }

    fn node(&mut self, path: &CanonPath) -> Result<(), FetchError> {
        self.interrupt.check()?;

        let st = self.accessor.lstat(path)?;

        match st.file_type {
            FileType::Regular => {
                self.emit(path, &[b"(", b"type", b"regular"])?;
                if st.is_executable {
                    self.emit(path, &[b"executable", b""])?;
                }
                let contents = self.accessor.read_file(path)?;
                self.emit(path, &[b"contents"])?;
                write_token(self.sink, &contents).map_err(|e| self.sink_error(path, e))?;
            }

            FileType::Directory => {
                self.emit(path, &[b"(", b"type", b"directory"])?;
                let entries = self.accessor.read_directory(path)?;
                for (name, stored) in self.unhack(path, &entries)? {
                    let mut child = path.clone();
                    child.push(&name);
                    if !(self.filter)(child.abs()) {
                        continue;
                    }
                    let mut stored_path = path.clone();
                    stored_path.push(&stored);
                    self.emit(path, &[b"entry", b"(", b"name", name.as_bytes(), b"node"])?;
                    self.node(&stored_path)?;
                    self.emit(path, &[b")"])?;
                }
            }

            FileType::Symlink => {
                let target = self.accessor.read_link(path)?;
                self.emit(path, &[b"(", b"type", b"symlink", b"target", target.as_bytes()])?;
            }

            FileType::Other => {
                return Err(FetchError::UnsupportedType {
                    path: self.accessor.show_path(path),
                });
            }
        }

        self.emit(path, &[b")"])
    }

    /// Map emitted names to stored names, sorted by emitted name.
    fn unhack(
        &self,
        path: &CanonPath,
        entries: &DirEntries,
    ) -> Result<BTreeMap<String, String>, FetchError> {
        let mut unhacked = BTreeMap::new();
        for (stored, _) in entries.iter() {
            let mut name = stored.to_string();
            if self.options.use_case_hack {
                if let Some(pos) = name.find(CASE_HACK_SUFFIX) {
                    debug!(
                        path = %self.accessor.show_path(&path.join_str(stored)),
                        "removing case hack suffix"
                    );
                    name.truncate(pos);
                    if name.is_empty() {
                        return Err(FetchError::InvalidData {
                            path: self.accessor.show_path(&path.join_str(stored)),
                            details: "entry name is empty without its case hack suffix".into(),
                        });
                    }
                }
            }
            if let Some(previous) = unhacked.insert(name.clone(), stored.to_string()) {
                return Err(FetchError::NameCollision {
                    first: self.accessor.show_path(&path.join_str(&previous)),
                    second: self.accessor.show_path(&path.join_str(stored)),
                });
            }
        }
        Ok(unhacked)
    }
}
