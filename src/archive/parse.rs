//! Archive reader, the inverse of the writer.

use std::collections::BTreeMap;

use super::ARCHIVE_VERSION_MAGIC;
use super::wire::padding_len;
use crate::FetchError;

/// A tree reconstructed from an archive stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveNode {
    /// Regular file.
    Regular {
        /// Owner-execute bit.
        executable: bool,
        /// File contents.
        contents: Vec<u8>,
    },
    /// Directory, entries keyed (and therefore ordered) by name.
    Directory(BTreeMap<String, ArchiveNode>),
    /// Symbolic link.
    Symlink {
        /// Raw link text.
        target: String,
    },
}

/// Parse a complete archive stream.
///
/// The stream must be exactly one archive: correct magic, well-framed tokens
/// with zero padding, strictly ascending entry names, no forbidden names and
/// no trailing bytes.
///
/// # Errors
///
/// - [`FetchError::BadArchive`] describing the first violation found
pub fn parse_archive(data: &[u8]) -> Result<ArchiveNode, FetchError> {
    let mut reader = Reader { data, pos: 0 };
    let magic = reader.token()?;
    if magic != ARCHIVE_VERSION_MAGIC.as_bytes() {
        return Err(bad("input doesn't look like an archive"));
    }
    let root = reader.node()?;
    if reader.pos != data.len() {
        return Err(bad(format!(
            "{} trailing bytes after the root node",
            data.len() - reader.pos
        )));
    }
    Ok(root)
}

fn bad(details: impl Into<String>) -> FetchError {
    FetchError::BadArchive {
        details: details.into(),
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FetchError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| bad("unexpected end of archive"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn token(&mut self) -> Result<&'a [u8], FetchError> {
        let mut len = [0u8; 8];
        len.copy_from_slice(self.take(8)?);
        let len = u64::from_le_bytes(len);
        let n = usize::try_from(len).map_err(|_| bad("token length overflows"))?;
        let bytes = self.take(n)?;
        if self.take(padding_len(len))?.iter().any(|b| *b != 0) {
            return Err(bad("non-zero padding"));
        }
        Ok(bytes)
    }

    fn string(&mut self) -> Result<String, FetchError> {
        let bytes = self.token()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| bad("string is not valid UTF-8"))
    }

    fn expect(&mut self, expected: &str) -> Result<(), FetchError> {
        let got = self.token()?;
        if got != expected.as_bytes() {
            return Err(bad(format!(
                "expected '{expected}', got '{}'",
                String::from_utf8_lossy(got)
            )));
        }
        Ok(())
    }

    fn node(&mut self) -> Result<ArchiveNode, FetchError> {
        self.expect("(")?;
        self.expect("type")?;
        let node = match self.token()? {
            b"regular" => {
                let mut tag = self.token()?;
                let executable = tag == b"executable";
                if executable {
                    self.expect("")?;
                    tag = self.token()?;
                }
                if tag != b"contents" {
                    return Err(bad("regular file without contents"));
                }
                let contents = self.token()?.to_vec();
                ArchiveNode::Regular {
                    executable,
                    contents,
                }
            }

            b"directory" => {
                let mut entries = BTreeMap::new();
                let mut previous: Option<String> = None;
                loop {
                    match self.token()? {
                        b")" => return Ok(ArchiveNode::Directory(entries)),
                        b"entry" => {}
                        other => {
                            return Err(bad(format!(
                                "unexpected '{}' in directory",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    }
                    self.expect("(")?;
                    self.expect("name")?;
                    let name = self.string()?;
                    check_name(&name)?;
                    if previous.as_deref().is_some_and(|prev| prev >= name.as_str()) {
                        return Err(bad(format!("entry '{name}' is out of order")));
                    }
                    self.expect("node")?;
                    let child = self.node()?;
                    self.expect(")")?;
                    previous = Some(name.clone());
                    entries.insert(name, child);
                }
            }

            b"symlink" => {
                self.expect("target")?;
                ArchiveNode::Symlink {
                    target: self.string()?,
                }
            }

            other => {
                return Err(bad(format!(
                    "unknown node type '{}'",
                    String::from_utf8_lossy(other)
                )));
            }
        };
        self.expect(")")?;
        Ok(node)
    }
}

fn check_name(name: &str) -> Result<(), FetchError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(bad(format!("invalid file name '{name}'")));
    }
    Ok(())
}
