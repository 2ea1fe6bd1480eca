//! Token framing shared by the archive writer and parser.
//!
//! Every token is a little-endian `u64` length, the raw bytes, and zero
//! padding up to the next multiple of 8.

use std::io::{self, Write};

/// Number of zero bytes that follow a token of `len` bytes.
#[inline]
pub(crate) const fn padding_len(len: u64) -> usize {
    ((8 - (len % 8)) % 8) as usize
}

pub(crate) fn write_token(sink: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    let len = bytes.len() as u64;
    sink.write_all(&len.to_le_bytes())?;
    sink.write_all(bytes)?;
    sink.write_all(&[0u8; 8][..padding_len(len)])
}

pub(crate) fn write_tokens(sink: &mut dyn Write, tokens: &[&[u8]]) -> io::Result<()> {
    tokens.iter().try_for_each(|t| write_token(sink, t))
}
