//! `z7`: a DEFLATE (RFC 1951) and gzip (RFC 1952) codec.
//!
//! The module layout mirrors the reference codebase this crate grew out
//! of: bitstream primitives, Huffman table construction, and the sliding
//! window live at the crate root, with `deflate` and `gzip` as sibling
//! modules layering the block format and container format on top.

pub mod bitstream;
pub mod crc32;
pub mod deflate;
pub mod error;
pub mod gzip;
pub mod huffman;
pub mod lz77;
pub mod ring_buffer;

use std::io::{Read, Write};

pub use deflate::CompressionMode;
pub use error::{Z7Error, Z7Result};
pub use gzip::{GzipHeaderInfo, GzipOptions};

/// Compress `source` as a single raw DEFLATE stream, writing it to `sink`.
///
/// The whole of `source` is read into memory before compression begins;
/// see `DESIGN.md` for why this crate favors a correctness-first
/// whole-buffer match finder over the reference codebase's streaming one.
pub fn deflate_compress(source: &mut dyn Read, sink: &mut dyn Write, mode: CompressionMode) -> Z7Result<()> {
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    deflate::deflate_compress(&buf, sink, mode)
}

/// Decompress a single raw DEFLATE stream from `source` into `sink`.
pub fn deflate_decompress(source: &mut dyn Read, sink: &mut dyn Write) -> Z7Result<()> {
    deflate::deflate_decompress(source, sink)
}

/// Compress `source` into a single gzip member written to `sink`.
pub fn gzip_compress(
    source: &mut dyn Read,
    sink: &mut dyn Write,
    mode: CompressionMode,
    options: &GzipOptions,
) -> Z7Result<()> {
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    gzip::gzip_compress(&buf, sink, mode, options)
}

/// Decompress a single gzip member from `source` into `sink`, returning
/// the parsed header fields.
pub fn gzip_decompress(source: &mut dyn Read, sink: &mut dyn Write) -> Z7Result<GzipHeaderInfo> {
    gzip::gzip_decompress(source, sink)
}
