//! Gzip member emission: header, DEFLATE payload, CRC-32/ISIZE trailer
//! (`spec.md` §4.7). Dispatch mirrors `libdeflate_gzip_decompress`'s
//! header-then-payload-then-trailer shape in the reference codebase, run
//! in reverse for the write side.

use std::io::Write;

use log::debug;

use crate::crc32::{crc32, header_crc16};
use crate::deflate::{deflate_compress, CompressionMode};
use crate::error::Z7Result;
use crate::gzip::constants::*;

/// Caller-selected optional gzip header sections.
#[derive(Clone, Debug, Default)]
pub struct GzipOptions {
    pub text: bool,
    pub header_crc: bool,
    pub extra: Option<Vec<u8>>,
    pub name: Option<String>,
    pub comment: Option<String>,
    /// Modification time, seconds since the Unix epoch (0 = unknown, per
    /// RFC 1952 §2.3.1).
    pub mtime: u32,
}

pub fn gzip_compress<W: Write>(
    data: &[u8],
    sink: &mut W,
    mode: CompressionMode,
    options: &GzipOptions,
) -> Z7Result<()> {
    let mut header = Vec::new();
    header.push(ID1);
    header.push(ID2);
    header.push(CM_DEFLATE);

    let mut flg = 0u8;
    if options.text {
        flg |= FTEXT;
    }
    if options.header_crc {
        flg |= FHCRC;
    }
    if options.extra.is_some() {
        flg |= FEXTRA;
    }
    if options.name.is_some() {
        flg |= FNAME;
    }
    if options.comment.is_some() {
        flg |= FCOMMENT;
    }
    header.push(flg);

    header.extend_from_slice(&options.mtime.to_le_bytes());

    let xfl = match mode {
        CompressionMode::BestSize => XFL_BEST_SIZE,
        CompressionMode::BestSpeed => XFL_BEST_SPEED,
        CompressionMode::NoCompression => XFL_DEFAULT,
    };
    header.push(xfl);
    header.push(OS_UNKNOWN);

    if let Some(extra) = &options.extra {
        header.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        header.extend_from_slice(extra);
    }
    if let Some(name) = &options.name {
        header.extend_from_slice(name.as_bytes());
        header.push(0);
    }
    if let Some(comment) = &options.comment {
        header.extend_from_slice(comment.as_bytes());
        header.push(0);
    }

    sink.write_all(&header)?;
    if options.header_crc {
        // RFC 1952: CRC-16 over all header bytes written so far, not
        // including the CRC16 field itself.
        let crc16 = header_crc16(&header);
        sink.write_all(&crc16.to_le_bytes())?;
    }

    debug!(
        "gzip: writing {} byte payload in mode {:?}",
        data.len(),
        mode
    );
    deflate_compress(data, sink, mode)?;

    let crc = crc32(data);
    sink.write_all(&crc.to_le_bytes())?;
    sink.write_all(&(data.len() as u32).to_le_bytes())?;

    Ok(())
}
