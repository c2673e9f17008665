//! Gzip member parsing and trailer verification (`spec.md` §4.7), ported
//! from `decompress_gzip.rs`'s field-by-field header walk in the reference
//! codebase, but built on `std::io::Read` instead of that codebase's
//! custom overread-tolerant input trait.

use std::io::Read;

use log::debug;

use crate::crc32::Crc32;
use crate::deflate::deflate_decompress;
use crate::error::{Z7Error, Z7Result};
use crate::gzip::constants::*;

/// What the header said, reported back to the caller (sans CRC, which is
/// only used internally for FHCRC verification).
#[derive(Clone, Debug, Default)]
pub struct GzipHeaderInfo {
    pub text: bool,
    pub mtime: u32,
    pub extra: Option<Vec<u8>>,
    pub name: Option<String>,
    pub comment: Option<String>,
}

pub fn gzip_decompress<R: Read>(mut source: R, sink: &mut impl std::io::Write) -> Z7Result<GzipHeaderInfo> {
    let mut header_bytes = Vec::new();

    let mut fixed = [0u8; 10];
    source.read_exact(&mut fixed).map_err(|_| Z7Error::InvalidGzipHeader)?;
    header_bytes.extend_from_slice(&fixed);

    if fixed[0] != ID1 || fixed[1] != ID2 {
        return Err(Z7Error::InvalidGzipHeader);
    }
    if fixed[2] != CM_DEFLATE {
        return Err(Z7Error::UnsupportedGzipMethod(fixed[2]));
    }
    let flg = fixed[3];
    if flg & FRESERVED != 0 {
        return Err(Z7Error::InvalidGzipHeader);
    }
    let mtime = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);

    let mut info = GzipHeaderInfo {
        text: flg & FTEXT != 0,
        mtime,
        ..Default::default()
    };

    if flg & FEXTRA != 0 {
        let mut xlen_bytes = [0u8; 2];
        source
            .read_exact(&mut xlen_bytes)
            .map_err(|_| Z7Error::InvalidGzipHeader)?;
        header_bytes.extend_from_slice(&xlen_bytes);
        let xlen = u16::from_le_bytes(xlen_bytes) as usize;
        let mut extra = vec![0u8; xlen];
        source
            .read_exact(&mut extra)
            .map_err(|_| Z7Error::InvalidGzipHeader)?;
        header_bytes.extend_from_slice(&extra);
        info.extra = Some(extra);
    }

    if flg & FNAME != 0 {
        let name_bytes = read_nul_terminated(&mut source, &mut header_bytes)?;
        info.name = Some(String::from_utf8_lossy(&name_bytes).into_owned());
    }

    if flg & FCOMMENT != 0 {
        let comment_bytes = read_nul_terminated(&mut source, &mut header_bytes)?;
        info.comment = Some(String::from_utf8_lossy(&comment_bytes).into_owned());
    }

    if flg & FHCRC != 0 {
        let mut crc16_bytes = [0u8; 2];
        source
            .read_exact(&mut crc16_bytes)
            .map_err(|_| Z7Error::InvalidGzipHeader)?;
        let expected = u16::from_le_bytes(crc16_bytes);
        let computed = (crate::crc32::crc32(&header_bytes) & 0xFFFF) as u16;
        if expected != computed {
            return Err(Z7Error::HeaderCrcMismatch { expected, computed });
        }
    }

    debug!("gzip: header parsed, mtime={}", mtime);

    let mut decompressed = Vec::new();
    deflate_decompress(&mut source, &mut decompressed)?;

    let mut running_crc = Crc32::new();
    running_crc.update(&decompressed);
    let computed_crc = running_crc.finalize();

    let mut trailer = [0u8; 8];
    source
        .read_exact(&mut trailer)
        .map_err(|_| Z7Error::UnexpectedEndOfStream)?;
    let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let expected_isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    if computed_crc != expected_crc {
        return Err(Z7Error::CrcMismatch {
            expected: expected_crc,
            computed: computed_crc,
        });
    }
    let computed_isize = decompressed.len() as u32;
    if computed_isize != expected_isize {
        return Err(Z7Error::SizeMismatch {
            expected: expected_isize,
            computed: computed_isize,
        });
    }

    sink.write_all(&decompressed)?;
    Ok(info)
}

fn read_nul_terminated<R: Read>(source: &mut R, header_bytes: &mut Vec<u8>) -> Z7Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        source
            .read_exact(&mut byte)
            .map_err(|_| Z7Error::InvalidGzipHeader)?;
        header_bytes.push(byte[0]);
        if byte[0] == 0 {
            break;
        }
        out.push(byte[0]);
    }
    Ok(out)
}
