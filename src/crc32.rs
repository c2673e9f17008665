//! IEEE-802.3 CRC-32, used by the gzip trailer and (per RFC 1952 §2.3.1) by
//! the optional FHCRC header checksum.
//!
//! The reference codebase already depends on `crc32fast` for exactly this;
//! we keep using it rather than hand-rolling the reflected polynomial
//! table, per `DESIGN.md`.

use crc32fast::Hasher;

/// Running CRC-32 accumulator, initialized to the all-ones state and
/// finalized by bitwise complement (both folded into `crc32fast::Hasher`).
#[derive(Default)]
pub struct Crc32 {
    hasher: Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

/// One-shot CRC-32 of a full buffer.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut c = Crc32::new();
    c.update(bytes);
    c.finalize()
}

/// RFC 1952's FHCRC is "the low order 2 bytes of the CRC-32 for all bytes
/// of the gzip header up to but not including the CRC16 bytes" — not an
/// independent CRC-16 algorithm.
pub fn header_crc16(header_bytes: &[u8]) -> u16 {
    (crc32(header_bytes) & 0xFFFF) as u16
}
