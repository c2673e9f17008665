//! DEFLATE decompressor: block header parsing, fixed/dynamic Huffman
//! table reconstruction, and literal/length/distance decoding into the
//! sliding window (`spec.md` §4.6).
//!
//! The block-type dispatch and dynamic-header field order follow
//! `decode_blocks.rs` in the reference codebase; the decode step itself
//! uses this crate's `huffman::DecodeTable` rather than the reference's
//! speed-oriented multi-level lookup tables (see `DESIGN.md`).

use std::io::{Read, Write};

use log::{debug, trace};

use crate::bitstream::BitReader;
use crate::deflate::constants::*;
use crate::error::{Z7Error, Z7Result};
use crate::huffman::DecodeTable;
use crate::ring_buffer::RingBuffer;

pub fn deflate_decompress<R: Read, W: Write>(source: R, sink: &mut W) -> Z7Result<()> {
    let mut reader = BitReader::new(source);
    let mut window: RingBuffer<u8, WINDOW_SIZE> = RingBuffer::new();

    loop {
        let bfinal = reader.get_bits(1)? != 0;
        let btype = reader.get_bits(2)?;

        match btype {
            0b00 => decode_stored_block(&mut reader, &mut window, sink)?,
            0b01 => {
                debug!("deflate: decoding fixed-Huffman block");
                let litlen = DecodeTable::from_lengths(&fixed_litlen_lengths())?;
                let dist = DecodeTable::from_lengths(&fixed_dist_lengths())?;
                decode_huffman_block(&mut reader, &litlen, &dist, &mut window, sink)?;
            }
            0b10 => {
                debug!("deflate: decoding dynamic-Huffman block");
                let (litlen, dist) = read_dynamic_tables(&mut reader)?;
                decode_huffman_block(&mut reader, &litlen, &dist, &mut window, sink)?;
            }
            _ => return Err(Z7Error::InvalidBlockType),
        }

        if bfinal {
            break;
        }
    }

    Ok(())
}

fn decode_stored_block<R: Read, W: Write>(
    reader: &mut BitReader<R>,
    window: &mut RingBuffer<u8, WINDOW_SIZE>,
    sink: &mut W,
) -> Z7Result<()> {
    reader.align_to_byte();
    let len_lo = reader.read_aligned_byte()?;
    let len_hi = reader.read_aligned_byte()?;
    let nlen_lo = reader.read_aligned_byte()?;
    let nlen_hi = reader.read_aligned_byte()?;
    let len = u16::from_le_bytes([len_lo, len_hi]);
    let nlen = u16::from_le_bytes([nlen_lo, nlen_hi]);
    if len != !nlen {
        return Err(Z7Error::StoredLengthMismatch { len, nlen });
    }
    debug!("deflate: decoding stored block of {} bytes", len);

    let mut chunk = vec![0u8; len as usize];
    for byte in chunk.iter_mut() {
        *byte = reader.read_aligned_byte()?;
    }
    sink.write_all(&chunk)?;
    window.push_slice(&chunk);
    Ok(())
}

fn read_dynamic_tables<R: Read>(reader: &mut BitReader<R>) -> Z7Result<(DecodeTable, DecodeTable)> {
    let hlit = reader.get_bits(5)? as usize + 257;
    let hdist = reader.get_bits(5)? as usize + 1;
    let hclen = reader.get_bits(4)? as usize + 4;

    let mut codelen_lengths = vec![0u8; NUM_CODELEN_SYMS];
    for i in 0..hclen {
        codelen_lengths[CODE_LENGTH_ORDER[i] as usize] = reader.get_bits(3)? as u8;
    }
    let codelen_table = DecodeTable::from_lengths(&codelen_lengths)?;

    let mut combined = vec![0u8; hlit + hdist];
    let mut i = 0;
    while i < combined.len() {
        let sym = codelen_table.decode(reader)?;
        match sym {
            0..=15 => {
                combined[i] = sym as u8;
                i += 1;
            }
            16 => {
                if i == 0 {
                    return Err(Z7Error::InvalidCodeLengthRun);
                }
                let repeat = 3 + reader.get_bits(2)? as usize;
                let value = combined[i - 1];
                for _ in 0..repeat {
                    if i >= combined.len() {
                        return Err(Z7Error::InvalidCodeLengthRun);
                    }
                    combined[i] = value;
                    i += 1;
                }
            }
            17 => {
                let repeat = 3 + reader.get_bits(3)? as usize;
                for _ in 0..repeat {
                    if i >= combined.len() {
                        return Err(Z7Error::InvalidCodeLengthRun);
                    }
                    combined[i] = 0;
                    i += 1;
                }
            }
            18 => {
                let repeat = 11 + reader.get_bits(7)? as usize;
                for _ in 0..repeat {
                    if i >= combined.len() {
                        return Err(Z7Error::InvalidCodeLengthRun);
                    }
                    combined[i] = 0;
                    i += 1;
                }
            }
            _ => return Err(Z7Error::InvalidCode),
        }
    }

    let litlen_table = DecodeTable::from_lengths(&combined[..hlit])?;
    let dist_table = DecodeTable::from_lengths(&combined[hlit..])?;
    Ok((litlen_table, dist_table))
}

fn decode_huffman_block<R: Read, W: Write>(
    reader: &mut BitReader<R>,
    litlen_table: &DecodeTable,
    dist_table: &DecodeTable,
    window: &mut RingBuffer<u8, WINDOW_SIZE>,
    sink: &mut W,
) -> Z7Result<()> {
    loop {
        let sym = litlen_table.decode(reader)?;
        if sym < 256 {
            let byte = sym as u8;
            sink.write_all(&[byte])?;
            window.push(byte);
        } else if sym == END_OF_BLOCK {
            return Ok(());
        } else if sym <= 285 {
            let (base_len, extra_bits) = length_code_info(sym);
            let length = base_len as usize + reader.get_bits(extra_bits as u32)? as usize;

            let dist_sym = dist_table.decode(reader)?;
            if dist_sym as usize >= NUM_DIST_SYMS {
                return Err(Z7Error::InvalidCode);
            }
            let (base_dist, dist_extra_bits) = distance_code_info(dist_sym);
            let distance = base_dist as usize + reader.get_bits(dist_extra_bits as u32)? as usize;

            if distance == 0 || distance > window.len() {
                return Err(Z7Error::InvalidDistance {
                    distance,
                    available: window.len(),
                });
            }
            trace!("deflate: match length={} distance={}", length, distance);

            // Copy byte-by-byte so that length > distance correctly
            // replicates the tail, as RFC 1951's run-length semantics
            // require.
            let mut out = Vec::with_capacity(length);
            for _ in 0..length {
                let byte = window.read_offset_end(distance - 1, 1)?[0];
                out.push(byte);
                window.push(byte);
            }
            sink.write_all(&out)?;
        } else {
            return Err(Z7Error::InvalidCode);
        }
    }
}
