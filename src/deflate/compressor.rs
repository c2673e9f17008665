//! DEFLATE compressor: block segmentation, block-type selection, dynamic
//! Huffman construction, and bit-packed emission (`spec.md` §4.5).

use std::io::Write;

use log::debug;

use crate::bitstream::BitWriter;
use crate::deflate::constants::*;
use crate::error::Z7Result;
use crate::huffman::{
    build_code_table, CodeTable, MAX_CODE_LENGTH_CODELEN, MAX_CODE_LENGTH_LITLEN_DIST,
};
use crate::lz77::{MatchEffort, MatchFinder, Token};

/// Compression effort, surfaced to callers via `spec.md` §6's
/// `deflate_compress(source, sink, mode)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMode {
    NoCompression,
    BestSpeed,
    BestSize,
}

impl CompressionMode {
    fn match_effort(self) -> MatchEffort {
        match self {
            CompressionMode::NoCompression => MatchEffort::None,
            CompressionMode::BestSpeed => MatchEffort::Speed,
            CompressionMode::BestSize => MatchEffort::Size,
        }
    }
}

/// A block is closed once its tokens cover this many input bytes...
const BLOCK_INPUT_TARGET: usize = 64 * 1024;
/// ...or once this many tokens have accumulated, whichever comes first.
const BLOCK_TOKEN_TARGET: usize = 16 * 1024;
const MAX_STORED_LEN: usize = 0xFFFF;

pub fn deflate_compress<W: Write>(
    data: &[u8],
    sink: &mut W,
    mode: CompressionMode,
) -> Z7Result<()> {
    let mut writer = BitWriter::new(sink);

    if mode == CompressionMode::NoCompression {
        return emit_all_stored(data, &mut writer);
    }

    let mut finder = MatchFinder::new(data, mode.match_effort());
    let mut block_tokens: Vec<Token> = Vec::new();
    let mut block_input_len = 0usize;
    let mut block_start = 0usize;
    let mut consumed = 0usize;

    loop {
        let token = finder.next();
        let is_last_token = token.is_none();

        if let Some(tok) = token {
            let advance = match tok {
                Token::Literal(_) => 1,
                Token::Match { length, .. } => length as usize,
            };
            block_tokens.push(tok);
            block_input_len += advance;
            consumed += advance;
        }

        let close_block = is_last_token
            || block_input_len >= BLOCK_INPUT_TARGET
            || block_tokens.len() >= BLOCK_TOKEN_TARGET;

        if close_block && !block_tokens.is_empty() {
            let is_final = is_last_token;
            let span = &data[block_start..block_start + block_input_len];
            emit_block(span, &block_tokens, is_final, mode, &mut writer)?;
            block_start += block_input_len;
            block_tokens.clear();
            block_input_len = 0;
        } else if close_block && block_tokens.is_empty() {
            // Empty input: still need one final (empty) block.
            emit_block(&[], &[], true, mode, &mut writer)?;
        }

        if is_last_token {
            break;
        }
    }

    debug_assert_eq!(consumed, data.len());
    writer.flush()?;
    Ok(())
}

fn emit_all_stored<W: Write>(data: &[u8], writer: &mut BitWriter<W>) -> Z7Result<()> {
    emit_stored_span(data, true, writer)?;
    writer.flush()?;
    Ok(())
}

/// Emit `data` as one or more stored blocks, each at most `MAX_STORED_LEN`
/// bytes (the wire `LEN`/`NLEN` fields are 16 bits). Only the final chunk
/// carries `is_final`.
fn emit_stored_span<W: Write>(data: &[u8], is_final: bool, writer: &mut BitWriter<W>) -> Z7Result<()> {
    if data.is_empty() {
        return emit_stored_block(&[], is_final, writer);
    }
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + MAX_STORED_LEN).min(data.len());
        let chunk_is_final = is_final && end == data.len();
        emit_stored_block(&data[offset..end], chunk_is_final, writer)?;
        offset = end;
    }
    Ok(())
}

fn emit_stored_block<W: Write>(
    chunk: &[u8],
    is_final: bool,
    writer: &mut BitWriter<W>,
) -> Z7Result<()> {
    writer.put_bits(is_final as u32, 1)?;
    writer.put_bits(0b00, 2)?;
    writer.align_to_byte()?;
    let len = chunk.len() as u16;
    writer.write_aligned_bytes(&len.to_le_bytes())?;
    writer.write_aligned_bytes(&(!len).to_le_bytes())?;
    writer.write_aligned_bytes(chunk)?;
    Ok(())
}

struct Histograms {
    litlen: Vec<u64>,
    dist: Vec<u64>,
}

fn histogram(tokens: &[Token]) -> Histograms {
    let mut litlen = vec![0u64; NUM_LITLEN_SYMS];
    let mut dist = vec![0u64; NUM_DIST_SYMS];
    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen[b as usize] += 1,
            Token::Match { length, distance } => {
                let (len_code, _, _) = length_to_code(length);
                litlen[len_code as usize] += 1;
                let (dist_code, _, _) = distance_to_code(distance as u32);
                dist[dist_code as usize] += 1;
            }
        }
    }
    litlen[END_OF_BLOCK as usize] += 1;
    Histograms { litlen, dist }
}

/// Estimate the bit cost of encoding `tokens` with a fixed code table given
/// per-symbol lengths (used both for fixed and dynamic cost estimation).
fn estimate_cost_bits(hist: &[u64], lengths: &[u8]) -> u64 {
    hist.iter()
        .zip(lengths.iter())
        .map(|(&count, &len)| count * len as u64)
        .sum()
}

fn choose_block_type(
    span_len: usize,
    tokens: &[Token],
    hist: &Histograms,
    mode: CompressionMode,
) -> BlockPlan {
    let stored_cost = (span_len as u64 + 5) * 8;

    let fixed_litlen_lens = fixed_litlen_lengths();
    let fixed_dist_lens = fixed_dist_lengths();
    let fixed_extra_bits = extra_bits_cost(tokens);
    let fixed_cost = 3
        + estimate_cost_bits(&hist.litlen, &fixed_litlen_lens)
        + estimate_cost_bits(&hist.dist, &fixed_dist_lens)
        + fixed_extra_bits;

    if mode == CompressionMode::BestSpeed {
        return if fixed_cost < stored_cost {
            BlockPlan::Fixed
        } else {
            BlockPlan::Stored
        };
    }

    let litlen_table = build_code_table(&hist.litlen, MAX_CODE_LENGTH_LITLEN_DIST);
    let dist_table = build_code_table(&hist.dist, MAX_CODE_LENGTH_LITLEN_DIST);
    let (codelen_table, codelen_symbols) =
        build_codelen_table(&litlen_table, &dist_table);

    let dynamic_header_cost = 3 + 5 + 5 + 4 + codelen_symbols.hclen_len_bits();
    let dynamic_body_cost = codelen_symbols.emitted_bits(&codelen_table)
        + estimate_cost_bits(&hist.litlen, &litlen_table.lengths)
        + estimate_cost_bits(&hist.dist, &dist_table.lengths)
        + fixed_extra_bits;
    let dynamic_cost = dynamic_header_cost + dynamic_body_cost;

    if stored_cost <= fixed_cost && stored_cost <= dynamic_cost {
        BlockPlan::Stored
    } else if fixed_cost <= dynamic_cost {
        BlockPlan::Fixed
    } else {
        BlockPlan::Dynamic {
            litlen_table,
            dist_table,
            codelen_table,
            codelen_symbols,
        }
    }
}

fn extra_bits_cost(tokens: &[Token]) -> u64 {
    let mut bits = 0u64;
    for tok in tokens {
        if let Token::Match { length, distance } = *tok {
            let (_, _, len_extra) = length_to_code(length);
            let (_, _, dist_extra) = distance_to_code(distance as u32);
            bits += len_extra as u64 + dist_extra as u64;
        }
    }
    bits
}

enum BlockPlan {
    Stored,
    Fixed,
    Dynamic {
        litlen_table: CodeTable,
        dist_table: CodeTable,
        codelen_table: CodeTable,
        codelen_symbols: CodeLenRunLength,
    },
}

fn emit_block<W: Write>(
    span: &[u8],
    tokens: &[Token],
    is_final: bool,
    mode: CompressionMode,
    writer: &mut BitWriter<W>,
) -> Z7Result<()> {
    let hist = histogram(tokens);
    let plan = choose_block_type(span.len(), tokens, &hist, mode);

    match plan {
        BlockPlan::Stored => {
            debug!("deflate: emitting stored block of {} bytes", span.len());
            emit_stored_span(span, is_final, writer)
        }
        BlockPlan::Fixed => {
            debug!("deflate: emitting fixed block of {} tokens", tokens.len());
            writer.put_bits(is_final as u32, 1)?;
            writer.put_bits(0b01, 2)?;
            let litlen_table = crate::huffman::CodeTable {
                lengths: fixed_litlen_lengths(),
                codes: crate::huffman::assign_canonical_codes(&fixed_litlen_lengths()),
            };
            let dist_table = crate::huffman::CodeTable {
                lengths: fixed_dist_lengths(),
                codes: crate::huffman::assign_canonical_codes(&fixed_dist_lengths()),
            };
            emit_tokens(tokens, &litlen_table, &dist_table, writer)
        }
        BlockPlan::Dynamic {
            litlen_table,
            dist_table,
            codelen_table,
            codelen_symbols,
        } => {
            debug!(
                "deflate: emitting dynamic block of {} tokens",
                tokens.len()
            );
            writer.put_bits(is_final as u32, 1)?;
            writer.put_bits(0b10, 2)?;
            emit_dynamic_header(&litlen_table, &dist_table, &codelen_table, &codelen_symbols, writer)?;
            emit_tokens(tokens, &litlen_table, &dist_table, writer)
        }
    }
}

fn emit_tokens<W: Write>(
    tokens: &[Token],
    litlen_table: &CodeTable,
    dist_table: &CodeTable,
    writer: &mut BitWriter<W>,
) -> Z7Result<()> {
    for tok in tokens {
        match *tok {
            Token::Literal(b) => {
                writer.put_huffman(litlen_table.codes[b as usize], litlen_table.lengths[b as usize])?;
            }
            Token::Match { length, distance } => {
                let (len_code, len_extra_val, len_extra_bits) = length_to_code(length);
                writer.put_huffman(
                    litlen_table.codes[len_code as usize],
                    litlen_table.lengths[len_code as usize],
                )?;
                writer.put_bits(len_extra_val, len_extra_bits as u32)?;

                let (dist_code, dist_extra_val, dist_extra_bits) =
                    distance_to_code(distance as u32);
                writer.put_huffman(
                    dist_table.codes[dist_code as usize],
                    dist_table.lengths[dist_code as usize],
                )?;
                writer.put_bits(dist_extra_val, dist_extra_bits as u32)?;
            }
        }
    }
    writer.put_huffman(
        litlen_table.codes[END_OF_BLOCK as usize],
        litlen_table.lengths[END_OF_BLOCK as usize],
    )
}

/// One run-length-encoded entry in the code-length-alphabet stream: either
/// an explicit length (symbol `< 16`) or a repeat symbol (16/17/18) with
/// its extra-bit count.
#[derive(Clone, Copy)]
enum CodeLenSymbol {
    Explicit(u8),
    RepeatPrevious { extra: u8 },
    RepeatZeroShort { extra: u8 },
    RepeatZeroLong { extra: u8 },
}

struct CodeLenRunLength {
    symbols: Vec<CodeLenSymbol>,
    hlit: usize,
    hdist: usize,
}

impl CodeLenRunLength {
    fn hclen_len_bits(&self) -> u64 {
        // HCLEN+4 explicit 3-bit lengths are always emitted for all 19
        // code-length symbols, trailing zeros included.
        3 * NUM_CODELEN_SYMS as u64
    }

    fn emitted_bits(&self, codelen_table: &CodeTable) -> u64 {
        self.symbols
            .iter()
            .map(|sym| match sym {
                CodeLenSymbol::Explicit(len) => codelen_table.lengths[*len as usize] as u64,
                CodeLenSymbol::RepeatPrevious { .. } => codelen_table.lengths[16] as u64 + 2,
                CodeLenSymbol::RepeatZeroShort { .. } => codelen_table.lengths[17] as u64 + 3,
                CodeLenSymbol::RepeatZeroLong { .. } => codelen_table.lengths[18] as u64 + 7,
            })
            .sum()
    }
}

/// Concatenate the literal/length and distance code-length sequences and
/// run-length encode them with the code-length alphabet (`spec.md` §4.5
/// step 2).
fn build_codelen_table(
    litlen_table: &CodeTable,
    dist_table: &CodeTable,
) -> (CodeTable, CodeLenRunLength) {
    let hlit = last_nonzero_index(&litlen_table.lengths, 257).max(257);
    let hdist = last_nonzero_index(&dist_table.lengths, 1).max(1);

    let mut combined: Vec<u8> = litlen_table.lengths[..hlit].to_vec();
    combined.extend_from_slice(&dist_table.lengths[..hdist]);

    let symbols = run_length_encode(&combined);

    let mut freq = vec![0u64; NUM_CODELEN_SYMS];
    for sym in &symbols {
        match sym {
            CodeLenSymbol::Explicit(len) => freq[*len as usize] += 1,
            CodeLenSymbol::RepeatPrevious { .. } => freq[16] += 1,
            CodeLenSymbol::RepeatZeroShort { .. } => freq[17] += 1,
            CodeLenSymbol::RepeatZeroLong { .. } => freq[18] += 1,
        }
    }
    let codelen_table = build_code_table(&freq, MAX_CODE_LENGTH_CODELEN);

    (
        codelen_table,
        CodeLenRunLength {
            symbols,
            hlit,
            hdist,
        },
    )
}

fn last_nonzero_index(lengths: &[u8], min_count: usize) -> usize {
    let last = lengths
        .iter()
        .rposition(|&l| l != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    last.max(min_count)
}

fn run_length_encode(lengths: &[u8]) -> Vec<CodeLenSymbol> {
    let mut symbols = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }

        if value == 0 {
            let mut remaining = run;
            while remaining > 0 {
                if remaining >= 11 {
                    let take = remaining.min(138);
                    symbols.push(CodeLenSymbol::RepeatZeroLong {
                        extra: (take - 11) as u8,
                    });
                    remaining -= take;
                } else if remaining >= 3 {
                    let take = remaining.min(10);
                    symbols.push(CodeLenSymbol::RepeatZeroShort {
                        extra: (take - 3) as u8,
                    });
                    remaining -= take;
                } else {
                    for _ in 0..remaining {
                        symbols.push(CodeLenSymbol::Explicit(0));
                    }
                    remaining = 0;
                }
            }
        } else {
            symbols.push(CodeLenSymbol::Explicit(value));
            let mut remaining = run - 1;
            while remaining >= 3 {
                let take = remaining.min(6);
                symbols.push(CodeLenSymbol::RepeatPrevious {
                    extra: (take - 3) as u8,
                });
                remaining -= take;
            }
            for _ in 0..remaining {
                symbols.push(CodeLenSymbol::Explicit(value));
            }
        }
        i += run;
    }
    symbols
}

fn emit_dynamic_header<W: Write>(
    litlen_table: &CodeTable,
    dist_table: &CodeTable,
    codelen_table: &CodeTable,
    run_length: &CodeLenRunLength,
    writer: &mut BitWriter<W>,
) -> Z7Result<()> {
    writer.put_bits((run_length.hlit - 257) as u32, 5)?;
    writer.put_bits((run_length.hdist - 1) as u32, 5)?;
    writer.put_bits((NUM_CODELEN_SYMS - 4) as u32, 4)?;

    for &sym in CODE_LENGTH_ORDER.iter() {
        writer.put_bits(codelen_table.lengths[sym as usize] as u32, 3)?;
    }

    for sym in &run_length.symbols {
        match *sym {
            CodeLenSymbol::Explicit(len) => {
                writer.put_huffman(
                    codelen_table.codes[len as usize],
                    codelen_table.lengths[len as usize],
                )?;
            }
            CodeLenSymbol::RepeatPrevious { extra } => {
                writer.put_huffman(codelen_table.codes[16], codelen_table.lengths[16])?;
                writer.put_bits(extra as u32, 2)?;
            }
            CodeLenSymbol::RepeatZeroShort { extra } => {
                writer.put_huffman(codelen_table.codes[17], codelen_table.lengths[17])?;
                writer.put_bits(extra as u32, 3)?;
            }
            CodeLenSymbol::RepeatZeroLong { extra } => {
                writer.put_huffman(codelen_table.codes[18], codelen_table.lengths[18])?;
                writer.put_bits(extra as u32, 7)?;
            }
        }
    }
    let _ = litlen_table;
    let _ = dist_table;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::decompressor::deflate_decompress;

    fn round_trip(data: &[u8], mode: CompressionMode) {
        let mut compressed = Vec::new();
        deflate_compress(data, &mut compressed, mode).unwrap();
        let mut out = Vec::new();
        deflate_decompress(&compressed[..], &mut out).unwrap();
        assert_eq!(out, data, "round trip failed for mode {:?}", mode);
    }

    #[test]
    fn hello_world_best_speed_round_trips() {
        round_trip(b"Hello, World!\n", CompressionMode::BestSpeed);
    }

    #[test]
    fn repeated_byte_best_size_is_small_and_round_trips() {
        let input = vec![b'A'; 9001];
        let mut compressed = Vec::new();
        deflate_compress(&input, &mut compressed, CompressionMode::BestSize).unwrap();
        assert!(compressed.len() < 50, "compressed to {} bytes", compressed.len());
        let mut out = Vec::new();
        deflate_decompress(&compressed[..], &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input_round_trips() {
        round_trip(&[], CompressionMode::BestSize);
        round_trip(&[], CompressionMode::NoCompression);
    }

    #[test]
    fn window_wrap_input_round_trips() {
        let mut input = Vec::with_capacity(32769);
        for i in 0..32769usize {
            input.push((i % 251) as u8);
        }
        round_trip(&input, CompressionMode::BestSize);
    }

    #[test]
    fn large_input_splits_stored_blocks() {
        let input = vec![7u8; 200_000];
        round_trip(&input, CompressionMode::NoCompression);
    }

    #[test]
    fn large_incompressible_input_round_trips_when_dynamically_stored() {
        // Large enough to exceed BLOCK_INPUT_TARGET (and MAX_STORED_LEN)
        // within a single block, and patterned so the cost model picks the
        // stored encoding even in BestSpeed/BestSize mode.
        let mut input = Vec::with_capacity(90_000);
        let mut x = 0x243Fu32;
        for _ in 0..90_000 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            input.push((x >> 16) as u8);
        }
        for mode in [CompressionMode::BestSpeed, CompressionMode::BestSize] {
            round_trip(&input, mode);
        }
    }

    #[test]
    fn all_modes_round_trip_mixed_text() {
        let input = b"RFC 1951 describes DEFLATE; RFC 1952 wraps it as gzip. \
                       repeat repeat repeat repeat repeat repeat.".repeat(20);
        for mode in [
            CompressionMode::NoCompression,
            CompressionMode::BestSpeed,
            CompressionMode::BestSize,
        ] {
            round_trip(&input, mode);
        }
    }
}
