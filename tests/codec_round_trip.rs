use z7::{
    deflate_compress, deflate_decompress, gzip_compress, gzip_decompress, CompressionMode,
    GzipOptions, Z7Error,
};

fn deflate_round_trip(input: &[u8], mode: CompressionMode) -> Vec<u8> {
    let mut compressed = Vec::new();
    deflate_compress(&mut &input[..], &mut compressed, mode).unwrap();
    let mut out = Vec::new();
    deflate_decompress(&mut &compressed[..], &mut out).unwrap();
    out
}

#[test]
fn hello_world_is_a_single_fixed_block() {
    let input = b"Hello, World!\n";
    let mut compressed = Vec::new();
    deflate_compress(&mut &input[..], &mut compressed, CompressionMode::BestSpeed).unwrap();

    // BFINAL=1, BTYPE=01 (fixed), packed LSB-first in the first byte.
    assert_eq!(compressed[0] & 0b111, 0b011);

    let mut out = Vec::new();
    deflate_decompress(&mut &compressed[..], &mut out).unwrap();
    assert_eq!(out, input);
}

#[test]
fn run_of_a_repeated_9001_times_compresses_small_and_round_trips() {
    let input = vec![b'A'; 9001];
    let mut compressed = Vec::new();
    deflate_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize).unwrap();
    assert!(compressed.len() < 50, "compressed to {} bytes", compressed.len());
    let mut out = Vec::new();
    deflate_decompress(&mut &compressed[..], &mut out).unwrap();
    assert_eq!(out, input);
}

#[test]
fn text_like_input_round_trips_in_every_mode_and_gzip_crc_matches() {
    let input = b"RFC 1951 defines DEFLATE as a combination of the LZ77 algorithm and \
                   Huffman coding. DEFLATE compressed data is stored in a sequence of \
                   blocks, each preceded by a three-bit header."
        .repeat(30);

    for mode in [
        CompressionMode::NoCompression,
        CompressionMode::BestSpeed,
        CompressionMode::BestSize,
    ] {
        assert_eq!(deflate_round_trip(&input, mode), input);
    }

    let mut compressed = Vec::new();
    gzip_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize, &GzipOptions::default())
        .unwrap();
    let mut out = Vec::new();
    gzip_decompress(&mut &compressed[..], &mut out).unwrap();
    assert_eq!(out, input);

    let independent_crc = z7::crc32::crc32(&input);
    let trailer = &compressed[compressed.len() - 8..];
    let trailer_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    assert_eq!(trailer_crc, independent_crc);
}

#[test]
fn window_wrap_input_round_trips() {
    let input: Vec<u8> = (0..32769usize).map(|i| (i % 251) as u8).collect();
    assert_eq!(deflate_round_trip(&input, CompressionMode::BestSize), input);
}

#[test]
fn large_input_splits_across_stored_blocks_in_no_compression_mode() {
    let input = vec![0xABu8; 200_000];
    assert_eq!(deflate_round_trip(&input, CompressionMode::NoCompression), input);
}

#[test]
fn reserved_block_type_is_rejected() {
    let data = [0b0000_0111u8]; // BFINAL=1, BTYPE=11
    let mut out = Vec::new();
    let err = deflate_decompress(&mut &data[..], &mut out).unwrap_err();
    assert!(matches!(err, Z7Error::InvalidBlockType));
}

#[test]
fn stored_block_length_mismatch_is_rejected() {
    let mut data = vec![0b0000_0001u8]; // BFINAL=1, BTYPE=00
    data.extend_from_slice(&5u16.to_le_bytes());
    data.extend_from_slice(&5u16.to_le_bytes()); // should be !5, not 5
    let mut out = Vec::new();
    let err = deflate_decompress(&mut &data[..], &mut out).unwrap_err();
    assert!(matches!(err, Z7Error::StoredLengthMismatch { .. }));
}

#[test]
fn empty_input_round_trips_for_both_formats() {
    assert_eq!(deflate_round_trip(&[], CompressionMode::BestSize), Vec::<u8>::new());

    let mut compressed = Vec::new();
    gzip_compress(&mut &[][..], &mut compressed, CompressionMode::BestSize, &GzipOptions::default())
        .unwrap();
    let trailer = &compressed[compressed.len() - 8..];
    assert_eq!(&trailer[0..4], &[0, 0, 0, 0], "CRC of empty input must be 0");
    assert_eq!(&trailer[4..8], &[0, 0, 0, 0], "ISIZE of empty input must be 0");

    let mut out = Vec::new();
    gzip_decompress(&mut &compressed[..], &mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn gzip_corrupted_crc_is_rejected() {
    let input = b"some payload worth compressing, repeated a bit for good measure".repeat(5);
    let mut compressed = Vec::new();
    gzip_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize, &GzipOptions::default())
        .unwrap();
    let len = compressed.len();
    compressed[len - 8] ^= 0xFF;
    let mut out = Vec::new();
    let err = gzip_decompress(&mut &compressed[..], &mut out).unwrap_err();
    assert!(matches!(err, Z7Error::CrcMismatch { .. }));
}

#[test]
fn gzip_wrong_isize_is_rejected() {
    let input = b"some payload worth compressing, repeated a bit for good measure".repeat(5);
    let mut compressed = Vec::new();
    gzip_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize, &GzipOptions::default())
        .unwrap();
    let len = compressed.len();
    compressed[len - 1] ^= 0xFF;
    let mut out = Vec::new();
    let err = gzip_decompress(&mut &compressed[..], &mut out).unwrap_err();
    assert!(matches!(err, Z7Error::SizeMismatch { .. }));
}

#[test]
fn forty_kb_random_buffer_round_trips_through_gzip() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let input: Vec<u8> = (0..40_000).map(|_| rng.gen()).collect();

    let mut compressed = Vec::new();
    gzip_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize, &GzipOptions::default())
        .unwrap();
    let mut out = Vec::new();
    gzip_decompress(&mut &compressed[..], &mut out).unwrap();
    assert_eq!(out, input);
}

#[test]
fn gzip_header_options_round_trip() {
    let input = b"payload with a named, commented header".to_vec();
    let options = GzipOptions {
        text: true,
        header_crc: true,
        extra: Some(vec![1, 2, 3, 4]),
        name: Some("data.bin".to_string()),
        comment: Some("generated for a test".to_string()),
        mtime: 1_700_000_000,
    };
    let mut compressed = Vec::new();
    gzip_compress(&mut &input[..], &mut compressed, CompressionMode::BestSize, &options).unwrap();
    let mut out = Vec::new();
    let info = gzip_decompress(&mut &compressed[..], &mut out).unwrap();
    assert_eq!(out, input);
    assert!(info.text);
    assert_eq!(info.name.as_deref(), Some("data.bin"));
    assert_eq!(info.comment.as_deref(), Some("generated for a test"));
    assert_eq!(info.mtime, 1_700_000_000);
    assert_eq!(info.extra.as_deref(), Some(&[1u8, 2, 3, 4][..]));
}
