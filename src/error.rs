use thiserror::Error;

/// Every way a `z7` codec operation can fail.
///
/// Decoder-side variants arise only while decompressing; the compressor is
/// infallible apart from [`Z7Error::Io`].
#[derive(Debug, Error)]
pub enum Z7Error {
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    #[error("invalid DEFLATE block type (BTYPE=11 is reserved)")]
    InvalidBlockType,

    #[error("stored block length mismatch: LEN={len:#06x} NLEN={nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    #[error("invalid Huffman code encountered while decoding")]
    InvalidCode,

    #[error("invalid code-length run (repeat-previous with no previous length)")]
    InvalidCodeLengthRun,

    #[error("invalid back-reference distance {distance} (window holds {available} bytes)")]
    InvalidDistance { distance: usize, available: usize },

    #[error("invalid gzip header")]
    InvalidGzipHeader,

    #[error("unsupported gzip compression method {0} (only CM=8/DEFLATE is supported)")]
    UnsupportedGzipMethod(u8),

    #[error("gzip header CRC-16 mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    HeaderCrcMismatch { expected: u16, computed: u16 },

    #[error("gzip trailer CRC-32 mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("gzip trailer ISIZE mismatch: expected {expected}, computed {computed}")]
    SizeMismatch { expected: u32, computed: u32 },

    #[error("ring buffer read from an empty buffer")]
    RingBufferEmptyRead,

    #[error("ring buffer read at offset {offset} of length {length} is out of range (live range is {available})")]
    RingBufferInvalidOffsetRead {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Z7Result<T> = Result<T, Z7Error>;
