pub mod compressor;
pub mod constants;
pub mod decompressor;

pub use compressor::{deflate_compress, CompressionMode};
pub use decompressor::deflate_decompress;
