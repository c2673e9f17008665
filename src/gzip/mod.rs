pub mod compressor;
pub mod constants;
pub mod decompressor;

pub use compressor::{gzip_compress, GzipOptions};
pub use decompressor::{gzip_decompress, GzipHeaderInfo};
