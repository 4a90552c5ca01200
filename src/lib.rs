#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![forbid(unsafe_code)]

mod compression;
mod counting;
mod crc;
mod directory;
mod errors;
mod mode;
pub mod path;
mod records;
pub mod time;
mod utils;
mod writer;

pub use compression::{
    CompressionMethod, Compressor, DeflateCompressor, StoreCompressor, DEFAULT_COMPRESSION_LEVEL,
};
pub use crc::crc32;
pub use directory::ZipEntryDescriptor;
pub use errors::{Error, ErrorKind};
pub use writer::{ZipArchiveWriter, ZipArchiveWriterBuilder, ZipDirBuilder, ZipFileBuilder};
