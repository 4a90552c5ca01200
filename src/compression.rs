//! Compression filters applied to entry data.
//!
//! A filter sits between the uncompressed bytes handed to the archive writer
//! and the bytes emitted to the destination. Filters may buffer internally,
//! so the number of bytes produced by [`Compressor::feed`] is unrelated to the
//! number of bytes consumed, but the total produced across every `feed` call
//! plus [`Compressor::finish`] is the entry's compressed size.

use crate::Error;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

/// Default Deflate level, matching zlib.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// The compression method recorded for an entry.
///
/// Documented in the APPNOTE under: 4.4.5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Data is stored as is.
    Store,

    /// Raw Deflate stream (RFC 1951).
    Deflate,
}

impl CompressionMethod {
    /// The method identifier written to local and central headers.
    #[must_use]
    pub const fn as_id(&self) -> u16 {
        match self {
            CompressionMethod::Store => 0,
            CompressionMethod::Deflate => 8,
        }
    }

    /// Creates a fresh filter for this method.
    ///
    /// `level` only applies to Deflate and is clamped to 0..=9.
    #[must_use]
    pub fn compressor(&self, level: u32) -> Box<dyn Compressor> {
        match self {
            CompressionMethod::Store => Box::new(StoreCompressor),
            CompressionMethod::Deflate => Box::new(DeflateCompressor::new(level)),
        }
    }
}

/// A streaming transform over the bytes of one entry.
///
/// A compressor is created per entry and consumed by [`Compressor::finish`],
/// so it can't be reused once the entry is closed.
pub trait Compressor: std::fmt::Debug {
    /// The method identifier the produced bytes conform to.
    fn method(&self) -> CompressionMethod;

    /// Consumes `input` and appends any bytes ready to be emitted to `output`.
    fn feed(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), Error>;

    /// Flushes buffered state, appending the trailing bytes to `output`.
    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<(), Error>;
}

/// The identity filter: every call produces exactly its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCompressor;

impl Compressor for StoreCompressor {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Store
    }

    #[inline]
    fn feed(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), Error> {
        output.extend_from_slice(input);
        Ok(())
    }

    fn finish(self: Box<Self>, _output: &mut Vec<u8>) -> Result<(), Error> {
        Ok(())
    }
}

/// Raw Deflate filter backed by flate2.
#[derive(Debug)]
pub struct DeflateCompressor {
    encoder: DeflateEncoder<Vec<u8>>,
}

impl DeflateCompressor {
    /// Creates a Deflate filter at the given level (clamped to 0..=9).
    pub fn new(level: u32) -> Self {
        DeflateCompressor {
            encoder: DeflateEncoder::new(Vec::new(), Compression::new(level.min(9))),
        }
    }
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Compressor for DeflateCompressor {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }

    fn feed(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), Error> {
        self.encoder.write_all(input)?;
        output.append(self.encoder.get_mut());
        Ok(())
    }

    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<(), Error> {
        let tail = self.encoder.finish()?;
        output.extend_from_slice(&tail);
        Ok(())
    }
}
