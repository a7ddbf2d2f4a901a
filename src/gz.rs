//! gzip codec backend
//!
//! flate2's gzip interface is used here as a one-shot backend: each call to
//! [`compress`] produces a complete gzip member. Incremental behavior comes
//! from the buffering adapters in [`crate::buffered`], so the stream a
//! [`GzCompressor`] emits is a sequence of independent gzip members.
//! [`decompress`] therefore decodes concatenated members, not just the
//! first one.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::buffered::{BufCompressor, BufDecompressor, OneShotCompress, OneShotDecompress};
use crate::error::{ArcError, Result};

/// Default gzip compression level.
pub const DEFAULT_LEVEL: u32 = 9;

/// Compress `data` into a single gzip member at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_with_level(data, DEFAULT_LEVEL)
}

/// Compress `data` into a single gzip member at the given level (0-9).
pub fn compress_with_level(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(data.len() / 2 + 64),
        Compression::new(level),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a sequence of one or more concatenated gzip members.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ArcError::Decode(e.to_string()))?;
    Ok(out)
}

/// One-shot gzip backend for the buffering adapters.
pub struct GzBackend {
    level: u32,
}

impl GzBackend {
    pub fn new(level: u32) -> Self {
        GzBackend { level }
    }
}

impl Default for GzBackend {
    fn default() -> Self {
        GzBackend::new(DEFAULT_LEVEL)
    }
}

impl OneShotCompress for GzBackend {
    fn compress_all(&self, data: &[u8]) -> Result<Vec<u8>> {
        compress_with_level(data, self.level)
    }
}

impl OneShotDecompress for GzBackend {
    fn decompress_all(&self, data: &[u8]) -> Result<Vec<u8>> {
        decompress(data)
    }
}

/// Incremental gzip compressor (buffering adapter over [`GzBackend`]).
pub type GzCompressor = BufCompressor<GzBackend>;

/// Incremental gzip decompressor (buffering adapter over [`GzBackend`]).
///
/// Inherits the adapter's limitation: `eof()` is always `false` and
/// `unused_data()` is always empty.
pub type GzDecompressor = BufDecompressor<GzBackend>;

/// Incremental gzip compressor at the default level.
pub fn compressor() -> GzCompressor {
    BufCompressor::new(GzBackend::default())
}

/// Incremental gzip compressor at the given level (0-9).
pub fn compressor_with_level(level: u32) -> GzCompressor {
    BufCompressor::new(GzBackend::new(level))
}

/// Incremental gzip decompressor.
pub fn decompressor() -> GzDecompressor {
    BufDecompressor::new(GzBackend::default())
}
