//! Incremental compression and decompression contracts
//!
//! Every codec backend in this crate satisfies one of two small capability
//! traits: [`Compressor`] (feed bytes, get bytes, explicit terminal flush)
//! and [`Decompressor`] (feed bytes, get bytes, end-of-stream flag, trailing
//! unused bytes). Backends that are natively incremental ([`crate::bz2`],
//! [`crate::xz`]) implement them directly; one-shot backends are adapted
//! through [`crate::buffered`].

use crate::error::Result;

/// Incremental compressor.
///
/// A compressor starts out active, accepts any number of `compress` calls,
/// and is finished with a single `flush`. Both calls may return an empty
/// buffer when the backend is still accumulating input; callers must
/// concatenate every non-empty result to obtain the compressed stream.
pub trait Compressor {
    /// Feed a chunk of input, returning whatever compressed bytes are ready.
    ///
    /// Fails with [`crate::ArcError::Flushed`] once `flush` has been called.
    fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Finish the stream and return all remaining compressed bytes.
    ///
    /// Terminal: any further `compress` or `flush` call fails with
    /// [`crate::ArcError::Flushed`].
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Incremental decompressor.
pub trait Decompressor {
    /// Feed a chunk of compressed input, returning whatever decoded bytes
    /// are ready. An empty result means the backend needs more input; it is
    /// not an error. Corrupted data fails with [`crate::ArcError::Decode`].
    fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// True once the backend has seen the logical end of the stream.
    fn eof(&self) -> bool;

    /// Bytes fed past the end of the stream, typically the start of a
    /// subsequent concatenated stream. May be empty even at eof.
    fn unused_data(&self) -> &[u8];
}
