//! Buffering adapters that present the incremental codec contracts on top
//! of one-shot backends
//!
//! Some compression backends only operate on a complete buffer at a time:
//! every call produces an independently decodable unit for exactly the bytes
//! it was given, with no state carried between calls. [`BufCompressor`] and
//! [`BufDecompressor`] adapt such backends to the [`Compressor`] and
//! [`Decompressor`] traits.
//!
//! The compressor side encodes each chunk independently and re-chunks the
//! already-compressed units through a threshold-triggered output buffer.
//! Every emitted blob is independently decodable, but the compression ratio
//! is worse than a true streaming codec and tiny chunks are dominated by
//! per-unit overhead. Callers who control chunk sizes should feed chunks
//! near the threshold.

use crate::codec::{Compressor, Decompressor};
use crate::error::{ArcError, Result};

/// Default output buffer threshold for [`BufCompressor`], in bytes.
///
/// A practical chunking granularity, not a protocol limit.
pub const DEFAULT_THRESHOLD: usize = 4096;

/// A compression backend that can only encode a complete buffer at once.
///
/// Implementors declare conformance where the wrapping type is defined; no
/// runtime registration is involved.
pub trait OneShotCompress {
    /// Encode `data` as one complete, independently decodable unit.
    fn compress_all(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// A decompression backend that can only decode a complete unit at once.
pub trait OneShotDecompress {
    /// Decode a complete sequence of units produced by the matching
    /// one-shot compressor.
    fn decompress_all(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Incremental compressor over a one-shot backend.
pub struct BufCompressor<B> {
    backend: B,
    buffer: Vec<u8>,
    threshold: usize,
    flushed: bool,
}

impl<B: OneShotCompress> BufCompressor<B> {
    /// Wrap a one-shot backend with the default threshold.
    pub fn new(backend: B) -> Self {
        Self::with_threshold(backend, DEFAULT_THRESHOLD)
    }

    /// Wrap a one-shot backend with a custom output buffer threshold.
    pub fn with_threshold(backend: B, threshold: usize) -> Self {
        BufCompressor {
            backend,
            buffer: Vec::new(),
            threshold,
            flushed: false,
        }
    }

    fn check_active(&self) -> Result<()> {
        if self.flushed {
            Err(ArcError::Flushed)
        } else {
            Ok(())
        }
    }
}

impl<B: OneShotCompress> Compressor for BufCompressor<B> {
    fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.check_active()?;
        let encoded = self.backend.compress_all(data)?;

        if self.buffer.len() + encoded.len() > self.threshold {
            // Hand the buffered units to the caller and start over with the
            // freshly encoded one.
            Ok(std::mem::replace(&mut self.buffer, encoded))
        } else {
            self.buffer.extend_from_slice(&encoded);
            Ok(Vec::new())
        }
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        self.check_active()?;
        self.flushed = true;
        Ok(std::mem::take(&mut self.buffer))
    }
}

/// Incremental decompressor over a one-shot backend.
///
/// Each `decompress` call appends to an accumulation buffer and retries a
/// one-shot decode of everything seen so far. Until the buffer forms a
/// complete unit the decode fails and an empty chunk is returned; the buffer
/// is never cleared, so a successful decode returns the full plaintext for
/// all input seen so far.
///
/// Limitation: the one-shot backend exposes no in-progress vs. done signal,
/// so this adapter reports `eof()` as `false` and `unused_data()` as empty
/// unconditionally, even after decoding a complete stream or when fed
/// concatenated streams. Callers that need trailing-data detection must use
/// a natively incremental codec such as [`crate::bz2`] or [`crate::xz`].
pub struct BufDecompressor<B> {
    backend: B,
    buffer: Vec<u8>,
}

impl<B: OneShotDecompress> BufDecompressor<B> {
    /// Wrap a one-shot backend.
    pub fn new(backend: B) -> Self {
        BufDecompressor {
            backend,
            buffer: Vec::new(),
        }
    }
}

impl<B: OneShotDecompress> Decompressor for BufDecompressor<B> {
    fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.buffer.extend_from_slice(data);
        match self.backend.decompress_all(&self.buffer) {
            Ok(decoded) => Ok(decoded),
            // The backend cannot distinguish "incomplete" from "corrupt";
            // treat every failure as need-more-input and keep accumulating.
            Err(_) => Ok(Vec::new()),
        }
    }

    fn eof(&self) -> bool {
        false
    }

    fn unused_data(&self) -> &[u8] {
        &[]
    }
}
