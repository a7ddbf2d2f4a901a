//! bzip2 codec backend
//!
//! bzip2 is natively incremental: the low-level stream state accepts partial
//! input and emits output as it becomes available, so [`Bz2Compressor`] and
//! [`Bz2Decompressor`] implement the codec traits directly with real
//! end-of-stream and trailing-data tracking. No buffering adapter involved.

use bzip2::{Action, Compress, Compression, Decompress, Status};

use crate::codec::{Compressor, Decompressor};
use crate::error::{ArcError, Result};

/// Default bzip2 block-size level.
pub const DEFAULT_LEVEL: u32 = 9;

/// Output space reserved per backend call.
const OUT_CHUNK: usize = 8 * 1024;

/// Compress `data` into a single complete bzip2 stream.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut compressor = Bz2Compressor::new();
    let mut out = compressor.compress(data)?;
    out.extend_from_slice(&compressor.flush()?);
    Ok(out)
}

/// Decompress a single complete bzip2 stream.
///
/// Fails with [`ArcError::Decode`] if the stream is truncated or carries
/// trailing bytes.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decompressor = Bz2Decompressor::new();
    let out = decompressor.decompress(data)?;
    if !decompressor.eof() {
        return Err(ArcError::Decode("truncated bzip2 stream".to_string()));
    }
    if !decompressor.unused_data().is_empty() {
        return Err(ArcError::Decode(
            "trailing bytes after bzip2 stream".to_string(),
        ));
    }
    Ok(out)
}

/// Incremental bzip2 compressor.
pub struct Bz2Compressor {
    raw: Compress,
    flushed: bool,
}

impl Bz2Compressor {
    /// New compressor at the default level.
    pub fn new() -> Self {
        Self::with_level(DEFAULT_LEVEL)
    }

    /// New compressor with a block-size level of 1-9.
    pub fn with_level(level: u32) -> Self {
        Bz2Compressor {
            raw: Compress::new(Compression::new(level), 30),
            flushed: false,
        }
    }
}

impl Default for Bz2Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for Bz2Compressor {
    fn compress(&mut self, mut data: &[u8]) -> Result<Vec<u8>> {
        if self.flushed {
            return Err(ArcError::Flushed);
        }

        let mut out = Vec::new();
        while !data.is_empty() {
            out.reserve(OUT_CHUNK);
            let before = self.raw.total_in();
            self.raw
                .compress_vec(data, &mut out, Action::Run)
                .map_err(|e| ArcError::Codec(e.to_string()))?;
            let consumed = (self.raw.total_in() - before) as usize;
            data = &data[consumed..];
        }
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        if self.flushed {
            return Err(ArcError::Flushed);
        }
        self.flushed = true;

        let mut out = Vec::new();
        loop {
            out.reserve(OUT_CHUNK);
            let status = self
                .raw
                .compress_vec(&[], &mut out, Action::Finish)
                .map_err(|e| ArcError::Codec(e.to_string()))?;
            if status == Status::StreamEnd {
                return Ok(out);
            }
        }
    }
}

/// Incremental bzip2 decompressor.
///
/// After the stream's logical end, `eof()` turns true and any further bytes
/// (the start of a concatenated stream, for instance) land in
/// `unused_data()` untouched.
pub struct Bz2Decompressor {
    raw: Decompress,
    eof: bool,
    unused: Vec<u8>,
}

impl Bz2Decompressor {
    pub fn new() -> Self {
        Bz2Decompressor {
            raw: Decompress::new(false),
            eof: false,
            unused: Vec::new(),
        }
    }
}

impl Default for Bz2Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for Bz2Decompressor {
    fn decompress(&mut self, mut data: &[u8]) -> Result<Vec<u8>> {
        if self.eof {
            self.unused.extend_from_slice(data);
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        loop {
            out.reserve(OUT_CHUNK);
            let before_out = out.len();
            let before_in = self.raw.total_in();
            let status = self
                .raw
                .decompress_vec(data, &mut out)
                .map_err(|e| ArcError::Decode(e.to_string()))?;
            let consumed = (self.raw.total_in() - before_in) as usize;
            let produced = out.len() - before_out;
            data = &data[consumed..];

            if status == Status::StreamEnd {
                self.eof = true;
                self.unused.extend_from_slice(data);
                break;
            }
            // Input drained and the backend stopped short of the reserved
            // space: it is waiting for more input.
            if data.is_empty() && produced < OUT_CHUNK {
                break;
            }
            if consumed == 0 && produced == 0 {
                break;
            }
        }
        Ok(out)
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn unused_data(&self) -> &[u8] {
        &self.unused
    }
}
