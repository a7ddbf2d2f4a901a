//! xz/lzma codec backend
//!
//! Like bzip2, liblzma is natively incremental, so the codec traits are
//! implemented directly over `xz2::stream::Stream` with real end-of-stream
//! and trailing-data tracking.

use xz2::stream::{Action, Check, Status, Stream};

use crate::codec::{Compressor, Decompressor};
use crate::error::{ArcError, Result};

/// Default xz preset.
pub const DEFAULT_PRESET: u32 = 6;

/// Output space reserved per backend call.
const OUT_CHUNK: usize = 8 * 1024;

/// Compress `data` into a single complete .xz stream.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut compressor = XzCompressor::new()?;
    let mut out = compressor.compress(data)?;
    out.extend_from_slice(&compressor.flush()?);
    Ok(out)
}

/// Decompress a single complete .xz stream.
///
/// Fails with [`ArcError::Decode`] if the stream is truncated or carries
/// trailing bytes.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decompressor = XzDecompressor::new()?;
    let out = decompressor.decompress(data)?;
    if !decompressor.eof() {
        return Err(ArcError::Decode("truncated xz stream".to_string()));
    }
    if !decompressor.unused_data().is_empty() {
        return Err(ArcError::Decode("trailing bytes after xz stream".to_string()));
    }
    Ok(out)
}

/// Incremental xz compressor.
pub struct XzCompressor {
    raw: Stream,
    flushed: bool,
}

impl XzCompressor {
    /// New compressor at the default preset.
    pub fn new() -> Result<Self> {
        Self::with_preset(DEFAULT_PRESET)
    }

    /// New compressor with an xz preset of 0-9.
    pub fn with_preset(preset: u32) -> Result<Self> {
        let raw = Stream::new_easy_encoder(preset, Check::Crc64)
            .map_err(|e| ArcError::Codec(e.to_string()))?;
        Ok(XzCompressor {
            raw,
            flushed: false,
        })
    }
}

impl Compressor for XzCompressor {
    fn compress(&mut self, mut data: &[u8]) -> Result<Vec<u8>> {
        if self.flushed {
            return Err(ArcError::Flushed);
        }

        let mut out = Vec::new();
        while !data.is_empty() {
            out.reserve(OUT_CHUNK);
            let before = self.raw.total_in();
            self.raw
                .process_vec(data, &mut out, Action::Run)
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
                .process_vec(&[], &mut out, Action::Finish)
                .map_err(|e| ArcError::Codec(e.to_string()))?;
            if status == Status::StreamEnd {
                return Ok(out);
            }
        }
    }
}

/// Incremental xz decompressor.
pub struct XzDecompressor {
    raw: Stream,
    eof: bool,
    unused: Vec<u8>,
}

impl XzDecompressor {
    pub fn new() -> Result<Self> {
        let raw = Stream::new_stream_decoder(u64::MAX, 0)
            .map_err(|e| ArcError::Codec(e.to_string()))?;
        Ok(XzDecompressor {
            raw,
            eof: false,
            unused: Vec::new(),
        })
    }
}

impl Decompressor for XzDecompressor {
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
                .process_vec(data, &mut out, Action::Run)
                .map_err(|e| ArcError::Decode(e.to_string()))?;
            let consumed = (self.raw.total_in() - before_in) as usize;
            let produced = out.len() - before_out;
            data = &data[consumed..];

            if status == Status::StreamEnd {
                self.eof = true;
                self.unused.extend_from_slice(data);
                break;
            }
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
