//! # arclib: Format-Agnostic Compression and Archive Access
//!
//! `arclib` puts one interface over incremental (streaming) compression and
//! over archive containers, so call sites can swap the underlying codec or
//! container format without changing shape.
//!
//! ## Features
//!
//! - **Uniform codecs**: [`Compressor`]/[`Decompressor`] traits over gzip,
//!   bzip2 and xz, whether the backend is natively incremental or one-shot
//! - **Buffering adapter**: incremental behavior on top of one-shot
//!   backends, every emitted blob independently decodable
//! - **Uniform archives**: the [`Archive`] trait over tar-style sequential
//!   streams and zip-style indexed directories
//! - **Normalized metadata**: one [`MemberInfo`] shape for member name,
//!   size and modification time across formats
//!
//! ## Quick Start
//!
//! ### Incremental compression
//!
//! ```
//! use arclib::{gz, Compressor};
//!
//! let mut compressor = gz::compressor();
//! let mut out = Vec::new();
//! out.extend(compressor.compress(b"hello, ")?);
//! out.extend(compressor.compress(b"world")?);
//! out.extend(compressor.flush()?);
//!
//! assert_eq!(gz::decompress(&out)?, b"hello, world");
//! # Ok::<(), arclib::ArcError>(())
//! ```
//!
//! ### Reading an archive
//!
//! ```no_run
//! use std::io::Read;
//! use arclib::{Archive, TarArchive};
//!
//! let mut archive = TarArchive::open("bundle.tar")?;
//! for name in archive.members()? {
//!     println!("{}", name);
//! }
//!
//! // "member missing" is a checkable outcome, not an error
//! if let Some(mut member) = archive.open_member("notes.txt")? {
//!     let mut text = String::new();
//!     member.read_to_string(&mut text)?;
//! }
//! # Ok::<(), arclib::ArcError>(())
//! ```
//!
//! ### Writing an archive
//!
//! ```no_run
//! use arclib::{Archive, ZipArchive};
//!
//! let mut archive = ZipArchive::create("bundle.zip")?;
//! archive.add_data("readme.txt", b"hello")?;
//! archive.add(std::path::Path::new("assets"), Some("data"), true)?;
//! archive.close()?;
//! # Ok::<(), arclib::ArcError>(())
//! ```

pub mod archive;
pub mod buffered;
pub mod bz2;
pub mod codec;
pub mod error;
pub mod gz;
pub mod member;
pub mod tar;
pub mod xz;
pub mod zip;

pub use archive::{Archive, MemberReader};
pub use buffered::{BufCompressor, BufDecompressor, OneShotCompress, OneShotDecompress};
pub use bz2::{Bz2Compressor, Bz2Decompressor};
pub use codec::{Compressor, Decompressor};
pub use error::{ArcError, Result};
pub use gz::{GzCompressor, GzDecompressor};
pub use member::{describe, MemberInfo};
pub use crate::tar::{is_tar_file, TarArchive, TarInfo};
pub use crate::zip::{is_zip_file, ZipArchive, ZipInfo};
pub use xz::{XzCompressor, XzDecompressor};
