//! Archive abstraction
//!
//! One polymorphic interface over structurally different container formats:
//! tar-style sequential member streams ([`crate::tar`]) and zip-style
//! indexed directories ([`crate::zip`]). Byte-level container layout is
//! delegated entirely to the backend libraries; this layer unifies member
//! enumeration, metadata access, addition and extraction.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::Result;
use crate::member::MemberInfo;

/// A container of named, sized, timestamped members.
///
/// All operations execute synchronously on the calling thread and assume a
/// single owner; share an archive across threads only with external
/// synchronization. Enumeration preserves the archive's on-disk order, and
/// `members()[i]` always names the record behind `all_info()[i]`.
///
/// Archives are opened either for reading or for writing; calling an
/// operation the current mode does not support fails with
/// [`crate::ArcError::Mode`], and any operation after [`close`](Self::close)
/// fails with [`crate::ArcError::Closed`]. Dropping an archive releases the
/// backend handle on every exit path, so early returns and mid-iteration
/// errors cannot leak it.
pub trait Archive {
    /// Release the backend handle, finalizing any pending writes.
    /// Idempotent; every other operation fails afterwards.
    fn close(&mut self) -> Result<()>;

    /// Metadata for the named member. Fails with
    /// [`crate::ArcError::MemberNotFound`] if no record matches; with
    /// duplicate names the backend-defined match wins.
    fn info_for(&mut self, member: &str) -> Result<Box<dyn MemberInfo>>;

    /// Metadata for every member, in archive order.
    fn all_info(&mut self) -> Result<Vec<Box<dyn MemberInfo>>>;

    /// Every member name, in archive order.
    fn members(&mut self) -> Result<Vec<String>>;

    /// Print a human-readable member listing to stdout. Diagnostic only.
    fn dump(&mut self) -> Result<()>;

    /// Add a file or directory tree from the filesystem.
    ///
    /// `arcname` overrides the name recorded in the archive (for a
    /// directory, the archive-root prefix). With `recursive` set, a
    /// directory's regular files are added one member each.
    fn add(&mut self, path: &Path, arcname: Option<&str>, recursive: bool) -> Result<()>;

    /// Add a member from an in-memory buffer, synthesizing a record with
    /// `size = data.len()` and the current time as mtime.
    fn add_data(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Add a member from an in-memory buffer, reusing an existing record's
    /// fields. The record's `size` is trusted as-is; keeping it consistent
    /// with `data.len()` is the caller's responsibility.
    fn add_data_info(&mut self, info: &dyn MemberInfo, data: &[u8]) -> Result<()>;

    /// Write one member's payload to disk under `dest` (current directory
    /// when `None`). The destination directory is created if absent.
    fn extract(&mut self, member: &str, dest: Option<&Path>) -> Result<()>;

    /// Extract every member, or only those named in `subset`, under `dest`.
    ///
    /// No partial-success bookkeeping: if an error aborts the run,
    /// previously extracted members remain on disk.
    fn extract_all(&mut self, dest: Option<&Path>, subset: Option<&[&str]>) -> Result<()>;

    /// Open one member for reading.
    ///
    /// Returns `Ok(None)` when no member has that name, so "member missing"
    /// stays a checkable outcome distinct from I/O failure.
    fn open_member(&mut self, member: &str) -> Result<Option<MemberReader>>;
}

/// A named, read-only byte source for one archive member.
///
/// Owns its bytes, so it stays valid independently of the archive it came
/// from.
pub struct MemberReader {
    name: String,
    data: Cursor<Vec<u8>>,
}

impl MemberReader {
    pub(crate) fn new(name: &str, data: Vec<u8>) -> Self {
        MemberReader {
            name: name.to_string(),
            data: Cursor::new(data),
        }
    }

    /// The member's filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total payload size in bytes.
    pub fn len(&self) -> u64 {
        self.data.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }
}

impl Read for MemberReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}
