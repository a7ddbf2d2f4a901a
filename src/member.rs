//! Normalized archive member metadata
//!
//! Each archive format stores member metadata in its own record layout; the
//! [`MemberInfo`] trait exposes one shape (name, uncompressed size,
//! modification time) over all of them. Concrete types own their backend
//! record as a value; callers never touch the backend encoding directly.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Metadata for one archive member.
///
/// `size` is always the uncompressed byte count. `mtime` uses [`SystemTime`]
/// as the normalized clock type; how much precision survives a round trip
/// depends on the backend record (see [`crate::tar::TarInfo`] and
/// [`crate::zip::ZipInfo`]).
pub trait MemberInfo {
    /// The member's filename within the archive. Duplicate names may exist;
    /// this layer does not enforce uniqueness.
    fn filename(&self) -> String;

    /// Rename the member. Fails if the backend record cannot represent the
    /// name (for instance an over-long tar path).
    fn set_filename(&mut self, name: &str) -> Result<()>;

    /// Uncompressed content size in bytes.
    fn size(&self) -> u64;

    fn set_size(&mut self, size: u64);

    /// Modification time.
    fn mtime(&self) -> SystemTime;

    /// Set the modification time. Fails if the backend record cannot
    /// represent the instant (for instance a pre-1980 date in a zip entry).
    fn set_mtime(&mut self, mtime: SystemTime) -> Result<()>;
}

/// Render a one-line description of a member, e.g. `tar::Info("a.txt", 12, 1700000000)`.
///
/// Free function rather than part of the trait so the abstract contract
/// stays limited to data accessors; the concrete types' `Display` impls
/// call it.
pub fn describe(kind: &str, info: &dyn MemberInfo) -> String {
    let secs = info
        .mtime()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{}::Info({:?}, {}, {})",
        kind,
        info.filename(),
        info.size(),
        secs
    )
}
