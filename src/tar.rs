//! Sequential-stream archive implementation over the `tar` crate
//!
//! A tar archive is a linear sequence of self-describing records, so every
//! lookup is a forward scan: the read side owns the underlying stream and
//! rewinds it for each query. Header timestamps carry whole seconds since
//! the epoch; sub-second precision does not survive a round trip through
//! [`TarInfo`].

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::archive::{Archive, MemberReader};
use crate::error::{ArcError, Result};
use crate::member::{describe, MemberInfo};

/// Check whether `path` looks like a tar archive (readable with at least
/// one well-formed record).
pub fn is_tar_file<P: AsRef<Path>>(path: P) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut backend = ::tar::Archive::new(file);
    match backend.entries() {
        Ok(mut entries) => matches!(entries.next(), Some(Ok(_))),
        Err(_) => false,
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Metadata for one tar member, owning its `tar::Header` record.
pub struct TarInfo {
    header: ::tar::Header,
}

impl TarInfo {
    /// Synthesize a regular-file record with zero size and the current time.
    pub fn new(name: &str) -> Result<Self> {
        let mut header = ::tar::Header::new_gnu();
        header.set_path(name)?;
        header.set_mode(0o644);
        header.set_size(0);
        header.set_mtime(unix_secs(SystemTime::now()));
        header.set_cksum();
        Ok(TarInfo { header })
    }

    pub(crate) fn from_header(header: ::tar::Header) -> Self {
        TarInfo { header }
    }

    /// The backend record.
    pub fn header(&self) -> &::tar::Header {
        &self.header
    }
}

impl MemberInfo for TarInfo {
    fn filename(&self) -> String {
        self.header
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn set_filename(&mut self, name: &str) -> Result<()> {
        self.header.set_path(name)?;
        self.header.set_cksum();
        Ok(())
    }

    fn size(&self) -> u64 {
        self.header.size().unwrap_or(0)
    }

    fn set_size(&mut self, size: u64) {
        self.header.set_size(size);
        self.header.set_cksum();
    }

    fn mtime(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.header.mtime().unwrap_or(0))
    }

    fn set_mtime(&mut self, mtime: SystemTime) -> Result<()> {
        self.header.set_mtime(unix_secs(mtime));
        self.header.set_cksum();
        Ok(())
    }
}

impl fmt::Display for TarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe("tar", self))
    }
}

enum TarInner<S: Read + Write + Seek> {
    Read(S),
    Write(::tar::Builder<S>),
    Closed,
}

/// Sequential-stream archive handle.
///
/// Opened either for reading ([`open`](TarArchive::open),
/// [`from_reader`](TarArchive::from_reader)) or for writing
/// ([`create`](TarArchive::create), [`from_writer`](TarArchive::from_writer));
/// operations for the other mode fail with [`ArcError::Mode`]. Dropping a
/// write-mode archive finishes it best-effort; call
/// [`close`](Archive::close) to surface errors.
pub struct TarArchive<S: Read + Write + Seek = File> {
    inner: TarInner<S>,
}

impl TarArchive<File> {
    /// Open an existing tar file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_reader(File::open(path)?))
    }

    /// Create a new tar file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<S: Read + Write + Seek> TarArchive<S> {
    /// Open a tar archive for reading from an arbitrary seekable stream.
    pub fn from_reader(stream: S) -> Self {
        TarArchive {
            inner: TarInner::Read(stream),
        }
    }

    /// Start a tar archive on an arbitrary seekable stream.
    pub fn from_writer(stream: S) -> Self {
        TarArchive {
            inner: TarInner::Write(::tar::Builder::new(stream)),
        }
    }

    /// Finalize the archive and hand back the underlying stream.
    pub fn into_inner(mut self) -> Result<S> {
        match std::mem::replace(&mut self.inner, TarInner::Closed) {
            TarInner::Read(stream) => Ok(stream),
            TarInner::Write(builder) => Ok(builder.into_inner()?),
            TarInner::Closed => Err(ArcError::Closed),
        }
    }

    /// Add a member reusing the record behind `info` verbatim, including
    /// mode and ownership fields the normalized contract does not cover.
    /// The record's size drives the backend write; keeping it consistent
    /// with `data.len()` is the caller's responsibility.
    pub fn add_info(&mut self, info: &TarInfo, data: &[u8]) -> Result<()> {
        self.writer()?.append(info.header(), data)?;
        Ok(())
    }

    fn read_stream(&mut self) -> Result<&mut S> {
        match &mut self.inner {
            TarInner::Read(stream) => Ok(stream),
            TarInner::Write(_) => Err(ArcError::Mode("archive opened for writing")),
            TarInner::Closed => Err(ArcError::Closed),
        }
    }

    fn writer(&mut self) -> Result<&mut ::tar::Builder<S>> {
        match &mut self.inner {
            TarInner::Write(builder) => Ok(builder),
            TarInner::Read(_) => Err(ArcError::Mode("archive opened for reading")),
            TarInner::Closed => Err(ArcError::Closed),
        }
    }
}

impl<S: Read + Write + Seek> Archive for TarArchive<S> {
    fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.inner, TarInner::Closed) {
            TarInner::Read(_) => Ok(()),
            TarInner::Write(builder) => {
                builder.into_inner()?;
                Ok(())
            }
            TarInner::Closed => Ok(()),
        }
    }

    fn info_for(&mut self, member: &str) -> Result<Box<dyn MemberInfo>> {
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        for entry in backend.entries()? {
            let entry = entry?;
            if entry.path()?.to_string_lossy() == member {
                return Ok(Box::new(TarInfo::from_header(entry.header().clone())));
            }
        }
        Err(ArcError::MemberNotFound(member.to_string()))
    }

    fn all_info(&mut self) -> Result<Vec<Box<dyn MemberInfo>>> {
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        let mut infos: Vec<Box<dyn MemberInfo>> = Vec::new();
        for entry in backend.entries()? {
            let entry = entry?;
            infos.push(Box::new(TarInfo::from_header(entry.header().clone())));
        }
        Ok(infos)
    }

    fn members(&mut self) -> Result<Vec<String>> {
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        let mut names = Vec::new();
        for entry in backend.entries()? {
            let entry = entry?;
            names.push(entry.path()?.to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn dump(&mut self) -> Result<()> {
        for info in self.all_info()? {
            println!("{}", describe("tar", info.as_ref()));
        }
        Ok(())
    }

    fn add(&mut self, path: &Path, arcname: Option<&str>, recursive: bool) -> Result<()> {
        let name: PathBuf = match arcname {
            Some(a) => PathBuf::from(a),
            None => path.to_path_buf(),
        };
        debug!("adding {} to tar as {}", path.display(), name.display());
        let is_dir = path.is_dir();
        let builder = self.writer()?;
        if is_dir && recursive {
            // The tar backend walks the directory tree itself.
            builder.append_dir_all(&name, path)?;
        } else {
            builder.append_path_with_name(path, &name)?;
        }
        Ok(())
    }

    fn add_data(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut header = ::tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        header.set_mtime(unix_secs(SystemTime::now()));
        header.set_cksum();
        self.writer()?.append_data(&mut header, name, data)?;
        Ok(())
    }

    fn add_data_info(&mut self, info: &dyn MemberInfo, data: &[u8]) -> Result<()> {
        let mut header = ::tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(info.size());
        header.set_mtime(unix_secs(info.mtime()));
        header.set_cksum();
        let name = info.filename();
        self.writer()?.append_data(&mut header, Path::new(&name), data)?;
        Ok(())
    }

    fn extract(&mut self, member: &str, dest: Option<&Path>) -> Result<()> {
        let dest = dest.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dest)?;
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        for entry in backend.entries()? {
            let mut entry = entry?;
            if entry.path()?.to_string_lossy() == member {
                debug!("extracting {} to {}", member, dest.display());
                if !entry.unpack_in(dest)? {
                    debug!("skipped {}: path escapes destination", member);
                }
                return Ok(());
            }
        }
        Err(ArcError::MemberNotFound(member.to_string()))
    }

    fn extract_all(&mut self, dest: Option<&Path>, subset: Option<&[&str]>) -> Result<()> {
        let dest = dest.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dest)?;
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        for entry in backend.entries()? {
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            if subset.map_or(true, |s| s.contains(&name.as_str())) {
                debug!("extracting {} to {}", name, dest.display());
                if !entry.unpack_in(dest)? {
                    debug!("skipped {}: path escapes destination", name);
                }
            }
        }
        Ok(())
    }

    fn open_member(&mut self, member: &str) -> Result<Option<MemberReader>> {
        let stream = self.read_stream()?;
        stream.seek(SeekFrom::Start(0))?;
        let mut backend = ::tar::Archive::new(stream);
        for entry in backend.entries()? {
            let mut entry = entry?;
            if entry.path()?.to_string_lossy() == member {
                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data)?;
                return Ok(Some(MemberReader::new(member, data)));
            }
        }
        Ok(None)
    }
}
