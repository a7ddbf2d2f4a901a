//! Indexed archive implementation over the `zip` crate
//!
//! Zip files carry a central directory, so members are addressed through an
//! index rather than a linear scan. Enumeration still follows directory
//! order. Entry timestamps are stored as a six-field calendar tuple with no
//! sub-second precision: converting an mtime with fractional seconds into a
//! [`ZipInfo`] silently truncates, and converting back yields a timestamp
//! with zero fractional component. The truncation is a fixpoint, so the
//! second conversion is lossless.
//!
//! The zip format supports per-entry encryption; reading an encrypted
//! member without a credential fails with [`ArcError::PasswordRequired`].

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use time::OffsetDateTime;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;

use crate::archive::{Archive, MemberReader};
use crate::error::{ArcError, Result};
use crate::member::{describe, MemberInfo};

/// Check whether `path` looks like a zip archive (has a readable central
/// directory).
pub fn is_zip_file<P: AsRef<Path>>(path: P) -> bool {
    match File::open(path) {
        Ok(file) => ::zip::ZipArchive::new(file).is_ok(),
        Err(_) => false,
    }
}

fn now_date_time() -> ::zip::DateTime {
    ::zip::DateTime::try_from(OffsetDateTime::now_utc()).unwrap_or_default()
}

fn to_date_time(mtime: SystemTime) -> Result<::zip::DateTime> {
    ::zip::DateTime::try_from(OffsetDateTime::from(mtime))
        .map_err(|e| ArcError::Unsupported(format!("timestamp outside zip range: {}", e)))
}

fn map_zip_err(name: &str, err: ZipError) -> ArcError {
    match err {
        ZipError::Io(e) => ArcError::Io(e),
        ZipError::FileNotFound => ArcError::MemberNotFound(name.to_string()),
        ZipError::InvalidPassword => ArcError::InvalidPassword(name.to_string()),
        ZipError::UnsupportedArchive(msg) if msg.contains("Password required") => {
            ArcError::PasswordRequired(name.to_string())
        }
        ZipError::UnsupportedArchive(msg) => ArcError::Unsupported(msg.to_string()),
        ZipError::InvalidArchive(msg) => ArcError::Decode(msg.to_string()),
        other => ArcError::Codec(other.to_string()),
    }
}

/// Compute the member name for a file found under `root` during a
/// recursive add: the path relative to `root`, joined with `/`, prefixed
/// with `arcname` when given. Trailing separators on `root` do not change
/// the result; `arcname` may itself contain separators and is used
/// verbatim as a prefix.
fn member_name_for(root: &Path, path: &Path, arcname: Option<&str>) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let name = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    match arcname {
        Some(prefix) if !prefix.is_empty() => {
            let prefix = prefix.trim_end_matches('/');
            if name.is_empty() {
                prefix.to_string()
            } else {
                format!("{}/{}", prefix, name)
            }
        }
        _ => name,
    }
}

/// Metadata for one zip member.
///
/// Owns a normalized copy of the central-directory record: name,
/// uncompressed size, and the format's six-field calendar timestamp.
pub struct ZipInfo {
    name: String,
    size: u64,
    modified: ::zip::DateTime,
}

impl ZipInfo {
    /// Synthesize a record with zero size and the current time.
    pub fn new(name: &str) -> Self {
        ZipInfo {
            name: name.to_string(),
            size: 0,
            modified: now_date_time(),
        }
    }

    /// The backend calendar timestamp.
    pub fn date_time(&self) -> ::zip::DateTime {
        self.modified
    }
}

impl MemberInfo for ZipInfo {
    fn filename(&self) -> String {
        self.name.clone()
    }

    fn set_filename(&mut self, name: &str) -> Result<()> {
        self.name = name.to_string();
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    fn mtime(&self) -> SystemTime {
        self.modified
            .to_time()
            .map(SystemTime::from)
            .unwrap_or(UNIX_EPOCH)
    }

    fn set_mtime(&mut self, mtime: SystemTime) -> Result<()> {
        // Lossy: fractional seconds are truncated by the calendar record.
        self.modified = to_date_time(mtime)?;
        Ok(())
    }
}

impl fmt::Display for ZipInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe("zip", self))
    }
}

enum ZipInner<S: Read + Write + Seek> {
    Read(::zip::ZipArchive<S>),
    Write(::zip::ZipWriter<S>),
    Closed,
}

/// Indexed archive handle.
///
/// Opened either for reading ([`open`](ZipArchive::open),
/// [`from_reader`](ZipArchive::from_reader)) or for writing
/// ([`create`](ZipArchive::create), [`from_writer`](ZipArchive::from_writer));
/// operations for the other mode fail with [`ArcError::Mode`]. Dropping a
/// write-mode archive finalizes it best-effort; call
/// [`close`](Archive::close) to surface errors.
pub struct ZipArchive<S: Read + Write + Seek = File> {
    inner: ZipInner<S>,
}

impl ZipArchive<File> {
    /// Open an existing zip file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Create a new zip file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<S: Read + Write + Seek> ZipArchive<S> {
    /// Open a zip archive for reading from an arbitrary seekable stream.
    pub fn from_reader(stream: S) -> Result<Self> {
        let backend = ::zip::ZipArchive::new(stream).map_err(|e| map_zip_err("", e))?;
        Ok(ZipArchive {
            inner: ZipInner::Read(backend),
        })
    }

    /// Start a zip archive on an arbitrary seekable stream.
    pub fn from_writer(stream: S) -> Self {
        ZipArchive {
            inner: ZipInner::Write(::zip::ZipWriter::new(stream)),
        }
    }

    /// Finalize the archive and hand back the underlying stream.
    pub fn into_inner(mut self) -> Result<S> {
        match std::mem::replace(&mut self.inner, ZipInner::Closed) {
            ZipInner::Read(backend) => Ok(backend.into_inner()),
            ZipInner::Write(writer) => writer.finish().map_err(|e| map_zip_err("", e)),
            ZipInner::Closed => Err(ArcError::Closed),
        }
    }

    /// Add a member from an in-memory buffer, encrypted with the legacy
    /// ZipCrypto scheme under `password`.
    pub fn add_data_with_password(&mut self, name: &str, data: &[u8], password: &str) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .last_modified_time(now_date_time())
            .with_deprecated_encryption(password.as_bytes());
        let writer = self.writer()?;
        writer
            .start_file(name, options)
            .map_err(|e| map_zip_err(name, e))?;
        writer.write_all(data)?;
        Ok(())
    }

    /// Like [`open_member`](Archive::open_member), decrypting the entry
    /// with `password`.
    pub fn open_member_with_password(
        &mut self,
        member: &str,
        password: &str,
    ) -> Result<Option<MemberReader>> {
        self.open_impl(member, Some(password.as_bytes()))
    }

    /// Like [`extract`](Archive::extract), decrypting the entry with
    /// `password`.
    pub fn extract_with_password(
        &mut self,
        member: &str,
        dest: Option<&Path>,
        password: &str,
    ) -> Result<()> {
        self.extract_impl(member, dest, Some(password.as_bytes()))
    }

    /// Like [`extract_all`](Archive::extract_all), decrypting entries with
    /// `password`.
    pub fn extract_all_with_password(
        &mut self,
        dest: Option<&Path>,
        subset: Option<&[&str]>,
        password: &str,
    ) -> Result<()> {
        self.extract_all_impl(dest, subset, Some(password.as_bytes()))
    }

    fn reader(&mut self) -> Result<&mut ::zip::ZipArchive<S>> {
        match &mut self.inner {
            ZipInner::Read(backend) => Ok(backend),
            ZipInner::Write(_) => Err(ArcError::Mode("archive opened for writing")),
            ZipInner::Closed => Err(ArcError::Closed),
        }
    }

    fn writer(&mut self) -> Result<&mut ::zip::ZipWriter<S>> {
        match &mut self.inner {
            ZipInner::Write(writer) => Ok(writer),
            ZipInner::Read(_) => Err(ArcError::Mode("archive opened for reading")),
            ZipInner::Closed => Err(ArcError::Closed),
        }
    }

    fn open_impl(&mut self, member: &str, password: Option<&[u8]>) -> Result<Option<MemberReader>> {
        let backend = self.reader()?;
        let result = match password {
            Some(pw) => backend.by_name_decrypt(member, pw),
            None => backend.by_name(member),
        };
        let mut entry = match result {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(map_zip_err(member, e)),
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(Some(MemberReader::new(member, data)))
    }

    fn extract_impl(
        &mut self,
        member: &str,
        dest: Option<&Path>,
        password: Option<&[u8]>,
    ) -> Result<()> {
        let dest = dest.unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dest)?;
        let backend = self.reader()?;
        let result = match password {
            Some(pw) => backend.by_name_decrypt(member, pw),
            None => backend.by_name(member),
        };
        let mut entry = result.map_err(|e| map_zip_err(member, e))?;

        let rel = entry.enclosed_name().ok_or_else(|| {
            ArcError::Unsupported(format!("member path escapes destination: {}", member))
        })?;
        let out_path = dest.join(rel);
        debug!("extracting {} to {}", member, out_path.display());
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            return Ok(());
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        Ok(())
    }

    fn extract_all_impl(
        &mut self,
        dest: Option<&Path>,
        subset: Option<&[&str]>,
        password: Option<&[u8]>,
    ) -> Result<()> {
        let names = self.members()?;
        for name in names {
            if subset.map_or(true, |s| s.contains(&name.as_str())) {
                self.extract_impl(&name, dest, password)?;
            }
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, name: &str) -> Result<()> {
        debug!("adding {} to zip as {}", path.display(), name);
        let mtime = fs::metadata(path)?
            .modified()
            .unwrap_or_else(|_| SystemTime::now());
        let mut options = SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        if let Ok(dt) = ::zip::DateTime::try_from(OffsetDateTime::from(mtime)) {
            options = options.last_modified_time(dt);
        }
        let writer = self.writer()?;
        writer
            .start_file(name, options)
            .map_err(|e| map_zip_err(name, e))?;
        let mut file = File::open(path)?;
        io::copy(&mut file, writer)?;
        Ok(())
    }
}

impl<S: Read + Write + Seek> Archive for ZipArchive<S> {
    fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.inner, ZipInner::Closed) {
            ZipInner::Read(_) => Ok(()),
            ZipInner::Write(writer) => {
                writer.finish().map_err(|e| map_zip_err("", e))?;
                Ok(())
            }
            ZipInner::Closed => Ok(()),
        }
    }

    fn info_for(&mut self, member: &str) -> Result<Box<dyn MemberInfo>> {
        let backend = self.reader()?;
        let index = backend
            .index_for_name(member)
            .ok_or_else(|| ArcError::MemberNotFound(member.to_string()))?;
        // Raw access reads metadata without decompressing or decrypting.
        let entry = backend
            .by_index_raw(index)
            .map_err(|e| map_zip_err(member, e))?;
        Ok(Box::new(ZipInfo {
            name: entry.name().to_string(),
            size: entry.size(),
            modified: entry.last_modified().unwrap_or_default(),
        }))
    }

    fn all_info(&mut self) -> Result<Vec<Box<dyn MemberInfo>>> {
        let backend = self.reader()?;
        let mut infos: Vec<Box<dyn MemberInfo>> = Vec::with_capacity(backend.len());
        for index in 0..backend.len() {
            let entry = backend
                .by_index_raw(index)
                .map_err(|e| map_zip_err("", e))?;
            infos.push(Box::new(ZipInfo {
                name: entry.name().to_string(),
                size: entry.size(),
                modified: entry.last_modified().unwrap_or_default(),
            }));
        }
        Ok(infos)
    }

    fn members(&mut self) -> Result<Vec<String>> {
        let backend = self.reader()?;
        Ok((0..backend.len())
            .filter_map(|i| backend.name_for_index(i).map(str::to_string))
            .collect())
    }

    fn dump(&mut self) -> Result<()> {
        for info in self.all_info()? {
            println!("{}", describe("zip", info.as_ref()));
        }
        Ok(())
    }

    fn add(&mut self, path: &Path, arcname: Option<&str>, recursive: bool) -> Result<()> {
        if path.is_dir() && recursive {
            // The zip backend has no directory-walk of its own.
            for entry in WalkDir::new(path) {
                let entry = entry.map_err(io::Error::from)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = member_name_for(path, entry.path(), arcname);
                self.write_file(entry.path(), &name)?;
            }
            Ok(())
        } else {
            let name = match arcname {
                Some(a) => a.to_string(),
                None => path.to_string_lossy().into_owned(),
            };
            self.write_file(path, &name)
        }
    }

    fn add_data(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .last_modified_time(now_date_time());
        let writer = self.writer()?;
        writer
            .start_file(name, options)
            .map_err(|e| map_zip_err(name, e))?;
        writer.write_all(data)?;
        Ok(())
    }

    fn add_data_info(&mut self, info: &dyn MemberInfo, data: &[u8]) -> Result<()> {
        let name = info.filename();
        let options = SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .last_modified_time(to_date_time(info.mtime())?);
        let writer = self.writer()?;
        writer
            .start_file(&name, options)
            .map_err(|e| map_zip_err(&name, e))?;
        writer.write_all(data)?;
        Ok(())
    }

    fn extract(&mut self, member: &str, dest: Option<&Path>) -> Result<()> {
        self.extract_impl(member, dest, None)
    }

    fn extract_all(&mut self, dest: Option<&Path>, subset: Option<&[&str]>) -> Result<()> {
        self.extract_all_impl(dest, subset, None)
    }

    fn open_member(&mut self, member: &str) -> Result<Option<MemberReader>> {
        self.open_impl(member, None)
    }
}

#[cfg(test)]
mod tests {
    use super::member_name_for;
    use std::path::Path;

    #[test]
    fn member_name_strips_root() {
        let name = member_name_for(Path::new("a"), Path::new("a/b.txt"), None);
        assert_eq!(name, "b.txt");
    }

    #[test]
    fn member_name_ignores_trailing_separator_on_root() {
        for root in ["a", "a/", "a//"] {
            let name = member_name_for(Path::new(root), Path::new("a/sub/b.txt"), Some("x"));
            assert_eq!(name, "x/sub/b.txt", "root {:?}", root);
        }
    }

    #[test]
    fn member_name_keeps_separators_in_arcname() {
        let name = member_name_for(Path::new("a"), Path::new("a/b.txt"), Some("x/y"));
        assert_eq!(name, "x/y/b.txt");
        let name = member_name_for(Path::new("a"), Path::new("a/b.txt"), Some("x/"));
        assert_eq!(name, "x/b.txt");
    }
}
