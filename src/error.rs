//! Error types for arclib

use std::io;

/// Result type for arclib operations
pub type Result<T> = std::result::Result<T, ArcError>;

/// Error types that can occur during codec or archive operations
#[derive(Debug)]
pub enum ArcError {
    /// I/O error
    Io(io::Error),
    /// Member not found in archive
    MemberNotFound(String),
    /// Compressor used after it has been flushed
    Flushed,
    /// Operation on a closed archive
    Closed,
    /// Operation not valid for the mode the archive was opened in
    Mode(&'static str),
    /// Codec backend failure (bad parameters, exhausted memory, sequence misuse)
    Codec(String),
    /// Corrupted or invalid compressed data
    Decode(String),
    /// Feature or data the backend cannot handle
    Unsupported(String),
    /// Encrypted member opened without a password
    PasswordRequired(String),
    /// Password did not match the encrypted member
    InvalidPassword(String),
}

impl std::fmt::Display for ArcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArcError::Io(e) => write!(f, "I/O error: {}", e),
            ArcError::MemberNotFound(name) => write!(f, "Member not found: {}", name),
            ArcError::Flushed => write!(f, "Compressor has been flushed"),
            ArcError::Closed => write!(f, "Archive is closed"),
            ArcError::Mode(msg) => write!(f, "Invalid archive mode: {}", msg),
            ArcError::Codec(msg) => write!(f, "Codec error: {}", msg),
            ArcError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ArcError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            ArcError::PasswordRequired(name) => {
                write!(f, "Password required to read member: {}", name)
            }
            ArcError::InvalidPassword(name) => {
                write!(f, "Invalid password for member: {}", name)
            }
        }
    }
}

impl std::error::Error for ArcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArcError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ArcError {
    fn from(err: io::Error) -> Self {
        ArcError::Io(err)
    }
}
