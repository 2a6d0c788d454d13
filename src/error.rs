use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for container operations
pub type Result<T> = std::result::Result<T, MfsError>;

/// Coarse classification of an [`MfsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed container bytes: bad magic, unknown codes, bad offsets
    Format,
    /// Filesystem failure, including missing external files
    Io,
    /// The compression backend rejected the data
    Compression,
    /// A file name that is not in the container
    Lookup,
    /// Invalid writer configuration
    Config,
}

/// Unified error type for all container operations
#[derive(Debug, Error)]
pub enum MfsError {
    // Format errors
    #[error("Invalid container: bad magic number")]
    InvalidMagic,

    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid compression method: {0}")]
    InvalidCompression(u8),

    #[error("Truncated {context}: need {needed} bytes, {available} available")]
    Truncated {
        context: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("{context} out of bounds: offset {offset} + length {length} exceeds {available} bytes")]
    OutOfBounds {
        context: &'static str,
        offset: u64,
        length: u64,
        available: u64,
    },

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(String),

    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    // Compression errors
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read external file {}: {source}", .path.display())]
    ExternalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Lookup errors
    #[error("File not found in container: {0}")]
    FileNotFound(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MfsError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MfsError::InvalidMagic
            | MfsError::UnsupportedVersion(_)
            | MfsError::InvalidCompression(_)
            | MfsError::Truncated { .. }
            | MfsError::OutOfBounds { .. }
            | MfsError::InvalidUtf8(_)
            | MfsError::InvalidFormat(_) => ErrorKind::Format,
            MfsError::CompressionFailed(_) | MfsError::DecompressionFailed(_) => {
                ErrorKind::Compression
            }
            MfsError::Io(_) | MfsError::ExternalFile { .. } => ErrorKind::Io,
            MfsError::FileNotFound(_) => ErrorKind::Lookup,
            MfsError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    pub fn is_io_error(&self) -> bool {
        self.kind() == ErrorKind::Io
    }

    pub fn is_compression_error(&self) -> bool {
        self.kind() == ErrorKind::Compression
    }
}

impl From<toml::de::Error> for MfsError {
    fn from(err: toml::de::Error) -> Self {
        MfsError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MfsError {
    fn from(err: toml::ser::Error) -> Self {
        MfsError::Config(err.to_string())
    }
}
