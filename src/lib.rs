//! mfs-rs: reader and writer for MFS containers
//!
//! An MFS container bundles named files into one byte blob:
//! - Fixed 34-byte header and 45-byte dictionary entries (little-endian)
//! - Deduplicated string table for names and linked filenames
//! - Per-entry payload compression (Zstd/LZ4), plus one algorithm shared by
//!   the string table and every entry's custom-data blob
//! - External entries whose payload stays in another file on disk
//!
//! # Example
//!
//! ```no_run
//! use mfs_rs::{CompressionMethod, ContainerReader, ContainerWriter, ExternalFileConfig};
//!
//! // Create a container
//! let mut writer = ContainerWriter::new();
//! writer.set_custom_property("Asset bundle");
//! writer.add_file("data.txt", b"Hello, World!", "greeting", CompressionMethod::Zstd);
//! writer.add_external_file(
//!     "intro.wav",
//!     ExternalFileConfig::new("audio.pak", 4096, 88_200),
//!     "",
//!     CompressionMethod::None,
//! );
//! writer.save("bundle.mfs")?;
//!
//! // Read it back; "audio.pak" is looked up next to bundle.mfs
//! let reader = ContainerReader::open("bundle.mfs")?;
//! let data = reader.read_file("data.txt")?;
//! # Ok::<(), mfs_rs::error::MfsError>(())
//! ```

// Core modules
pub mod config;
pub mod container;
pub mod error;

// Re-export commonly used types
pub use config::WriterConfig;
pub use container::{
    CompressionBackend, CompressionMethod, ContainerReader, ContainerWriter, ExternalFileConfig,
    FileEntry, FileHeader, PayloadLocation, StandardBackend, DICTIONARY_ENTRY_SIZE,
    FORMAT_VERSION, HEADER_SIZE, MAGIC_NUMBER,
};
pub use error::{ErrorKind, MfsError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure core types are accessible
        let _method = CompressionMethod::Zstd;
        let _header = FileHeader::new();
        let _writer = ContainerWriter::default();
    }
}
