use crate::container::format::{CompressionMethod, PayloadLocation};
use crate::container::reader::ContainerReader;
use crate::error::Result;
use std::fmt;

/// Dictionary entry with its strings and custom data resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryRecord {
    pub name: String,
    pub location: PayloadLocation,
    pub compression: CompressionMethod,
    pub uncompressed_length: u64,
    pub custom_data: String,
}

/// Handle to one file in a [`ContainerReader`]
///
/// Borrows the reader, so any number of handles can be alive and read from
/// different threads at once.
#[derive(Clone, Copy)]
pub struct FileEntry<'a> {
    reader: &'a ContainerReader,
    record: &'a EntryRecord,
}

impl<'a> FileEntry<'a> {
    pub(crate) fn new(reader: &'a ContainerReader, record: &'a EntryRecord) -> Self {
        Self { reader, record }
    }

    pub fn name(&self) -> &'a str {
        &self.record.name
    }

    pub fn custom_data(&self) -> &'a str {
        &self.record.custom_data
    }

    pub fn is_external(&self) -> bool {
        self.record.location.is_external()
    }

    /// Where the payload lives. The linked filename is not sanitized; callers
    /// handling untrusted containers should inspect it before reading.
    pub fn location(&self) -> &'a PayloadLocation {
        &self.record.location
    }

    /// Compression applied to the payload
    pub fn compression(&self) -> CompressionMethod {
        self.record.compression
    }

    /// Bytes the payload occupies where it is stored
    pub fn stored_length(&self) -> u64 {
        self.record.location.length()
    }

    /// Length recorded at write time. Exact for embedded entries, advisory
    /// for external ones.
    pub fn uncompressed_length(&self) -> u64 {
        self.record.uncompressed_length
    }

    /// Fetch and decompress the payload
    ///
    /// External payloads are read from disk on every call.
    pub fn read_payload(&self) -> Result<Vec<u8>> {
        self.reader.read_record_payload(self.record)
    }
}

impl fmt::Debug for FileEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("name", &self.record.name)
            .field("location", &self.record.location)
            .field("compression", &self.record.compression)
            .field("uncompressed_length", &self.record.uncompressed_length)
            .field("custom_data", &self.record.custom_data)
            .finish()
    }
}
