use crate::error::{MfsError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::ops::Range;

/// Magic number: "MFS." (0x2E53464D read as a little-endian u32)
pub const MAGIC_NUMBER: [u8; 4] = *b"MFS.";

/// The only layout this crate reads and writes
pub const FORMAT_VERSION: u8 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 34;

/// File dictionary entry size in bytes
pub const DICTIONARY_ENTRY_SIZE: usize = 45;

/// Compression methods supported
///
/// The same selector is used for payloads, custom-data blobs and the string
/// table. `Zstd` is the high-ratio choice, `Lz4` the fast one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionMethod {
    #[default]
    None = 0,
    Zstd = 1,
    Lz4 = 2,
}

impl CompressionMethod {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Zstd),
            2 => Ok(Self::Lz4),
            _ => Err(MfsError::InvalidCompression(value)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Where an entry's payload bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadLocation {
    /// Inside the container, `offset` counted from its first byte
    Embedded { offset: u64, length: u64 },
    /// Inside another file, resolved against the reader's working directory
    External {
        linked_filename: String,
        offset: u64,
        length: u64,
    },
}

impl PayloadLocation {
    pub fn is_external(&self) -> bool {
        matches!(self, PayloadLocation::External { .. })
    }

    pub fn offset(&self) -> u64 {
        match self {
            PayloadLocation::Embedded { offset, .. } | PayloadLocation::External { offset, .. } => {
                *offset
            }
        }
    }

    /// Bytes occupied on disk (compressed length)
    pub fn length(&self) -> u64 {
        match self {
            PayloadLocation::Embedded { length, .. } | PayloadLocation::External { length, .. } => {
                *length
            }
        }
    }
}

/// File header at the beginning of the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u8,
    pub entry_count: u64,
    pub string_count: u64,
    /// Byte length of the string table as stored, i.e. after compression
    pub string_table_length: u64,
    pub custom_property_index: u32,
    /// Applies to the string table and to every custom-data blob
    pub custom_data_compression: CompressionMethod,
}

impl FileHeader {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            entry_count: 0,
            string_count: 0,
            string_table_length: 0,
            custom_property_index: 0,
            custom_data_compression: CompressionMethod::None,
        }
    }

    /// Write header to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC_NUMBER)?;
        writer.write_all(&[self.version])?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.string_count.to_le_bytes())?;
        writer.write_all(&self.string_table_length.to_le_bytes())?;
        writer.write_all(&self.custom_property_index.to_le_bytes())?;
        writer.write_all(&[self.custom_data_compression.as_u8()])?;
        Ok(())
    }

    /// Parse the header from the start of a container.
    ///
    /// The magic is checked before anything else is looked at.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data, "container header");

        let magic = cursor.read_array::<4>()?;
        if magic != MAGIC_NUMBER {
            return Err(MfsError::InvalidMagic);
        }

        let version = cursor.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(MfsError::UnsupportedVersion(version));
        }

        let entry_count = cursor.read_u64()?;
        let string_count = cursor.read_u64()?;
        let string_table_length = cursor.read_u64()?;
        let custom_property_index = cursor.read_u32()?;
        let custom_data_compression = CompressionMethod::from_u8(cursor.read_u8()?)?;

        Ok(Self {
            version,
            entry_count,
            string_count,
            string_table_length,
            custom_property_index,
            custom_data_compression,
        })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// File dictionary entry as stored, with string references still unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDictionaryEntry {
    pub name_index: u32,
    /// String-table index of the linked file, `None` when embedded
    pub linked_index: Option<u32>,
    pub offset: u64,
    pub length: u64,
    pub compression: CompressionMethod,
    pub uncompressed_length: u64,
    pub custom_data_offset: u64,
    pub custom_data_length: u32,
}

impl RawDictionaryEntry {
    /// Write entry to the file dictionary
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.name_index.to_le_bytes())?;
        writer.write_all(&encode_linked_index(self.linked_index)?.to_le_bytes())?;
        writer.write_all(&self.offset.to_le_bytes())?;
        writer.write_all(&self.length.to_le_bytes())?;
        writer.write_all(&[self.compression.as_u8()])?;
        writer.write_all(&self.uncompressed_length.to_le_bytes())?;
        writer.write_all(&self.custom_data_offset.to_le_bytes())?;
        writer.write_all(&self.custom_data_length.to_le_bytes())?;
        Ok(())
    }

    /// Read entry from the file dictionary
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data, "file dictionary entry");

        let name_index = cursor.read_u32()?;
        let linked_index = decode_linked_index(cursor.read_u32()?);
        let offset = cursor.read_u64()?;
        let length = cursor.read_u64()?;
        let compression = CompressionMethod::from_u8(cursor.read_u8()?)?;
        let uncompressed_length = cursor.read_u64()?;
        let custom_data_offset = cursor.read_u64()?;
        let custom_data_length = cursor.read_u32()?;

        Ok(Self {
            name_index,
            linked_index,
            offset,
            length,
            compression,
            uncompressed_length,
            custom_data_offset,
            custom_data_length,
        })
    }
}

/// Stored form of a linked-filename reference: 0 means embedded, otherwise index + 1
pub fn encode_linked_index(index: Option<u32>) -> Result<u32> {
    match index {
        None => Ok(0),
        Some(index) => index.checked_add(1).ok_or_else(|| {
            MfsError::InvalidFormat(format!("linked filename index {} too large", index))
        }),
    }
}

pub fn decode_linked_index(stored: u32) -> Option<u32> {
    stored.checked_sub(1)
}

/// Validate `[offset, offset + length)` against a buffer of `available` bytes
pub fn checked_range(
    offset: u64,
    length: u64,
    available: usize,
    context: &'static str,
) -> Result<Range<usize>> {
    let out_of_bounds = || MfsError::OutOfBounds {
        context,
        offset,
        length,
        available: available as u64,
    };

    let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
    if end > available as u64 {
        return Err(out_of_bounds());
    }

    // Both fit in `available`, which is a usize
    Ok(offset as usize..end as usize)
}

/// Little-endian reader over a byte slice. Every read is bounds-checked.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    context: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            position: 0,
            context,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(MfsError::Truncated {
                context: self.context,
                needed: (self.position as u64).saturating_add(count as u64),
                available: self.data.len() as u64,
            });
        }

        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }
}
