use crate::container::compression::{CompressionBackend, StandardBackend};
use crate::container::entry::{EntryRecord, FileEntry};
use crate::container::format::{
    checked_range, CompressionMethod, FileHeader, PayloadLocation, RawDictionaryEntry,
    DICTIONARY_ENTRY_SIZE, HEADER_SIZE,
};
use crate::container::string_table::StringTable;
use crate::error::{MfsError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Parsed MFS container
///
/// Header, string table, dictionary and every custom-data blob are decoded up
/// front; a malformed container never yields a reader. Payloads are resolved
/// lazily through [`FileEntry::read_payload`].
pub struct ContainerReader {
    data: Vec<u8>,
    working_directory: PathBuf,
    header: FileHeader,
    strings: StringTable,
    records: Vec<EntryRecord>,
    by_name: HashMap<String, usize>,
    backend: Arc<dyn CompressionBackend>,
}

impl ContainerReader {
    /// Parse a container held in memory
    ///
    /// External entries are resolved relative to `working_directory`.
    pub fn parse<D, P>(data: D, working_directory: P) -> Result<Self>
    where
        D: Into<Vec<u8>>,
        P: AsRef<Path>,
    {
        Self::parse_with_backend(data, working_directory, Arc::new(StandardBackend::default()))
    }

    /// Read and parse a container file; its directory becomes the working directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let working_directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(data, working_directory)
    }

    /// Parse with a caller-supplied compression backend
    pub fn parse_with_backend<D, P>(
        data: D,
        working_directory: P,
        backend: Arc<dyn CompressionBackend>,
    ) -> Result<Self>
    where
        D: Into<Vec<u8>>,
        P: AsRef<Path>,
    {
        let data = data.into();
        let header = FileHeader::parse(&data)?;

        let dictionary_size = header
            .entry_count
            .checked_mul(DICTIONARY_ENTRY_SIZE as u64)
            .ok_or_else(|| {
                MfsError::InvalidFormat(format!(
                    "dictionary entry count {} overflows",
                    header.entry_count
                ))
            })?;
        let dictionary_range =
            checked_range(HEADER_SIZE as u64, dictionary_size, data.len(), "file dictionary")?;
        let table_range = checked_range(
            dictionary_range.end as u64,
            header.string_table_length,
            data.len(),
            "string table",
        )?;

        let table = backend.decompress(header.custom_data_compression, &data[table_range])?;
        let strings = StringTable::decode(&table, header.string_count)?;
        strings.resolve(header.custom_property_index, "custom property")?;

        let mut records = Vec::with_capacity(header.entry_count as usize);
        let mut by_name = HashMap::with_capacity(header.entry_count as usize);
        for (index, raw) in data[dictionary_range]
            .chunks_exact(DICTIONARY_ENTRY_SIZE)
            .enumerate()
        {
            let raw = RawDictionaryEntry::parse(raw)?;
            let record = resolve_entry(
                &data,
                &strings,
                &raw,
                header.custom_data_compression,
                backend.as_ref(),
            )?;
            trace!(index, name = %record.name, external = record.location.is_external(), "parsed entry");
            by_name.entry(record.name.clone()).or_insert(index);
            records.push(record);
        }

        debug!(
            entries = records.len(),
            strings = strings.len(),
            bytes = data.len(),
            "parsed container"
        );

        Ok(Self {
            data,
            working_directory: working_directory.as_ref().to_path_buf(),
            header,
            strings,
            records,
            by_name,
            backend,
        })
    }

    /// Get container header information
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The container-wide free-text property
    pub fn custom_property(&self) -> &str {
        // Validated during parse
        self.strings
            .get(self.header.custom_property_index)
            .unwrap_or_default()
    }

    pub fn custom_data_compression(&self) -> CompressionMethod {
        self.header.custom_data_compression
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The decoded string table
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// The raw container bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get number of entries in the container
    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    /// List all file names in dictionary order
    pub fn list_files(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    /// Check if a file exists in the container
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All entries in dictionary order
    pub fn entries(&self) -> impl Iterator<Item = FileEntry<'_>> + '_ {
        self.records
            .iter()
            .map(move |record| FileEntry::new(self, record))
    }

    /// First entry with the given name
    pub fn entry(&self, name: &str) -> Option<FileEntry<'_>> {
        self.by_name.get(name).and_then(|&index| self.entry_at(index))
    }

    pub fn entry_at(&self, index: usize) -> Option<FileEntry<'_>> {
        self.records
            .get(index)
            .map(|record| FileEntry::new(self, record))
    }

    /// Read a file's payload by name
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        self.entry(name)
            .ok_or_else(|| MfsError::FileNotFound(name.to_string()))?
            .read_payload()
    }

    /// Resolve and decompress one entry's payload
    pub(crate) fn read_record_payload(&self, record: &EntryRecord) -> Result<Vec<u8>> {
        match &record.location {
            PayloadLocation::Embedded { offset, length } => {
                let range = checked_range(*offset, *length, self.data.len(), "embedded payload")?;
                self.backend.decompress(record.compression, &self.data[range])
            }
            PayloadLocation::External {
                linked_filename,
                offset,
                length,
            } => {
                let path = self.working_directory.join(linked_filename);
                trace!(name = %record.name, path = %path.display(), "reading external payload");
                let file = std::fs::read(&path)
                    .map_err(|source| MfsError::ExternalFile { path, source })?;
                let range = checked_range(*offset, *length, file.len(), "external payload")?;
                self.backend.decompress(record.compression, &file[range])
            }
        }
    }
}

/// Turn a stored dictionary entry into a reader-owned record
fn resolve_entry(
    data: &[u8],
    strings: &StringTable,
    raw: &RawDictionaryEntry,
    custom_data_compression: CompressionMethod,
    backend: &dyn CompressionBackend,
) -> Result<EntryRecord> {
    let name = strings.resolve(raw.name_index, "entry name")?.to_string();

    let location = match raw.linked_index {
        None => PayloadLocation::Embedded {
            offset: raw.offset,
            length: raw.length,
        },
        Some(index) => PayloadLocation::External {
            linked_filename: strings.resolve(index, "linked filename")?.to_string(),
            offset: raw.offset,
            length: raw.length,
        },
    };

    let range = checked_range(
        raw.custom_data_offset,
        u64::from(raw.custom_data_length),
        data.len(),
        "custom data",
    )?;
    let custom_data = backend.decompress(custom_data_compression, &data[range])?;
    let custom_data = String::from_utf8(custom_data)
        .map_err(|e| MfsError::InvalidUtf8(format!("custom data of {}: {}", name, e)))?;

    Ok(EntryRecord {
        name,
        location,
        compression: raw.compression,
        uncompressed_length: raw.uncompressed_length,
        custom_data,
    })
}

impl fmt::Debug for ContainerReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerReader")
            .field("header", &self.header)
            .field("working_directory", &self.working_directory)
            .field("entries", &self.records.len())
            .field("bytes", &self.data.len())
            .finish_non_exhaustive()
    }
}
