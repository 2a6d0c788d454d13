use crate::config::WriterConfig;
use crate::container::compression::{CompressionBackend, StandardBackend};
use crate::container::format::{
    CompressionMethod, FileHeader, RawDictionaryEntry, DICTIONARY_ENTRY_SIZE, FORMAT_VERSION,
    HEADER_SIZE,
};
use crate::container::string_table::StringTable;
use crate::error::{MfsError, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Custom property written when the caller sets none
pub const DEFAULT_CUSTOM_PROPERTY: &str = "A Meepso File System File!";

/// Coordinates of a payload stored in another file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFileConfig {
    /// Path relative to the reader's working directory
    pub linked_filename: String,
    pub offset: u64,
    pub length: u64,
}

impl ExternalFileConfig {
    pub fn new(linked_filename: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            linked_filename: linked_filename.into(),
            offset,
            length,
        }
    }
}

enum PendingPayload {
    Embedded(Vec<u8>),
    External(ExternalFileConfig),
}

struct PendingFile {
    name: String,
    payload: PendingPayload,
    custom_data: String,
    compression: CompressionMethod,
}

/// One file after compression, waiting for its offsets
struct StagedFile {
    entry: RawDictionaryEntry,
    payload: Option<Vec<u8>>,
    custom_data: Vec<u8>,
}

/// Builds an MFS container in memory
///
/// Registration never touches the layout; [`export`](Self::export) computes
/// every offset in one pass and can be called any number of times.
pub struct ContainerWriter {
    files: Vec<PendingFile>,
    custom_property: String,
    custom_data_compression: CompressionMethod,
    backend: Arc<dyn CompressionBackend>,
}

impl ContainerWriter {
    /// Create an empty writer with the default custom property and no custom-data compression
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            custom_property: DEFAULT_CUSTOM_PROPERTY.to_string(),
            custom_data_compression: CompressionMethod::None,
            backend: Arc::new(StandardBackend::default()),
        }
    }

    /// Create a writer from a validated configuration
    pub fn with_config(config: WriterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            files: Vec::new(),
            custom_property: config.custom_property,
            custom_data_compression: config.custom_data_compression,
            backend: Arc::new(StandardBackend::with_zstd_level(config.zstd_level)),
        })
    }

    /// Replace the compression backend
    pub fn with_backend(mut self, backend: Arc<dyn CompressionBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Set the container-wide free-text property
    pub fn set_custom_property(&mut self, value: impl Into<String>) {
        self.custom_property = value.into();
    }

    /// Set the algorithm used for the string table and every custom-data blob
    pub fn set_custom_data_compression(&mut self, method: CompressionMethod) {
        self.custom_data_compression = method;
    }

    pub fn custom_property(&self) -> &str {
        &self.custom_property
    }

    pub fn custom_data_compression(&self) -> CompressionMethod {
        self.custom_data_compression
    }

    /// Number of registered files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Register a file whose payload is embedded in the container
    pub fn add_file(
        &mut self,
        name: &str,
        data: &[u8],
        custom_data: &str,
        compression: CompressionMethod,
    ) {
        self.files.push(PendingFile {
            name: name.to_string(),
            payload: PendingPayload::Embedded(data.to_vec()),
            custom_data: custom_data.to_string(),
            compression,
        });
    }

    /// Register an embedded file, reading its payload from disk now
    pub fn add_file_from_path<P: AsRef<Path>>(
        &mut self,
        name: &str,
        source_path: P,
        custom_data: &str,
        compression: CompressionMethod,
    ) -> Result<()> {
        let data = std::fs::read(source_path)?;
        self.files.push(PendingFile {
            name: name.to_string(),
            payload: PendingPayload::Embedded(data),
            custom_data: custom_data.to_string(),
            compression,
        });
        Ok(())
    }

    /// Register a file whose payload stays in another file
    ///
    /// Only the custom data is embedded. `compression` describes how the bytes
    /// at `config.offset` are already encoded; they are never rewritten.
    pub fn add_external_file(
        &mut self,
        name: &str,
        config: ExternalFileConfig,
        custom_data: &str,
        compression: CompressionMethod,
    ) {
        self.files.push(PendingFile {
            name: name.to_string(),
            payload: PendingPayload::External(config),
            custom_data: custom_data.to_string(),
            compression,
        });
    }

    /// Serialize the container
    ///
    /// Layout: header, file dictionary, compressed string table, then for each
    /// file in registration order its embedded payload (if any) followed by its
    /// compressed custom data.
    pub fn export(&self) -> Result<Vec<u8>> {
        let mut strings = StringTable::new();
        let custom_property_index = strings.insert(&self.custom_property)?;

        let mut staged = Vec::with_capacity(self.files.len());
        for file in &self.files {
            staged.push(self.stage_file(file, &mut strings)?);
        }

        let string_table = self
            .backend
            .compress(self.custom_data_compression, &strings.encode()?)?;

        let dictionary_size = staged.len() * DICTIONARY_ENTRY_SIZE;
        let data_start = HEADER_SIZE + dictionary_size + string_table.len();
        let data_size: usize = staged
            .iter()
            .map(|file| file.payload.as_ref().map_or(0, Vec::len) + file.custom_data.len())
            .sum();

        let header = FileHeader {
            version: FORMAT_VERSION,
            entry_count: staged.len() as u64,
            string_count: strings.len() as u64,
            string_table_length: string_table.len() as u64,
            custom_property_index,
            custom_data_compression: self.custom_data_compression,
        };

        let mut output = Vec::with_capacity(data_start + data_size);
        header.write_to(&mut output)?;

        // Dictionary slot is filled once the offsets are known
        output.resize(HEADER_SIZE + dictionary_size, 0);
        output.extend_from_slice(&string_table);

        for file in &mut staged {
            if let Some(payload) = &file.payload {
                file.entry.offset = output.len() as u64;
                output.extend_from_slice(payload);
            }
            file.entry.custom_data_offset = output.len() as u64;
            output.extend_from_slice(&file.custom_data);
        }

        let mut dictionary = Vec::with_capacity(dictionary_size);
        for file in &staged {
            file.entry.write_to(&mut dictionary)?;
        }
        output[HEADER_SIZE..HEADER_SIZE + dictionary_size].copy_from_slice(&dictionary);

        debug!(
            entries = staged.len(),
            strings = strings.len(),
            string_table_bytes = string_table.len(),
            total_bytes = output.len(),
            "exported container"
        );

        Ok(output)
    }

    /// Export and write the container to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.export()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Compress one file's blobs and build its dictionary entry (offsets still zero)
    fn stage_file(&self, file: &PendingFile, strings: &mut StringTable) -> Result<StagedFile> {
        let name_index = strings.insert(&file.name)?;

        let custom_data = self
            .backend
            .compress(self.custom_data_compression, file.custom_data.as_bytes())?;
        let custom_data_length = u32::try_from(custom_data.len()).map_err(|_| {
            MfsError::InvalidFormat(format!(
                "custom data for {} is {} bytes (max {})",
                file.name,
                custom_data.len(),
                u32::MAX
            ))
        })?;

        let staged = match &file.payload {
            PendingPayload::Embedded(data) => {
                let payload = self.backend.compress(file.compression, data)?;
                trace!(
                    name = %file.name,
                    uncompressed = data.len(),
                    stored = payload.len(),
                    "staged embedded file"
                );
                StagedFile {
                    entry: RawDictionaryEntry {
                        name_index,
                        linked_index: None,
                        offset: 0,
                        length: payload.len() as u64,
                        compression: file.compression,
                        uncompressed_length: data.len() as u64,
                        custom_data_offset: 0,
                        custom_data_length,
                    },
                    payload: Some(payload),
                    custom_data,
                }
            }
            PendingPayload::External(config) => {
                let linked_index = strings.insert(&config.linked_filename)?;
                trace!(
                    name = %file.name,
                    linked = %config.linked_filename,
                    offset = config.offset,
                    length = config.length,
                    "staged external file"
                );
                StagedFile {
                    entry: RawDictionaryEntry {
                        name_index,
                        linked_index: Some(linked_index),
                        offset: config.offset,
                        length: config.length,
                        compression: file.compression,
                        // Advisory only: the external bytes are never inspected
                        uncompressed_length: config.length,
                        custom_data_offset: 0,
                        custom_data_length,
                    },
                    payload: None,
                    custom_data,
                }
            }
        };

        Ok(staged)
    }
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerWriter")
            .field("files", &self.files.len())
            .field("custom_property", &self.custom_property)
            .field("custom_data_compression", &self.custom_data_compression)
            .finish_non_exhaustive()
    }
}
