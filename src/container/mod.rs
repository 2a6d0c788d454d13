mod compression;
mod entry;
mod format;
mod reader;
mod string_table;
mod writer;

pub use compression::{compress, decompress, CompressionBackend, StandardBackend, DEFAULT_ZSTD_LEVEL};
pub use entry::FileEntry;
pub use format::{
    checked_range, decode_linked_index, encode_linked_index, ByteCursor, CompressionMethod,
    FileHeader, PayloadLocation, RawDictionaryEntry, DICTIONARY_ENTRY_SIZE, FORMAT_VERSION,
    HEADER_SIZE, MAGIC_NUMBER,
};
pub use reader::ContainerReader;
pub use string_table::StringTable;
pub use writer::{ContainerWriter, ExternalFileConfig, DEFAULT_CUSTOM_PROPERTY};
