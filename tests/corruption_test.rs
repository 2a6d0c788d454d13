//! Corruption detection suite
//!
//! Malformed containers must fail with format errors, never panic or read out of bounds.

use mfs_rs::{
    CompressionMethod, ContainerReader, ContainerWriter, ErrorKind, MfsError,
    DICTIONARY_ENTRY_SIZE, HEADER_SIZE,
};

// Header field offsets
const ENTRY_COUNT: usize = 5;
const STRING_TABLE_LENGTH: usize = 21;
const CUSTOM_DATA_COMPRESSION: usize = 33;

// Dictionary entry field offsets
const NAME_INDEX: usize = 0;
const PAYLOAD_OFFSET: usize = 8;
const PAYLOAD_LENGTH: usize = 16;
const PAYLOAD_COMPRESSION: usize = 24;
const CUSTOM_DATA_OFFSET: usize = 33;

/// Helper: Create a valid test container
fn create_test_container() -> Vec<u8> {
    let mut writer = ContainerWriter::new();
    writer.add_file("test.txt", b"Hello, World!", "greeting", CompressionMethod::None);
    writer.add_file("data.bin", &vec![0xAB; 1024], "binary", CompressionMethod::Zstd);
    writer.export().unwrap()
}

/// Helper: Byte position of a field in dictionary entry `index`
fn entry_field(index: usize, field: usize) -> usize {
    HEADER_SIZE + index * DICTIONARY_ENTRY_SIZE + field
}

/// Helper: Overwrite a little-endian u64 at `at`
fn patch_u64(bytes: &mut [u8], at: usize, value: u64) {
    bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

fn parse_err(bytes: Vec<u8>) -> MfsError {
    ContainerReader::parse(bytes, ".").unwrap_err()
}

#[test]
fn test_corrupted_magic_number() {
    let mut bytes = create_test_container();
    bytes[0] = 0xFF;

    match parse_err(bytes) {
        MfsError::InvalidMagic => {}
        other => panic!("Expected InvalidMagic, got: {:?}", other),
    }
}

#[test]
fn test_foreign_file_rejected() {
    let err = parse_err(b"PK\x03\x04 this is a zip file, not a container".to_vec());
    assert!(matches!(err, MfsError::InvalidMagic));
    assert_eq!(err.to_string(), "Invalid container: bad magic number");
}

#[test]
fn test_empty_buffer() {
    let err = parse_err(Vec::new());
    assert!(matches!(err, MfsError::Truncated { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_truncated_header() {
    let mut bytes = create_test_container();
    bytes.truncate(20);
    assert!(matches!(parse_err(bytes), MfsError::Truncated { .. }));
}

#[test]
fn test_unsupported_version() {
    let mut bytes = create_test_container();
    bytes[4] = 9;
    assert!(matches!(parse_err(bytes), MfsError::UnsupportedVersion(9)));
}

#[test]
fn test_unknown_custom_data_compression() {
    let mut bytes = create_test_container();
    bytes[CUSTOM_DATA_COMPRESSION] = 77;
    assert!(matches!(parse_err(bytes), MfsError::InvalidCompression(77)));
}

#[test]
fn test_unknown_payload_compression_aborts_parse() {
    let mut bytes = create_test_container();
    bytes[entry_field(1, PAYLOAD_COMPRESSION)] = 3;
    assert!(matches!(parse_err(bytes), MfsError::InvalidCompression(3)));
}

#[test]
fn test_entry_count_beyond_buffer() {
    let mut bytes = create_test_container();
    patch_u64(&mut bytes, ENTRY_COUNT, 1_000_000);
    let err = parse_err(bytes);
    assert!(matches!(err, MfsError::OutOfBounds { context: "file dictionary", .. }));
}

#[test]
fn test_string_table_length_beyond_buffer() {
    let mut bytes = create_test_container();
    patch_u64(&mut bytes, STRING_TABLE_LENGTH, u64::MAX);
    let err = parse_err(bytes);
    assert!(matches!(err, MfsError::OutOfBounds { context: "string table", .. }));
}

#[test]
fn test_dangling_name_index() {
    let mut bytes = create_test_container();
    let at = entry_field(0, NAME_INDEX);
    bytes[at..at + 4].copy_from_slice(&500u32.to_le_bytes());
    assert!(matches!(parse_err(bytes), MfsError::InvalidFormat(_)));
}

#[test]
fn test_dangling_linked_filename_index() {
    let mut bytes = create_test_container();
    // Turn an embedded entry into a link to a string that does not exist
    let at = entry_field(0, 4);
    bytes[at..at + 4].copy_from_slice(&200u32.to_le_bytes());
    assert!(parse_err(bytes).is_format_error());
}

#[test]
fn test_custom_data_out_of_bounds() {
    let mut bytes = create_test_container();
    let len = bytes.len() as u64;
    patch_u64(&mut bytes, entry_field(0, CUSTOM_DATA_OFFSET), len);
    let err = parse_err(bytes);
    assert!(matches!(err, MfsError::OutOfBounds { context: "custom data", .. }));
}

#[test]
fn test_truncated_tail() {
    let mut bytes = create_test_container();
    let len = bytes.len();
    // Cuts into the last entry's custom data
    bytes.truncate(len - 3);
    assert!(parse_err(bytes).is_format_error());
}

#[test]
fn test_invalid_utf8_custom_data() {
    let mut bytes = create_test_container();
    let at = read_u64(&bytes, entry_field(0, CUSTOM_DATA_OFFSET)) as usize;
    bytes[at] = 0xFF;
    assert!(matches!(parse_err(bytes), MfsError::InvalidUtf8(_)));
}

#[test]
fn test_corrupted_compressed_string_table() {
    let mut writer = ContainerWriter::new();
    writer.set_custom_data_compression(CompressionMethod::Zstd);
    writer.add_file("a.txt", b"alpha", "meta", CompressionMethod::None);
    let mut bytes = writer.export().unwrap();

    // Zstd frame magic of the string table
    let table_start = HEADER_SIZE + DICTIONARY_ENTRY_SIZE;
    bytes[table_start] ^= 0xFF;

    let err = parse_err(bytes);
    assert!(err.is_compression_error(), "got: {:?}", err);
}

#[test]
fn test_payload_offset_past_end() {
    let mut bytes = create_test_container();
    let len = bytes.len() as u64;
    patch_u64(&mut bytes, entry_field(0, PAYLOAD_OFFSET), len - 4);

    // Payload coordinates are only checked when the payload is read
    let reader = ContainerReader::parse(bytes, ".").unwrap();
    let err = reader.read_file("test.txt").unwrap_err();
    assert!(matches!(err, MfsError::OutOfBounds { context: "embedded payload", .. }));
    assert!(err.is_format_error());

    // The other entry is unaffected
    assert_eq!(reader.read_file("data.bin").unwrap(), vec![0xAB; 1024]);
}

#[test]
fn test_payload_length_overflow() {
    let mut bytes = create_test_container();
    patch_u64(&mut bytes, entry_field(0, PAYLOAD_OFFSET), u64::MAX - 1);
    patch_u64(&mut bytes, entry_field(0, PAYLOAD_LENGTH), 16);

    let reader = ContainerReader::parse(bytes, ".").unwrap();
    let err = reader.entry("test.txt").unwrap().read_payload().unwrap_err();
    assert!(matches!(err, MfsError::OutOfBounds { .. }));
}

#[test]
fn test_corrupted_compressed_payload() {
    let mut bytes = create_test_container();
    let at = read_u64(&bytes, entry_field(1, PAYLOAD_OFFSET)) as usize;
    // Break the zstd frame header
    for byte in &mut bytes[at..at + 4] {
        *byte = 0;
    }

    let reader = ContainerReader::parse(bytes, ".").unwrap();
    let err = reader.read_file("data.bin").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compression);
    assert_eq!(reader.read_file("test.txt").unwrap(), b"Hello, World!");
}

#[test]
fn test_random_garbage_never_panics() {
    let valid = create_test_container();

    // Flip each byte in turn; every outcome must be Ok or a clean error
    for i in 0..valid.len() {
        let mut bytes = valid.clone();
        bytes[i] = bytes[i].wrapping_add(0x5A);
        if let Ok(reader) = ContainerReader::parse(bytes, ".") {
            for entry in reader.entries() {
                let _ = entry.read_payload();
            }
        }
    }

    // And every truncation
    for len in 0..valid.len() {
        if let Ok(reader) = ContainerReader::parse(valid[..len].to_vec(), ".") {
            for entry in reader.entries() {
                let _ = entry.read_payload();
            }
        }
    }
}
