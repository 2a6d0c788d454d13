use crate::container::format::CompressionMethod;
use crate::error::{MfsError, Result};
use tracing::trace;

/// Default zstd level (balanced compression)
pub const DEFAULT_ZSTD_LEVEL: i32 = 6;

/// Upper bound on LZ4 block expansion; a larger prepended size is corrupt
const LZ4_MAX_RATIO: usize = 255;

/// Byte transform behind every compressed region of a container
///
/// Payloads, custom-data blobs and the string table all go through the same
/// two calls, so a different codec set can be plugged in without touching the
/// layout code.
pub trait CompressionBackend: Send + Sync {
    fn compress(&self, method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>>;

    fn decompress(&self, method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>>;
}

/// zstd + LZ4 backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardBackend {
    zstd_level: i32,
}

impl StandardBackend {
    pub fn new() -> Self {
        Self {
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }

    pub fn with_zstd_level(zstd_level: i32) -> Self {
        Self { zstd_level }
    }

    pub fn zstd_level(&self) -> i32 {
        self.zstd_level
    }
}

impl Default for StandardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionBackend for StandardBackend {
    fn compress(&self, method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>> {
        trace!(?method, input = data.len(), "compress");
        match method {
            CompressionMethod::None => Ok(data.to_vec()),
            CompressionMethod::Zstd => compress_zstd(data, self.zstd_level),
            CompressionMethod::Lz4 => Ok(compress_lz4(data)),
        }
    }

    fn decompress(&self, method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>> {
        trace!(?method, input = data.len(), "decompress");
        match method {
            CompressionMethod::None => Ok(data.to_vec()),
            CompressionMethod::Zstd => decompress_zstd(data),
            CompressionMethod::Lz4 => decompress_lz4(data),
        }
    }
}

/// Compress with the default backend
pub fn compress(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>> {
    StandardBackend::default().compress(method, data)
}

/// Decompress with the default backend
pub fn decompress(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>> {
    StandardBackend::default().decompress(method, data)
}

/// Compress with Zstd
fn compress_zstd(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level)
        .map_err(|e| MfsError::CompressionFailed(format!("Zstd compression failed: {}", e)))
}

/// Decompress Zstd data
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data)
        .map_err(|e| MfsError::DecompressionFailed(format!("Zstd decompression failed: {}", e)))
}

/// Compress with LZ4 (uncompressed size prepended)
fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data
fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    // Check the prepended size before lz4_flex allocates for it
    if data.len() < 4 {
        return Err(MfsError::DecompressionFailed(
            "LZ4 block shorter than its size prefix".to_string(),
        ));
    }
    let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if declared > (data.len() - 4).saturating_mul(LZ4_MAX_RATIO) {
        return Err(MfsError::DecompressionFailed(format!(
            "LZ4 block claims {} bytes from {} compressed",
            declared,
            data.len() - 4
        )));
    }

    lz4_flex::decompress_size_prepended(data).map_err(|e| {
        MfsError::DecompressionFailed(format!("LZ4 decompression failed: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const METHODS: [CompressionMethod; 3] = [
        CompressionMethod::None,
        CompressionMethod::Zstd,
        CompressionMethod::Lz4,
    ];

    #[test]
    fn test_roundtrip_all_methods() {
        let data = b"This is test data that should compress well. ".repeat(50);
        for method in METHODS {
            let compressed = compress(method, &data).unwrap();
            assert_eq!(decompress(method, &compressed).unwrap(), data, "{:?}", method);
        }
    }

    #[test]
    fn test_none_is_identity() {
        assert_eq!(compress(CompressionMethod::None, b"abc").unwrap(), b"abc");
        assert_eq!(decompress(CompressionMethod::None, b"abc").unwrap(), b"abc");
    }

    #[test]
    fn test_compression_shrinks_repetitive_data() {
        let data = vec![42u8; 64 * 1024];
        assert!(compress(CompressionMethod::Zstd, &data).unwrap().len() < 1024);
        assert!(compress(CompressionMethod::Lz4, &data).unwrap().len() < 1024);
    }

    #[test]
    fn test_empty_input() {
        for method in METHODS {
            let compressed = compress(method, &[]).unwrap();
            assert!(decompress(method, &compressed).unwrap().is_empty());
        }
    }

    #[test]
    fn test_deterministic_output() {
        let data = b"The quick brown fox jumps over the lazy dog".repeat(20);
        for method in METHODS {
            assert_eq!(compress(method, &data).unwrap(), compress(method, &data).unwrap());
        }
    }

    #[test]
    fn test_zstd_level_is_applied() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8 ^ (i / 7) as u8).collect();
        let fast = StandardBackend::with_zstd_level(1);
        let strong = StandardBackend::with_zstd_level(19);
        assert_eq!(strong.zstd_level(), 19);

        let a = fast.compress(CompressionMethod::Zstd, &data).unwrap();
        let b = strong.compress(CompressionMethod::Zstd, &data).unwrap();
        assert_eq!(fast.decompress(CompressionMethod::Zstd, &b).unwrap(), data);
        assert_eq!(strong.decompress(CompressionMethod::Zstd, &a).unwrap(), data);
    }

    #[test]
    fn test_corrupt_zstd_stream() {
        let err = decompress(CompressionMethod::Zstd, b"definitely not zstd").unwrap_err();
        assert!(err.is_compression_error());
    }

    #[test]
    fn test_corrupt_lz4_block() {
        let mut compressed = compress(CompressionMethod::Lz4, &b"hello lz4 ".repeat(40)).unwrap();
        let len = compressed.len();
        compressed.truncate(len - 5);
        let err = decompress(CompressionMethod::Lz4, &compressed).unwrap_err();
        assert!(err.is_compression_error());
    }

    #[test]
    fn test_lz4_rejects_absurd_size_prefix() {
        let mut block = u32::MAX.to_le_bytes().to_vec();
        block.extend_from_slice(&[0u8; 8]);
        let err = decompress(CompressionMethod::Lz4, &block).unwrap_err();
        assert!(matches!(err, MfsError::DecompressionFailed(_)));

        let err = decompress(CompressionMethod::Lz4, &[1, 2]).unwrap_err();
        assert!(err.is_compression_error());
    }
}
