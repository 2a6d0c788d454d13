use crate::container::format::ByteCursor;
use crate::error::{MfsError, Result};
use std::collections::HashMap;

/// Deduplicated, ordered list of UTF-8 strings
///
/// Serialized as `[len: u32 LE][bytes]` per string, in insertion order.
/// Header and dictionary fields refer to strings by their position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
    positions: HashMap<String, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string, returning the index of its single stored copy
    pub fn insert(&mut self, value: &str) -> Result<u32> {
        if let Some(&index) = self.positions.get(value) {
            return Ok(index);
        }

        let index = u32::try_from(self.strings.len()).map_err(|_| {
            MfsError::InvalidFormat("string table exceeds u32::MAX entries".to_string())
        })?;
        self.strings.push(value.to_string());
        self.positions.insert(value.to_string(), index);
        Ok(index)
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Like [`get`](Self::get), but a dangling index is a format error
    pub fn resolve(&self, index: u32, context: &str) -> Result<&str> {
        self.get(index).ok_or_else(|| {
            MfsError::InvalidFormat(format!(
                "{} references string {}, table holds {}",
                context,
                index,
                self.strings.len()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Serialize the table (uncompressed)
    pub fn encode(&self) -> Result<Vec<u8>> {
        let size = self.strings.iter().map(|s| 4 + s.len()).sum();
        let mut buf = Vec::with_capacity(size);

        for value in &self.strings {
            let length = u32::try_from(value.len()).map_err(|_| {
                MfsError::InvalidFormat(format!(
                    "string of {} bytes does not fit the string table",
                    value.len()
                ))
            })?;
            buf.extend_from_slice(&length.to_le_bytes());
            buf.extend_from_slice(value.as_bytes());
        }

        Ok(buf)
    }

    /// Parse `count` strings from an already decompressed table
    pub fn decode(data: &[u8], count: u64) -> Result<Self> {
        // Every string costs at least its 4-byte length prefix
        if count > (data.len() / 4) as u64 {
            return Err(MfsError::InvalidFormat(format!(
                "string table declares {} strings but holds only {} bytes",
                count,
                data.len()
            )));
        }

        let mut cursor = ByteCursor::new(data, "string table");
        let mut table = Self {
            strings: Vec::with_capacity(count as usize),
            positions: HashMap::with_capacity(count as usize),
        };

        for i in 0..count {
            let length = cursor.read_u32()? as usize;
            let bytes = cursor.read_bytes(length)?;
            let value = std::str::from_utf8(bytes)
                .map_err(|e| MfsError::InvalidUtf8(format!("string table entry {}: {}", i, e)))?;

            // Foreign writers may repeat a string; the first copy keeps the lookup slot
            let index = table.strings.len() as u32;
            table.positions.entry(value.to_string()).or_insert(index);
            table.strings.push(value.to_string());
        }

        if cursor.remaining() != 0 {
            return Err(MfsError::InvalidFormat(format!(
                "{} trailing bytes after string table",
                cursor.remaining()
            )));
        }

        Ok(table)
    }
}
