//! Writer configuration
//!
//! Container-wide writer settings can be kept in a TOML file:
//!
//! ```toml
//! custom_property = "Nightly asset bundle"
//! custom_data_compression = "zstd"
//! zstd_level = 9
//! ```
//!
//! Every key is optional; missing keys take the [`WriterConfig::default`] values.

use crate::container::{CompressionMethod, DEFAULT_CUSTOM_PROPERTY, DEFAULT_ZSTD_LEVEL};
use crate::error::{MfsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings applied by [`ContainerWriter::with_config`](crate::ContainerWriter::with_config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    /// Free-text property stored in the header's string slot
    pub custom_property: String,
    /// Algorithm for the string table and every custom-data blob
    pub custom_data_compression: CompressionMethod,
    /// Level used whenever zstd is selected
    pub zstd_level: i32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            custom_property: DEFAULT_CUSTOM_PROPERTY.to_string(),
            custom_data_compression: CompressionMethod::None,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl WriterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// zstd accepts levels 1 through 22
    pub fn validate(&self) -> Result<()> {
        if !(1..=22).contains(&self.zstd_level) {
            return Err(MfsError::Config(format!(
                "zstd_level must be between 1 and 22, got {}",
                self.zstd_level
            )));
        }
        Ok(())
    }
}
