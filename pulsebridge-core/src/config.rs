//! Bridge configuration
//!
//! Loaded from JSON with `serde`. Every field has a default so an empty
//! object `{}` is a valid configuration.
//!
//! ```rust
//! use pulsebridge_core::BridgeConfig;
//!
//! let config = BridgeConfig::from_json_str(r#"{ "max_line": 27 }"#)?;
//! assert_eq!(config.max_line, 27);
//! # Ok::<(), pulsebridge_core::ConfigError>(())
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::gpio::{MAX_ADDRESSABLE_LINE, MAX_USER_LINE};
use crate::errors::ConfigError;

/// Bridge-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Highest line number accepted by registries and publishers
    pub max_line: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_line: MAX_USER_LINE,
        }
    }
}

impl BridgeConfig {
    /// Check constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line > MAX_ADDRESSABLE_LINE {
            return Err(ConfigError::Invalid("max_line exceeds addressable range"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&text)
    }

    /// Number of lines covered
    pub fn line_count(&self) -> usize {
        usize::from(self.max_line) + 1
    }
}
