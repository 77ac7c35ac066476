//! Decoding configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest native protocol version the decoders know the framing of
pub const MAX_PROTOCOL_VERSION: u8 = 5;

/// Settings for building and driving decoder trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Native protocol version the data was encoded with (default: 3)
    pub protocol_version: u8,

    /// Deepest descriptor nesting the factory will resolve (default: 32)
    pub max_nesting_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            protocol_version: crate::DEFAULT_PROTOCOL_VERSION,
            max_nesting_depth: 32,
        }
    }
}

impl DecodeConfig {
    /// Default settings for another protocol version
    pub fn for_protocol_version(protocol_version: u8) -> Self {
        Self {
            protocol_version,
            ..Self::default()
        }
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version == 0 || self.protocol_version > MAX_PROTOCOL_VERSION {
            return Err(Error::configuration(format!(
                "protocol_version must be between 1 and {}, got {}",
                MAX_PROTOCOL_VERSION, self.protocol_version
            )));
        }

        if self.max_nesting_depth == 0 {
            return Err(Error::configuration(
                "max_nesting_depth must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecodeConfig::default();
        assert_eq!(config.protocol_version, 3);
        assert_eq!(config.max_nesting_depth, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(DecodeConfig::for_protocol_version(0).validate().is_err());
        assert!(DecodeConfig::for_protocol_version(6).validate().is_err());
        assert!(DecodeConfig::for_protocol_version(2).validate().is_ok());

        let config = DecodeConfig {
            max_nesting_depth: 0,
            ..DecodeConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DecodeConfig::from_toml_str("protocol_version = 2").unwrap();
        assert_eq!(config.protocol_version, 2);
        assert_eq!(config.max_nesting_depth, 32);

        let err = DecodeConfig::from_toml_str("protocol_version = \"two\"").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = DecodeConfig::from_toml_str("protocol_version = 9").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
