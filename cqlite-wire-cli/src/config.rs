use anyhow::{Context, Result};
use cqlite_wire::DecodeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decode: DecodeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub max_rows: Option<usize>,
    pub colors: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_rows: Some(1000),
            colors: true,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = if let Some(path) = config_path {
            Self::load_from_file(&path)?
        } else {
            Self::load_default()?
        };

        config
            .decode
            .validate()
            .with_context(|| "Invalid [decode] configuration")?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).with_context(|| "Failed to parse JSON config")?
            }
            _ => toml::from_str(&content).with_context(|| "Failed to parse TOML config")?,
        };

        Ok(config)
    }

    fn load_default() -> Result<Self> {
        let local = Path::new("cqlite-wire.toml");
        if local.exists() {
            return Self::load_from_file(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("cqlite-wire").join("config.toml");
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }
}
