//! Runtime configuration
//!
//! Fee policy and stack limits, loaded from a JSON file. Missing fields
//! fall back to their defaults.

use crate::core::FeePolicy;
use crate::script::StackLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fees: FeePolicy,
    pub stack: StackLimits,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("loaded config from {:?}: {:?}", path, config);
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.fees.fee_per_byte = 250;
        config.stack.max_item_bytes = 1024;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "fees": { "double_spent_threshold_pct": 50 } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fees.double_spent_threshold_pct, 50);
        assert_eq!(config.fees.fee_per_byte, FeePolicy::default().fee_per_byte);
        assert_eq!(config.stack, StackLimits::default());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Config::load(temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
