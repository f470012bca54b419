//! Simulator configuration.
//!
//! Software revisions of the real ECU differ only in the identifier/seed
//! geometry and the fault catalog; the catalog is compiled in, everything
//! else lives here. Defaults match the reference revision; a JSON config file
//! and CLI flags can override them.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::security::SeedSpec;

pub const DEFAULT_CYCLE_MS: u64 = 500;
pub const DEFAULT_INPUT_PATH: &str = "data/OBD_2_INPUT.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/OBD_2_OUTPUT.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("seed geometry {id}+{suffix} digits overflows the seed width")]
    SeedWidthOverflow { id: u32, suffix: u32 },
    #[error("cycle period must be non-zero")]
    ZeroCyclePeriod,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EcuConfig {
    /// Fixed ECU identifier, the seed/key prefix.
    pub ecu_id: u32,
    /// Width of the random seed suffix in digits.
    pub seed_suffix_digits: u32,
    /// Preset the security gate to unlocked (development only).
    pub debug_access: bool,
    /// Simulation period in milliseconds.
    pub cycle_ms: u64,
    pub input_path: String,
    pub output_path: String,
}

impl Default for EcuConfig {
    fn default() -> Self {
        Self {
            ecu_id: 8978,
            seed_suffix_digits: 15,
            debug_access: false,
            cycle_ms: DEFAULT_CYCLE_MS,
            input_path: DEFAULT_INPUT_PATH.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl EcuConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn seed_spec(&self) -> SeedSpec {
        SeedSpec {
            ecu_id: self.ecu_id,
            suffix_digits: self.seed_suffix_digits,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_ms == 0 {
            return Err(ConfigError::ZeroCyclePeriod);
        }
        if self.seed_spec().max_seed().is_none() {
            return Err(ConfigError::SeedWidthOverflow {
                id: self.ecu_id,
                suffix: self.seed_suffix_digits,
            });
        }
        Ok(())
    }
}
