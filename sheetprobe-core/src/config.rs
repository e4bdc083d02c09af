//! Configuration for the structure scan

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sheetprobe.toml";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub scan: ScanWindow,
}

impl ProbeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ProbeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the analyzer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scan.row_limit == 0 {
            bail!("Configuration error: scan.row_limit must be at least 1");
        }
        if self.scan.col_limit == 0 {
            bail!("Configuration error: scan.col_limit must be at least 1");
        }
        Ok(())
    }
}

/// The preview window scanned at the top-left of every sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWindow {
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
    #[serde(default = "default_col_limit")]
    pub col_limit: u32,
}

impl ScanWindow {
    pub fn new(row_limit: u32, col_limit: u32) -> Self {
        Self {
            row_limit,
            col_limit,
        }
    }
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self::new(default_row_limit(), default_col_limit())
    }
}

fn default_row_limit() -> u32 {
    20
}

fn default_col_limit() -> u32 {
    10
}
