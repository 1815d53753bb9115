//! Checker configuration stored in `checker.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Checker configuration (TOML).
///
/// Intended to be edited by humans; missing fields default to the
/// conventional layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Directory holding the decision-table source files.
    pub tables_dir: PathBuf,

    /// Extension of table source files (without the dot).
    pub extension: String,

    /// The symbol separating record fields.
    pub delimiter: String,

    /// Path of the stored-state JSON file.
    pub state_path: PathBuf,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            tables_dir: PathBuf::from("tables"),
            extension: "csv".to_string(),
            delimiter: ";".to_string(),
            state_path: PathBuf::from("state.json"),
        }
    }
}

impl CheckerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.extension.trim().is_empty() {
            return Err(anyhow!("extension must not be empty"));
        }
        if self.delimiter.is_empty() {
            return Err(anyhow!("delimiter must not be empty"));
        }
        if self.delimiter.contains("::") {
            return Err(anyhow!("delimiter must not contain the coordinate separator '::'"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CheckerConfig::default()`.
pub fn load_config(path: &Path) -> Result<CheckerConfig> {
    if !path.exists() {
        let cfg = CheckerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CheckerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
