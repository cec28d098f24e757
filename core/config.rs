use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = ".codepick.toml";

/// Optional per-project configuration, loaded from `<root>/.codepick.toml`.
/// A missing file means defaults; a malformed file is a real error so typos
/// do not silently change what gets scanned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format: txt, md, llm or json.
    pub format: String,
    /// Copy the finished report to the clipboard.
    pub clipboard: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "llm".to_string(),
            clipboard: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Honor `.gitignore` and the user's global ignore files.
    pub use_gitignore: bool,
    /// Extra ignore patterns, applied after all file-sourced ones.
    pub ignore: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            use_gitignore: true,
            ignore: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| AppError::FileRead {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| AppError::TomlParse(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
