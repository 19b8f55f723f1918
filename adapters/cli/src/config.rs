use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use seed_scanner_core::{DifficultySettings, DEFAULT_EXPORT_DAY, DEFAULT_LOOKAHEAD_DAYS};
use serde::Deserialize;

/// Settings file consulted when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "seed-scanner.toml";

/// Scanner options loaded from TOML; command-line flags take precedence.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScannerConfig {
    /// Days scanned ahead of a node for its next unlock offer.
    pub(crate) lookahead_days: u32,
    /// Last day included in exports.
    pub(crate) export_day: i32,
    /// Directory exports are written below.
    pub(crate) export_dir: PathBuf,
    /// Folder inside `export_dir` that receives every export.
    pub(crate) export_folder: String,
    /// Difficulty constants used for multipliers and shops.
    pub(crate) difficulty: DifficultySettings,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            export_day: DEFAULT_EXPORT_DAY,
            export_dir: PathBuf::from("exports"),
            export_folder: "SeedScan".to_owned(),
            difficulty: DifficultySettings::default(),
        }
    }
}

impl ScannerConfig {
    /// Loads the configuration at `path`, or the default file when present.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.is_file() {
                    Self::from_path(fallback)
                } else {
                    tracing::debug!("no configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ScannerConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, ScannerConfig::default());
        assert_eq!(config.lookahead_days, 10);
        assert_eq!(config.export_day, 15);
        assert_eq!(config.export_folder, "SeedScan");
    }

    #[test]
    fn partial_documents_override_selected_fields() {
        let config = ScannerConfig::from_toml_str(
            r#"
export_day = 20
export_dir = "out"

[difficulty]
staple_count = 2
"#,
        )
        .expect("config parses");

        assert_eq!(config.export_day, 20);
        assert_eq!(config.export_dir, PathBuf::from("out"));
        assert_eq!(config.lookahead_days, 10);
        assert_eq!(config.difficulty.staple_count, 2);
        assert_eq!(config.difficulty.base_shop_count, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ScannerConfig::from_toml_str("lookahead = 3").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        let error = ScannerConfig::load(Some(&missing)).expect_err("missing file");
        assert!(error.to_string().contains("failed to read configuration"));
    }

    #[test]
    fn files_are_loaded_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanner.toml");
        fs::write(&path, "lookahead_days = 4\n").expect("config written");
        let config = ScannerConfig::load(Some(&path)).expect("config loads");
        assert_eq!(config.lookahead_days, 4);
    }
}
