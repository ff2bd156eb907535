//! Configuration management for Universal Storage
//!
//! Settings are loaded once from a settings document (format picked by file
//! extension) with `UNIVERSAL_STORAGE_*` environment overrides, validated, and then
//! handed to the provider. The core never mutates them.

use config::{Config, Environment, File};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// Environment variable prefix for overrides (`UNIVERSAL_STORAGE_ROOT`, `UNIVERSAL_STORAGE_TMP`)
pub const ENV_PREFIX: &str = "UNIVERSAL_STORAGE";

/// Base names tried by [`Settings::load_default`], in order
pub const DEFAULT_CONFIG_NAMES: [&str; 2] = ["universal-storage", "config"];

/// Storage settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory every logical path resolves against
    pub root: PathBuf,

    /// Directory retrieved files are staged into
    pub tmp: PathBuf,
}

impl Settings {
    /// Build settings directly from two directories
    pub fn new(root: impl Into<PathBuf>, tmp: impl Into<PathBuf>) -> StorageResult<Self> {
        let settings = Self {
            root: root.into(),
            tmp: tmp.into(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file with environment overrides
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        debug!("Loading storage settings from {}", path.display());
        Self::build(File::from(path))
    }

    /// Load settings from the first default location that parses
    pub fn load_default() -> StorageResult<Self> {
        let mut last_error = None;

        for name in DEFAULT_CONFIG_NAMES {
            match Self::build(File::with_name(name)) {
                Ok(settings) => return Ok(settings),
                Err(e) => {
                    debug!("No usable settings at '{}': {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StorageError::Configuration("no settings location configured".into())
        }))
    }

    fn build<S>(source: S) -> StorageResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .set_default("tmp", default_tmp().to_string_lossy().to_string())?
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validation for the values themselves; root existence is checked per operation
    fn validate(&self) -> StorageResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(StorageError::Configuration("root cannot be empty".into()));
        }

        if self.tmp.as_os_str().is_empty() {
            return Err(StorageError::Configuration("tmp cannot be empty".into()));
        }

        if self.root == self.tmp {
            return Err(StorageError::Configuration(format!(
                "tmp must differ from root ({})",
                self.root.display()
            )));
        }

        Ok(())
    }

    /// Get root as string
    pub fn root_str(&self) -> String {
        self.root.to_string_lossy().to_string()
    }

    /// Get tmp as string
    pub fn tmp_str(&self) -> String {
        self.tmp.to_string_lossy().to_string()
    }
}

/// Staging directory used when the settings document names none
pub fn default_tmp() -> PathBuf {
    std::env::temp_dir().join("universal-storage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_json_settings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, r#"{ "root": "/srv/storage", "tmp": "/srv/tmp" }"#).unwrap();

        let settings = Settings::load(&file).unwrap();
        assert_eq!(settings.root, PathBuf::from("/srv/storage"));
        assert_eq!(settings.tmp, PathBuf::from("/srv/tmp"));
    }

    #[test]
    fn tmp_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.toml");
        fs::write(&file, "root = \"/srv/storage\"\n").unwrap();

        let settings = Settings::load(&file).unwrap();
        assert_eq!(settings.tmp, default_tmp());
    }

    #[test]
    fn missing_root_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, r#"{ "tmp": "/srv/tmp" }"#).unwrap();

        let err = Settings::load(&file).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn rejects_tmp_equal_to_root() {
        let err = Settings::new("/srv/storage", "/srv/storage").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn rejects_empty_root() {
        assert!(Settings::new("", "/srv/tmp").is_err());
    }
}
