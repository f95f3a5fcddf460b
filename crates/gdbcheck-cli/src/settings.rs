use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "gdbcheck.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid settings in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Values from `gdbcheck.toml`. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// PostgreSQL schema holding standalone tables.
    pub table_schema: String,
    /// Restrict feature datasets to these PostgreSQL schemas.
    pub datasets: Option<Vec<String>>,
    pub scan_timeout_secs: u64,
    pub page_size: u32,
    pub hierarchy_key_width: Option<usize>,
    pub run_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_schema: "public".to_string(),
            datasets: None,
            scan_timeout_secs: 300,
            page_size: 5_000,
            hierarchy_key_width: None,
            run_dir: PathBuf::from("runs"),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        if settings.scan_timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                path: path.to_path_buf(),
                message: "scan_timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }
}

/// Load an explicit settings file, or `gdbcheck.toml` if it exists, or defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !fallback.exists() {
                return Ok(Settings::default());
            }
            fallback
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    Settings::from_toml_str(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let settings = Settings::from_toml_str(
            "table_schema = \"geology\"\nhierarchy_key_width = 2\n",
            Path::new("gdbcheck.toml"),
        )
        .unwrap();
        assert_eq!(settings.table_schema, "geology");
        assert_eq!(settings.hierarchy_key_width, Some(2));
        assert_eq!(settings.scan_timeout_secs, 300);
        assert_eq!(settings.run_dir, PathBuf::from("runs"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml_str("scan_timeout = 5\n", Path::new("gdbcheck.toml"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Toml { .. }));
    }

    #[test]
    fn zero_scan_timeout_is_rejected() {
        let err = Settings::from_toml_str("scan_timeout_secs = 0\n", Path::new("gdbcheck.toml"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
        assert!(err.to_string().contains("scan_timeout_secs"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/gdbcheck.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
