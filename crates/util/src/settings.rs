//! Data source settings resolution.
//!
//! Settings come from a small JSON file (the same `jsonData` shape the host's
//! config editor stores, e.g. `{"baseUrl": "http://10.0.0.5:8181"}`), then
//! environment overrides. The file lives in the standard configuration
//! directory (`~/.config/odl/datasource.json` on most platforms) unless
//! `ODL_SETTINGS_PATH` points elsewhere.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use odl_types::DataSourceSettings;
use thiserror::Error;
use tracing::debug;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "ODL_SETTINGS_PATH";

/// Environment variable overriding the controller base URL.
pub const BASE_URL_ENV: &str = "ODL_BASE_URL";

pub const SETTINGS_FILE_NAME: &str = "datasource.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings in {path} are not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Path consulted when no explicit settings file is given.
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("odl").join(SETTINGS_FILE_NAME)
}

/// Loads settings and applies environment overrides.
///
/// An explicit `path` must exist. The default path is optional; when it is
/// missing the built-in defaults are used.
pub fn load_settings(path: Option<&Path>) -> Result<DataSourceSettings, SettingsError> {
    let settings = match path {
        Some(explicit) => read_settings_file(explicit)?,
        None => {
            let default_path = default_settings_path();
            match read_settings_file(&default_path) {
                Err(SettingsError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %default_path.display(), "no settings file; using defaults");
                    DataSourceSettings::default()
                }
                other => other?,
            }
        }
    };
    Ok(apply_env_overrides(settings))
}

/// Applies `ODL_BASE_URL` when it is set to a non-blank value.
pub fn apply_env_overrides(settings: DataSourceSettings) -> DataSourceSettings {
    match env::var(BASE_URL_ENV) {
        Ok(base_url) if !base_url.trim().is_empty() => settings.with_base_url(base_url.trim()),
        _ => settings,
    }
}

fn read_settings_file(path: &Path) -> Result<DataSourceSettings, SettingsError> {
    let data = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| SettingsError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use odl_types::DEFAULT_BASE_URL;

    #[test]
    fn explicit_file_is_read_and_env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasource.json");
        fs::write(&path, r#"{"baseUrl": "http://10.0.0.5:8181"}"#).unwrap();

        temp_env::with_var(BASE_URL_ENV, None::<&str>, || {
            let settings = load_settings(Some(&path)).expect("load settings");
            assert_eq!(settings.base_url, "http://10.0.0.5:8181");
        });
        temp_env::with_var(BASE_URL_ENV, Some("http://odl.lab:8181"), || {
            let settings = load_settings(Some(&path)).expect("load settings");
            assert_eq!(settings.base_url, "http://odl.lab:8181");
        });
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        temp_env::with_vars(
            [
                (SETTINGS_PATH_ENV, Some(missing.to_string_lossy().to_string())),
                (BASE_URL_ENV, None),
            ],
            || {
                let settings = load_settings(None).expect("defaults");
                assert_eq!(settings.base_url, DEFAULT_BASE_URL);
            },
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasource.json");
        fs::write(&path, "{ baseUrl: ").unwrap();
        let error = load_settings(Some(&path)).unwrap_err();
        assert!(error.to_string().contains("datasource.json"), "error: {error}");
    }
}
