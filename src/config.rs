//! Optional user configuration file.
//!
//! Stored in `~/.arcode/config.json`. Every key is optional; explicit CLI
//! flags override the file, and `env` entries are only exported when the
//! variable is not already set in the process environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Fatal configuration problems, reported before any work is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing credential: set {variable} to use {provider} models")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Unsupported model provider '{0}' (expected openai/, anthropic/, gemini/ or azure/)")]
    UnsupportedProvider(String),

    #[error("{provider} does not offer an embeddings API; choose another --model-embedding")]
    EmbeddingsUnsupported { provider: &'static str },

    #[error("Invalid config file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Unsupported image format: {0} (expected PNG, JPEG, GIF, WEBP, BMP or TIFF)")]
    UnsupportedImage(PathBuf),
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub env: BTreeMap<String, String>,
    pub model: Option<String>,
    pub model_embedding: Option<String>,
    pub max_estimated_cost: Option<f64>,
    pub max_file_size: Option<u64>,
    pub ignore: Vec<String>,
    pub resources: Vec<String>,
}

/// `~/.arcode/config.json`, when a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".arcode").join("config.json"))
}

impl ConfigFile {
    /// Load from `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfigFile {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let config: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidConfigFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        info!("📋 Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or the default location when `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => match default_config_path() {
                Some(p) => Self::load(&p),
                None => Ok(Self::default()),
            },
        }
    }

    /// Export `env` entries that are not already set. Returns the names exported.
    pub fn apply_env(&self) -> Vec<String> {
        let mut exported = Vec::new();
        for (name, value) in &self.env {
            if std::env::var_os(name).is_some() {
                debug!("Environment already defines {}, keeping it", name);
                continue;
            }
            std::env::set_var(name, value);
            exported.push(name.clone());
        }
        exported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_config() {
        let tmp = tempdir().unwrap();
        let config = ConfigFile::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_partial_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"model": "anthropic/claude-3-opus-20240229", "ignore": ["*.lock"], "max_estimated_cost": 2.5}"#,
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.model.as_deref(), Some("anthropic/claude-3-opus-20240229"));
        assert_eq!(config.ignore, vec!["*.lock".to_string()]);
        assert_eq!(config.max_estimated_cost, Some(2.5));
        assert!(config.env.is_empty());
        assert!(config.max_file_size.is_none());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfigFile { .. }));
    }

    #[test]
    fn test_apply_env_keeps_existing_values() {
        let keep = "ARCODE_TEST_CONFIG_KEEP";
        let fresh = "ARCODE_TEST_CONFIG_FRESH";
        std::env::set_var(keep, "original");
        std::env::remove_var(fresh);

        let mut config = ConfigFile::default();
        config.env.insert(keep.to_string(), "from-config".to_string());
        config.env.insert(fresh.to_string(), "from-config".to_string());

        let exported = config.apply_env();
        assert_eq!(exported, vec![fresh.to_string()]);
        assert_eq!(std::env::var(keep).unwrap(), "original");
        assert_eq!(std::env::var(fresh).unwrap(), "from-config");

        std::env::remove_var(keep);
        std::env::remove_var(fresh);
    }
}
