//! ---
//! weft_section: "01-core-functionality"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Shared primitives and utilities for the core runtime."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_check_extension_code() -> bool {
    false
}

fn default_task_permission() -> DefaultTaskPermission {
    DefaultTaskPermission::Update
}

/// Primary configuration object for the Weft engine runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

/// Metadata describing where an [`EngineConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedEngineConfig {
    pub config: EngineConfig,
    pub source: PathBuf,
}

/// Logging sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format of the tracing subscriber.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Directory where rolling log files are written.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directory: default_logging_directory(),
        }
    }
}

/// Configuration surface of the access-control subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Whether externally-supplied extension code is itself subject to
    /// authorization checks when it calls back into the engine API.
    #[serde(default = "default_check_extension_code")]
    pub check_extension_code: bool,
    /// Action permission the auto-grant maintainer adds on top of READ when
    /// an identity becomes linked to a task.
    #[serde(default = "default_task_permission")]
    pub default_task_permission: DefaultTaskPermission,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            check_extension_code: default_check_extension_code(),
            default_task_permission: default_task_permission(),
        }
    }
}

/// Selectable default action permission for auto-granted task access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultTaskPermission {
    /// Broad task update permission.
    Update,
    /// Narrow "work on this task" permission.
    TaskWork,
}

impl EngineConfig {
    pub const ENV_CONFIG_PATH: &str = "WEFT_CONFIG";

    /// Load configuration from disk, respecting the `WEFT_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedEngineConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedEngineConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedEngineConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Parse a configuration file from an explicit path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("unable to read configuration file {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&raw)
            .with_context(|| format!("invalid configuration file {}", path.display()))?;
        config.validate()?;
        debug!(source = %path.display(), "engine configuration loaded");
        Ok(config)
    }

    /// Validate cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.logging.directory.as_os_str().is_empty() {
            return Err(anyhow!("logging.directory must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_empty_document() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
        assert!(!config.authorization.check_extension_code);
        assert_eq!(
            config.authorization.default_task_permission,
            DefaultTaskPermission::Update
        );
    }

    #[test]
    fn sections_override_defaults() {
        let raw = r#"
            [logging]
            format = "pretty"

            [authorization]
            check_extension_code = true
            default_task_permission = "task-work"
        "#;
        let config: EngineConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.authorization.check_extension_code);
        assert_eq!(
            config.authorization.default_task_permission,
            DefaultTaskPermission::TaskWork
        );
    }

    #[test]
    fn unknown_default_permission_is_rejected() {
        let raw = r#"
            [authorization]
            default_task_permission = "delete"
        "#;
        assert!(toml::from_str::<EngineConfig>(raw).is_err());
    }

    #[test]
    fn load_reads_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[authorization]\ncheck_extension_code = true").unwrap();

        let missing = dir.path().join("absent.toml");
        let loaded = EngineConfig::load_with_source(&[missing, path.clone()]).unwrap();
        assert_eq!(loaded.source, path);
        assert!(loaded.config.authorization.check_extension_code);
    }

    #[test]
    fn load_fails_without_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(EngineConfig::load(&[missing]).is_err());
    }
}
