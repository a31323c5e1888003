use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::model::{ConfigFormat, Submitter};

static DEFAULT_CONFIG_NAME: &str = "config.yaml";
static DEFAULT_LOG_NAME: &str = "rlboard.log";
static ENV_CONFIG: &str = "RLBOARD_CONFIG";
static ENV_USER: &str = "RLBOARD_USER";
static ENV_AVATAR: &str = "RLBOARD_AVATAR";

static DEFAULT_USER: &str = "Current User";
static DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1519244703995-f4e0f30006d5?w=32&h=32&fit=crop&crop=face";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "rlboard", "rlboard"));

/// Session settings: who is submitting and which format the editor starts in.
#[derive(Debug, Clone)]
pub struct AppConfig {
    submitter: Submitter,
    default_format: ConfigFormat,
    source: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    submitter: SubmitterFile,
    default_format: Option<ConfigFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubmitterFile {
    name: Option<String>,
    avatar_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            submitter: Submitter {
                name: DEFAULT_USER.to_string(),
                avatar_url: DEFAULT_AVATAR.to_string(),
            },
            default_format: ConfigFormat::Json,
            source: None,
        }
    }
}

impl AppConfig {
    /// Construct [`AppConfig`] from the override path, `RLBOARD_CONFIG`, or the platform
    /// config directory, then apply the identity environment overrides.
    pub fn discover(config_override: Option<PathBuf>) -> Result<Self> {
        let mut config = match resolve_config_path(config_override) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Ok(name) = env::var(ENV_USER) {
            if !name.trim().is_empty() {
                config.submitter.name = name;
            }
        }
        if let Ok(avatar) = env::var(ENV_AVATAR) {
            config.submitter.avatar_url = avatar;
        }
        Ok(config)
    }

    /// Load a YAML (or JSON) session file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let file: ConfigFile = if raw.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file at {}", path.display()))?
        };

        let mut config = Self::default();
        if let Some(name) = file.submitter.name {
            config.submitter.name = name;
        }
        if let Some(avatar) = file.submitter.avatar_url {
            config.submitter.avatar_url = avatar;
        }
        if let Some(format) = file.default_format {
            config.default_format = format;
        }
        config.source = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    pub fn with_submitter(mut self, submitter: Submitter) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn with_default_format(mut self, format: ConfigFormat) -> Self {
        self.default_format = format;
        self
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    pub fn default_format(&self) -> ConfigFormat {
        self.default_format
    }

    /// File the settings were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Where the dashboard writes its trace output, since stderr is hidden behind the
/// alternate screen.
pub fn default_log_path() -> PathBuf {
    PROJECT_DIRS
        .as_ref()
        .map(|project| project.data_local_dir().join(DEFAULT_LOG_NAME))
        .unwrap_or_else(|| env::temp_dir().join(DEFAULT_LOG_NAME))
}

fn resolve_config_path(config_override: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(path);
    }

    if let Ok(env_path) = env::var(ENV_CONFIG) {
        return Some(PathBuf::from(env_path));
    }

    PROJECT_DIRS
        .as_ref()
        .map(|project| project.config_dir().join(DEFAULT_CONFIG_NAME))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_to_current_user_and_json() {
        let config = AppConfig::default();
        assert_eq!(config.submitter().name, "Current User");
        assert_eq!(config.default_format(), ConfigFormat::Json);
        assert!(config.source().is_none());
    }

    #[test]
    fn reads_yaml_session_file() {
        let file = write_config(
            "submitter:\n  name: Ada\n  avatar_url: https://example.com/ada.png\ndefault_format: yaml\n",
        );
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.submitter().name, "Ada");
        assert_eq!(config.submitter().avatar_url, "https://example.com/ada.png");
        assert_eq!(config.default_format(), ConfigFormat::Yaml);
        assert_eq!(config.source(), Some(file.path()));
    }

    #[test]
    fn reads_json_session_file_with_partial_keys() {
        let file = write_config("{\"submitter\": {\"name\": \"Grace\"}}");
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.submitter().name, "Grace");
        assert_eq!(config.submitter().avatar_url, DEFAULT_AVATAR);
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let file = write_config("");
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.submitter().name, DEFAULT_USER);
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = write_config("theme: dark\n");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn log_path_names_the_log_file() {
        assert_eq!(
            default_log_path().file_name().and_then(|name| name.to_str()),
            Some(DEFAULT_LOG_NAME)
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppConfig::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
