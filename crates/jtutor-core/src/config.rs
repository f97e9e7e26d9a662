//! Configuration management for jtutor.
//!
//! Loads configuration from ${JTUTOR_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::providers::GeminiConfig;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for jtutor configuration and data files.
    //!
    //! JTUTOR_HOME resolution order:
    //! 1. JTUTOR_HOME environment variable (if set)
    //! 2. ~/.config/jtutor (default)
    //! 3. ./.jtutor when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the jtutor home directory.
    pub fn jtutor_home() -> PathBuf {
        if let Ok(home) = std::env::var("JTUTOR_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".jtutor"),
            |h| h.join(".config").join("jtutor"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        jtutor_home().join("config.toml")
    }

    /// Returns the path to the completed-topics file.
    pub fn progress_path() -> PathBuf {
        jtutor_home().join("progress.json")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        jtutor_home().join("logs")
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Language being taught; substituted into every prompt.
    pub language: String,
    pub quiz_questions: u32,
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            max_output_tokens: None,
            language: Self::DEFAULT_LANGUAGE.to_string(),
            quiz_questions: Self::DEFAULT_QUIZ_QUESTIONS,
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
    pub const DEFAULT_LANGUAGE: &str = "Java";
    pub const DEFAULT_QUIZ_QUESTIONS: u32 = 3;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Resolves the Gemini client settings (API key, base URL) for this config.
    ///
    /// # Errors
    /// Returns an error when no API key is configured or the base URL is invalid.
    pub fn gemini(&self) -> Result<GeminiConfig> {
        let gemini = &self.providers.gemini;
        GeminiConfig::from_env(
            self.model.clone(),
            self.max_output_tokens,
            gemini.base_url.as_deref(),
            gemini.api_key.as_deref(),
        )
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}
