//! Configuration management for novel-trans.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories, and derives the explicit
//! [`PipelineConfig`] and [`WorkPaths`] values the pipeline runs with.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "NovelTrans";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for unconfigured API keys.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Translation gateway API configuration.
    pub api: ApiConfig,

    /// Translation behavior settings.
    pub translation: TranslationConfig,

    /// LLM prompts.
    pub prompts: PromptsConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// API configuration for the OpenAI-compatible gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key (required).
    pub key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Upper bound for a single request in seconds.
    pub timeout_sec: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: API_KEY_PLACEHOLDER.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_sec: 60.0,
        }
    }
}

impl ApiConfig {
    /// Checks if the API key is configured (not placeholder).
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != API_KEY_PLACEHOLDER
    }
}

/// Translation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Language code of the novel (e.g. "zh").
    pub source_language: String,

    /// Language code to translate into (e.g. "en").
    pub target_language: String,

    /// Maximum characters per chapter before cutting at the next line break.
    pub max_chars_per_chapter: usize,

    /// Delay between gateway requests in seconds.
    pub delay_between_requests_sec: f64,

    /// Gateway attempts per line before the line is left empty.
    pub retries: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: "zh".to_string(),
            target_language: "en".to_string(),
            max_chars_per_chapter: 3000,
            delay_between_requests_sec: 1.0,
            retries: 3,
        }
    }
}

/// LLM system prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Prompt for single-line translation. `{source}` and `{target}` are
    /// replaced with the configured language codes.
    pub line_translation: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            line_translation: "You are a literary translator. Translate the line of novel text you are given from language '{source}' to language '{target}'. Reply with the translation only, on a single line, with no notes or explanations.".to_string(),
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for the progress file, chapter storage and output.
    /// Defaults to the directory containing the novel.
    pub output_directory: Option<PathBuf>,

    /// File name of the progress record.
    pub progress_file: String,

    /// Directory name for per-chapter storage.
    pub chapters_directory: String,

    /// Prefix prepended to the novel's file name for the output artifact.
    pub output_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            progress_file: "translation_data.json".to_string(),
            chapters_directory: "chapters".to_string(),
            output_prefix: "translated_".to_string(),
        }
    }
}

/// Resolved locations for one run against one novel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    /// Progress record file.
    pub progress: PathBuf,
    /// Per-chapter storage directory.
    pub chapters_dir: PathBuf,
    /// Interleaved output artifact.
    pub output: PathBuf,
}

impl PathsConfig {
    /// Resolves the work paths for the given novel file.
    pub fn resolve(&self, novel_path: &Path) -> WorkPaths {
        let base = match &self.output_directory {
            Some(dir) => dir.clone(),
            None => novel_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        let novel_name = novel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "novel.txt".to_string());

        WorkPaths {
            progress: base.join(&self.progress_file),
            chapters_dir: base.join(&self.chapters_directory),
            output: base.join(format!("{}{}", self.output_prefix, novel_name)),
        }
    }
}

/// The explicit settings the pipeline controller is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub source_lang: String,
    pub target_lang: String,
    pub max_chars_per_chapter: usize,
    pub request_delay: Duration,
    pub retries: u32,
}

impl TryFrom<&TranslationConfig> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(config: &TranslationConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            source_lang: config.source_language.clone(),
            target_lang: config.target_language.clone(),
            max_chars_per_chapter: config.max_chars_per_chapter,
            request_delay: seconds(
                "translation.delay_between_requests_sec",
                config.delay_between_requests_sec,
            )?,
            retries: config.retries,
        })
    }
}

/// Converts a seconds value from the config file into a `Duration`.
///
/// Negative, NaN, infinite and out-of-range values are rejected.
pub(crate) fn seconds(key: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| invalid(key, &e.to_string()))
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.is_configured() {
            return Err(ConfigError::MissingValue(
                "api.key (set your API key in config file)".to_string(),
            ));
        }

        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(invalid("api.base_url", &e.to_string()));
        }

        if seconds("api.timeout_sec", self.api.timeout_sec)?.is_zero() {
            return Err(invalid("api.timeout_sec", "must be greater than 0"));
        }

        let translation = &self.translation;
        if translation.source_language.trim().is_empty() {
            return Err(invalid("translation.source_language", "must not be empty"));
        }
        if translation.target_language.trim().is_empty() {
            return Err(invalid("translation.target_language", "must not be empty"));
        }
        if translation.max_chars_per_chapter == 0 {
            return Err(invalid(
                "translation.max_chars_per_chapter",
                "must be greater than 0",
            ));
        }
        if translation.retries == 0 {
            return Err(invalid("translation.retries", "must be at least 1"));
        }
        seconds(
            "translation.delay_between_requests_sec",
            translation.delay_between_requests_sec,
        )?;

        Ok(())
    }

    /// Returns the explicit pipeline settings derived from this config.
    pub fn pipeline(&self) -> Result<PipelineConfig, ConfigError> {
        PipelineConfig::try_from(&self.translation)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
