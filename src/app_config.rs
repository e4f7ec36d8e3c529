use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Path to the vocabulary database (empty means the platform data directory)
    #[serde(default)]
    pub database_path: String,

    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Import config
    #[serde(default)]
    pub import: ImportConfig,

    /// Export config
    #[serde(default)]
    pub export: ExportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: MyMemory public API
    #[default]
    MyMemory,
    // @provider: LibreTranslate (hosted or self-hosted)
    LibreTranslate,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::MyMemory => "MyMemory",
            Self::LibreTranslate => "LibreTranslate",
        }
    }

    // @returns: Default endpoint for the provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::MyMemory => "https://api.mymemory.translated.net/get",
            Self::LibreTranslate => "https://libretranslate.com/translate",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MyMemory => write!(f, "mymemory"),
            Self::LibreTranslate => write!(f, "libretranslate"),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mymemory" => Ok(Self::MyMemory),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: Service URL, empty for the provider default
    #[serde(default)]
    pub endpoint: String,

    // @field: API key (LibreTranslate key, MyMemory key)
    #[serde(default)]
    pub api_key: String,

    // @field: Contact email, raises the MyMemory daily quota
    #[serde(default)]
    pub email: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed wait between retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Longest retry-after hint worth waiting for, in seconds
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Maximum number of concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Whether successful lookups are memoized for the session
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl TranslationConfig {
    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if self.endpoint.trim().is_empty() {
            self.provider.default_endpoint().to_string()
        } else {
            self.endpoint.trim().to_string()
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            email: String::new(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_retry_after_secs: default_max_retry_after_secs(),
            concurrent_requests: default_concurrent_requests(),
            cache_enabled: true,
        }
    }
}

/// Import settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImportConfig {
    /// Shortest token kept from free text
    #[serde(default = "default_min_word_length")]
    pub min_word_length: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            min_word_length: default_min_word_length(),
        }
    }
}

/// Flashcard export settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Number of cards per export when no limit is given
    #[serde(default = "default_export_limit")]
    pub default_limit: i64,

    /// Write a `front,back` header row
    #[serde(default)]
    pub include_header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_limit: default_export_limit(),
            include_header: false,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fa".to_string()
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_retry_after_secs() -> u64 {
    30
}

fn default_min_word_length() -> usize {
    2
}

fn default_export_limit() -> i64 {
    50
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Database location, falling back to the platform data directory
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if self.database_path.trim().is_empty() {
            crate::database::DatabaseConnection::default_database_path()
        } else {
            Ok(PathBuf::from(self.database_path.trim()))
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language are both '{}'",
                self.source_language
            ));
        }

        let translation = &self.translation;
        if translation.concurrent_requests == 0 {
            return Err(anyhow!("translation.concurrent_requests must be at least 1"));
        }
        if translation.timeout_secs == 0 {
            return Err(anyhow!("translation.timeout_secs must be at least 1"));
        }
        url::Url::parse(&translation.get_endpoint())
            .with_context(|| format!("Invalid translation endpoint: {}", translation.get_endpoint()))?;

        if self.import.min_word_length == 0 {
            return Err(anyhow!("import.min_word_length must be at least 1"));
        }
        if self.export.default_limit < 0 {
            return Err(anyhow!("export.default_limit cannot be negative"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: String::new(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            import: ImportConfig::default(),
            export: ExportConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
