//! Configuration management for the voice pipeline
//!
//! Provides persistent settings storage with schema versioning and migrations.
//! Configuration is stored in `~/.todo-voice/config.json`. Hosts that manage
//! their own settings location use [`load_from_path`] and [`save_to_path`]
//! directly; everything else goes through the cached global instance.

use crate::dictionary::{self, DictionaryEntry};
use crate::locale::Locale;
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Current config schema version
pub const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Errors loading, saving or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Listening session settings
    pub voice: VoiceConfig,
    /// Fuzzy task matching
    pub resolver: ResolverConfig,
    /// Transcript corrections applied before classification
    pub dictionary: Vec<DictionaryEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            voice: VoiceConfig::default(),
            resolver: ResolverConfig::default(),
            dictionary: dictionary::default_entries(),
        }
    }
}

impl Config {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.voice.validate()?;
        self.resolver.validate()?;
        dictionary::validate_entries(&self.dictionary)
    }
}

/// Listening session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Language a session starts in
    pub default_language: Locale,
    /// How long a result or error stays on screen before returning to idle
    pub result_display_ms: u64,
    /// Listening gives up after this long without a final transcript
    pub listening_timeout_seconds: u64,
    /// Longest title accepted for a new task
    pub max_title_length: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default_language: Locale::English,
            result_display_ms: 3000,
            listening_timeout_seconds: 10,
            max_title_length: 500,
        }
    }
}

impl VoiceConfig {
    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }

    pub fn listening_timeout(&self) -> Duration {
        Duration::from_secs(self.listening_timeout_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listening_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "listening_timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.max_title_length == 0 {
            return Err(ConfigError::Validation(
                "max_title_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the path to the config file (~/.todo-voice/config.json)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

/// Get the path to the config directory (~/.todo-voice)
pub fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".todo-voice")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Load configuration from `path`
///
/// A missing file yields defaults. Older schema versions are migrated and the
/// migrated file is written back.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("Config file not found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;

    let original_version = config.version;
    let migrated = migrate_config(config)?;
    if migrated.version != original_version {
        save_to_path(&migrated, path)?;
    }

    migrated.validate()?;
    Ok(migrated)
}

/// Save configuration to `path`, creating parent directories
pub fn save_to_path(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;

    tracing::info!(
        "Config saved to {:?} (language={}, dictionary entries={})",
        path,
        config.voice.default_language,
        config.dictionary.len()
    );
    Ok(())
}

/// Migrate configuration from older schema versions
pub fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    let original_version = config.version;

    // Apply migrations sequentially
    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 -> 1: unversioned files predate transcript corrections
        0 => {
            let mut migrated = config;
            if migrated.dictionary.is_empty() {
                migrated.dictionary = dictionary::default_entries();
            }
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}

/// Get the global config instance
fn get_config_instance() -> &'static Config {
    CONFIG.get_or_init(|| {
        let config = load_from_path(&get_config_path()).unwrap_or_else(|e| {
            tracing::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        tracing::info!(
            "Config loaded (language={}, timeout={}s)",
            config.voice.default_language,
            config.voice.listening_timeout_seconds
        );
        config
    })
}

/// Get the current configuration
///
/// The config is loaded from disk on first access and cached for the life
/// of the process.
pub fn get_config() -> Config {
    get_config_instance().clone()
}
