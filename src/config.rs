//! Configuration file parser for ~/.config/magipaper/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::filter::MIN_SEARCH_DEBOUNCE;
use crate::related::DEFAULT_RELATED_LIMIT;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period before typed search text is applied. Values below 300
    /// are raised to 300.
    pub search_debounce_ms: u64,

    /// Simulated latency of the built-in article source.
    pub load_latency_ms: u64,

    /// Maximum number of related articles on the detail view.
    pub related_limit: usize,

    /// Preference database location. Defaults to `magipaper.db` in the
    /// config directory.
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_debounce_ms: MIN_SEARCH_DEBOUNCE.as_millis() as u64,
            load_latency_ms: 500,
            related_limit: DEFAULT_RELATED_LIMIT,
            database_path: None,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "search_debounce_ms",
        "load_latency_ms",
        "related_limit",
        "database_path",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a huge file is never pulled into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            path = %path.display(),
            search_debounce_ms = config.search_debounce_ms,
            related_limit = config.related_limit,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Search debounce, never below the 300 ms floor.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms).max(MIN_SEARCH_DEBOUNCE)
    }

    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }

    /// Resolve the database path, relative paths against `config_dir`.
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => config_dir.join(path),
            None => config_dir.join("magipaper.db"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Fresh scratch directory per test name.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("magipaper_config_test_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.load_latency_ms, 500);
        assert_eq!(config.related_limit, 5);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/magipaper_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = scratch("empty");
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = scratch("partial");
        let path = dir.join("config.toml");
        std::fs::write(&path, "related_limit = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.related_limit, 3);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.load_latency_ms, 500);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = scratch("full");
        let path = dir.join("config.toml");
        let content = r#"
search_debounce_ms = 450
load_latency_ms = 0
related_limit = 8
database_path = "/var/tmp/prefs.db"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.search_debounce(), Duration::from_millis(450));
        assert_eq!(config.load_latency(), Duration::ZERO);
        assert_eq!(config.related_limit, 8);
        assert_eq!(
            config.database_path(Path::new("/home/u/.config/magipaper")),
            PathBuf::from("/var/tmp/prefs.db")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debounce_is_clamped() {
        let config = Config {
            search_debounce_ms: 20,
            ..Config::default()
        };
        assert_eq!(config.search_debounce(), MIN_SEARCH_DEBOUNCE);
    }

    #[test]
    fn test_database_path_resolution() {
        let dir = Path::new("/home/u/.config/magipaper");
        assert_eq!(
            Config::default().database_path(dir),
            dir.join("magipaper.db")
        );

        let relative = Config {
            database_path: Some(PathBuf::from("other.db")),
            ..Config::default()
        };
        assert_eq!(relative.database_path(dir), dir.join("other.db"));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = scratch("invalid");
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = scratch("unknown");
        let path = dir.join("config.toml");
        let content = r#"
related_limit = 4
theme = "dark"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.related_limit, 4);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = scratch("wrongtype");
        let path = dir.join("config.toml");
        std::fs::write(&path, "related_limit = \"five\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = scratch("too_large");
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_at_size_limit_accepted() {
        let dir = scratch("at_limit");
        let path = dir.join("config.toml");

        let mut content = "related_limit = 5\n".to_string();
        while content.len() < 1_048_576 - 20 {
            content.push_str("# padding comment\n");
        }
        content.truncate(1_048_576);
        std::fs::write(&path, &content).unwrap();

        assert!(Config::load(&path).is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }
}
