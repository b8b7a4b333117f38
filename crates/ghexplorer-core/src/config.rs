use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ghexplorer";

/// Main configuration structure
///
/// This gets loaded from the config file, then CLI flags and env vars
/// override it. Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load config from default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the config file path
    /// Uses XDG on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Directory for the storage database and the TUI log file
    pub fn data_dir() -> crate::Result<PathBuf> {
        Ok(dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join(APP_DIR))
    }

    /// Resolved storage database path
    pub fn db_path(&self) -> crate::Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("storage.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubConfig {
    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,

    /// Request timeout; a hung search would otherwise block pagination
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_github_url() -> String {
    ghexplorer_api::DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ghexplorer/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Query behind the trending view
    #[serde(default = "default_trending_query")]
    pub trending_query: String,

    #[serde(default = "default_trending_per_page")]
    pub trending_per_page: u32,

    #[serde(default = "default_search_per_page")]
    pub search_per_page: u32,

    /// Quiet period after the last keystroke before a search fires
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Rows from the end of the list that count as "near the bottom"
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: usize,

    /// Languages shown in the distribution chart
    #[serde(default = "default_language_top_n")]
    pub language_top_n: usize,
}

fn default_trending_query() -> String {
    "stars:>10000".to_string()
}

fn default_trending_per_page() -> u32 {
    25
}

fn default_search_per_page() -> u32 {
    20
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_scroll_threshold() -> usize {
    3
}

fn default_language_top_n() -> usize {
    8
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            trending_query: default_trending_query(),
            trending_per_page: default_trending_per_page(),
            search_per_page: default_search_per_page(),
            debounce_ms: default_debounce_ms(),
            scroll_threshold: default_scroll_threshold(),
            language_top_n: default_language_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageConfig {
    /// Override for the storage database location
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.feed.trending_query, "stars:>10000");
        assert_eq!(config.feed.trending_per_page, 25);
        assert_eq!(config.feed.search_per_page, 20);
        assert_eq!(config.feed.debounce_ms, 500);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("api_url"));
        assert!(toml.contains("debounce_ms"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [feed]
            debounce_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.debounce_ms, 250);
        assert_eq!(config.feed.search_per_page, 20);
        assert_eq!(config.github, GitHubConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("config.toml");

        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("db.sqlite"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "feed = 3 = 4").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(crate::Error::ConfigError(_))
        ));
    }
}
