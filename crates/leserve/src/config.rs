//! Server configuration from TOML or environment

use lerecherche::corpus::DEFAULT_PUBLIC_BASE_URL;
use lerecherche::{LexicalConfig, ScoringConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default host address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port number
pub const DEFAULT_PORT: u16 = 5001;

/// Default requests allowed per client per window
pub const DEFAULT_RATE_LIMIT: usize = 100;

/// Default rate-limit window in seconds
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;

/// Default response cache lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 1800;

/// Candidate corpus files, tried in order
pub const DEFAULT_CORPUS_PATHS: &[&str] = &[
    "./data/articles.csv",
    "data/articles.csv",
    "../data/articles.csv",
];

/// Candidate lexical index directories, tried in order
pub const DEFAULT_INDEX_PATHS: &[&str] = &[
    "./data/article_index",
    "data/article_index",
    "../data/article_index",
];

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log level for tracing
    pub log_level: String,

    /// Candidate corpus CSV files
    pub corpus_paths: Vec<PathBuf>,

    /// Candidate lexical index directories
    pub index_paths: Vec<PathBuf>,

    /// Base of synthesized article URLs
    pub public_base_url: String,

    /// Local prefix stripped from lexical index filenames
    pub index_path_prefix: String,

    /// Requests allowed per client per window
    pub rate_limit: usize,

    /// Rate-limit window in seconds
    pub rate_window_secs: u64,

    /// Response cache lifetime in seconds
    pub cache_ttl_secs: u64,

    /// Upper bound (and default) for search `limit`
    pub max_results: usize,

    /// Upper bound (and default) for recommendation `limit`
    pub max_recommendations: usize,

    /// Longest accepted search query
    pub max_query_len: usize,

    /// Longest accepted reference title
    pub max_title_len: usize,

    /// Bound on a single lexical query in milliseconds
    pub lexical_timeout_ms: u64,

    /// Scoring constants
    pub scoring: ScoringConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: Self::default_log_level(),
            corpus_paths: Self::paths(DEFAULT_CORPUS_PATHS),
            index_paths: Self::paths(DEFAULT_INDEX_PATHS),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            index_path_prefix: "./geek/".to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window_secs: DEFAULT_RATE_WINDOW_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_results: 12,
            max_recommendations: 6,
            max_query_len: 500,
            max_title_len: 200,
            lexical_timeout_ms: 5000,
            scoring: ScoringConfig::default(),
        }
    }
}

impl ServerConfig {
    fn paths(raw: &[&str]) -> Vec<PathBuf> {
        raw.iter().map(PathBuf::from).collect()
    }

    /// Default log level
    fn default_log_level() -> String {
        "info".to_string()
    }

    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `LESERVE_HOST` - Server host
    /// - `LESERVE_PORT` - Server port
    /// - `LESERVE_CORPUS_PATH` - Corpus CSV file (replaces the candidate list)
    /// - `LESERVE_INDEX_PATH` - Lexical index directory (replaces the candidate list)
    /// - `LESERVE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a TOML file, then apply environment overrides
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay `LESERVE_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("LESERVE_HOST") {
            self.host = host;
        }

        if let Ok(port_str) = std::env::var("LESERVE_PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                self.port = port;
            }
        }

        if let Ok(corpus) = std::env::var("LESERVE_CORPUS_PATH") {
            self.corpus_paths = vec![PathBuf::from(corpus)];
        }

        if let Ok(index) = std::env::var("LESERVE_INDEX_PATH") {
            self.index_paths = vec![PathBuf::from(index)];
        }

        if let Ok(log_level) = std::env::var("LESERVE_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Get the socket address for the server
    ///
    /// # Returns
    ///
    /// `Result<SocketAddr, String>` - Parsed address or error message
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Get the full server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Lexical adapter settings derived from this config
    #[must_use]
    pub fn lexical_config(&self) -> LexicalConfig {
        LexicalConfig {
            index_paths: self.index_paths.clone(),
            path_prefix: self.index_path_prefix.clone(),
            public_base_url: self.public_base_url.clone(),
        }
    }

    /// Rate-limit window
    #[must_use]
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    /// Response cache lifetime
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Bound on a single lexical query
    #[must_use]
    pub fn lexical_timeout(&self) -> Duration {
        Duration::from_millis(self.lexical_timeout_ms)
    }

    /// Validate configuration
    ///
    /// # Returns
    ///
    /// `Result<(), String>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.rate_limit == 0 {
            return Err("Rate limit must be greater than zero".to_string());
        }

        if self.rate_window_secs == 0 {
            return Err("Rate window must be greater than zero".to_string());
        }

        if self.max_results == 0 || self.max_recommendations == 0 {
            return Err("Result limits must be greater than zero".to_string());
        }

        if self.max_query_len == 0 || self.max_title_len == 0 {
            return Err("Input length limits must be greater than zero".to_string());
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.corpus_paths.len(), 3);
        assert_eq!(config.index_paths[0], PathBuf::from("./data/article_index"));
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.rate_window(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.max_results, 12);
        assert_eq!(config.max_recommendations, 6);
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("LESERVE_HOST", "127.0.0.1");
        std::env::set_var("LESERVE_PORT", "8080");
        std::env::set_var("LESERVE_CORPUS_PATH", "/tmp/articles.csv");
        std::env::set_var("LESERVE_LOG_LEVEL", "debug");

        let config = ServerConfig::from_env();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.corpus_paths, vec![PathBuf::from("/tmp/articles.csv")]);
        assert_eq!(config.log_level, "debug");

        // Clean up
        std::env::remove_var("LESERVE_HOST");
        std::env::remove_var("LESERVE_PORT");
        std::env::remove_var("LESERVE_CORPUS_PATH");
        std::env::remove_var("LESERVE_LOG_LEVEL");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 9000
            rate_limit = 3

            [scoring]
            title_match_boost = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit, 3);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.scoring.title_match_boost, 1.5);
        assert_eq!(config.scoring.content_weight, 0.8);
    }

    #[test]
    fn test_toml_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ServerConfig::from_toml_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "port = \"many\"").unwrap();
        assert!(matches!(
            ServerConfig::from_toml_file(&bad),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_socket_addr() {
        let config = ServerConfig::default();
        let addr = config.socket_addr().expect("Default socket address should be valid");
        assert_eq!(addr.ip(), std::net::Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(addr.port(), 5001);
    }

    #[test]
    fn test_lexical_config() {
        let config = ServerConfig::default();
        let lexical = config.lexical_config();
        assert_eq!(lexical.path_prefix, "./geek/");
        assert_eq!(lexical.index_paths, config.index_paths);
    }

    #[test]
    fn test_config_validate_success() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validate_failures() {
        let cases = [
            ServerConfig {
                port: 0,
                ..Default::default()
            },
            ServerConfig {
                host: String::new(),
                ..Default::default()
            },
            ServerConfig {
                rate_limit: 0,
                ..Default::default()
            },
            ServerConfig {
                rate_window_secs: 0,
                ..Default::default()
            },
            ServerConfig {
                max_results: 0,
                ..Default::default()
            },
            ServerConfig {
                log_level: "invalid".to_string(),
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }
}
