use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::{SearchOptions, DEFAULT_MAX_NEW_RESULTS, DEFAULT_RESULT_WINDOW};

/// Environment variable that overrides `[server].port`.
pub const PORT_ENV: &str = "PORT";

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/shakesearch.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("completeworks.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_result_window")]
    pub result_window: usize,
    #[serde(default = "default_max_new_results")]
    pub max_new_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_window: default_result_window(),
            max_new_results: default_max_new_results(),
        }
    }
}

fn default_result_window() -> usize {
    DEFAULT_RESULT_WINDOW
}
fn default_max_new_results() -> usize {
    DEFAULT_MAX_NEW_RESULTS
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            result_window: self.result_window,
            max_new_results: self.max_new_results,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

impl ServerConfig {
    /// Listening address, with `PORT` taking precedence over the file.
    pub fn bind_addr(&self) -> Result<String> {
        let port = resolve_port(std::env::var(PORT_ENV).ok(), self.port)?;
        Ok(format!("{}:{}", self.host, port))
    }
}

/// An unset or empty `PORT` falls back to the configured port; anything
/// else must parse as a port number.
pub fn resolve_port(env_value: Option<String>, fallback: u16) -> Result<u16> {
    match env_value.as_deref().map(str::trim) {
        None | Some("") => Ok(fallback),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, raw)),
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Loads `path` when given. Without an explicit path the default location is
/// optional and built-in defaults apply when it does not exist.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.search.max_new_results == 0 {
        anyhow::bail!("search.max_new_results must be > 0");
    }

    if config.server.host.trim().is_empty() {
        anyhow::bail!("server.host must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shakesearch.toml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_tmp, path) = write_config("");
        let config = load_config(&path).unwrap();

        assert_eq!(config.corpus.path, PathBuf::from("completeworks.txt"));
        assert_eq!(config.search.options(), SearchOptions::default());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.static_dir, PathBuf::from("./static"));
    }

    #[test]
    fn test_full_file() {
        let (_tmp, path) = write_config(
            r#"
[corpus]
path = "/srv/corpus.txt"

[search]
result_window = 80
max_new_results = 5

[server]
host = "127.0.0.1"
port = 8080
static_dir = "/srv/static"
"#,
        );
        let config = load_config(&path).unwrap();

        assert_eq!(config.corpus.path, PathBuf::from("/srv/corpus.txt"));
        assert_eq!(config.search.result_window, 80);
        assert_eq!(config.search.max_new_results, 5);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let (_tmp, path) = write_config("[search]\nmax_new_results = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_new_results"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let (_tmp, path) = write_config("[server\nport = ");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        let err = load_or_default(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_port_resolution() {
        assert_eq!(resolve_port(None, 3001).unwrap(), 3001);
        assert_eq!(resolve_port(Some(String::new()), 3001).unwrap(), 3001);
        assert_eq!(resolve_port(Some("8080".to_string()), 3001).unwrap(), 8080);
        assert!(resolve_port(Some("eighty".to_string()), 3001).is_err());
        assert!(resolve_port(Some("70000".to_string()), 3001).is_err());
    }
}
