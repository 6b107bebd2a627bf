//! Application configuration for GitDocx.
//!
//! User config lives at `~/.gitdocx/gitdocx.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GitDocxError, Result};
use crate::types::{DEFAULT_EXTENSIONS, Layout};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "gitdocx.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".gitdocx";

// ---------------------------------------------------------------------------
// Config structs (matching gitdocx.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Job server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory the standalone run writes documents into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File name suffixes selected for rendering.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Document grouping.
    #[serde(default)]
    pub layout: Layout,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            extensions: default_extensions(),
            layout: Layout::default(),
        }
    }
}

fn default_output_dir() -> String {
    "Output_Reports".into()
}
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base address of the content API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Root under which each job gets its own output directory.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Number of background workers draining the job queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            output_root: default_output_root(),
            workers: default_workers(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_output_root() -> String {
    "output".into()
}
fn default_workers() -> usize {
    2
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration: merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Base address of the content API.
    pub api_base: String,
    /// Access token sent with every request, if any.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// File name suffixes selected for rendering.
    pub extensions: Vec<String>,
    /// Document grouping.
    pub layout: Layout,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_base: config.github.api_base.clone(),
            token: resolve_token(config),
            timeout_secs: config.github.timeout_secs,
            extensions: config.defaults.extensions.clone(),
            layout: config.defaults.layout,
        }
    }
}

/// Read the access token from the env var named in `[github].token_env`.
pub fn resolve_token(config: &AppConfig) -> Option<String> {
    std::env::var(&config.github.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.gitdocx/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| GitDocxError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.gitdocx/gitdocx.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GitDocxError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        GitDocxError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GitDocxError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GitDocxError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GitDocxError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings no run could work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    Url::parse(&config.github.api_base).map_err(|e| {
        GitDocxError::config(format!(
            "github.api_base '{}' is not a valid URL: {e}",
            config.github.api_base
        ))
    })?;

    if config.defaults.extensions.iter().any(|e| e.is_empty()) {
        return Err(GitDocxError::config(
            "defaults.extensions must not contain empty entries",
        ));
    }

    if config.server.workers == 0 {
        return Err(GitDocxError::config("server.workers must be at least 1"));
    }

    Ok(())
}
