//! Application configuration for MadForge.
//!
//! User config lives at `~/.madforge/madforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MadError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "madforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".madforge";

/// Model selector that disables a capability.
pub const DISABLED_MODEL: &str = "none";

// ---------------------------------------------------------------------------
// Config structs (matching madforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Embedding capability.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Entity tagger capability.
    #[serde(default)]
    pub tagger: TaggerConfig,

    /// Source loading limits.
    #[serde(default)]
    pub source: SourceConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output directory for bundles. Empty means `<stem>_mad` next to the source.
    #[serde(default)]
    pub output_dir: String,
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model selector (`hashing-<dims>` or `none`).
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

fn default_embedding_model() -> String {
    "hashing-384".into()
}

/// `[tagger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Tagger model selector (`patterns` or `none`).
    #[serde(default = "default_tagger_model")]
    pub model: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            model: default_tagger_model(),
        }
    }
}

fn default_tagger_model() -> String {
    "patterns".into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// HTTP timeout for URL sources, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest source accepted, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_bytes() -> u64 {
    50 * 1024 * 1024
}

// ---------------------------------------------------------------------------
// Convert settings (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime conversion settings, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ConvertSettings {
    /// Output directory override; `None` derives one from the source.
    pub output_dir: Option<PathBuf>,
    pub embedding_model: String,
    pub tagger_model: String,
    pub timeout_secs: u64,
    pub max_bytes: u64,
}

impl From<&AppConfig> for ConvertSettings {
    fn from(config: &AppConfig) -> Self {
        let output_dir = config.defaults.output_dir.trim();
        Self {
            output_dir: (!output_dir.is_empty()).then(|| PathBuf::from(output_dir)),
            embedding_model: config.embedding.model.clone(),
            tagger_model: config.tagger.model.clone(),
            timeout_secs: config.source.timeout_secs,
            max_bytes: config.source.max_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.madforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MadError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.madforge/madforge.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| MadError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MadError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MadError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| MadError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MadError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
