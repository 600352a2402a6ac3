use crate::model::ChunkStrategy;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Environment variable selecting the embedding provider.
pub const ENV_EMBEDDER: &str = "GLEAN_EMBEDDER";
/// Environment variable overriding the embedding server base URL.
pub const ENV_EMBED_URL: &str = "GLEAN_EMBED_URL";
/// Environment variable overriding the embedding model name.
pub const ENV_EMBED_MODEL: &str = "GLEAN_EMBED_MODEL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GleanConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub text_search: TextSearchConfig,
    #[serde(default)]
    pub item_select: ItemSelectConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// When false, no embedding backend is built regardless of `[embedder]`.
    #[serde(default = "default_true")]
    pub semantic: bool,
    #[serde(default)]
    pub chunk_strategy: ChunkStrategy,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic: default_true(),
            chunk_strategy: ChunkStrategy::default(),
            max_results: default_max_results(),
            min_score: default_min_score(),
        }
    }
}

/// Interactive passage search over a body of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSearchConfig {
    #[serde(default = "default_text_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_text_min_query_length")]
    pub min_query_length: usize,
}

impl Default for TextSearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_text_debounce_ms(),
            min_query_length: default_text_min_query_length(),
        }
    }
}

impl TextSearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Interactive item selection (command palettes, pickers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSelectConfig {
    #[serde(default = "default_item_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_item_min_query_length")]
    pub min_query_length: usize,
}

impl Default for ItemSelectConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_item_debounce_ms(),
            min_query_length: default_item_min_query_length(),
        }
    }
}

impl ItemSelectConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    /// No embedding backend; item ranking is lexical-only.
    #[default]
    None,
    /// Deterministic in-process feature hashing.
    Hashing,
    /// A local Ollama server's `/api/embed` endpoint.
    Ollama,
}

impl fmt::Display for EmbedderProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Hashing => "hashing",
            Self::Ollama => "ollama",
        })
    }
}

impl FromStr for EmbedderProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "" => Ok(Self::None),
            "hashing" | "hash" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown embedder provider '{other}' (expected none|hashing|ollama)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub provider: EmbedderProvider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embed_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Vector width produced by the hashing embedder.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::default(),
            base_url: default_base_url(),
            model: default_embed_model(),
            timeout_secs: default_timeout_secs(),
            dimensions: default_dimensions(),
        }
    }
}

impl EmbedderConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<GleanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<GleanConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Path of the project-local config file under `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".glean/config.toml")
}

/// Path of the per-user config file, if the OS exposes a config directory.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("glean/config.toml"))
}

/// Resolve the effective configuration.
///
/// The first file found wins: `explicit`, then `.glean/config.toml` under
/// `project_root`, then the user config file. Environment overrides
/// (`GLEAN_EMBEDDER`, `GLEAN_EMBED_URL`, `GLEAN_EMBED_MODEL`) are applied last.
pub fn resolve_config(project_root: &Path, explicit: Option<&Path>) -> Result<GleanConfig> {
    let mut config = if let Some(path) = explicit {
        load_config_file(path)?
    } else {
        let candidates = std::iter::once(project_config_path(project_root)).chain(user_config_path());
        let mut found = None;
        for path in candidates {
            if path.exists() {
                debug!("loading config from {}", path.display());
                found = Some(load_config_file(&path)?);
                break;
            }
        }
        found.unwrap_or_default()
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    config: &mut GleanConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(raw) = lookup(ENV_EMBEDDER) {
        config.embedder.provider = raw
            .parse()
            .with_context(|| format!("invalid {ENV_EMBEDDER} value"))?;
    }
    if let Some(url) = lookup(ENV_EMBED_URL).filter(|v| !v.trim().is_empty()) {
        config.embedder.base_url = url;
    }
    if let Some(model) = lookup(ENV_EMBED_MODEL).filter(|v| !v.trim().is_empty()) {
        config.embedder.model = model;
    }
    Ok(())
}

const fn default_true() -> bool {
    true
}

const fn default_max_results() -> usize {
    5
}

const fn default_min_score() -> f32 {
    0.3
}

const fn default_text_debounce_ms() -> u64 {
    300
}

const fn default_text_min_query_length() -> usize {
    2
}

const fn default_item_debounce_ms() -> u64 {
    200
}

const fn default_item_min_query_length() -> usize {
    1
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_dimensions() -> usize {
    256
}
