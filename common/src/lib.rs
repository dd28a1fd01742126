/*!
common/src/lib.rs

Shared configuration types and credential loading for newspost.

This file provides:
- Config data structures (deserialized from TOML, every field defaulted)
- An async loader that merges a default file with an override file
- Credential resolution from the process environment and a KEY=VALUE file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving startup configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required credential {name} is not set (environment or key file)")]
    MissingCredential { name: String },

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address Rocket binds to
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// News search service (Currents API) section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_url: String,
    /// Name of the credential holding the API key
    pub api_key_env: String,
    pub language: String,
    pub max_headlines: usize,
    pub timeout_seconds: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.currentsapi.services/v1/latest-news".to_string(),
            api_key_env: "CURRENTS_API_KEY".to_string(),
            language: "en".to_string(),
            max_headlines: 5,
            timeout_seconds: 30,
        }
    }
}

/// Language the generation prompts (and the "no news" placeholder) are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[default]
    Ru,
    En,
}

/// Text generation service (OpenAI-compatible chat completions) section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub prompt_language: PromptLanguage,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.5,
            timeout_seconds: 60,
            prompt_language: PromptLanguage::Ru,
        }
    }
}

/// Telegram relay section. The relay is off unless `enabled = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub api_base: String,
    pub token_env: String,
    pub timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: "https://api.telegram.org".to_string(),
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            timeout_seconds: 15,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub telegram: TelegramConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). With neither,
    /// the built-in defaults are returned.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (path, label) in [(default_path, "default"), (override_path, "override")] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Load a `.env` file from the working directory into the process environment, if present.
/// Variables already set in the environment are not overwritten.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Credentials read from a plain `KEY=VALUE` file (one per line, `#` comments allowed).
#[derive(Debug, Clone, Default)]
pub struct KeyFile {
    entries: HashMap<String, String>,
}

impl KeyFile {
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self { entries }
    }

    /// Read a key file. A missing file yields an empty set of keys.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::KeyFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// API credentials needed by the outbound clients.
#[derive(Clone)]
pub struct Credentials {
    pub news_api_key: String,
    pub llm_api_key: String,
    /// Present only when the Telegram relay is enabled
    pub telegram_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("news_api_key", &"<redacted>")
            .field("llm_api_key", &"<redacted>")
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from the process environment, falling back to `keys`.
    pub fn resolve(config: &Config, keys: &KeyFile) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |name| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| keys.get(name).map(str::to_string))
        })
    }

    /// Resolve credentials through an arbitrary lookup. Blank values count as missing.
    pub fn resolve_with<F>(config: &Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential {
                    name: name.to_string(),
                })
        };

        let llm_api_key = require(&config.llm.api_key_env)?;
        let news_api_key = require(&config.news.api_key_env)?;
        let telegram_token = if config.telegram.enabled {
            Some(require(&config.telegram.token_env)?)
        } else {
            None
        };

        Ok(Self {
            news_api_key,
            llm_api_key,
            telegram_token,
        })
    }
}
