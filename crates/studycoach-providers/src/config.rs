//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studycoach_core::coach::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use studycoach_core::traits::LlmProvider;

use crate::openai::OpenAiCompatProvider;

/// Configuration for a single chat-completion provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Groq {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl ProviderConfig {
    fn api_key_mut(&mut self) -> &mut String {
        match self {
            ProviderConfig::Groq { api_key, .. } | ProviderConfig::OpenAI { api_key, .. } => {
                api_key
            }
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, base_url) = match self {
            ProviderConfig::Groq { base_url, .. } => ("Groq", base_url),
            ProviderConfig::OpenAI { base_url, .. } => ("OpenAI", base_url),
        };
        f.debug_struct(name)
            .field("api_key", &"***")
            .field("base_url", base_url)
            .finish()
    }
}

/// Top-level studycoach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudycoachConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// How many times the host regenerates a quiz that fails to compile or
    /// hits a transient provider error.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubles each retry.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for StudycoachConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl StudycoachConfig {
    /// Build the default provider, failing with the configured names if it
    /// is missing.
    pub fn default_provider_instance(&self) -> Result<Box<dyn LlmProvider>> {
        let name = &self.default_provider;
        let pconfig = self.providers.get(name).with_context(|| {
            format!(
                "provider '{}' not found in config. Available: {:?}",
                name,
                self.providers.keys().collect::<Vec<_>>()
            )
        })?;
        create_provider(pconfig)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Groq { api_key, base_url } => ProviderConfig::Groq {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI { api_key, base_url } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studycoach.toml` in the current directory
/// 2. `~/.config/studycoach/config.toml`
///
/// A `.env` file in the current directory is loaded first. Environment
/// variable overrides: `GROQ_API_KEY`, `OPENAI_API_KEY`.
pub fn load_config() -> Result<StudycoachConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudycoachConfig> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("ignoring unreadable .env file: {e}");
        }
    }

    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studycoach.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudycoachConfig::default(),
    };

    Ok(apply_env(config))
}

/// Parse a TOML config string without touching the environment.
pub fn parse_config(content: &str) -> Result<StudycoachConfig> {
    let config = toml::from_str::<StudycoachConfig>(content)?;
    anyhow::ensure!(
        (0.0..=2.0).contains(&config.default_temperature),
        "default_temperature must be between 0.0 and 2.0"
    );
    Ok(config)
}

/// Apply key overrides from the environment and resolve `${VAR}` references.
fn apply_env(mut config: StudycoachConfig) -> StudycoachConfig {
    if let Ok(key) = std::env::var("GROQ_API_KEY") {
        config
            .providers
            .entry("groq".into())
            .or_insert(ProviderConfig::Groq {
                api_key: String::new(),
                base_url: None,
            })
            .api_key_mut()
            .clone_from(&key);
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
            })
            .api_key_mut()
            .clone_from(&key);
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studycoach"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::Groq { api_key, base_url } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "missing Groq API key; set GROQ_API_KEY or providers.groq.api_key"
            );
            Ok(Box::new(OpenAiCompatProvider::groq(api_key, base_url.clone())?))
        }
        ProviderConfig::OpenAI { api_key, base_url } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "missing OpenAI API key; set OPENAI_API_KEY or providers.openai.api_key"
            );
            Ok(Box::new(OpenAiCompatProvider::openai(
                api_key,
                base_url.clone(),
            )?))
        }
    }
}
