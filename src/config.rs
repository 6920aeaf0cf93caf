//! Configuration for factcheck.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (a `.env` file is loaded into the environment
//!    by the binary before configuration is read)
//! 2. Config file (.factcheck/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .factcheck/config.yaml
//! - Falls back to ~/.factcheck/config.yaml
//!
//! Credentials have no defaults. Without search credentials the keyless
//! fallback backend is used; without a model key every verification ends
//! UNVERIFIED with the configuration error in its summary.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{duckduckgo, google};
use crate::core::PipelineLimits;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_MODEL: &str = "tngtech/deepseek-r1t2-chimera:free";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const APP_NAME: &str = "Fake News Verification API";

const CONFIG_DIR: &str = ".factcheck";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub model: Option<ModelConfig>,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
    pub endpoint: Option<String>,
    pub fallback_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub referer: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfig {
    pub call_timeout_seconds: Option<u64>,
    pub min_claim_chars: Option<usize>,
    pub max_claim_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub address: Option<String>,
}

/// Search backend settings
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Custom Search API key (primary backend)
    pub api_key: Option<String>,
    /// Custom Search engine id (primary backend)
    pub engine_id: Option<String>,
    pub endpoint: String,
    pub fallback_endpoint: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: google::DEFAULT_ENDPOINT.to_string(),
            fallback_endpoint: duckduckgo::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Sent as `HTTP-Referer`
    pub referer: String,
    /// Sent as `X-Title`
    pub title: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            referer: "https://factcheck-ai.vercel.app".to_string(),
            title: "Fake News Verify".to_string(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub search: SearchSettings,
    pub model: ModelSettings,
    pub limits: PipelineLimits,
    /// Address the HTTP server binds to
    pub address: String,
    /// Expose error details in HTTP 500 responses
    pub debug: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Render for display with credentials masked
    pub fn describe(&self) -> String {
        let lines = [
            format!(
                "config file:        {}",
                self.config_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            ),
            format!("search api key:     {}", mask(self.search.api_key.as_deref())),
            format!("search engine id:   {}", mask(self.search.engine_id.as_deref())),
            format!("search endpoint:    {}", self.search.endpoint),
            format!("fallback endpoint:  {}", self.search.fallback_endpoint),
            format!("model api key:      {}", mask(self.model.api_key.as_deref())),
            format!("model base url:     {}", self.model.base_url),
            format!("model:              {}", self.model.model),
            format!("temperature:        {}", self.model.temperature),
            format!("call timeout:       {}s", self.limits.call_timeout_seconds),
            format!(
                "claim length:       {}..={} chars",
                self.limits.min_claim_chars, self.limits.max_claim_chars
            ),
            format!("server address:     {}", self.address),
            format!("debug:              {}", self.debug),
        ];
        lines.join("\n")
    }
}

/// Show only the first four characters of a secret
fn mask(secret: Option<&str>) -> String {
    match secret {
        None => "(not set)".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => format!("{}****", s.chars().take(4).collect::<String>()),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge environment, config file and defaults.
///
/// `env` looks up a variable by name; empty values count as unset.
pub fn resolve<F>(env: F, file: ConfigFile, config_file: Option<PathBuf>) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let search_file = file.search.unwrap_or_default();
    let model_file = file.model.unwrap_or_default();
    let limits_file = file.limits.unwrap_or_default();
    let server_file = file.server.unwrap_or_default();

    let search_defaults = SearchSettings::default();
    let search = SearchSettings {
        api_key: var("GOOGLE_API_KEY").or(search_file.api_key),
        engine_id: var("GOOGLE_CSE_ID").or(search_file.engine_id),
        endpoint: search_file.endpoint.unwrap_or(search_defaults.endpoint),
        fallback_endpoint: search_file
            .fallback_endpoint
            .unwrap_or(search_defaults.fallback_endpoint),
    };

    let model_defaults = ModelSettings::default();
    let model = ModelSettings {
        api_key: var("OPENROUTER_API_KEY").or(model_file.api_key),
        base_url: var("OPENROUTER_BASE_URL")
            .or(model_file.base_url)
            .unwrap_or(model_defaults.base_url),
        model: var("LLM_MODEL")
            .or(model_file.model)
            .unwrap_or(model_defaults.model),
        temperature: model_file
            .temperature
            .unwrap_or(model_defaults.temperature),
        referer: model_file.referer.unwrap_or(model_defaults.referer),
        title: model_file.title.unwrap_or(model_defaults.title),
    };

    let limit_defaults = PipelineLimits::default();
    let limits = PipelineLimits {
        call_timeout_seconds: limits_file
            .call_timeout_seconds
            .unwrap_or(limit_defaults.call_timeout_seconds),
        min_claim_chars: limits_file
            .min_claim_chars
            .unwrap_or(limit_defaults.min_claim_chars),
        max_claim_chars: limits_file
            .max_claim_chars
            .unwrap_or(limit_defaults.max_claim_chars),
    };

    let debug = var("FACTCHECK_DEBUG")
        .or_else(|| var("DEBUG"))
        .and_then(|v| parse_bool(&v))
        .or(file.debug)
        .unwrap_or(false);

    let address = var("FACTCHECK_ADDRESS")
        .or(server_file.address)
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    ResolvedConfig {
        search,
        model,
        limits,
        address,
        debug,
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(|name| std::env::var(name).ok(), file, config_file))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
