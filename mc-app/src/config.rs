//! mistral-chat configuration loader.
//!
//! Built-in defaults, overlaid by `~/.mistral-chat/config.toml` (or `--config`),
//! overlaid by environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// `1`/`text` or `2`/`image`; prompted for on the console when unset.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: None,
            model: None,
            system_prompt: None,
            request_timeout_secs: default_request_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfig {
    pub mistral_api_key: Option<String>,
}

/// Defaults for one-shot runs and image turns without an explicit path.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_text")]
    pub text: String,
    #[serde(default)]
    pub image_path: Option<PathBuf>,
}

fn default_demo_text() -> String {
    "Hello! Who are you?".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            text: default_demo_text(),
            image_path: None,
        }
    }
}

impl ChatConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                ChatConfig::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("MISTRAL_API_KEY") {
            self.keys.mistral_api_key = Some(v);
        }
        if let Some(v) = get("MISTRAL_CHAT_MODE") {
            self.general.mode = Some(v);
        }
        if let Some(v) = get("MISTRAL_CHAT_MODEL") {
            self.general.model = Some(v);
        }
        if let Some(v) = get("MISTRAL_CHAT_BASE_URL") {
            self.general.base_url = v;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.general.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("general.request_timeout_secs must be > 0"));
        }
        if self.general.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("general.base_url must not be empty"));
        }
        Ok(())
    }

    /// The API key is only needed once a conversation is opened.
    pub fn api_key(&self) -> anyhow::Result<String> {
        self.keys
            .mistral_api_key
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("missing Mistral API key: set MISTRAL_API_KEY or keys.mistral_api_key")
            })
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".mistral-chat").join("config.toml")
}
