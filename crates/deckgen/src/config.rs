use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "deckgen";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key. If not set, falls back to the OPENROUTER_API_KEY
    /// environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_chars: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead_chars: Option<usize>,
}

impl ChatConfig {
    /// Resolve API key from config or environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(API_KEY_ENV_VAR).ok()
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `deckgen config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# Deckgen configuration\n{yaml}");
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "chat.model" => {
                self.chat.get_or_insert_with(ChatConfig::default).model =
                    Some(value.to_string());
            }
            "chat.api-key" => {
                self.chat.get_or_insert_with(ChatConfig::default).api_key =
                    Some(value.to_string());
            }
            "generation.min-chars" => {
                let parsed: usize = value.parse().map_err(|_| {
                    anyhow::anyhow!("Invalid min-chars: {value}. Must be a positive integer.")
                })?;
                self.generation
                    .get_or_insert_with(GenerationConfig::default)
                    .min_chars = Some(parsed);
            }
            "generation.lookahead-chars" => {
                let parsed: usize = value.parse().map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid lookahead-chars: {value}. Must be a non-negative integer."
                    )
                })?;
                self.generation
                    .get_or_insert_with(GenerationConfig::default)
                    .lookahead_chars = Some(parsed);
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: chat.model, chat.api-key, generation.min-chars, generation.lookahead-chars"
            ),
        }
        Ok(())
    }
}
