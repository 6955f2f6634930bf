use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{defaults, endpoints, layout};
use crate::context::RequestContext;
use crate::error::{InklingError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub endpoint: EndpointSettings,
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointSettings {
    pub url: String,
    /// Name of the environment variable holding an optional bearer token.
    pub api_key_env: String,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionSettings {
    pub debounce_ms: u64,
    pub min_source_chars: usize,
    pub context_chars: usize,
    pub reveal_stagger_ms: u64,
}

/// Opaque identifiers forwarded with every completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextSettings {
    pub session_id: Option<String>,
    #[serde(default)]
    pub anchor_ids: Vec<String>,
}

/// Geometry of the in-memory document used by the CLI and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutSettings {
    pub char_width: f64,
    pub line_height: f64,
    pub columns: usize,
    /// When false the document reports no caret-from-point support and the
    /// resolver always takes the rectangle probe path.
    pub native_caret_api: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            char_width: layout::CHAR_WIDTH,
            line_height: layout::LINE_HEIGHT,
            columns: layout::COLUMNS,
            native_caret_api: true,
        }
    }
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::DEBOUNCE_MS,
            min_source_chars: defaults::MIN_SOURCE_CHARS,
            context_chars: defaults::CONTEXT_CHARS,
            reveal_stagger_ms: defaults::REVEAL_STAGGER_MS,
        }
    }
}

impl PredictionSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reveal_stagger(&self) -> Duration {
        Duration::from_millis(self.reveal_stagger_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: EndpointSettings {
                url: endpoints::COMPLETION_URL.to_string(),
                api_key_env: endpoints::DEFAULT_API_KEY_ENV.to_string(),
                connect_timeout_ms: defaults::CONNECT_TIMEOUT_MS,
            },
            prediction: PredictionSettings::default(),
            context: ContextSettings::default(),
            layout: LayoutSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkling")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {}: {}", config_path.display(), e)
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| InklingError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| InklingError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the bearer token from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        if self.endpoint.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.endpoint.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            session_id: self.context.session_id.clone(),
            anchor_ids: self.context.anchor_ids.clone(),
        }
    }
}
