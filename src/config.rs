//! Game and advisor configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FALLBACK: &str = "Practice lives in the heart; keep the brush moving. \
     The tutor is unreachable, but your effort has been recorded.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_funds: u32,
    /// Credited when the token passes or lands on Start.
    pub salary: u32,
    /// Levy for a tax cell whose price is unset.
    pub default_tax: u32,
    /// Magnitude of a chance or chest draw.
    pub card_amount: u32,
    pub move_delay_ms: u64,
    pub settle_delay_ms: u64,
    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
    pub advisor: AdvisorConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_funds: 1500,
            salary: 200,
            default_tax: 100,
            card_amount: 50,
            move_delay_ms: 1000,
            settle_delay_ms: 500,
            seed: None,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Card draws are applied as a signed change, so the magnitude must fit in `i32`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if i32::try_from(self.card_amount).is_err() {
            return Err(ConfigError::Invalid(format!(
                "card_amount {} exceeds {}",
                self.card_amount,
                i32::MAX
            )));
        }
        Ok(())
    }

    /// Default economy with both suspension windows set to zero.
    pub fn instant() -> Self {
        Self {
            move_delay_ms: 0,
            settle_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            salary: self.salary,
            default_tax: self.default_tax,
            card_amount: self.card_amount,
        }
    }
}

/// Economic parameters consumed by the turn functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub salary: u32,
    pub default_tax: u32,
    pub card_amount: u32,
}

impl Default for Rules {
    fn default() -> Self {
        GameConfig::default().rules()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub fallback_text: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
            api_key: None,
            fallback_text: DEFAULT_FALLBACK.to_string(),
        }
    }
}

impl AdvisorConfig {
    /// Fills a missing key from `GEMINI_API_KEY`, then `API_KEY`.
    pub fn with_env_key(self) -> Self {
        self.with_key_from(|name| std::env::var(name).ok())
    }

    pub fn with_key_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.api_key.is_none() {
            self.api_key = ["GEMINI_API_KEY", "API_KEY"]
                .into_iter()
                .find_map(|name| lookup(name).filter(|key| !key.is_empty()));
        }
        self
    }
}
