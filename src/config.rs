//! Studio configuration and the signed-in user's profile.
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields:
//!
//! | variable              | field          |
//! |-----------------------|----------------|
//! | `GOOGLE_API_KEY`      | `api_key`      |
//! | `API_KEY`             | `api_key`      |
//! | `PINPRO_BASE_URL`     | `base_url`     |
//! | `PINPRO_OUTPUT_DIR`   | `output_dir`   |
//! | `PINPRO_STATE_DIR`    | `state_dir`    |
//! | `PINPRO_TIMEOUT_SECS` | `timeout_secs` |

use crate::assistant::{GeminiTextProvider, PromptAssistant};
use crate::catalog::{CreativeStyle, ImageQuality, Resolution};
use crate::error::{PinProError, Result};
use crate::gate::KeySlot;
use crate::gemini::API_KEY_ENV_VARS;
use crate::handoff::HandoffSlot;
use crate::image::providers::GeminiProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BASE_URL_ENV: &str = "PINPRO_BASE_URL";
const OUTPUT_DIR_ENV: &str = "PINPRO_OUTPUT_DIR";
const STATE_DIR_ENV: &str = "PINPRO_STATE_DIR";
const TIMEOUT_ENV: &str = "PINPRO_TIMEOUT_SECS";

const DEFAULT_STATE_DIR: &str = ".pinpro";

/// Subscription tier shown on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

/// The signed-in user. Display only; usage limits are not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub plan: Plan,
    pub daily_pin_limit: u32,
    pub pins_used_today: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Guest".into(),
            email: String::new(),
            plan: Plan::Free,
            daily_pin_limit: 10,
            pins_used_today: 0,
        }
    }
}

impl UserProfile {
    /// Pins left for today.
    pub fn remaining_pins(&self) -> u32 {
        self.daily_pin_limit.saturating_sub(self.pins_used_today)
    }
}

/// Runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Explicit Gemini key. Unset means resolve from the environment per call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Where exported pins go. Defaults to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Where the handoff slot lives. Defaults to `.pinpro`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    pub resolution: Resolution,
    pub style: CreativeStyle,
    pub quality: ImageQuality,
    pub profile: UserProfile,
}

impl StudioConfig {
    /// Loads `path` if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parses a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PinProError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| PinProError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|&name| get(name)) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        if let Some(dir) = get(OUTPUT_DIR_ENV) {
            self.output_dir = Some(dir.into());
        }
        if let Some(dir) = get(STATE_DIR_ENV) {
            self.state_dir = Some(dir.into());
        }
        if let Some(secs) = get(TIMEOUT_ENV) {
            let secs = secs
                .trim()
                .parse()
                .map_err(|_| PinProError::Config(format!("{TIMEOUT_ENV} must be seconds: {secs}")))?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }

    pub fn handoff_slot(&self) -> HandoffSlot {
        HandoffSlot::new(self.state_dir())
    }

    /// Image provider reading keys from `slot` first, then this config.
    pub fn image_provider(&self, slot: &KeySlot) -> GeminiProvider {
        let mut builder = GeminiProvider::builder().key_slot(slot.clone());
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Prompt assistant sharing the same key resolution.
    pub fn assistant(&self, slot: &KeySlot) -> PromptAssistant<GeminiTextProvider> {
        let mut builder = GeminiTextProvider::builder().key_slot(slot.clone());
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        PromptAssistant::new(builder.build())
    }
}
