//! Configuration management for Factcast
//!
//! Every section is optional; omitted fields take the production defaults
//! (daily facts about exceptional people, posted to the `tweets` channel).
//! The alternate bot variant is just another config file:
//!
//! ```toml
//! [bot]
//! topic = "a surprising corner of the natural world"
//! model = "gpt-4"
//! channel = "facts"
//! unbounded_history = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV: &str = "FACTCAST_CONFIG";

pub const DEFAULT_STORE_PATH: &str = "/data/tweets";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_TOPIC: &str = "an exceptional person from any period in human history";
pub const DEFAULT_PROMPT: &str = "Give me a one-liner interesting fact about {topic}.\n\
These are the previous facts you've mentioned:\n{history}\nDon't repeat yourself\n\
and keep it short but interesting.";
pub const DEFAULT_CHANNEL: &str = "tweets";
pub const DEFAULT_NOTIFICATION: &str = "Hey peeps, I just tweeted this: {fact}";
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

pub const DEFAULT_GENERATION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_PUBLISH_URL: &str = "https://api.twitter.com/2/tweets";
pub const DEFAULT_NOTIFY_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub bot: BotConfig,
    pub services: ServicesConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

/// Everything that differs between bot variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub topic: String,
    pub model: String,
    /// Prompt template; `{topic}` and `{history}` are substituted
    pub prompt: String,
    pub history_window: usize,
    /// Feed the whole store back into the prompt, ignoring `history_window`
    pub unbounded_history: bool,
    pub channel: String,
    /// Chat message template; `{fact}` is substituted
    pub notification: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            unbounded_history: false,
            channel: DEFAULT_CHANNEL.to_string(),
            notification: DEFAULT_NOTIFICATION.to_string(),
        }
    }
}

impl BotConfig {
    /// Number of recent facts to feed back, `None` for all of them
    pub fn history_limit(&self) -> Option<usize> {
        if self.unbounded_history {
            None
        } else {
            Some(self.history_window)
        }
    }

    /// Render the chat message announcing `fact`
    pub fn notification_for(&self, fact: &str) -> String {
        self.notification.replace("{fact}", fact)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub generation_url: String,
    pub publish_url: String,
    pub notify_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            generation_url: DEFAULT_GENERATION_URL.to_string(),
            publish_url: DEFAULT_PUBLISH_URL.to_string(),
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time between routine runs in daemon mode, e.g. "1d" or "12h"
    pub period: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            period: "1d".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn period(&self) -> Result<Duration> {
        crate::schedule::parse_period(&self.period)
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: the built-in defaults are used.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the routine cannot run with
    ///
    /// `[schedule] period` is left to the daemon, which is its only reader.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("store.path", &self.store.path),
            ("bot.model", &self.bot.model),
            ("bot.prompt", &self.bot.prompt),
            ("bot.channel", &self.bot.channel),
            ("bot.notification", &self.bot.notification),
            ("services.generation_url", &self.services.generation_url),
            ("services.publish_url", &self.services.publish_url),
            ("services.notify_url", &self.services.notify_url),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field.to_string()).into());
            }
        }

        Ok(())
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("factcast").join("config.toml"))
}
