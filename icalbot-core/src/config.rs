//! icalbot configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. `~/.config/icalbot/config.toml` (optional)
//! 2. `./icalbot.{toml,yaml,json}` (optional), or the file passed explicitly
//! 3. `ICALBOT_*` environment variables, `__` separating nested keys
//!    (`ICALBOT_DISCORD__TOKEN`, `ICALBOT_CALENDAR_ENDPOINTS=a,b`)

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;

use crate::error::{BotError, BotResult};
use crate::poller::PollerSettings;
use crate::schedule::Schedule;

const LOCAL_CONFIG_NAME: &str = "icalbot";
const ENV_PREFIX: &str = "ICALBOT";
const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn default_check_interval() -> Duration {
    DEFAULT_CHECK_INTERVAL
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("icalbot").join("events.redb"))
        .unwrap_or_else(|| PathBuf::from("icalbot.redb"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Feeds to poll, in precedence order
    #[serde(default)]
    pub calendar_endpoints: Vec<String>,

    #[serde(
        default = "default_check_interval",
        deserialize_with = "duration::deserialize"
    )]
    pub check_interval: Duration,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Clone, Default, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    /// Defaults to the first guild the bot belongs to
    pub guild_id: Option<String>,
    /// Restrict destinations to channels under this category
    pub parent: Option<String>,
    pub default_channel: Option<String>,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("parent", &self.parent)
            .field("default_channel", &self.default_channel)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// Message templates keyed by `add`, `update` and `notify`
    #[serde(default)]
    pub templates: HashMap<String, String>,

    /// Lead times before an event's end at which to remind
    #[serde(default, deserialize_with = "duration::deserialize_vec")]
    pub schedules: Vec<Duration>,
}

impl BotConfig {
    /// Path of the per-user config file (~/.config/icalbot/config.toml)
    pub fn config_path() -> BotResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BotError::Config("Could not determine config directory".into()))?
            .join("icalbot");

        Ok(config_dir.join("config.toml"))
    }

    /// Load and validate configuration from all sources.
    ///
    /// `explicit` replaces the optional `./icalbot.*` file with a required one.
    pub fn load(explicit: Option<&Path>) -> BotResult<Self> {
        let mut files = Vec::new();

        if let Ok(path) = Self::config_path() {
            files.push(File::from(path).required(false));
        }

        match explicit {
            Some(path) => files.push(File::from(path).required(true)),
            None => files.push(File::with_name(LOCAL_CONFIG_NAME).required(false)),
        }

        Self::from_sources(files, env_source())
    }

    fn from_sources(
        files: Vec<File<FileSourceFile, FileFormat>>,
        env: Environment,
    ) -> BotResult<Self> {
        let mut builder = Config::builder();
        for file in files {
            builder = builder.add_source(file);
        }

        let config: BotConfig = builder
            .add_source(env)
            .build()
            .map_err(|e| BotError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| BotError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BotResult<()> {
        if self.calendar_endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(BotError::Config(
                "At least one calendar endpoint is required (calendar_endpoints)".into(),
            ));
        }

        if self.discord.token.trim().is_empty() {
            return Err(BotError::Config(
                "Discord bot token is required (discord.token)".into(),
            ));
        }

        if self.check_interval.is_zero() {
            return Err(BotError::Config("check_interval must be positive".into()));
        }

        Ok(())
    }

    /// Database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path.to_string_lossy()).into_owned())
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calendar_endpoints
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Poll loop settings for the given guild.
    pub fn poller_settings(&self, guild_id: String) -> BotResult<PollerSettings> {
        Ok(PollerSettings {
            endpoints: self.endpoints(),
            schedule: Schedule::from_std(&self.notification.schedules)?,
            guild_id,
            parent: non_empty(&self.discord.parent),
            default_channel: non_empty(&self.discord.default_channel),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("calendar_endpoints")
        .with_list_parse_key("notification.schedules")
}

/// Durations written as humantime strings ("90s", "1h 30m", "1day") or as
/// plain seconds.
mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    fn parse(raw: Raw) -> Result<Duration, String> {
        match raw {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| format!("invalid duration '{text}': {e}")),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        parse(Raw::deserialize(d)?).map_err(D::Error::custom)
    }

    pub fn deserialize_vec<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        Vec::<Raw>::deserialize(d)?
            .into_iter()
            .map(parse)
            .collect::<Result<_, _>>()
            .map_err(D::Error::custom)
    }
}
