use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_POSTAL_BASE_URL: &str = "https://zipcloud.ibsnet.co.jp";
pub const DEFAULT_FORECAST_BASE_URL: &str = "https://weather.tsukumijima.net";

/// How results of overlapping forecast chains are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sequencing {
    /// Whichever chain finishes last overwrites the state.
    #[default]
    LastWrite,
    /// Only the most recently started chain may write.
    LatestRequest,
}

impl Sequencing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sequencing::LastWrite => "last_write",
            Sequencing::LatestRequest => "latest_request",
        }
    }

    pub const fn all() -> &'static [Sequencing] {
        &[Sequencing::LastWrite, Sequencing::LatestRequest]
    }
}

impl std::fmt::Display for Sequencing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of the two external services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub postal_base_url: String,
    pub forecast_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            postal_base_url: DEFAULT_POSTAL_BASE_URL.to_string(),
            forecast_base_url: DEFAULT_FORECAST_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_millis: u64,
    /// Offset from UTC used for display; 540 is JST.
    pub utc_offset_minutes: i32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_millis: 1000, utc_offset_minutes: 9 * 60 }
    }
}

impl ClockConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!("UTC offset of {} minutes is out of range", self.utc_offset_minutes)
            })
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional per-request timeout; requests wait indefinitely when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub sequencing: Sequencing,

    /// Clear the displayed weather when the postal service finds no address.
    #[serde(default)]
    pub clear_on_empty_result: bool,

    #[serde(default)]
    pub endpoints: Endpoints,

    /// Example TOML:
    /// [clock]
    /// tick_millis = 1000
    /// utc_offset_minutes = 540
    #[serde(default)]
    pub clock: ClockConfig,
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.clock.offset()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "zipweather", "zipweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
