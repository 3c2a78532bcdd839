//! Configuration management for the kiosk
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::scheduler::slots::{DEFAULT_SLOT_MINUTES, MAX_SLOTS_PER_WINDOW};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kiosk behaviour
    pub kiosk: KioskConfig,

    /// Slot layout and draw randomness
    pub schedule: ScheduleConfig,

    /// Automatic draw trigger
    pub trigger: TriggerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Kiosk-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// IANA zone name the night is computed in
    pub timezone: String,

    /// Shared staff PIN gating admin actions
    pub admin_pin: String,

    /// Minimum seconds between two signups on this device
    pub signup_cooldown_secs: u64,

    /// Whether the cooldown is enforced at startup
    pub cooldown_enabled: bool,

    /// How long a status message stays visible
    pub status_pulse_secs: u64,
}

/// Slot layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Length of one slot in minutes
    pub slot_minutes: u32,

    /// Upper bound on slots generated per window
    pub max_slots_per_window: usize,

    /// Fixed seed for the draw RNG (entropy when unset)
    pub rng_seed: Option<u64>,
}

/// Automatic draw trigger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Run automatic draws at all
    pub enabled: bool,

    /// Seconds between trigger polls
    pub poll_interval_secs: u64,

    /// How long after a draw time the automatic draw may still fire
    pub grace_secs: u64,

    /// Milliseconds between housekeeping ticks (status expiry, night rollover)
    pub tick_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            timezone: String::from("Europe/London"),
            admin_pin: String::from("1796"),
            signup_cooldown_secs: 60,
            cooldown_enabled: true,
            status_pulse_secs: 3,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            max_slots_per_window: MAX_SLOTS_PER_WINDOW,
            rng_seed: None,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 5,
            grace_secs: 60,
            tick_interval_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Upper bound for every configured period
pub const MAX_PERIOD_SECS: u64 = 24 * 60 * 60;

fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `OPENDECKS_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(tz) = std::env::var("OPENDECKS_TIMEZONE") {
            self.kiosk.timezone = tz;
        }
        if let Ok(pin) = std::env::var("OPENDECKS_ADMIN_PIN") {
            self.kiosk.admin_pin = pin;
        }
        if let Some(secs) = env_parse("OPENDECKS_COOLDOWN_SECS") {
            self.kiosk.signup_cooldown_secs = secs;
        }
        if let Some(enabled) = env_parse("OPENDECKS_COOLDOWN_ENABLED") {
            self.kiosk.cooldown_enabled = enabled;
        }
        if let Some(seed) = env_parse("OPENDECKS_RNG_SEED") {
            self.schedule.rng_seed = Some(seed);
        }
        if let Some(secs) = env_parse("OPENDECKS_POLL_INTERVAL_SECS") {
            self.trigger.poll_interval_secs = secs;
        }
        if let Ok(level) = std::env::var("OPENDECKS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OPENDECKS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.zone()?;

        if self.kiosk.admin_pin.trim().is_empty() {
            anyhow::bail!("admin_pin must not be empty");
        }

        if self.schedule.slot_minutes == 0 {
            anyhow::bail!("slot_minutes must be greater than 0");
        }

        if self.schedule.max_slots_per_window == 0 {
            anyhow::bail!("max_slots_per_window must be greater than 0");
        }

        if self.trigger.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.trigger.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than 0");
        }

        for (name, secs) in [
            ("signup_cooldown_secs", self.kiosk.signup_cooldown_secs),
            ("status_pulse_secs", self.kiosk.status_pulse_secs),
            ("grace_secs", self.trigger.grace_secs),
            ("poll_interval_secs", self.trigger.poll_interval_secs),
            ("tick_interval_ms", self.trigger.tick_interval_ms / 1000),
        ] {
            if secs > MAX_PERIOD_SECS {
                anyhow::bail!("{name} must be at most one day");
            }
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Resolve the configured civil timezone
    pub fn zone(&self) -> Result<Tz> {
        self.kiosk
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {e}", self.kiosk.timezone))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    #[must_use]
    pub fn signup_cooldown(&self) -> chrono::Duration {
        seconds(self.kiosk.signup_cooldown_secs)
    }

    #[must_use]
    pub fn status_pulse(&self) -> chrono::Duration {
        seconds(self.kiosk.status_pulse_secs)
    }

    #[must_use]
    pub fn trigger_grace(&self) -> chrono::Duration {
        seconds(self.trigger.grace_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.trigger.poll_interval_secs)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.trigger.tick_interval_ms)
    }
}
