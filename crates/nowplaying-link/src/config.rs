//! Configuration loading and parsing.
//!
//! Every key is optional; resolution applies defaults and clamps.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use nowplaying_core::config::EstimatorConfig;
use serde::Deserialize;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const MIN_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_ARTWORK_MAX_BYTES: usize = 5_000_000;
const DEFAULT_ARTWORK_TIMEOUT_MS: u64 = 3000;

/// Top-level link configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct LinkConfig {
    /// Only talk to this player (playerctl `--player`).
    pub player: Option<String>,
    /// Watch poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Position estimator tuning.
    pub estimator: Option<EstimatorSection>,
    /// Artwork fetch settings.
    pub artwork: Option<ArtworkSection>,
}

/// Estimator tuning from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct EstimatorSection {
    /// Seconds added per poll while the session position is unchanged.
    pub extrapolation_step_secs: Option<f64>,
    /// Seconds added when the session position advances.
    pub lookahead_secs: Option<f64>,
}

/// Artwork settings from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ArtworkSection {
    /// Largest artwork accepted, in bytes.
    pub max_bytes: Option<usize>,
    /// User-Agent for HTTP artwork requests.
    pub user_agent: Option<String>,
    /// Timeout for HTTP artwork requests in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl LinkConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<LinkConfig>(raw)?)
    }
}

/// Resolved artwork fetch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkSettings {
    pub max_bytes: usize,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ArtworkSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_ARTWORK_MAX_BYTES,
            user_agent: format!("nowplaying-link/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_millis(DEFAULT_ARTWORK_TIMEOUT_MS),
        }
    }
}

/// Fully resolved settings used by the runtime.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub player: Option<String>,
    pub poll_interval: Duration,
    pub estimator: EstimatorConfig,
    pub artwork: ArtworkSettings,
}

impl LinkSettings {
    /// Merge the config file with command-line overrides.
    pub fn resolve(
        cfg: &LinkConfig,
        player_override: Option<String>,
        interval_override_ms: Option<u64>,
    ) -> Self {
        Self {
            player: player_from_config(cfg, player_override),
            poll_interval: poll_interval_from_config(cfg, interval_override_ms),
            estimator: estimator_from_config(cfg),
            artwork: artwork_from_config(cfg),
        }
    }
}

/// Pick the player filter; blank names mean "any player".
pub fn player_from_config(cfg: &LinkConfig, player_override: Option<String>) -> Option<String> {
    player_override
        .or_else(|| cfg.player.clone())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Poll interval, never faster than 100ms.
pub fn poll_interval_from_config(cfg: &LinkConfig, override_ms: Option<u64>) -> Duration {
    let ms = override_ms
        .or(cfg.poll_interval_ms)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
        .max(MIN_POLL_INTERVAL_MS);
    Duration::from_millis(ms)
}

pub fn estimator_from_config(cfg: &LinkConfig) -> EstimatorConfig {
    let defaults = EstimatorConfig::default();
    let Some(section) = cfg.estimator.as_ref() else {
        return defaults;
    };
    EstimatorConfig {
        extrapolation_step_secs: section
            .extrapolation_step_secs
            .unwrap_or(defaults.extrapolation_step_secs),
        lookahead_secs: section.lookahead_secs.unwrap_or(defaults.lookahead_secs),
    }
    .sanitized()
}

pub fn artwork_from_config(cfg: &LinkConfig) -> ArtworkSettings {
    let defaults = ArtworkSettings::default();
    let Some(section) = cfg.artwork.as_ref() else {
        return defaults;
    };
    ArtworkSettings {
        max_bytes: section
            .max_bytes
            .filter(|bytes| *bytes > 0)
            .unwrap_or(defaults.max_bytes),
        user_agent: section
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.user_agent),
        timeout: section
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout),
    }
}
