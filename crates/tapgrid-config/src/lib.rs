//! Configuration management for tapgrid.
//!
//! Loads configuration from TOML files with per-pair grid constants.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tapgrid_core::PairConstants;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub chart: ChartConfig,
    pub recenter: RecenterConfig,
    pub probability: ProbabilityConfig,
    pub orders: OrderConfig,
    /// Grid constants keyed by symbol.
    pub pairs: HashMap<String, PairConstants>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations.
    ///
    /// Searches in order:
    /// 1. `./tapgrid.toml`
    /// 2. `~/.config/tapgrid/config.toml`
    ///
    /// Returns default config if no file found.
    pub fn load_default() -> Self {
        if let Ok(config) = Self::load(Self::default_path()) {
            return config;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("tapgrid").join("config.toml");
            if let Ok(config) = Self::load(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("tapgrid.toml")
    }

    /// Grid constants for a symbol.
    /// Falls back to [`PairConstants::default`] if the symbol is not configured.
    pub fn pair(&self, symbol: &str) -> PairConstants {
        self.pairs
            .get(symbol)
            .or_else(|| self.pairs.get(&symbol.to_uppercase()))
            .copied()
            .unwrap_or_default()
    }
}

/// General application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Trading pair shown on startup.
    pub default_symbol: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_symbol: "BTCUSDT".to_string(),
        }
    }
}

/// Chart geometry and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Number of grid rows across the viewport height.
    pub grid_rows: u32,
    /// Host frame interval driving the tween scheduler.
    pub frame_interval_ms: u64,
    /// Feed cadence; also the smoothing tween duration.
    pub feed_interval_ms: u64,
    /// Feed samples retained for rendering.
    pub max_points: usize,
    /// How long taps stay suppressed after a pan is released.
    pub pan_release_grace_ms: u64,
    /// Pointer travel (px) below which a press/release counts as a tap.
    pub tap_slop_px: f64,
    /// Fraction of the price window kept as a dead band in follow mode.
    pub follow_padding: f64,
    /// Ripple animation length.
    pub ripple_duration_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            grid_rows: 10,
            frame_interval_ms: 30,
            feed_interval_ms: 500,
            max_points: 2_000,
            pan_release_grace_ms: 150,
            tap_slop_px: 6.0,
            follow_padding: 0.25,
            ripple_duration_ms: 600,
        }
    }
}

impl ChartConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms)
    }

    pub fn pan_release_grace(&self) -> Duration {
        Duration::from_millis(self.pan_release_grace_ms)
    }

    pub fn ripple_duration(&self) -> Duration {
        Duration::from_millis(self.ripple_duration_ms)
    }
}

/// "Go to center" animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecenterConfig {
    /// Eased animation length.
    pub duration_ms: u64,
    /// Length used when the target is already close.
    pub snap_duration_ms: u64,
    /// Distance (in grid cells, per axis) under which the recenter snaps.
    pub snap_threshold_cells: f64,
}

impl Default for RecenterConfig {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            snap_duration_ms: 1,
            snap_threshold_cells: 2.0,
        }
    }
}

impl RecenterConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn snap_duration(&self) -> Duration {
        Duration::from_millis(self.snap_duration_ms)
    }
}

/// Payout multiplier overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    /// Spawn the background worker at all.
    pub enabled: bool,
    /// Minimum spacing between worker requests.
    pub throttle_ms: u64,
    /// Fraction of fair odds kept by the house.
    pub house_edge: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            throttle_ms: 500,
            house_edge: 0.05,
            min_multiplier: 1.01,
            max_multiplier: 100.0,
        }
    }
}

impl ProbabilityConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Order placement defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Markers drawn per clustered cell before truncation.
    pub max_cluster: usize,
    /// Stake used for a tap.
    pub default_amount: f64,
    pub currency: String,
    /// Identity attached to locally placed orders.
    pub user_id: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_cluster: 15,
            default_amount: 10.0,
            currency: "USDT".to_string(),
            user_id: "local".to_string(),
        }
    }
}
