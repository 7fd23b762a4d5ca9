//! Configuration management for icm426xx-sim.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (ICM_SIM_ACCEL_AMPLITUDE, etc.)
//! 2. Project-local config file (`./icm426xx-sim.toml`)
//! 3. User config file (`~/.config/icm426xx-sim/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # icm426xx-sim.toml
//!
//! # Noise amplitude per sensor, 0.0 to 1.0
//! accel_amplitude = 0.5
//! gyro_amplitude = 0.1
//!
//! # FIFO depth in bytes (multiple of 16)
//! fifo_capacity = 2048
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::device::generator::DEFAULT_TEMPERATURE;
use crate::device::{ChipOptions, DEFAULT_FIFO_CAPACITY, RECORD_SIZE};

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// icm426xx-sim configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Initial accelerometer noise amplitude.
    pub accel_amplitude: Option<f32>,

    /// Initial gyroscope noise amplitude.
    pub gyro_amplitude: Option<f32>,

    /// FIFO depth in bytes.
    /// Rounded down to whole records.
    pub fifo_capacity: Option<usize>,

    /// Temperature byte stamped into each record.
    pub temperature: Option<i8>,

    /// Seed for the sample noise generator.
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `icm426xx-sim.toml`
    /// 3. User config `~/.config/icm426xx-sim/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Accelerometer amplitude, defaulting to full scale.
    pub fn accel_amplitude(&self) -> f32 {
        self.accel_amplitude.unwrap_or(1.0)
    }

    /// Gyroscope amplitude, defaulting to full scale.
    pub fn gyro_amplitude(&self) -> f32 {
        self.gyro_amplitude.unwrap_or(1.0)
    }

    /// FIFO capacity in bytes, a whole number of records (at least one).
    pub fn fifo_capacity(&self) -> usize {
        let bytes = self.fifo_capacity.unwrap_or(DEFAULT_FIFO_CAPACITY);
        (bytes / RECORD_SIZE).max(1) * RECORD_SIZE
    }

    /// Temperature placeholder.
    pub fn temperature(&self) -> i8 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Noise seed.
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(0)
    }

    /// Chip construction options derived from this configuration.
    pub fn chip_options(&self) -> ChipOptions {
        ChipOptions {
            fifo_capacity: self.fifo_capacity(),
            accel_amplitude: self.accel_amplitude(),
            gyro_amplitude: self.gyro_amplitude(),
            temperature: self.temperature(),
        }
    }

    /// Load user configuration from ~/.config/icm426xx-sim/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./icm426xx-sim.toml
    fn load_local_config() -> Option<Self> {
        let local_path = Path::new("icm426xx-sim.toml");
        if let Some(config) = Self::load_from_file(local_path) {
            return Some(config);
        }

        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let project_path = Path::new(&manifest_dir).join("icm426xx-sim.toml");
            if let Some(config) = Self::load_from_file(&project_path) {
                return Some(config);
            }
        }

        None
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.accel_amplitude.is_some() {
            self.accel_amplitude = other.accel_amplitude;
        }
        if other.gyro_amplitude.is_some() {
            self.gyro_amplitude = other.gyro_amplitude;
        }
        if other.fifo_capacity.is_some() {
            self.fifo_capacity = other.fifo_capacity;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_value("ICM_SIM_ACCEL_AMPLITUDE") {
            self.accel_amplitude = Some(v);
        }
        if let Some(v) = env_value("ICM_SIM_GYRO_AMPLITUDE") {
            self.gyro_amplitude = Some(v);
        }
        if let Some(v) = env_value("ICM_SIM_FIFO_CAPACITY") {
            self.fifo_capacity = Some(v);
        }
        if let Some(v) = env_value("ICM_SIM_SEED") {
            self.seed = Some(v);
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("icm426xx-sim").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# icm426xx-sim configuration
# Place this file at ~/.config/icm426xx-sim/config.toml or ./icm426xx-sim.toml

# Noise amplitude per sensor, 0.0 (silent) to 1.0 (full i16 range)
accel_amplitude = 1.0
gyro_amplitude = 1.0

# FIFO depth in bytes, rounded down to whole 16-byte records
# fifo_capacity = 2048

# Temperature byte written into every record
# temperature = 44

# Seed for the sample noise generator
# seed = 0
"#
        .to_string()
    }
}

/// Parse an environment variable, warning on malformed values.
fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => {
            log::info!("Using {} from environment: {}", name, raw);
            Some(v)
        }
        Err(_) => {
            log::warn!("Ignoring malformed {}={}", name, raw);
            None
        }
    }
}
