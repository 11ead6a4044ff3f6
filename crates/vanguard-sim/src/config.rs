//! Simulation configuration.
//!
//! Handles loading and saving the headless run settings from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default config file name.
pub const CONFIG_FILE: &str = "vanguard-sim.toml";

/// Simulation configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Timing ===
    /// Seconds per simulated frame.
    pub frame_dt: f32,
    /// Number of frames to run.
    pub frames: u32,

    // === Arena ===
    /// Enemies placed on the line.
    pub enemy_count: u32,
    /// Distance between neighbouring enemies.
    pub enemy_spacing: f32,
    /// Starting health of each enemy.
    pub enemy_health: f32,

    // === Combat ===
    /// Relative damage jitter per hit (0.1 means +-10%).
    pub damage_variance: f32,
    /// Frames between slams. Zero disables slamming.
    pub slam_every: u32,
    /// Height the player slams from.
    pub slam_height: f32,
    /// RNG seed for damage jitter. Random when unset.
    pub seed: Option<u64>,

    // === Content ===
    /// Gameplay config (RON). Built-in defaults when unset.
    pub gameplay_config: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_dt: 1.0 / 60.0,
            frames: 600,

            enemy_count: 5,
            enemy_spacing: 2.0,
            enemy_health: 200.0,

            damage_variance: 0.1,
            slam_every: 120,
            slam_height: 6.0,
            seed: None,

            gameplay_config: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a file, falling back to defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values.
    pub fn validate(&mut self) {
        self.frame_dt = self.frame_dt.clamp(0.001, 1.0);
        self.frames = self.frames.min(1_000_000);

        self.enemy_count = self.enemy_count.min(1_000);
        self.enemy_spacing = self.enemy_spacing.max(0.1);
        self.enemy_health = self.enemy_health.max(1.0);

        self.damage_variance = self.damage_variance.clamp(0.0, 1.0);
        self.slam_height = self.slam_height.max(0.0);
    }

    /// Total simulated time in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.frame_dt * self.frames as f32
    }
}
