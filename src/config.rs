use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Start playing the first queued track immediately.
    pub autoplay: bool,
    /// Advance to the next track when one finishes naturally.
    pub advance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Analysis window size in samples. Larger windows give smoother per-bin
    /// values at the cost of responsiveness; the spectrum carries
    /// `fft_size / 2` bins.
    pub fft_size: usize,
    /// Magnitude gain applied before clamping into the byte range.
    pub gain: f32,
    /// How often the engine publishes a fresh spectrum snapshot.
    pub publish_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Higher = wider, fewer, more prominent bars.
    pub bar_weight: f32,
    /// Horizontal gap between bars in pixels.
    pub padding: f32,
    /// Silent bins are bumped to this intensity so bars never vanish.
    pub intensity_floor: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            advance: true,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            gain: 6.0,
            publish_interval_ms: 16,
        }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bar_weight: 13.0,
            padding: 2.0,
            intensity_floor: 25,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/playvibe/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("playvibe").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config at {}: {}\nUsing defaults.",
                        path.display(),
                        e
                    );
                    None
                }
            }
        } else {
            None
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = Self::generate_config_template();
        std::fs::write(&path, template)?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r#"# Playvibe Configuration
# This file is auto-generated. Edit as needed.

[player]
# Start playing the first queued track immediately
autoplay = false
# Advance to the next track when one finishes
advance = true

[audio]
# Analysis window size in samples (power of two)
# Larger = smoother per-bin values, smaller = more responsive
fft_size = 2048
# Magnitude gain before clamping into 0-255
gain = 6.0
# Spectrum publish interval in milliseconds
publish_interval_ms = 16

[visualizer]
# Bar weight: higher = wider, fewer bars
bar_weight = 13.0
# Gap between bars in pixels
padding = 2.0
# Minimum bar intensity so silent bins stay visible
intensity_floor = 25
"#
        .to_string()
    }
}
