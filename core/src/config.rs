//! Session configuration.
//!
//! Every field has a default matching the reference scene, so an empty JSON
//! object is a complete configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{AnalyserError, AnalyserSettings, PlaybackSettings};
use crate::camera::CameraConfig;
use crate::compositor::DEFAULT_BLEND_RATIO;
use crate::gpu::RenderConfig;
use crate::mesh::MeshConfig;
use crate::transform::{RotationMode, DEFAULT_INITIAL_ROTATION};
use crate::uniforms::{UniformNames, DEFAULT_AMPLITUDE_NORMALIZATION};

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Viewport must be non-zero, got {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
    #[error("Invalid background color: {0}")]
    InvalidColor(String),
    #[error("Invalid analyser settings: {0}")]
    Analyser(#[from] AnalyserError),
    #[error("Amplitude normalization must be positive and finite, got {0}")]
    InvalidNormalization(f32),
    #[error("Volume must be in 0.0..=1.0, got {0}")]
    InvalidVolume(f32),
    #[error("Blend ratio must be strictly between 0 and 1, got {0}")]
    InvalidBlendRatio(f32),
    #[error("Mesh radius must be positive, got {0}")]
    InvalidRadius(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Asset to decode at startup. `None` runs silently.
    pub path: Option<PathBuf>,
    pub analyser: AnalyserSettings,
    pub playback: PlaybackSettings,
    /// Divisor applied to the analyser output before binding.
    pub normalization: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            path: None,
            analyser: AnalyserSettings::default(),
            playback: PlaybackSettings::default(),
            normalization: DEFAULT_AMPLITUDE_NORMALIZATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Euler angles in radians.
    pub initial_rotation: [f32; 3],
    pub rotation: RotationMode,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            initial_rotation: DEFAULT_INITIAL_ROTATION.to_array(),
            rotation: RotationMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// History weight per tick.
    pub blend_ratio: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            blend_ratio: DEFAULT_BLEND_RATIO,
        }
    }
}

/// Full session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub width: u32,
    pub height: u32,
    /// Hex color, `#rrggbb`.
    pub background: String,
    pub audio: AudioConfig,
    pub uniforms: UniformNames,
    pub motion: MotionConfig,
    pub mesh: MeshConfig,
    pub camera: CameraConfig,
    pub blur: BlurConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: "#000000".to_string(),
            audio: AudioConfig::default(),
            uniforms: UniformNames::default(),
            motion: MotionConfig::default(),
            mesh: MeshConfig::default(),
            camera: CameraConfig::default(),
            blur: BlurConfig::default(),
        }
    }
}

impl VisualizerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        self.background_rgb()?;
        self.audio.analyser.validate()?;

        let normalization = self.audio.normalization;
        if !(normalization.is_finite() && normalization > 0.0) {
            return Err(ConfigError::InvalidNormalization(normalization));
        }
        if !(0.0..=1.0).contains(&self.audio.playback.volume) {
            return Err(ConfigError::InvalidVolume(self.audio.playback.volume));
        }
        let ratio = self.blur.blend_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::InvalidBlendRatio(ratio));
        }
        if self.mesh.radius.is_nan() || self.mesh.radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.mesh.radius));
        }
        Ok(())
    }

    pub fn background_rgb(&self) -> Result<[f32; 3], ConfigError> {
        parse_hex_color(&self.background)
            .ok_or_else(|| ConfigError::InvalidColor(self.background.clone()))
    }

    pub fn to_render_config(&self) -> Result<RenderConfig, ConfigError> {
        Ok(RenderConfig {
            width: self.width,
            height: self.height,
            background: self.background_rgb()?,
            blend_ratio: self.blur.blend_ratio,
            mesh: self.mesh,
            camera: self.camera,
            uniforms: self.uniforms.clone(),
        })
    }
}

/// Parse hex color to RGB floats (accepts 6-char RGB or 8-char RGBA, alpha is ignored).
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let hex = hex.trim_start_matches('#');
    if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
    Some([r, g, b])
}
