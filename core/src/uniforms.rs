//! Named scalar uniform slots and the binder that feeds them.
//!
//! A [`ShaderMaterial`] holds one slot per uniform name. The GPU renderer
//! resolves the names its shader declares into [`UniformHandle`]s once, then
//! reads values by index every frame. [`UniformBinder`] writes the live
//! signals (elapsed time and rescaled amplitude) into the same slots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reference divisor mapping analyser output (0..=255) onto a small intensity.
pub const DEFAULT_AMPLITUDE_NORMALIZATION: f32 = 50.0;

/// Errors raised when a material does not satisfy a shader.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("Shader uniform '{0}' has no slot on the material")]
    Missing(String),
    #[error("Amplitude normalization must be positive and finite, got {0}")]
    InvalidNormalization(f32),
}

/// Index of a slot inside its material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformHandle(usize);

#[derive(Debug, Clone, PartialEq)]
struct UniformSlot {
    name: String,
    value: f32,
}

/// Scalar uniform slots of a shader material.
#[derive(Debug, Clone, Default)]
pub struct ShaderMaterial {
    slots: Vec<UniformSlot>,
    index: HashMap<String, usize>,
}

impl ShaderMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with `initial` unless it already exists.
    ///
    /// Binding an existing name keeps its current value and returns the
    /// existing handle.
    pub fn bind(&mut self, name: &str, initial: f32) -> UniformHandle {
        if let Some(&slot) = self.index.get(name) {
            return UniformHandle(slot);
        }
        let slot = self.slots.len();
        self.slots.push(UniformSlot {
            name: name.to_string(),
            value: initial,
        });
        self.index.insert(name.to_string(), slot);
        UniformHandle(slot)
    }

    /// Overwrite the value of `name`. Unknown names are ignored and reported
    /// through the return value.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        match self.index.get(name) {
            Some(&slot) => {
                self.slots[slot].value = value;
                true
            }
            None => {
                log::trace!("ignoring write to unbound uniform '{}'", name);
                false
            }
        }
    }

    /// Overwrite a slot by handle.
    pub fn set_handle(&mut self, handle: UniformHandle, value: f32) {
        self.slots[handle.0].value = value;
    }

    pub fn handle(&self, name: &str) -> Option<UniformHandle> {
        self.index.get(name).copied().map(UniformHandle)
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.index.get(name).map(|&slot| self.slots[slot].value)
    }

    pub fn value(&self, handle: UniformHandle) -> f32 {
        self.slots[handle.0].value
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Resolve every uniform a shader declares, failing on the first name
    /// without a slot.
    pub fn require<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<UniformHandle>, UniformError> {
        names
            .into_iter()
            .map(|name| {
                self.handle(name)
                    .ok_or_else(|| UniformError::Missing(name.to_string()))
            })
            .collect()
    }
}

/// Uniform names used by the mesh shader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformNames {
    pub time: String,
    pub audio: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            time: "uTime".to_string(),
            audio: "uAudioFrequency".to_string(),
        }
    }
}

/// Pushes time and amplitude into a material every tick.
#[derive(Debug, Clone, Copy)]
pub struct UniformBinder {
    time: UniformHandle,
    audio: UniformHandle,
    normalization: f32,
}

impl UniformBinder {
    /// Bind both slots on `material`, starting at 0.
    pub fn attach(
        material: &mut ShaderMaterial,
        names: &UniformNames,
        normalization: f32,
    ) -> Result<Self, UniformError> {
        if !(normalization.is_finite() && normalization > 0.0) {
            return Err(UniformError::InvalidNormalization(normalization));
        }
        Ok(Self {
            time: material.bind(&names.time, 0.0),
            audio: material.bind(&names.audio, 0.0),
            normalization,
        })
    }

    /// Rescale `raw` and write it. Returns the bound value.
    pub fn push_amplitude(&self, material: &mut ShaderMaterial, raw: f32) -> f32 {
        let value = raw / self.normalization;
        material.set_handle(self.audio, value);
        value
    }

    /// Write elapsed seconds.
    pub fn push_time(&self, material: &mut ShaderMaterial, elapsed_seconds: f32) {
        material.set_handle(self.time, elapsed_seconds);
    }

    pub fn normalization(&self) -> f32 {
        self.normalization
    }

    pub fn time_handle(&self) -> UniformHandle {
        self.time
    }

    pub fn audio_handle(&self) -> UniformHandle {
        self.audio
    }
}
