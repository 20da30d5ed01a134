//! Mesh rotation state.

use glam::{EulerRot, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Per-axis rotation applied every tick, in radians.
pub const DEFAULT_ROTATION_STEP: f32 = 0.05;

/// Starting orientation: a one-off 1 rad turn about Z.
pub const DEFAULT_INITIAL_ROTATION: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// How rotation advances between ticks.
///
/// `PerTick` ties rotation speed to the host's refresh rate. `PerSecond`
/// scales by the tick delta instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RotationMode {
    PerTick { step: f32 },
    PerSecond { radians_per_second: f32 },
}

impl Default for RotationMode {
    fn default() -> Self {
        RotationMode::PerTick {
            step: DEFAULT_ROTATION_STEP,
        }
    }
}

impl RotationMode {
    /// Angle increment for one tick.
    pub fn increment(&self, delta_seconds: f64) -> f32 {
        match *self {
            RotationMode::PerTick { step } => step,
            RotationMode::PerSecond { radians_per_second } => {
                radians_per_second * delta_seconds as f32
            }
        }
    }
}

/// Euler rotation (XYZ order) of the mesh.
///
/// Angles are never wrapped; everything downstream goes through sin/cos.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshTransform {
    pub rotation: Vec3,
}

impl MeshTransform {
    pub fn new(rotation: Vec3) -> Self {
        Self { rotation }
    }

    /// Add `increment` to each axis.
    pub fn advance(&mut self, increment: f32) {
        self.rotation += Vec3::splat(increment);
    }

    /// Model matrix, rotating about X, then Y, then Z in intrinsic order.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}
