//! Ordered postprocessing stages.

use std::fmt;

use super::CompositorError;

/// One step of the accumulation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Mix the fresh render with the saved history into scratch.
    Blend,
    /// Copy scratch into history.
    Save,
    /// Present scratch.
    Output,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Blend => "blend",
            Stage::Save => "save",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated stage order.
///
/// Blend has to read history before save overwrites it, and output has to
/// present the finished composite, so the only accepted order is
/// `[blend, save, output]`. The type exists so that order is checked once at
/// construction instead of being implied by call sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassChain {
    stages: Vec<Stage>,
}

impl PassChain {
    pub fn new(stages: Vec<Stage>) -> Result<Self, CompositorError> {
        for stage in [Stage::Blend, Stage::Save, Stage::Output] {
            let count = stages.iter().filter(|&&s| s == stage).count();
            if count != 1 {
                return Err(CompositorError::StageCount { stage, count });
            }
        }

        let position = |stage: Stage| stages.iter().position(|&s| s == stage);
        if position(Stage::Save) < position(Stage::Blend) {
            return Err(CompositorError::OutOfOrder {
                before: Stage::Blend,
                after: Stage::Save,
            });
        }
        if position(Stage::Output) != Some(stages.len() - 1) {
            return Err(CompositorError::OutOfOrder {
                before: Stage::Save,
                after: Stage::Output,
            });
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }
}

impl Default for PassChain {
    fn default() -> Self {
        Self {
            stages: vec![Stage::Blend, Stage::Save, Stage::Output],
        }
    }
}
