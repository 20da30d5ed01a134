//! Accumulation motion blur.
//!
//! Each tick the freshly rendered frame C is mixed with the saved history A
//! into a scratch buffer B, B is saved back into A, and B is presented:
//!
//! ```text
//! B = C * (1 - ratio) + A * ratio
//! A = B
//! screen = B
//! ```
//!
//! Because A holds the previous *composite*, a frame rendered N ticks ago
//! contributes with weight `ratio^N`. On the first tick A is seeded with C
//! so nothing undefined leaks into the output.
//!
//! [`FrameCompositor`] owns the ordering and the first-tick policy; the
//! buffers live behind [`CompositeTarget`], implemented on the CPU by
//! [`CpuFrameTargets`] and on the GPU by `gpu::composite::GpuCompositePass`.

pub mod frame;
pub mod stage;

pub use frame::{save_rgba8_png, Frame, Rgba};
pub use stage::{PassChain, Stage};

/// Reference history weight.
pub const DEFAULT_BLEND_RATIO: f32 = 0.725;

/// Errors for compositor setup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompositorError {
    #[error("Blend ratio must be strictly between 0 and 1, got {0}")]
    InvalidBlendRatio(f32),
    #[error("Stage '{stage}' must appear exactly once, found {count}")]
    StageCount { stage: Stage, count: usize },
    #[error("Stage '{before}' must run before '{after}'")]
    OutOfOrder { before: Stage, after: Stage },
}

/// Buffers the compositor operates on.
///
/// Implementations hold the current render C, history A, scratch B and the
/// presented output.
pub trait CompositeTarget {
    /// A = C.
    fn seed_history(&mut self);
    /// B = mix(C, A, ratio).
    fn blend(&mut self, ratio: f32);
    /// A = B.
    fn save(&mut self);
    /// output = B.
    fn present(&mut self);
}

/// Drives a [`PassChain`] over a [`CompositeTarget`] once per tick.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    chain: PassChain,
    blend_ratio: f32,
    history_seeded: bool,
    frames: u64,
}

impl FrameCompositor {
    pub fn new(blend_ratio: f32) -> Result<Self, CompositorError> {
        Self::with_chain(PassChain::default(), blend_ratio)
    }

    pub fn with_chain(chain: PassChain, blend_ratio: f32) -> Result<Self, CompositorError> {
        validate_ratio(blend_ratio)?;
        Ok(Self {
            chain,
            blend_ratio,
            history_seeded: false,
            frames: 0,
        })
    }

    pub fn blend_ratio(&self) -> f32 {
        self.blend_ratio
    }

    pub fn set_blend_ratio(&mut self, ratio: f32) -> Result<(), CompositorError> {
        validate_ratio(ratio)?;
        self.blend_ratio = ratio;
        Ok(())
    }

    pub fn chain(&self) -> &PassChain {
        &self.chain
    }

    /// Frames composited so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Drop the history so the next frame reseeds it. Call after the target
    /// buffers are reallocated.
    pub fn reset(&mut self) {
        self.history_seeded = false;
    }

    /// Run the chain against a target whose C has just been rendered.
    pub fn composite<T: CompositeTarget + ?Sized>(&mut self, target: &mut T) {
        if !self.history_seeded {
            target.seed_history();
            self.history_seeded = true;
        }

        for stage in self.chain.stages() {
            match stage {
                Stage::Blend => target.blend(self.blend_ratio),
                Stage::Save => target.save(),
                Stage::Output => target.present(),
            }
        }
        self.frames += 1;
    }
}

fn validate_ratio(ratio: f32) -> Result<(), CompositorError> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(CompositorError::InvalidBlendRatio(ratio))
    }
}

/// CPU implementation of the four compositor buffers.
#[derive(Debug, Clone)]
pub struct CpuFrameTargets {
    current: Frame,
    history: Frame,
    scratch: Frame,
    output: Frame,
}

impl CpuFrameTargets {
    /// Allocate every buffer at the same size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            current: Frame::new(width, height),
            history: Frame::new(width, height),
            scratch: Frame::new(width, height),
            output: Frame::new(width, height),
        }
    }

    /// The render target C for this tick.
    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.current
    }

    pub fn current(&self) -> &Frame {
        &self.current
    }

    pub fn history(&self) -> &Frame {
        &self.history
    }

    /// The last presented frame.
    pub fn output(&self) -> &Frame {
        &self.output
    }
}

impl CompositeTarget for CpuFrameTargets {
    fn seed_history(&mut self) {
        self.history.copy_from(&self.current);
    }

    fn blend(&mut self, ratio: f32) {
        self.scratch.mix_into(&self.current, &self.history, ratio);
    }

    fn save(&mut self) {
        self.history.copy_from(&self.scratch);
    }

    fn present(&mut self) {
        self.output.copy_from(&self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl CompositeTarget for Recorder {
        fn seed_history(&mut self) {
            self.calls.push("seed");
        }
        fn blend(&mut self, _ratio: f32) {
            self.calls.push("blend");
        }
        fn save(&mut self) {
            self.calls.push("save");
        }
        fn present(&mut self) {
            self.calls.push("output");
        }
    }

    #[test]
    fn test_stage_order_and_single_seed() {
        let mut compositor = FrameCompositor::new(DEFAULT_BLEND_RATIO).unwrap();
        let mut recorder = Recorder::default();

        compositor.composite(&mut recorder);
        compositor.composite(&mut recorder);

        assert_eq!(
            recorder.calls,
            vec!["seed", "blend", "save", "output", "blend", "save", "output"]
        );
        assert_eq!(compositor.frames(), 2);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut compositor = FrameCompositor::new(0.5).unwrap();
        let mut recorder = Recorder::default();
        compositor.composite(&mut recorder);
        compositor.reset();
        compositor.composite(&mut recorder);
        assert_eq!(recorder.calls.iter().filter(|&&c| c == "seed").count(), 2);
    }

    #[test]
    fn test_ratio_validation() {
        assert!(FrameCompositor::new(1.0).is_err());
        assert!(FrameCompositor::new(-0.1).is_err());
        assert!(FrameCompositor::new(f32::NAN).is_err());
        assert!(matches!(
            FrameCompositor::new(0.0),
            Err(CompositorError::InvalidBlendRatio(r)) if r == 0.0
        ));
        let mut compositor = FrameCompositor::new(0.1).unwrap();
        assert!(compositor.set_blend_ratio(0.0).is_err());
        assert_eq!(compositor.blend_ratio(), 0.1);
        assert!(compositor.set_blend_ratio(0.9).is_ok());
        assert_eq!(compositor.blend_ratio(), 0.9);
    }

    #[test]
    fn test_first_frame_passes_through() {
        let mut compositor = FrameCompositor::new(DEFAULT_BLEND_RATIO).unwrap();
        let mut targets = CpuFrameTargets::new(4, 3);
        targets.current_mut().fill([0.3, 0.6, 0.9, 1.0]);

        compositor.composite(&mut targets);

        assert_eq!(targets.output(), targets.current());
        assert_eq!(targets.history(), targets.current());
    }

    #[test]
    fn test_second_frame_blends_with_history() {
        let ratio = 0.5;
        let mut compositor = FrameCompositor::new(ratio).unwrap();
        let mut targets = CpuFrameTargets::new(1, 1);

        targets.current_mut().fill([1.0, 1.0, 1.0, 1.0]);
        compositor.composite(&mut targets);
        targets.current_mut().fill([0.0, 0.0, 0.0, 1.0]);
        compositor.composite(&mut targets);

        assert_eq!(targets.output().pixel(0, 0), [0.5, 0.5, 0.5, 1.0]);
    }
}
