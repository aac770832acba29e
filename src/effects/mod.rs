//! Per-sample effects applied in place to stereo buffers.
//!
//! An effect sees one frame at a time: it receives both channel buffers, the
//! index of the frame to transform and the frame rate of the signal it runs
//! on. Effects are chained in an [`EffectChain`]; for every frame each effect
//! runs in insertion order before the next frame is touched.
//!
//! # Examples
//!
//! ```
//! use kaudio::effects::{Amplifier, Effect, Overdriver};
//!
//! let mut left = [1000.0, -3000.0];
//! let mut right = [2000.0, 500.0];
//! let mut amp = Amplifier::new(4.0);
//! let mut drive = Overdriver::new(1.0, 8000.0).unwrap();
//! for i in 0..left.len() {
//!     amp.apply(i, &mut left, &mut right, 44_100);
//!     drive.apply(i, &mut left, &mut right, 44_100);
//! }
//! assert_eq!(left, [4000.0, -8000.0]);
//! assert_eq!(right, [8000.0, 2000.0]);
//! ```

mod amplifier;
mod chain;
mod complex_fader;
mod compressor;
mod fader;
mod oscillator;
mod overdriver;

pub use amplifier::Amplifier;
pub use chain::{EffectChain, EffectId};
pub use complex_fader::{ComplexFader, MixControls};
pub use compressor::Compressor;
pub use fader::Fader;
pub use oscillator::Oscillator;
pub use overdriver::Overdriver;

/// A transform applied to one stereo frame at a time.
pub trait Effect: Send {
    /// Transforms `left[index]` and `right[index]` in place.
    ///
    /// `index` is always within both buffers.
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], frame_rate: u32);

    /// Name used in log messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Allow boxed effects to be used as effects, so a removed effect can be re-added.
impl Effect for Box<dyn Effect> {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], frame_rate: u32) {
        (**self).apply(index, left, right, frame_rate)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Sign of `x` as -1, 0 or +1. Zero maps to zero, unlike `f64::signum`.
#[inline]
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(12.0), 1.0);
        assert_eq!(sign(-0.5), -1.0);
    }

    #[test]
    fn test_boxed_effect_delegates() {
        let mut boxed: Box<dyn Effect> = Box::new(Amplifier::new(2.0));
        let mut left = [3.0];
        let mut right = [4.0];
        boxed.apply(0, &mut left, &mut right, 8000);
        assert_eq!((left[0], right[0]), (6.0, 8.0));
        assert!(boxed.name().ends_with("Amplifier"));
    }
}
