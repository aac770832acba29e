//! Uniform gain.

use super::Effect;

/// Multiplies both channels by the same gain.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{Amplifier, Effect};
///
/// let mut left = [100.0];
/// let mut right = [-50.0];
/// Amplifier::new(0.5).apply(0, &mut left, &mut right, 44_100);
/// assert_eq!((left[0], right[0]), (50.0, -25.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amplifier {
    gain: f64,
}

impl Amplifier {
    /// Creates an amplifier.
    ///
    /// # Arguments
    ///
    /// * `gain` - Factor applied to both channels; values above 1 boost,
    ///   below 1 attenuate, negative values also invert the phase
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }

    /// The gain applied to both channels.
    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Effect for Amplifier {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], _frame_rate: u32) {
        left[index] *= self.gain;
        right[index] *= self.gain;
    }
}
