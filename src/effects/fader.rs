//! Independent per-channel gain (balance).

use super::Effect;

/// Scales the left and right channels by separate gains.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{Effect, Fader};
///
/// // Hard left
/// let mut pan = Fader::new(1.0, 0.0);
/// let mut left = [300.0];
/// let mut right = [300.0];
/// pan.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!((left[0], right[0]), (300.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    left_gain: f64,
    right_gain: f64,
}

impl Fader {
    /// Creates a fader.
    ///
    /// # Arguments
    ///
    /// * `left_gain` - Factor applied to the left channel
    /// * `right_gain` - Factor applied to the right channel
    pub fn new(left_gain: f64, right_gain: f64) -> Self {
        Self {
            left_gain,
            right_gain,
        }
    }

    /// Gains as `(left, right)`.
    pub fn gains(&self) -> (f64, f64) {
        (self.left_gain, self.right_gain)
    }
}

impl Effect for Fader {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], _frame_rate: u32) {
        left[index] *= self.left_gain;
        right[index] *= self.right_gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_scaled_independently() {
        let mut fader = Fader::new(0.25, 2.0);
        let mut left = [400.0];
        let mut right = [400.0];
        fader.apply(0, &mut left, &mut right, 44_100);
        assert_eq!((left[0], right[0]), (100.0, 800.0));
    }

    #[test]
    fn test_hard_pan_left() {
        let mut fader = Fader::new(1.0, 0.0);
        let mut left = [123.0];
        let mut right = [456.0];
        fader.apply(0, &mut left, &mut right, 44_100);
        assert_eq!((left[0], right[0]), (123.0, 0.0));
    }
}
