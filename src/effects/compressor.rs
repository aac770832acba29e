//! Two-threshold dynamic range shaping.

use super::{Effect, sign};
use crate::error::{Error, Result};

/// Pulls quiet samples up toward `low_thresh` and loud samples down toward
/// `high_thresh`, per channel, on the sample magnitude.
///
/// ```text
/// |x| <  low:  low  - (low  - |x|) / low_factor
/// |x| >  high: high + (|x| - high) / high_factor
/// otherwise:   |x|
/// ```
///
/// The original sign is restored afterwards; silence stays silent.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{Compressor, Effect};
///
/// let mut comp = Compressor::new(1000.0, 2.0, 4000.0, 4.0).unwrap();
/// let mut left = [8000.0];
/// let mut right = [-200.0];
/// comp.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!(left[0], 5000.0);
/// assert_eq!(right[0], -600.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compressor {
    low_thresh: f64,
    low_factor: f64,
    high_thresh: f64,
    high_factor: f64,
}

impl Compressor {
    /// Creates a compressor.
    ///
    /// # Arguments
    ///
    /// * `low_thresh` - Magnitudes below this are pulled up toward it
    /// * `low_factor` - Divisor for the distance below `low_thresh`, must be positive
    /// * `high_thresh` - Magnitudes above this are pulled down toward it
    /// * `high_factor` - Divisor for the distance above `high_thresh`, must be positive
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if `low_thresh > high_thresh` or either factor
    /// is not positive.
    pub fn new(low_thresh: f64, low_factor: f64, high_thresh: f64, high_factor: f64) -> Result<Self> {
        if low_thresh.is_nan() || high_thresh.is_nan() || low_thresh > high_thresh {
            return Err(Error::Precondition(format!(
                "compressor thresholds out of order: low {} > high {}",
                low_thresh, high_thresh
            )));
        }
        for (label, factor) in [("low", low_factor), ("high", high_factor)] {
            if factor.is_nan() || factor <= 0.0 {
                return Err(Error::Precondition(format!(
                    "compressor {} factor must be positive, got {}",
                    label, factor
                )));
            }
        }
        Ok(Self {
            low_thresh,
            low_factor,
            high_thresh,
            high_factor,
        })
    }

    /// Shapes one sample.
    pub fn compress(&self, sample: f64) -> f64 {
        let magnitude = sample.abs();
        let shaped = if magnitude < self.low_thresh {
            self.low_thresh - (self.low_thresh - magnitude) / self.low_factor
        } else if magnitude > self.high_thresh {
            self.high_thresh + (magnitude - self.high_thresh) / self.high_factor
        } else {
            magnitude
        };
        sign(sample) * shaped
    }
}

impl Effect for Compressor {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], _frame_rate: u32) {
        left[index] = self.compress(left[index]);
        right[index] = self.compress(right[index]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_on_both_thresholds_unchanged() {
        let comp = Compressor::new(3000.0, 1.0, 3000.0, 3.0).unwrap();
        assert_eq!(comp.compress(3000.0), 3000.0);
        assert_eq!(comp.compress(-3000.0), -3000.0);
    }

    #[test]
    fn test_above_high_threshold() {
        let comp = Compressor::new(3000.0, 1.0, 3000.0, 3.0).unwrap();
        assert_eq!(comp.compress(6000.0), 4000.0);
        assert_eq!(comp.compress(-6000.0), -4000.0);
    }

    #[test]
    fn test_below_low_threshold() {
        let comp = Compressor::new(1000.0, 4.0, 5000.0, 1.0).unwrap();
        assert_eq!(comp.compress(200.0), 800.0);
        assert_eq!(comp.compress(-600.0), -900.0);
    }

    #[test]
    fn test_unity_factors_are_transparent() {
        let comp = Compressor::new(1000.0, 1.0, 2000.0, 1.0).unwrap();
        for x in [-30_000.0, -1500.0, -10.0, 10.0, 1500.0, 30_000.0] {
            assert_eq!(comp.compress(x), x);
        }
    }

    #[test]
    fn test_between_thresholds_untouched() {
        let comp = Compressor::new(1000.0, 2.0, 5000.0, 2.0).unwrap();
        assert_eq!(comp.compress(2500.0), 2500.0);
    }

    #[test]
    fn test_silence_stays_silent() {
        let comp = Compressor::new(1000.0, 2.0, 5000.0, 2.0).unwrap();
        assert_eq!(comp.compress(0.0), 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Compressor::new(5000.0, 1.0, 1000.0, 1.0),
            Err(Error::Precondition(_))
        ));
        assert!(Compressor::new(1000.0, 0.0, 5000.0, 1.0).is_err());
        assert!(Compressor::new(1000.0, 1.0, 5000.0, -2.0).is_err());
    }
}
