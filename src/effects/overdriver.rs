//! Hard-clipping overdrive.

use super::{Effect, sign};
use crate::error::{Error, Result};

/// Amplifies each channel and clips its magnitude at `cutoff`.
///
/// `out = sign(x) * min(cutoff, |x * gain|)`, per channel.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{Effect, Overdriver};
///
/// let mut drive = Overdriver::new(4.0, 8000.0).unwrap();
/// let mut left = [3000.0];
/// let mut right = [-1000.0];
/// drive.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!((left[0], right[0]), (8000.0, -4000.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overdriver {
    gain: f64,
    cutoff: f64,
}

impl Overdriver {
    /// Creates an overdriver.
    ///
    /// # Arguments
    ///
    /// * `gain` - Factor applied before clipping
    /// * `cutoff` - Largest output magnitude, must be positive
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if `cutoff` is zero, negative or NaN.
    pub fn new(gain: f64, cutoff: f64) -> Result<Self> {
        if cutoff.is_nan() || cutoff <= 0.0 {
            return Err(Error::Precondition(format!(
                "overdriver cutoff must be positive, got {}",
                cutoff
            )));
        }
        Ok(Self { gain, cutoff })
    }

    /// Factor applied before clipping.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Largest output magnitude.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    #[inline]
    fn drive(&self, sample: f64) -> f64 {
        sign(sample) * self.cutoff.min((sample * self.gain).abs())
    }
}

impl Effect for Overdriver {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], _frame_rate: u32) {
        left[index] = self.drive(left[index]);
        right[index] = self.drive(right[index]);
    }
}
