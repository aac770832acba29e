//! Tremolo: periodic amplitude modulation.

use super::Effect;
use crate::error::{Error, Result};
use std::f64::consts::TAU;

/// Tremolo effect with its own phase counter.
///
/// Each frame is multiplied by `amplitude ^ sin(2π · phase / frames_per_cycle)`,
/// so with `amplitude = 2` the gain swings between 0.5 and 2 once per cycle.
/// The period is derived from the frame rate passed to [`Effect::apply`].
///
/// The phase is an integer frame counter that wraps on the first frame at or
/// past `frame_rate / freq`. When that ratio is fractional the cycle is
/// rounded up to a whole number of frames, so the modulation runs slightly
/// slower than `freq`.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{Effect, Oscillator};
///
/// let mut tremolo = Oscillator::new(5.0, 2.0).unwrap();
/// let mut left = [1000.0];
/// let mut right = [1000.0];
/// // First frame sits at phase zero, where the gain is 2^0 = 1
/// tremolo.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!(left[0], 1000.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    freq: f64,
    amplitude: f64,
    phase_frame: u64,
}

impl Oscillator {
    /// Creates a tremolo.
    ///
    /// # Arguments
    ///
    /// * `freq` - Modulation rate in Hz, must be positive
    /// * `amplitude` - Peak gain, must be positive; the gain swings between
    ///   `1 / amplitude` and `amplitude`
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if either argument is zero, negative or not finite.
    pub fn new(freq: f64, amplitude: f64) -> Result<Self> {
        if !freq.is_finite() || freq <= 0.0 {
            return Err(Error::Precondition(format!(
                "oscillator frequency must be positive, got {}",
                freq
            )));
        }
        // 0^negative is infinite and a negative base yields NaN
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return Err(Error::Precondition(format!(
                "oscillator amplitude must be positive, got {}",
                amplitude
            )));
        }
        Ok(Self {
            freq,
            amplitude,
            phase_frame: 0,
        })
    }

    /// Modulation rate in Hz.
    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Peak gain of the modulation.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Restarts the modulation cycle.
    pub fn reset(&mut self) {
        self.phase_frame = 0;
    }

    /// Gain for the current phase, advancing the phase by one frame.
    fn next_gain(&mut self, frame_rate: u32) -> f64 {
        let frames_per_cycle = frame_rate as f64 / self.freq;
        let d = self.phase_frame as f64 / frames_per_cycle;
        let gain = self.amplitude.powf((TAU * d).sin());
        self.phase_frame += 1;
        if self.phase_frame as f64 >= frames_per_cycle {
            self.phase_frame = 0;
        }
        gain
    }
}

impl Effect for Oscillator {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], frame_rate: u32) {
        let gain = self.next_gain(frame_rate);
        left[index] *= gain;
        right[index] *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_at_quarter_points() {
        // 4 frames per cycle: phases 0, 0.25, 0.5, 0.75
        let mut osc = Oscillator::new(1.0, 2.0).unwrap();
        let gains: Vec<f64> = (0..4).map(|_| osc.next_gain(4)).collect();
        assert!((gains[0] - 1.0).abs() < 1e-12);
        assert!((gains[1] - 2.0).abs() < 1e-12);
        assert!((gains[2] - 1.0).abs() < 1e-12);
        assert!((gains[3] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_phase_wraps_every_cycle() {
        let mut osc = Oscillator::new(1.0, 3.0).unwrap();
        let first: Vec<f64> = (0..8).map(|_| osc.next_gain(8)).collect();
        let second: Vec<f64> = (0..8).map(|_| osc.next_gain(8)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_applies_same_gain_to_both_channels() {
        let mut osc = Oscillator::new(1.0, 2.0).unwrap();
        let mut left = [100.0, 100.0];
        let mut right = [-50.0, -50.0];
        osc.apply(0, &mut left, &mut right, 4);
        osc.apply(1, &mut left, &mut right, 4);
        assert!((left[1] - 200.0).abs() < 1e-9);
        assert!((right[1] + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unity_amplitude_is_transparent() {
        let mut osc = Oscillator::new(7.0, 1.0).unwrap();
        for _ in 0..1000 {
            assert_eq!(osc.next_gain(44_100), 1.0);
        }
    }

    #[test]
    fn test_reset() {
        let mut osc = Oscillator::new(1.0, 2.0).unwrap();
        let first = osc.next_gain(4);
        osc.next_gain(4);
        osc.reset();
        assert_eq!(osc.next_gain(4), first);
    }

    #[test]
    fn test_invalid_frequency() {
        assert!(Oscillator::new(0.0, 2.0).is_err());
        assert!(Oscillator::new(-3.0, 2.0).is_err());
    }

    #[test]
    fn test_invalid_amplitude() {
        for amplitude in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    Oscillator::new(5.0, amplitude),
                    Err(Error::Precondition(_))
                ),
                "amplitude {} accepted",
                amplitude
            );
        }
    }

    #[test]
    fn test_output_stays_finite_over_full_cycles() {
        let mut osc = Oscillator::new(5.0, 0.25).unwrap();
        let mut left = vec![1000.0; 8000];
        let mut right = vec![0.0; 8000];
        for i in 0..left.len() {
            osc.apply(i, &mut left, &mut right, 8000);
        }
        assert!(left.iter().all(|x| x.is_finite() && *x > 0.0));
        assert!(right.iter().all(|x| *x == 0.0));
    }
}
