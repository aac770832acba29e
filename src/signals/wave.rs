//! Periodic waveform generator.

use super::Source;
use crate::error::{Error, Result};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Frame rate used by [`WaveGenerator::new`].
pub const DEFAULT_FRAME_RATE: u32 = 44_100;

/// Waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveType {
    pub const ALL: [WaveType; 4] = [
        WaveType::Sine,
        WaveType::Square,
        WaveType::Triangle,
        WaveType::Sawtooth,
    ];

    /// Unit-amplitude value at normalized phase `d` in `[0, 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kaudio::signals::WaveType;
    ///
    /// assert_eq!(WaveType::Square.value_at(0.4), 1.0);
    /// assert_eq!(WaveType::Square.value_at(0.6), -1.0);
    /// assert_eq!(WaveType::Triangle.value_at(0.25), 0.0);
    /// assert_eq!(WaveType::Sawtooth.value_at(0.75), 0.5);
    /// ```
    pub fn value_at(self, d: f64) -> f64 {
        match self {
            WaveType::Sine => (TAU * d).sin(),
            WaveType::Square => {
                if d < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveType::Triangle => 4.0 * if d < 0.5 { d } else { 1.0 - d } - 1.0,
            WaveType::Sawtooth => 2.0 * d - 1.0,
        }
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaveType::Sine => "sine",
            WaveType::Square => "square",
            WaveType::Triangle => "triangle",
            WaveType::Sawtooth => "sawtooth",
        };
        f.write_str(name)
    }
}

impl FromStr for WaveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(WaveType::Sine),
            "square" | "sqr" => Ok(WaveType::Square),
            "triangle" | "tri" => Ok(WaveType::Triangle),
            "sawtooth" | "saw" => Ok(WaveType::Sawtooth),
            other => Err(Error::Precondition(format!("unknown wave type '{}'", other))),
        }
    }
}

/// Generates a periodic waveform from an integer phase counter.
///
/// The cycle is `frame_rate / freq` frames long. Frame `n` of a cycle has
/// normalized phase `d = n / frames_per_cycle` and value
/// `amplitude * wave_type.value_at(d)`, written to both channels.
///
/// A looping generator wraps the counter forever. A non-looping one plays a
/// single cycle and then reports exhaustion until rewound.
///
/// # Examples
///
/// ```
/// use kaudio::signals::{Source, WaveGenerator, WaveType};
///
/// let mut wave = WaveGenerator::with_frame_rate(WaveType::Sawtooth, 1.0, 100.0, 4).unwrap();
/// let mut left = [0.0; 4];
/// let mut right = [0.0; 4];
/// assert!(wave.produce(&mut left, &mut right).unwrap());
/// assert_eq!(left, [-100.0, -50.0, 0.0, 50.0]);
/// assert_eq!(left, right);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WaveGenerator {
    wave_type: WaveType,
    freq: f64,
    amplitude: f64,
    frame_rate: u32,
    frames_per_cycle: f64,
    phase_frame: u64,
    looping: bool,
    finished: bool,
}

impl WaveGenerator {
    /// Creates a looping generator at [`DEFAULT_FRAME_RATE`].
    ///
    /// # Arguments
    ///
    /// * `wave_type` - Shape of the waveform
    /// * `freq` - Frequency in Hz, must be positive
    /// * `amplitude` - Peak sample value, must be finite
    ///
    /// # Examples
    ///
    /// ```
    /// use kaudio::signals::{WaveGenerator, WaveType};
    ///
    /// let a4 = WaveGenerator::new(WaveType::Sine, 440.0, 4000.0).unwrap();
    /// assert!(a4.is_looping());
    /// ```
    pub fn new(wave_type: WaveType, freq: f64, amplitude: f64) -> Result<Self> {
        Self::with_frame_rate(wave_type, freq, amplitude, DEFAULT_FRAME_RATE)
    }

    /// Creates a looping generator at a custom frame rate.
    ///
    /// # Arguments
    ///
    /// * `wave_type` - Shape of the waveform
    /// * `freq` - Frequency in Hz, must be positive
    /// * `amplitude` - Peak sample value, must be finite
    /// * `frame_rate` - Frames per second, must be positive
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if any argument is out of range.
    pub fn with_frame_rate(
        wave_type: WaveType,
        freq: f64,
        amplitude: f64,
        frame_rate: u32,
    ) -> Result<Self> {
        if frame_rate == 0 {
            return Err(Error::Precondition("frame rate must be positive".into()));
        }
        if !freq.is_finite() || freq <= 0.0 {
            return Err(Error::Precondition(format!(
                "wave frequency must be positive, got {}",
                freq
            )));
        }
        if !amplitude.is_finite() {
            return Err(Error::Precondition(format!(
                "wave amplitude must be finite, got {}",
                amplitude
            )));
        }
        Ok(Self {
            wave_type,
            freq,
            amplitude,
            frame_rate,
            frames_per_cycle: frame_rate as f64 / freq,
            phase_frame: 0,
            looping: true,
            finished: false,
        })
    }

    /// Sets whether the waveform repeats, builder style.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Sets whether the waveform repeats. A non-looping generator stops at
    /// the end of its current cycle.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Whether the waveform repeats.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Shape of the waveform.
    pub fn wave_type(&self) -> WaveType {
        self.wave_type
    }

    /// Requested frequency in Hz.
    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Peak sample value.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Nominal cycle length, `frame_rate / freq`.
    ///
    /// # Returns
    ///
    /// The exact ratio, which may be fractional. The phase counter is a whole
    /// number of frames and wraps on the first frame at or past this value,
    /// so a fractional cycle is played as `frames_per_cycle().ceil()` frames
    /// and the heard pitch is slightly below [`freq`](Self::freq). For
    /// example 440 Hz at 44.1 kHz wraps every 101 frames, about 436.6 Hz.
    pub fn frames_per_cycle(&self) -> f64 {
        self.frames_per_cycle
    }

    /// Position within the current cycle, in frames.
    pub fn phase_frame(&self) -> u64 {
        self.phase_frame
    }

    /// Whether a non-looping generator has played its cycle.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Sample value at normalized phase `d`, scaled by the amplitude.
    #[inline]
    pub fn value_at(&self, d: f64) -> f64 {
        self.amplitude * self.wave_type.value_at(d)
    }

    #[inline]
    fn current_value(&self) -> f64 {
        self.value_at(self.phase_frame as f64 / self.frames_per_cycle)
    }
}

impl Source for WaveGenerator {
    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn produce(&mut self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let value = self.current_value();
            *l = value;
            *r = value;

            self.phase_frame += 1;
            if self.phase_frame as f64 >= self.frames_per_cycle {
                self.phase_frame = 0;
                if !self.looping {
                    self.finished = true;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn rewind(&mut self) -> Result<()> {
        self.phase_frame = 0;
        self.finished = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.wave_type {
            WaveType::Sine => "sine wave",
            WaveType::Square => "square wave",
            WaveType::Triangle => "triangle wave",
            WaveType::Sawtooth => "sawtooth wave",
        }
    }
}
