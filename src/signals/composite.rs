//! Mixes several signals into one.

use super::{Signal, Source};
use crate::error::{Error, Result};

/// Sums the output of its children, each after the child's own effects.
///
/// The mix is a plain sum with no normalization, so loud children can push
/// the result past the 16-bit range. Values are only saturated when the
/// chunk is written out. The composite keeps producing while any child still
/// has data; exhausted children stay in the list and contribute silence.
///
/// # Examples
///
/// ```
/// use kaudio::signals::{CompositeSignal, Signal, Source, WaveGenerator, WaveType};
///
/// let low = WaveGenerator::with_frame_rate(WaveType::Square, 1.0, 100.0, 8).unwrap();
/// let high = WaveGenerator::with_frame_rate(WaveType::Square, 1.0, 20.0, 8).unwrap();
/// let mut mix = CompositeSignal::new(vec![Signal::new(low), Signal::new(high)]).unwrap();
///
/// let mut left = [0.0; 2];
/// let mut right = [0.0; 2];
/// mix.produce(&mut left, &mut right).unwrap();
/// assert_eq!(left, [120.0, 120.0]);
/// ```
pub struct CompositeSignal {
    frame_rate: u32,
    children: Vec<Signal>,
    scratch_left: Vec<f64>,
    scratch_right: Vec<f64>,
}

impl CompositeSignal {
    /// Builds a mix of `children`.
    ///
    /// # Arguments
    ///
    /// * `children` - Signals to sum, in processing order. They are moved in
    ///   and from then on are only driven by the composite.
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if `children` is empty, if the children do not
    /// share one frame rate, or if any child is currently playing on its own.
    pub fn new(children: Vec<Signal>) -> Result<Self> {
        let Some(first) = children.first() else {
            return Err(Error::Precondition(
                "a composite signal needs at least one child".into(),
            ));
        };
        let frame_rate = first.frame_rate();
        for child in &children {
            check_child(child, frame_rate)?;
        }
        Ok(Self {
            frame_rate,
            children,
            scratch_left: Vec::new(),
            scratch_right: Vec::new(),
        })
    }

    /// Appends a child, heard from the next chunk on.
    ///
    /// # Errors
    ///
    /// [`Error::Precondition`] if the child's frame rate differs from the
    /// composite's or the child is currently playing on its own. The child is
    /// dropped in that case.
    pub fn add_signal(&mut self, child: Signal) -> Result<()> {
        if let Err(err) = check_child(&child, self.frame_rate) {
            log::warn!("rejected child {}: {}", child.name(), err);
            return Err(err);
        }
        log::debug!("composite gained child {}", child.name());
        self.children.push(child);
        Ok(())
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A child must match the mix's frame rate and must not have its own
/// playback thread, since two threads pulling from one source would split it.
fn check_child(child: &Signal, frame_rate: u32) -> Result<()> {
    if child.frame_rate() != frame_rate {
        return Err(Error::Precondition(format!(
            "child {} runs at {} Hz, expected {} Hz",
            child.name(),
            child.frame_rate(),
            frame_rate
        )));
    }
    if child.is_playing() {
        return Err(Error::Precondition(format!(
            "child {} is already playing on its own",
            child.name()
        )));
    }
    Ok(())
}

impl Source for CompositeSignal {
    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn produce(&mut self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        let frames = left.len().min(right.len());
        self.scratch_left.resize(frames, 0.0);
        self.scratch_right.resize(frames, 0.0);

        let mut has_more = false;
        for child in &self.children {
            self.scratch_left.fill(0.0);
            self.scratch_right.fill(0.0);
            has_more |= child.render(&mut self.scratch_left, &mut self.scratch_right)?;

            for (out, sample) in left.iter_mut().zip(&self.scratch_left) {
                *out += sample;
            }
            for (out, sample) in right.iter_mut().zip(&self.scratch_right) {
                *out += sample;
            }
        }
        Ok(has_more)
    }

    fn rewind(&mut self) -> Result<()> {
        for child in &self.children {
            child.rewind()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Amplifier;
    use crate::host::{AudioHost, MemoryBackend};
    use crate::signals::{WaveGenerator, WaveType};

    /// Emits a constant for a fixed number of frames.
    struct Constant {
        value: f64,
        rate: u32,
        remaining: usize,
        total: usize,
    }

    impl Constant {
        fn signal(value: f64, rate: u32, total: usize) -> Signal {
            Signal::new(Constant {
                value,
                rate,
                remaining: total,
                total,
            })
        }
    }

    impl Source for Constant {
        fn frame_rate(&self) -> u32 {
            self.rate
        }

        fn produce(&mut self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
            let n = left.len().min(self.remaining);
            left[..n].fill(self.value);
            right[..n].fill(self.value);
            self.remaining -= n;
            Ok(self.remaining > 0)
        }

        fn rewind(&mut self) -> Result<()> {
            self.remaining = self.total;
            Ok(())
        }
    }

    fn produce(mix: &mut CompositeSignal, frames: usize) -> (Vec<f64>, Vec<f64>, bool) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        let more = mix.produce(&mut left, &mut right).unwrap();
        (left, right, more)
    }

    #[test]
    fn test_sums_children_without_normalizing() {
        let mut mix = CompositeSignal::new(vec![
            Constant::signal(20_000.0, 8000, 100),
            Constant::signal(30_000.0, 8000, 100),
        ])
        .unwrap();
        let (left, right, more) = produce(&mut mix, 4);
        assert!(more);
        assert_eq!(left, vec![50_000.0; 4]);
        assert_eq!(right, vec![50_000.0; 4]);
    }

    #[test]
    fn test_child_effects_applied_before_sum() {
        let loud = Constant::signal(10.0, 8000, 100);
        loud.add_effect(Amplifier::new(3.0));
        let mut mix = CompositeSignal::new(vec![loud, Constant::signal(1.0, 8000, 100)]).unwrap();
        let (left, _, _) = produce(&mut mix, 2);
        assert_eq!(left, vec![31.0, 31.0]);
    }

    #[test]
    fn test_continues_while_any_child_has_data() {
        let mut mix = CompositeSignal::new(vec![
            Constant::signal(1.0, 8000, 2),
            Constant::signal(2.0, 8000, 6),
        ])
        .unwrap();
        let (left, _, more) = produce(&mut mix, 4);
        assert!(more);
        assert_eq!(left, vec![3.0, 3.0, 2.0, 2.0]);

        let (left, _, more) = produce(&mut mix, 4);
        assert!(!more);
        assert_eq!(left, vec![2.0, 2.0, 0.0, 0.0]);
        assert_eq!(mix.len(), 2);
    }

    #[test]
    fn test_rewind_reaches_every_child() {
        let mut mix = CompositeSignal::new(vec![
            Constant::signal(1.0, 8000, 2),
            Constant::signal(2.0, 8000, 2),
        ])
        .unwrap();
        produce(&mut mix, 4);
        mix.rewind().unwrap();
        let (left, _, _) = produce(&mut mix, 2);
        assert_eq!(left, vec![3.0, 3.0]);
    }

    #[test]
    fn test_construction_preconditions() {
        assert!(matches!(
            CompositeSignal::new(Vec::new()),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            CompositeSignal::new(vec![
                Constant::signal(1.0, 8000, 1),
                Constant::signal(1.0, 44_100, 1),
            ]),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_add_signal_checks_frame_rate() {
        let mut mix = CompositeSignal::new(vec![Constant::signal(1.0, 8000, 10)]).unwrap();
        assert!(mix.add_signal(Constant::signal(1.0, 16_000, 10)).is_err());
        assert_eq!(mix.len(), 1);

        mix.add_signal(Constant::signal(4.0, 8000, 10)).unwrap();
        assert_eq!(mix.len(), 2);
        let (left, _, _) = produce(&mut mix, 1);
        assert_eq!(left, vec![5.0]);
    }

    #[test]
    fn test_add_signal_through_handle() {
        let wave = WaveGenerator::new(WaveType::Sine, 440.0, 1.0).unwrap();
        let composite =
            Signal::new(CompositeSignal::new(vec![Signal::new(wave.clone())]).unwrap());
        composite.add_signal(Signal::new(wave)).unwrap();
        let children = composite.with_source(|mix: &mut CompositeSignal| mix.len()).unwrap();
        assert_eq!(children, 2);

        // Not a composite
        let plain = Signal::new(WaveGenerator::new(WaveType::Sine, 440.0, 1.0).unwrap());
        let child = Signal::new(WaveGenerator::new(WaveType::Sine, 220.0, 1.0).unwrap());
        assert!(matches!(
            plain.add_signal(child),
            Err(Error::SourceMismatch { .. })
        ));
    }

    #[test]
    fn test_playing_signal_cannot_become_child() {
        let host = AudioHost::with_backend(MemoryBackend::new().paced());
        let busy = Constant::signal(1.0, 8000, usize::MAX);
        busy.play(&host).unwrap();
        assert!(busy.is_playing());

        let mut mix = CompositeSignal::new(vec![Constant::signal(1.0, 8000, 10)]).unwrap();
        assert!(matches!(
            mix.add_signal(busy),
            Err(Error::Precondition(_))
        ));
        assert_eq!(mix.len(), 1);

        let busy = Constant::signal(1.0, 8000, usize::MAX);
        busy.play(&host).unwrap();
        assert!(matches!(
            CompositeSignal::new(vec![busy]),
            Err(Error::Precondition(_))
        ));
    }
}
