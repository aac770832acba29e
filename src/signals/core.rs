//! The `Source` capability trait and the `Signal` playback handle.
//!
//! A [`Source`] knows how to fill stereo buffers; a [`Signal`] owns one source
//! together with its effect chain and a background playback thread.

use super::driver;
use crate::effects::{Effect, EffectChain, EffectId};
use crate::error::{Error, Result};
use crate::host::AudioHost;
use parking_lot::{Condvar, Mutex};
use std::any::{Any, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Common interface for everything that produces stereo frames.
///
/// `produce` and `rewind` have default bodies that fail with
/// [`Error::Unimplemented`], so a source that lacks one of them still builds
/// and reports the problem when the operation is used.
pub trait Source: Any + Send {
    /// Frames per second. Must stay the same for the life of the source.
    fn frame_rate(&self) -> u32;

    /// Fills `left` and `right` (equal length, zeroed by the caller) with the
    /// next frames.
    ///
    /// Returns `false` once the source is exhausted. A source may fill only a
    /// prefix of the buffers; the rest stays zero.
    fn produce(&mut self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        let _ = (left, right);
        Err(Error::Unimplemented("produce"))
    }

    /// Returns production to the very beginning.
    fn rewind(&mut self) -> Result<()> {
        Err(Error::Unimplemented("rewind"))
    }

    /// Name used in log messages and thread names.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// State shared between a [`Signal`] handle and its playback thread.
pub(crate) struct Shared {
    pub(crate) frame_rate: u32,
    pub(crate) name: &'static str,
    pub(crate) source: Mutex<Box<dyn Source>>,
    pub(crate) effects: Mutex<EffectChain>,
    pub(crate) stop_requested: AtomicBool,
    playing: Mutex<bool>,
    idle: Condvar,
}

impl Shared {
    pub(crate) fn set_idle(&self) {
        *self.playing.lock() = false;
        self.idle.notify_all();
    }

    /// Produces one chunk and runs the effect chain over it.
    pub(crate) fn render(&self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        let has_more = self.source.lock().produce(left, right)?;
        self.effects.lock().apply(left, right, self.frame_rate);
        Ok(has_more)
    }
}

/// A playable source with its own effect chain.
///
/// `play` starts a dedicated thread that repeatedly produces a chunk, runs the
/// effects over it and writes it to a stream opened from the given host. The
/// calling thread only blocks in [`play_and_wait`](Self::play_and_wait) and
/// [`pause`](Self::pause).
///
/// The effect chain may be edited while playing. The chain is locked for the
/// whole effect pass of a chunk, so an edit takes effect from the next chunk
/// on and never lands halfway through one.
///
/// Dropping a playing signal stops it and waits for its thread.
///
/// # Examples
///
/// ```
/// use kaudio::host::{AudioHost, MemoryBackend};
/// use kaudio::signals::{Signal, WaveGenerator, WaveType};
/// use kaudio::effects::Amplifier;
///
/// let backend = MemoryBackend::new();
/// let host = AudioHost::with_backend(backend.clone());
/// host.set_chunk_size(100).unwrap();
///
/// // One cycle of a 441 Hz square wave at 44.1 kHz is exactly 100 frames
/// let tone = WaveGenerator::new(WaveType::Square, 441.0, 1000.0)
///     .unwrap()
///     .looping(false);
/// let signal = Signal::new(tone);
/// signal.add_effect(Amplifier::new(2.0));
/// signal.play_and_wait(&host).unwrap();
/// assert!(!signal.is_playing());
///
/// let frames = backend.streams()[0].frames();
/// assert_eq!(frames.len(), 100);
/// assert_eq!(frames[0], [2000, 2000]);
/// assert_eq!(frames[99], [-2000, -2000]);
/// ```
pub struct Signal {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Signal {
    /// Wraps a source. The frame rate is read once and fixed from here on.
    pub fn new(source: impl Source) -> Self {
        let frame_rate = source.frame_rate();
        let name = source.name();
        Self {
            shared: Arc::new(Shared {
                frame_rate,
                name,
                source: Mutex::new(Box::new(source)),
                effects: Mutex::new(EffectChain::new()),
                stop_requested: AtomicBool::new(false),
                playing: Mutex::new(false),
                idle: Condvar::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn frame_rate(&self) -> u32 {
        self.shared.frame_rate
    }

    /// Name of the wrapped source type.
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Whether the playback thread is running.
    pub fn is_playing(&self) -> bool {
        *self.shared.playing.lock()
    }

    /// Starts playback on a new thread and returns immediately.
    ///
    /// Does nothing if already playing. `is_playing` is true as soon as this
    /// returns.
    pub fn play(&self, host: &AudioHost) -> Result<()> {
        let mut worker = self.worker.lock();
        {
            let mut playing = self.shared.playing.lock();
            if *playing {
                return Ok(());
            }
            *playing = true;
        }

        if let Some(finished) = worker.take() {
            match finished.join() {
                Ok(Err(err)) => log::warn!("{}: previous playback had failed: {}", self.name(), err),
                Err(_) => log::warn!("{}: previous playback thread panicked", self.name()),
                Ok(Ok(())) => {}
            }
        }

        self.shared.stop_requested.store(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let host = host.clone();
        let spawned = thread::Builder::new()
            .name(format!("kaudio:{}", short_name(self.name())))
            .spawn(move || driver::run(&shared, &host));
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                log::info!("{}: playback started", self.name());
                Ok(())
            }
            Err(err) => {
                self.shared.set_idle();
                Err(Error::Io(err))
            }
        }
    }

    /// Starts playback and blocks until the source is exhausted.
    ///
    /// Returns the error that ended playback, if any.
    pub fn play_and_wait(&self, host: &AudioHost) -> Result<()> {
        self.play(host)?;
        self.wait_idle()
    }

    /// Asks the playback thread to stop at the next chunk boundary and blocks
    /// until it has.
    ///
    /// Returns the error that ended playback, if any. Pausing a signal that is
    /// not playing is a no-op.
    pub fn pause(&self) -> Result<()> {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.wait_idle()
    }

    fn wait_idle(&self) -> Result<()> {
        {
            let mut playing = self.shared.playing.lock();
            while *playing {
                self.shared.idle.wait(&mut playing);
            }
        }
        let finished = self.worker.lock().take();
        match finished {
            Some(handle) => handle.join().map_err(|_| Error::DriverPanicked)?,
            None => Ok(()),
        }
    }

    /// Resets the source to its beginning. Safe to call while playing; the
    /// next chunk starts from the top.
    pub fn rewind(&self) -> Result<()> {
        log::debug!("{}: rewind", self.name());
        self.shared.source.lock().rewind()
    }

    /// Appends an effect to the end of the chain.
    pub fn add_effect(&self, effect: impl Effect + 'static) -> EffectId {
        self.shared.effects.lock().push(Box::new(effect))
    }

    /// Removes an effect, handing it back so it can be added elsewhere.
    ///
    /// Returns `None` if the id is not in this signal's chain.
    pub fn remove_effect(&self, id: EffectId) -> Option<Box<dyn Effect>> {
        self.shared.effects.lock().remove(id)
    }

    /// Number of effects in the chain.
    pub fn effect_count(&self) -> usize {
        self.shared.effects.lock().len()
    }

    /// Produces the next chunk and applies this signal's effects to it,
    /// exactly as the playback thread would.
    ///
    /// Used by composites to pull from their children, and handy for offline
    /// rendering. The buffers should be zeroed and of equal length.
    pub fn render(&self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        self.shared.render(left, right)
    }

    /// Runs `f` on the concrete source.
    ///
    /// Fails with [`Error::SourceMismatch`] if the source is not a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kaudio::signals::{Signal, WaveGenerator, WaveType};
    ///
    /// let signal = Signal::new(WaveGenerator::new(WaveType::Sine, 440.0, 1.0).unwrap());
    /// let freq = signal.with_source(|wave: &mut WaveGenerator| wave.freq()).unwrap();
    /// assert_eq!(freq, 440.0);
    /// ```
    pub fn with_source<T: Source, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut source = self.shared.source.lock();
        let found = source.name();
        let any: &mut dyn Any = &mut **source;
        any.downcast_mut::<T>().map(f).ok_or(Error::SourceMismatch {
            expected: type_name::<T>(),
            found,
        })
    }

    /// Adds a child to a signal wrapping a [`CompositeSignal`](super::CompositeSignal).
    ///
    /// Works while playing; the child is heard from the next chunk.
    pub fn add_signal(&self, child: Signal) -> Result<()> {
        self.with_source(move |composite: &mut super::CompositeSignal| composite.add_signal(child))?
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.get_mut().take() {
            match handle.join() {
                Ok(Err(err)) => log::warn!("{}: playback ended with error: {}", self.shared.name, err),
                Err(_) => log::warn!("{}: playback thread panicked", self.shared.name),
                Ok(Ok(())) => {}
            }
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("source", &self.shared.name)
            .field("frame_rate", &self.shared.frame_rate)
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// Last path segment of a type name.
fn short_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}
