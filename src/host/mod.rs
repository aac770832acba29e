//! Audio host: the process-wide context that output streams are opened from.
//!
//! A host wraps a [`Backend`] (the system device through `cpal`, or the
//! in-process [`MemoryBackend`]) and owns the playback configuration shared by
//! every signal played against it. Streams opened from a host stay valid until
//! the host is terminated; after that every write fails with
//! [`Error::HostTerminated`].
//!
//! # Examples
//!
//! ```
//! use kaudio::host::{AudioHost, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! let host = AudioHost::with_backend(backend.clone());
//! host.set_chunk_size(256).unwrap();
//!
//! let mut stream = host.open_stream(44_100).unwrap();
//! stream.write(&[0, 0, 0, 0]).unwrap();
//! drop(stream);
//!
//! assert_eq!(backend.streams()[0].frames().len(), 1);
//! host.terminate();
//! ```

#[cfg(feature = "cpal")]
mod cpal_backend;
mod memory;

#[cfg(feature = "cpal")]
pub use cpal_backend::CpalBackend;
pub use memory::{CapturedStream, MemoryBackend};

use crate::error::{Error, Result};
use crate::pcm::BYTES_PER_FRAME;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Frames per processing chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Every stream carries interleaved stereo.
pub const CHANNELS: u16 = 2;

/// Set while the process-wide host created by [`AudioHost::init`] is live.
static PROCESS_HOST_LIVE: AtomicBool = AtomicBool::new(false);

/// PCM encodings a stream can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian integers
    I16,
}

/// Format of an output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub frame_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
}

impl StreamConfig {
    /// Interleaved stereo, 16-bit signed, at `frame_rate`.
    pub fn stereo_i16(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            channels: CHANNELS,
            format: SampleFormat::I16,
        }
    }

    /// Size of one frame in bytes.
    pub fn bytes_per_frame(&self) -> usize {
        BYTES_PER_FRAME
    }
}

/// Something that can open output streams.
pub trait Backend: Send + Sync {
    /// Human readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Opens a new output stream. The stream is closed when dropped.
    fn open_stream(&self, config: &StreamConfig) -> Result<Box<dyn OutputStream>>;
}

/// A sink accepting interleaved PCM bytes.
///
/// Streams live on the thread that opened them, so no `Send` bound is
/// required. Closing is done by dropping.
pub trait OutputStream {
    /// Writes whole frames, blocking until the sink has accepted them.
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// Lets already written audio finish before the stream is closed.
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

struct HostInner {
    backend: Box<dyn Backend>,
    process_wide: bool,
    terminated: AtomicBool,
    chunk_size: AtomicUsize,
    open_streams: AtomicUsize,
}

impl HostInner {
    fn release(&self) {
        if !self.terminated.swap(true, Ordering::SeqCst) && self.process_wide {
            PROCESS_HOST_LIVE.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for HostInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handle to an audio host. Clones share the same host.
#[derive(Clone)]
pub struct AudioHost {
    inner: Arc<HostInner>,
}

impl AudioHost {
    /// Creates the process-wide host over the default output device.
    ///
    /// Only one such host may be live at a time; a second call before
    /// [`terminate`](Self::terminate) fails with [`Error::HostAlreadyInitialized`].
    #[cfg(feature = "cpal")]
    pub fn init() -> Result<Self> {
        Self::init_with(CpalBackend::new())
    }

    /// Creates the process-wide host over a custom backend.
    ///
    /// Subject to the same single-instance rule as [`init`](Self::init).
    pub fn init_with(backend: impl Backend + 'static) -> Result<Self> {
        if PROCESS_HOST_LIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::HostAlreadyInitialized);
        }
        log::info!("audio host initialized on backend '{}'", backend.name());
        Ok(Self::build(Box::new(backend), true))
    }

    /// Creates an independent host that does not take the process-wide slot.
    ///
    /// Useful for offline capture and tests, where several hosts may coexist.
    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        Self::build(Box::new(backend), false)
    }

    fn build(backend: Box<dyn Backend>, process_wide: bool) -> Self {
        Self {
            inner: Arc::new(HostInner {
                backend,
                process_wide,
                terminated: AtomicBool::new(false),
                chunk_size: AtomicUsize::new(DEFAULT_CHUNK_SIZE),
                open_streams: AtomicUsize::new(0),
            }),
        }
    }

    /// Tears the host down. Open streams fail on their next write.
    ///
    /// Calling this more than once is harmless.
    pub fn terminate(&self) {
        if !self.is_terminated() {
            log::info!("audio host '{}' terminated", self.inner.backend.name());
        }
        self.inner.release();
    }

    /// Whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::SeqCst)
    }

    /// Frames per processing chunk used by drivers started from now on.
    pub fn chunk_size(&self) -> usize {
        self.inner.chunk_size.load(Ordering::SeqCst)
    }

    /// Changes the chunk size.
    ///
    /// Fails if `frames` is zero or if any stream is currently open, since a
    /// running driver has already sized its buffers.
    pub fn set_chunk_size(&self, frames: usize) -> Result<()> {
        if frames == 0 {
            return Err(Error::Precondition("chunk size must be positive".into()));
        }
        let open = self.active_streams();
        if open > 0 {
            return Err(Error::Precondition(format!(
                "cannot change chunk size while {} stream(s) are open",
                open
            )));
        }
        self.inner.chunk_size.store(frames, Ordering::SeqCst);
        log::debug!("chunk size set to {} frames", frames);
        Ok(())
    }

    /// Number of streams currently open on this host.
    pub fn active_streams(&self) -> usize {
        self.inner.open_streams.load(Ordering::SeqCst)
    }

    /// Opens a stereo 16-bit stream at `frame_rate`.
    pub fn open_stream(&self, frame_rate: u32) -> Result<Stream> {
        if self.is_terminated() {
            return Err(Error::HostTerminated);
        }
        if frame_rate == 0 {
            return Err(Error::Precondition("frame rate must be positive".into()));
        }
        let config = StreamConfig::stereo_i16(frame_rate);
        let sink = self.inner.backend.open_stream(&config)?;
        self.inner.open_streams.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "opened {} Hz stereo stream on '{}'",
            frame_rate,
            self.inner.backend.name()
        );
        Ok(Stream {
            sink,
            config,
            host: Arc::clone(&self.inner),
        })
    }
}

/// An open output stream. Dropping it closes the stream.
pub struct Stream {
    sink: Box<dyn OutputStream>,
    config: StreamConfig,
    host: Arc<HostInner>,
}

impl Stream {
    /// Format the stream was opened with.
    pub fn config(&self) -> StreamConfig {
        self.config
    }

    /// Writes interleaved PCM bytes, blocking until the sink accepts them.
    pub fn write(&mut self, pcm: &[u8]) -> Result<()> {
        if self.host.terminated.load(Ordering::SeqCst) {
            return Err(Error::HostTerminated);
        }
        self.sink.write(pcm)
    }

    /// Drains the stream ahead of closing it.
    pub fn stop(&mut self) -> Result<()> {
        if self.host.terminated.load(Ordering::SeqCst) {
            return Err(Error::HostTerminated);
        }
        self.sink.stop()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.host.open_streams.fetch_sub(1, Ordering::SeqCst);
        log::info!("closed {} Hz stream", self.config.frame_rate);
    }
}
