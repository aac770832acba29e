//! In-process backend that captures everything written to it.

use super::{Backend, OutputStream, StreamConfig};
use crate::error::{Error, Result};
use crate::pcm::decode_interleaved;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Everything one stream received.
#[derive(Debug, Clone)]
pub struct CapturedStream {
    pub config: StreamConfig,
    pub bytes: Vec<u8>,
    pub writes: usize,
    pub stopped: bool,
    pub closed: bool,
}

impl CapturedStream {
    /// Written audio as `[left, right]` frames.
    pub fn frames(&self) -> Vec<[i16; 2]> {
        decode_interleaved(&self.bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    paced: bool,
    fail_after: Option<usize>,
}

/// Backend that keeps written audio in memory.
///
/// Clones share their captures, so a test can hand one clone to an
/// [`AudioHost`](super::AudioHost) and inspect the other.
///
/// # Examples
///
/// ```
/// use kaudio::host::{AudioHost, MemoryBackend};
///
/// let backend = MemoryBackend::new().fail_after_writes(1);
/// let host = AudioHost::with_backend(backend.clone());
/// let mut stream = host.open_stream(8000).unwrap();
/// assert!(stream.write(&[1, 0, 1, 0]).is_ok());
/// assert!(stream.write(&[1, 0, 1, 0]).is_err());
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    options: Options,
    streams: Arc<Mutex<Vec<Arc<Mutex<CapturedStream>>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write take as long as the audio it carries would play for.
    pub fn paced(mut self) -> Self {
        self.options.paced = true;
        self
    }

    /// Makes each stream reject every write after the first `writes`.
    pub fn fail_after_writes(mut self, writes: usize) -> Self {
        self.options.fail_after = Some(writes);
        self
    }

    /// Snapshot of all streams opened so far, in opening order.
    pub fn streams(&self) -> Vec<CapturedStream> {
        self.streams
            .lock()
            .iter()
            .map(|stream| stream.lock().clone())
            .collect()
    }

    /// Total writes accepted across all streams.
    pub fn total_writes(&self) -> usize {
        self.streams.lock().iter().map(|s| s.lock().writes).sum()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn open_stream(&self, config: &StreamConfig) -> Result<Box<dyn OutputStream>> {
        let capture = Arc::new(Mutex::new(CapturedStream {
            config: *config,
            bytes: Vec::new(),
            writes: 0,
            stopped: false,
            closed: false,
        }));
        self.streams.lock().push(Arc::clone(&capture));
        Ok(Box::new(MemoryStream {
            capture,
            options: self.options,
        }))
    }
}

struct MemoryStream {
    capture: Arc<Mutex<CapturedStream>>,
    options: Options,
}

impl OutputStream for MemoryStream {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let frame_rate = {
            let mut capture = self.capture.lock();
            if let Some(limit) = self.options.fail_after
                && capture.writes >= limit
            {
                return Err(Error::Device(format!(
                    "memory stream refused write #{}",
                    capture.writes + 1
                )));
            }
            capture.bytes.extend_from_slice(pcm);
            capture.writes += 1;
            capture.config.frame_rate
        };
        if self.options.paced {
            let frames = pcm.len() / crate::pcm::BYTES_PER_FRAME;
            thread::sleep(Duration::from_secs_f64(frames as f64 / frame_rate as f64));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.capture.lock().stopped = true;
        Ok(())
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        self.capture.lock().closed = true;
    }
}
