//! kaudio - Threaded stereo PCM playback for Rust
//!
//! Signals (waveforms, WAV files and mixes of other signals) fill stereo
//! buffers chunk by chunk. Each playing signal runs on its own thread, passes
//! every chunk through its effect chain and writes it as interleaved 16-bit
//! PCM to a stream opened from an [`AudioHost`].
//!
//! # Examples
//!
//! ```
//! use kaudio::{AudioHost, CompositeSignal, Fader, MemoryBackend, Signal, WaveGenerator, WaveType};
//!
//! let backend = MemoryBackend::new();
//! let host = AudioHost::with_backend(backend.clone());
//!
//! let a = Signal::new(WaveGenerator::new(WaveType::Sine, 441.0, 4000.0).unwrap().looping(false));
//! let b = Signal::new(WaveGenerator::new(WaveType::Sine, 882.0, 2000.0).unwrap().looping(false));
//! let mix = Signal::new(CompositeSignal::new(vec![a, b]).unwrap());
//! mix.add_effect(Fader::new(1.0, 0.0));
//!
//! mix.play_and_wait(&host).unwrap();
//! let frames = backend.streams()[0].frames();
//! assert!(frames.iter().all(|[_, right]| *right == 0));
//! ```

pub mod effects;
pub mod error;
pub mod host;
pub mod pcm;
pub mod signals;

// Re-export commonly used types at the crate root
pub use effects::{
    Amplifier, ComplexFader, Compressor, Effect, EffectId, Fader, MixControls, Oscillator,
    Overdriver,
};
pub use error::{Error, Result};
#[cfg(feature = "cpal")]
pub use host::CpalBackend;
pub use host::{AudioHost, Backend, DEFAULT_CHUNK_SIZE, MemoryBackend, OutputStream, StreamConfig};
#[cfg(feature = "wav")]
pub use signals::WavDecoder;
pub use signals::{
    CompositeSignal, Decoder, FileSignal, Signal, Source, WaveGenerator, WaveType,
};
