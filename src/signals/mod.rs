//! Signal sources and the playback handle that drives them.
//!
//! This module provides:
//! - `Source`, the capability trait every producer of stereo frames implements
//! - `Signal`, which owns a source, its effect chain and a playback thread
//! - `WaveGenerator` for periodic waveforms
//! - `FileSignal` for 16-bit PCM read through a `Decoder`
//! - `CompositeSignal` for summing several signals into one

mod composite;
mod core;
mod driver;
mod file;
mod wave;

pub use composite::CompositeSignal;
pub use core::{Signal, Source};
#[cfg(feature = "wav")]
pub use file::WavDecoder;
pub use file::{Decoder, FileSignal, PcmFormat};
pub use wave::{DEFAULT_FRAME_RATE, WaveGenerator, WaveType};
