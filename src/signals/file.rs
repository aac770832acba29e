//! Signals that stream 16-bit PCM out of an audio file.

use super::Source;
use crate::error::{Error, Result};

/// Layout of the PCM data a [`Decoder`] yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub frame_rate: u32,
    pub channels: u16,
    pub sample_width_bytes: u16,
}

/// Sequential access to decoded PCM frames.
pub trait Decoder: Send {
    fn format(&self) -> PcmFormat;

    /// Replaces `out` with up to `frames` interleaved frames and returns how
    /// many were read. Zero means end of data.
    fn read_frames(&mut self, frames: usize, out: &mut Vec<i16>) -> Result<usize>;

    /// Starts decoding again from the first frame. Also reopens a closed decoder.
    fn reopen(&mut self) -> Result<()>;

    /// Releases the underlying resource. Reads after this return no frames.
    fn close(&mut self) {}
}

#[cfg(feature = "wav")]
pub use wav::WavDecoder;

#[cfg(feature = "wav")]
mod wav {
    use super::{Decoder, PcmFormat};
    use crate::error::Result;
    use hound::WavReader;
    use std::fs::File;
    use std::io::{BufReader, Cursor, Read};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    type Reader = WavReader<Box<dyn Read + Send>>;

    enum Origin {
        Path(PathBuf),
        Memory(Arc<[u8]>),
    }

    impl Origin {
        fn open(&self) -> Result<Reader> {
            let input: Box<dyn Read + Send> = match self {
                Origin::Path(path) => Box::new(BufReader::new(File::open(path)?)),
                Origin::Memory(bytes) => Box::new(Cursor::new(bytes.clone())),
            };
            Ok(WavReader::new(input)?)
        }
    }

    /// WAV decoder backed by `hound`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kaudio::signals::{Decoder, WavDecoder};
    ///
    /// let decoder = WavDecoder::open("drums.wav").unwrap();
    /// println!("{} Hz", decoder.format().frame_rate);
    /// ```
    pub struct WavDecoder {
        origin: Origin,
        reader: Option<Reader>,
        format: PcmFormat,
    }

    impl WavDecoder {
        /// Opens a WAV file on disk. It is reopened from the path on rewind.
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            Self::from_origin(Origin::Path(path.as_ref().to_path_buf()))
        }

        /// Decodes a complete WAV image held in memory.
        pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
            Self::from_origin(Origin::Memory(bytes.into()))
        }

        fn from_origin(origin: Origin) -> Result<Self> {
            let reader = origin.open()?;
            let spec = reader.spec();
            let format = PcmFormat {
                frame_rate: spec.sample_rate,
                channels: spec.channels,
                sample_width_bytes: spec.bits_per_sample.div_ceil(8),
            };
            Ok(Self {
                origin,
                reader: Some(reader),
                format,
            })
        }
    }

    impl Decoder for WavDecoder {
        fn format(&self) -> PcmFormat {
            self.format
        }

        fn read_frames(&mut self, frames: usize, out: &mut Vec<i16>) -> Result<usize> {
            out.clear();
            let Some(reader) = self.reader.as_mut() else {
                return Ok(0);
            };
            let channels = usize::from(self.format.channels.max(1));
            for sample in reader.samples::<i16>().take(frames * channels) {
                out.push(sample?);
            }
            // Drop a trailing partial frame
            let read = out.len() / channels;
            out.truncate(read * channels);
            Ok(read)
        }

        fn reopen(&mut self) -> Result<()> {
            self.reader = Some(self.origin.open()?);
            Ok(())
        }

        fn close(&mut self) {
            self.reader = None;
        }
    }
}

/// Plays 16-bit PCM frames from a [`Decoder`].
///
/// Mono input is copied to both channels. A looping signal starts over from
/// the first frame when the data runs out; a non-looping one releases the
/// decoder and reports exhaustion until rewound.
pub struct FileSignal {
    decoder: Box<dyn Decoder>,
    format: PcmFormat,
    looping: bool,
    exhausted: bool,
    scratch: Vec<i16>,
}

impl FileSignal {
    /// Opens a WAV file.
    #[cfg(feature = "wav")]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let signal = Self::from_decoder(WavDecoder::open(path)?)?;
        log::info!(
            "opened {} ({} Hz, {} channel(s))",
            path.display(),
            signal.format.frame_rate,
            signal.format.channels
        );
        Ok(signal)
    }

    /// Wraps a decoder. The signal does not loop unless asked to.
    ///
    /// # Arguments
    ///
    /// * `decoder` - Source of interleaved 16-bit frames
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFormat`] unless the data is 16-bit mono or stereo
    /// with a positive frame rate.
    pub fn from_decoder(decoder: impl Decoder + 'static) -> Result<Self> {
        let format = decoder.format();
        if format.sample_width_bytes != 2 {
            return Err(Error::UnsupportedFormat(format!(
                "{}-bit samples, only 16-bit is supported",
                u32::from(format.sample_width_bytes) * 8
            )));
        }
        if !(1..=2).contains(&format.channels) {
            return Err(Error::UnsupportedFormat(format!(
                "{} channels, only mono and stereo are supported",
                format.channels
            )));
        }
        if format.frame_rate == 0 {
            return Err(Error::UnsupportedFormat("frame rate of 0".into()));
        }
        Ok(Self {
            decoder: Box::new(decoder),
            format,
            looping: false,
            exhausted: false,
            scratch: Vec::new(),
        })
    }

    /// Sets whether playback restarts at the end of the data, builder style.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Sets whether playback restarts at the end of the data.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Whether playback restarts at the end of the data.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Channels in the underlying data, 1 or 2.
    pub fn channel_count(&self) -> u16 {
        self.format.channels
    }

    /// True once a non-looping signal has run out of data.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Source for FileSignal {
    fn frame_rate(&self) -> u32 {
        self.format.frame_rate
    }

    fn produce(&mut self, left: &mut [f64], right: &mut [f64]) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let wanted = left.len().min(right.len());
        let mut read = self.decoder.read_frames(wanted, &mut self.scratch)?;
        if read == 0 {
            if self.looping {
                log::debug!("file signal reached the end, looping");
                self.decoder.reopen()?;
                read = self.decoder.read_frames(wanted, &mut self.scratch)?;
            } else {
                log::debug!("file signal exhausted");
                self.decoder.close();
                self.exhausted = true;
                return Ok(false);
            }
        }

        if self.format.channels == 1 {
            for (i, &sample) in self.scratch.iter().take(read).enumerate() {
                left[i] = f64::from(sample);
                right[i] = f64::from(sample);
            }
        } else {
            for (i, frame) in self.scratch.chunks_exact(2).take(read).enumerate() {
                left[i] = f64::from(frame[0]);
                right[i] = f64::from(frame[1]);
            }
        }
        Ok(read > 0)
    }

    fn rewind(&mut self) -> Result<()> {
        log::debug!("file signal rewound");
        self.decoder.reopen()?;
        self.exhausted = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decoder over a fixed sample list.
    struct Scripted {
        format: PcmFormat,
        samples: Vec<i16>,
        position: usize,
        closed: bool,
    }

    impl Scripted {
        fn new(channels: u16, samples: Vec<i16>) -> Self {
            Self {
                format: PcmFormat {
                    frame_rate: 8000,
                    channels,
                    sample_width_bytes: 2,
                },
                samples,
                position: 0,
                closed: false,
            }
        }
    }

    impl Decoder for Scripted {
        fn format(&self) -> PcmFormat {
            self.format
        }

        fn read_frames(&mut self, frames: usize, out: &mut Vec<i16>) -> Result<usize> {
            out.clear();
            if self.closed {
                return Ok(0);
            }
            let channels = usize::from(self.format.channels);
            let end = (self.position + frames * channels).min(self.samples.len());
            out.extend_from_slice(&self.samples[self.position..end]);
            self.position = end;
            Ok(out.len() / channels)
        }

        fn reopen(&mut self) -> Result<()> {
            self.position = 0;
            self.closed = false;
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn produce(signal: &mut FileSignal, frames: usize) -> (Vec<f64>, Vec<f64>, bool) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        let more = signal.produce(&mut left, &mut right).unwrap();
        (left, right, more)
    }

    #[test]
    fn test_mono_duplicated_to_both_channels() {
        let mut signal = FileSignal::from_decoder(Scripted::new(1, vec![1, -2, 3])).unwrap();
        let (left, right, more) = produce(&mut signal, 3);
        assert!(more);
        assert_eq!(left, vec![1.0, -2.0, 3.0]);
        assert_eq!(left, right);
    }

    #[test]
    fn test_stereo_assigned_directly() {
        let mut signal =
            FileSignal::from_decoder(Scripted::new(2, vec![10, -10, 20, -20])).unwrap();
        let (left, right, _) = produce(&mut signal, 2);
        assert_eq!(left, vec![10.0, 20.0]);
        assert_eq!(right, vec![-10.0, -20.0]);
    }

    #[test]
    fn test_partial_then_exhausted() {
        let mut signal = FileSignal::from_decoder(Scripted::new(1, vec![5, 6, 7])).unwrap();
        let (left, _, more) = produce(&mut signal, 2);
        assert!(more);
        assert_eq!(left, vec![5.0, 6.0]);

        let (left, _, more) = produce(&mut signal, 2);
        assert!(more);
        assert_eq!(left, vec![7.0, 0.0]);

        let (_, _, more) = produce(&mut signal, 2);
        assert!(!more);
        assert!(signal.is_exhausted());

        // Stays exhausted until rewound
        let (_, _, more) = produce(&mut signal, 2);
        assert!(!more);
        signal.rewind().unwrap();
        let (left, _, more) = produce(&mut signal, 2);
        assert!(more);
        assert_eq!(left, vec![5.0, 6.0]);
    }

    #[test]
    fn test_looping_restarts_at_end() {
        let mut signal = FileSignal::from_decoder(Scripted::new(1, vec![1, 2]))
            .unwrap()
            .looping(true);
        produce(&mut signal, 2);
        let (left, _, more) = produce(&mut signal, 2);
        assert!(more);
        assert_eq!(left, vec![1.0, 2.0]);
        assert!(!signal.is_exhausted());
    }

    #[test]
    fn test_rejects_unsupported_layouts() {
        let mut wide = Scripted::new(1, vec![]);
        wide.format.sample_width_bytes = 3;
        assert!(matches!(
            FileSignal::from_decoder(wide),
            Err(Error::UnsupportedFormat(_))
        ));

        let surround = Scripted::new(6, vec![]);
        assert!(matches!(
            FileSignal::from_decoder(surround),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[cfg(feature = "wav")]
    mod wav_files {
        use super::*;
        use hound::{SampleFormat, WavSpec, WavWriter};
        use std::io::Cursor;

        fn wav_bytes(channels: u16, bits: u16, samples: &[i32]) -> Vec<u8> {
            let spec = WavSpec {
                channels,
                sample_rate: 22_050,
                bits_per_sample: bits,
                sample_format: SampleFormat::Int,
            };
            let mut cursor = Cursor::new(Vec::new());
            {
                let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
                for &sample in samples {
                    writer.write_sample(sample).unwrap();
                }
                writer.finalize().unwrap();
            }
            cursor.into_inner()
        }

        #[test]
        fn test_wav_decoder_reads_and_reopens() {
            let bytes = wav_bytes(2, 16, &[1, 2, 3, 4, 5, 6]);
            let mut decoder = WavDecoder::from_bytes(bytes).unwrap();
            assert_eq!(
                decoder.format(),
                PcmFormat {
                    frame_rate: 22_050,
                    channels: 2,
                    sample_width_bytes: 2,
                }
            );

            let mut out = Vec::new();
            assert_eq!(decoder.read_frames(2, &mut out).unwrap(), 2);
            assert_eq!(out, vec![1, 2, 3, 4]);
            assert_eq!(decoder.read_frames(2, &mut out).unwrap(), 1);
            assert_eq!(decoder.read_frames(2, &mut out).unwrap(), 0);

            decoder.reopen().unwrap();
            assert_eq!(decoder.read_frames(1, &mut out).unwrap(), 1);
            assert_eq!(out, vec![1, 2]);

            decoder.close();
            assert_eq!(decoder.read_frames(1, &mut out).unwrap(), 0);
        }

        #[test]
        fn test_wav_signal_frame_rate_and_samples() {
            let bytes = wav_bytes(1, 16, &[100, -100, i16::MAX as i32]);
            let mut signal = FileSignal::from_decoder(WavDecoder::from_bytes(bytes).unwrap())
                .unwrap();
            assert_eq!(signal.frame_rate(), 22_050);
            assert_eq!(signal.channel_count(), 1);
            let (left, right, more) = produce(&mut signal, 4);
            assert!(more);
            assert_eq!(left, vec![100.0, -100.0, 32767.0, 0.0]);
            assert_eq!(left, right);
        }

        #[test]
        fn test_24_bit_wav_rejected() {
            let bytes = wav_bytes(1, 24, &[1, 2, 3]);
            let decoder = WavDecoder::from_bytes(bytes).unwrap();
            assert!(matches!(
                FileSignal::from_decoder(decoder),
                Err(Error::UnsupportedFormat(_))
            ));
        }

        #[test]
        fn test_garbage_bytes_fail_to_decode() {
            assert!(WavDecoder::from_bytes(vec![0u8; 16]).is_err());
        }

        #[test]
        fn test_missing_file_is_io_error() {
            assert!(matches!(
                FileSignal::open("/nonexistent/kaudio/missing.wav"),
                Err(Error::Io(_))
            ));
        }
    }
}
