//! Output through the system audio device using `cpal`.
//!
//! `cpal` is callback driven while streams here are written to. The two are
//! joined by a ring buffer: `write` pushes samples and blocks while the ring
//! is full, the device callback pops them and pads with silence on underrun.

use super::{Backend, OutputStream, StreamConfig};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;
use ringbuf::{HeapCons, HeapProd, HeapRb, traits::*};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long a blocked write sleeps before retrying.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Ring capacity in seconds of audio.
const RING_SECONDS: f64 = 0.1;

fn device_error(err: impl std::fmt::Display) -> Error {
    Error::Device(err.to_string())
}

/// Backend for the system output device.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    /// Uses the default output device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the output device with the given name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match &self.device_name {
            None => host
                .default_output_device()
                .ok_or_else(|| Error::Device("no default output device".into())),
            Some(wanted) => {
                let devices = host.output_devices().map_err(device_error)?;
                for device in devices {
                    if device.name().is_ok_and(|name| &name == wanted) {
                        return Ok(device);
                    }
                }
                Err(Error::Device(format!("output device '{}' not found", wanted)))
            }
        }
    }
}

impl Backend for CpalBackend {
    fn name(&self) -> &str {
        self.device_name.as_deref().unwrap_or("default output")
    }

    fn open_stream(&self, config: &StreamConfig) -> Result<Box<dyn OutputStream>> {
        let device = self.find_device()?;
        let sample_format = device
            .default_output_config()
            .map_err(device_error)?
            .sample_format();
        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.frame_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = ((config.frame_rate as f64 * RING_SECONDS) as usize).max(1024)
            * config.channels as usize;
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        let failure = Arc::new(Mutex::new(None));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, consumer, Arc::clone(&failure))?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, consumer, Arc::clone(&failure))?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, consumer, Arc::clone(&failure))?
            }
            other => {
                return Err(Error::Device(format!(
                    "unsupported device sample format: {}",
                    other
                )));
            }
        };
        stream.play().map_err(device_error)?;
        log::debug!(
            "cpal stream started ({} device format, ring of {} samples)",
            sample_format,
            capacity
        );

        Ok(Box::new(CpalStream {
            stream,
            producer,
            pending: Vec::new(),
            failure,
            ring_duration: Duration::from_secs_f64(
                capacity as f64 / (config.frame_rate as f64 * config.channels as f64),
            ),
        }))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<i16>,
    failure: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for slot in data.iter_mut() {
                    *slot = T::from_sample(consumer.try_pop().unwrap_or(0));
                }
            },
            move |err| {
                log::error!("output stream error: {}", err);
                *failure.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(device_error)
}

struct CpalStream {
    stream: cpal::Stream,
    producer: HeapProd<i16>,
    pending: Vec<i16>,
    failure: Arc<Mutex<Option<String>>>,
    ring_duration: Duration,
}

impl CpalStream {
    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().as_ref() {
            Some(msg) => Err(Error::Device(msg.clone())),
            None => Ok(()),
        }
    }
}

impl OutputStream for CpalStream {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        self.check_failure()?;
        self.pending.clear();
        self.pending.extend(
            pcm.chunks_exact(2)
                .map(|bytes| i16::from_le_bytes([bytes[0], bytes[1]])),
        );

        let mut rest = &self.pending[..];
        while !rest.is_empty() {
            let pushed = self.producer.push_slice(rest);
            rest = &rest[pushed..];
            if !rest.is_empty() {
                self.check_failure()?;
                thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.ring_duration * 2;
        while !self.producer.is_empty() && Instant::now() < deadline {
            self.check_failure()?;
            thread::sleep(POLL_INTERVAL);
        }
        self.stream.pause().map_err(device_error)
    }
}
