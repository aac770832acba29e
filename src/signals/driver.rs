//! The playback loop run on each playing signal's thread.

use super::core::Shared;
use crate::error::Result;
use crate::host::{AudioHost, Stream};
use crate::pcm::encode_interleaved;
use std::sync::atomic::Ordering;

/// Marks the signal idle however the loop ends, including by panic.
struct IdleOnExit<'a>(&'a Shared);

impl Drop for IdleOnExit<'_> {
    fn drop(&mut self) {
        self.0.set_idle();
    }
}

/// Plays `shared` until its source is exhausted, a stop is requested or an
/// error occurs.
///
/// The stream is opened here and closed on every exit path; on a clean exit
/// it is drained first.
pub(crate) fn run(shared: &Shared, host: &AudioHost) -> Result<()> {
    let _idle = IdleOnExit(shared);

    let result = host.open_stream(shared.frame_rate).and_then(|mut stream| {
        let chunk_size = host.chunk_size();
        pump(shared, &mut stream, chunk_size)?;
        stream.stop()
    });

    match &result {
        Ok(()) => log::info!("{}: playback finished", shared.name),
        Err(err) => log::error!("{}: playback failed: {}", shared.name, err),
    }
    result
}

fn pump(shared: &Shared, stream: &mut Stream, chunk_size: usize) -> Result<()> {
    let mut left = vec![0.0; chunk_size];
    let mut right = vec![0.0; chunk_size];
    let mut pcm = Vec::with_capacity(chunk_size * stream.config().bytes_per_frame());
    let mut chunks = 0u64;

    loop {
        if shared.stop_requested.load(Ordering::SeqCst) {
            log::debug!("{}: stop requested after {} chunk(s)", shared.name, chunks);
            return Ok(());
        }

        let has_more = shared.render(&mut left, &mut right)?;
        encode_interleaved(&left, &right, &mut pcm);
        stream.write(&pcm)?;
        chunks += 1;

        if !has_more {
            log::debug!("{}: exhausted after {} chunk(s)", shared.name, chunks);
            return Ok(());
        }
        left.fill(0.0);
        right.fill(0.0);
    }
}
