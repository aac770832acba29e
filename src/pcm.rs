//! Conversion between processing buffers and interleaved 16-bit PCM.
//!
//! Processing happens on `f64` buffers so that mixing and effects never wrap.
//! Values are only narrowed to `i16` here, at serialization time: each sample
//! is truncated toward zero and saturated to `i16::MIN..=i16::MAX`.

/// Bytes occupied by one interleaved stereo frame.
pub const BYTES_PER_FRAME: usize = 4;

/// Narrows one processing sample to a PCM sample.
///
/// # Examples
///
/// ```
/// use kaudio::pcm::to_pcm_sample;
///
/// assert_eq!(to_pcm_sample(1234.9), 1234);
/// assert_eq!(to_pcm_sample(-1234.9), -1234);
/// assert_eq!(to_pcm_sample(40_000.0), i16::MAX);
/// assert_eq!(to_pcm_sample(-40_000.0), i16::MIN);
/// ```
#[inline]
pub fn to_pcm_sample(value: f64) -> i16 {
    // `as` truncates toward zero, saturates at the bounds and maps NaN to 0
    value as i16
}

/// Serializes two channel buffers into interleaved little-endian `i16` bytes.
///
/// `out` is cleared first. Only the common length of both buffers is written.
pub fn encode_interleaved(left: &[f64], right: &[f64], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(left.len().min(right.len()) * BYTES_PER_FRAME);
    for (&l, &r) in left.iter().zip(right) {
        out.extend_from_slice(&to_pcm_sample(l).to_le_bytes());
        out.extend_from_slice(&to_pcm_sample(r).to_le_bytes());
    }
}

/// Parses interleaved little-endian stereo bytes back into `[left, right]` frames.
///
/// A trailing partial frame is ignored.
pub fn decode_interleaved(bytes: &[u8]) -> Vec<[i16; 2]> {
    bytes
        .chunks_exact(BYTES_PER_FRAME)
        .map(|frame| {
            [
                i16::from_le_bytes([frame[0], frame[1]]),
                i16::from_le_bytes([frame[2], frame[3]]),
            ]
        })
        .collect()
}
