//! Raw 16-bit PCM decoding
//!
//! Converts arbitrarily-sized chunks of interleaved signed 16-bit little-endian
//! bytes into per-channel `f32` batches. Chunk boundaries may fall in the middle
//! of a sample or of a frame: the dangling low byte and the channel rotation are
//! carried over to the next call.
//!
//! # Example
//!
//! ```
//! use waveform_peaks::io::pcm::PcmDecoder;
//!
//! let mut decoder = PcmDecoder::new(2)?;
//! let first = decoder.decode_chunk(&[0x00, 0x40, 0x00]);
//! let second = decoder.decode_chunk(&[0xC0]);
//!
//! assert_eq!(first, vec![vec![0.5], vec![]]);
//! assert_eq!(second, vec![vec![], vec![-0.5]]);
//! # Ok::<(), waveform_peaks::PeaksError>(())
//! ```

use crate::error::PeaksError;

/// Divisor mapping an `i16` onto `[-1.0, 1.0)`
///
/// 32768 rather than 32767: `i16::MIN` maps to exactly -1.0 and full-scale
/// positive stops just short of 1.0. Output produced with a 32767 divisor is
/// not reproduced.
pub const PCM_DIVISOR: f32 = 32768.0;

/// Decoder state carried between chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderCarry {
    /// Low byte of a sample whose high byte has not arrived yet
    pub pending: Option<u8>,
    /// Channel that receives the next decoded sample
    pub rotation: usize,
}

/// Decode one chunk of interleaved 16-bit LE PCM
///
/// Pure form of [`PcmDecoder::decode_chunk`]: the carry is passed in and the
/// updated carry returned alongside exactly `num_channels` sample vectors.
///
/// # Errors
///
/// Returns `PeaksError::InvalidConfig` if `num_channels` is zero or
/// `carry.rotation` does not name one of the `num_channels` channels.
pub fn decode_chunk(
    bytes: &[u8],
    carry: DecoderCarry,
    num_channels: usize,
) -> Result<(Vec<Vec<f32>>, DecoderCarry), PeaksError> {
    if num_channels == 0 {
        return Err(PeaksError::InvalidConfig(
            "num_channels must be positive".to_string(),
        ));
    }
    if carry.rotation >= num_channels {
        return Err(PeaksError::InvalidConfig(format!(
            "carry rotation {} out of range for {} channels",
            carry.rotation, num_channels
        )));
    }

    Ok(decode_with_carry(bytes, carry, num_channels))
}

/// Decoding loop shared by the pure and stateful forms; `num_channels` is
/// non-zero and `carry.rotation` below it
fn decode_with_carry(
    bytes: &[u8],
    carry: DecoderCarry,
    num_channels: usize,
) -> (Vec<Vec<f32>>, DecoderCarry) {
    let per_channel = bytes.len() / 2 / num_channels + 1;
    let mut channels: Vec<Vec<f32>> = (0..num_channels)
        .map(|_| Vec::with_capacity(per_channel))
        .collect();
    let mut rotation = carry.rotation;

    let mut rest = bytes;
    if let Some(low) = carry.pending {
        let Some((&high, tail)) = rest.split_first() else {
            // Empty chunk: the low byte keeps waiting
            return (channels, carry);
        };
        channels[rotation].push(to_sample(low, high));
        rotation = (rotation + 1) % num_channels;
        rest = tail;
    }

    let mut pairs = rest.chunks_exact(2);
    for pair in &mut pairs {
        channels[rotation].push(to_sample(pair[0], pair[1]));
        rotation = (rotation + 1) % num_channels;
    }

    let pending = pairs.remainder().first().copied();
    (channels, DecoderCarry { pending, rotation })
}

#[inline]
fn to_sample(low: u8, high: u8) -> f32 {
    i16::from_le_bytes([low, high]) as f32 / PCM_DIVISOR
}

/// Stateful PCM decoder for one stream
///
/// Holds the odd-byte carry and the channel rotation for a single decoding
/// session. Use a fresh decoder (or [`PcmDecoder::reset`]) per stream.
#[derive(Debug, Clone)]
pub struct PcmDecoder {
    num_channels: usize,
    carry: DecoderCarry,
    samples_decoded: u64,
}

impl PcmDecoder {
    /// Create a decoder for a stream with `num_channels` interleaved channels
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::InvalidConfig` if `num_channels` is zero.
    pub fn new(num_channels: usize) -> Result<Self, PeaksError> {
        if num_channels == 0 {
            return Err(PeaksError::InvalidConfig(
                "num_channels must be positive".to_string(),
            ));
        }
        Ok(Self {
            num_channels,
            carry: DecoderCarry::default(),
            samples_decoded: 0,
        })
    }

    /// Decode the next chunk of the stream into per-channel batches
    ///
    /// Always returns `num_channels` vectors; some may be empty when the chunk
    /// is shorter than a frame.
    pub fn decode_chunk(&mut self, bytes: &[u8]) -> Vec<Vec<f32>> {
        let (channels, carry) = decode_with_carry(bytes, self.carry, self.num_channels);
        self.carry = carry;
        self.samples_decoded += channels.iter().map(|c| c.len() as u64).sum::<u64>();
        channels
    }

    /// Number of interleaved channels
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Current carry (pending low byte and rotation)
    pub fn carry(&self) -> DecoderCarry {
        self.carry
    }

    /// True if a half sample is waiting for its high byte
    pub fn has_pending_byte(&self) -> bool {
        self.carry.pending.is_some()
    }

    /// Total samples emitted across all channels since creation or reset
    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded
    }

    /// Forget the carry and restart the rotation at channel 0
    pub fn reset(&mut self) {
        self.carry = DecoderCarry::default();
        self.samples_decoded = 0;
    }
}
