//! # Waveform Peaks
//!
//! Incremental extraction of waveform summaries (per-bucket max/min amplitude)
//! from raw 16-bit PCM streams, for drawing waveforms.
//!
//! ## Features
//!
//! - **PCM decoding**: signed 16-bit little-endian, any channel count, chunks
//!   may split samples and frames anywhere
//! - **Streaming aggregation**: bounded memory, identical output however the
//!   stream is chunked
//! - **Merged or split output**: one array for all channels or one per channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use waveform_peaks::{extract_peaks_from_reader, PeaksConfig};
//! use std::fs::File;
//!
//! // Raw s16le PCM, e.g. produced by `ffmpeg -f s16le -acodec pcm_s16le`
//! let file = File::open("audio.raw")?;
//! let total_bytes = file.metadata()?.len();
//!
//! let result = extract_peaks_from_reader(file, total_bytes, &PeaksConfig::default())?;
//! println!("{} buckets", result.peaks.bucket_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Raw bytes → PcmDecoder → per-channel batches → PeakAggregator → Peaks
//! ```
//!
//! The caller owns everything around that pipeline: running an external
//! decoder, temporary files, and writing the result (the output types
//! implement `serde::Serialize`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod peaks;

// Re-export main types
pub use config::PeaksConfig;
pub use error::PeaksError;
pub use io::pcm::{DecoderCarry, PcmDecoder, PCM_DIVISOR};
pub use io::stream::{extract_peaks_from_reader, PeakStream};
pub use peaks::aggregator::PeakAggregator;
pub use peaks::cursor::ChannelCursor;
pub use peaks::output::{Peaks, PeaksMetadata, WaveformPeaks};

/// Extract peaks from an in-memory buffer of raw PCM
///
/// Decodes `bytes` as interleaved signed 16-bit little-endian samples with
/// `config.num_channels` channels and summarizes them into `config.width`
/// buckets.
///
/// # Arguments
///
/// * `bytes` - The complete PCM stream
/// * `config` - Extraction parameters
///
/// # Errors
///
/// Returns `PeaksError::InvalidConfig` if `config` does not validate.
///
/// # Example
///
/// ```
/// use waveform_peaks::{extract_peaks, Peaks, PeaksConfig};
///
/// // Mono, 4 samples: 0.5, 0.5, -0.5, -0.5
/// let bytes = [0x00, 0x40, 0x00, 0x40, 0x00, 0xC0, 0x00, 0xC0];
/// let config = PeaksConfig {
///     num_channels: 1,
///     width: 2,
///     precision: 1,
///     ..Default::default()
/// };
///
/// let result = extract_peaks(&bytes, &config)?;
/// assert_eq!(result.peaks, Peaks::Merged(vec![0.5, 0.0, 0.0, -0.5]));
/// # Ok::<(), waveform_peaks::PeaksError>(())
/// ```
pub fn extract_peaks(bytes: &[u8], config: &PeaksConfig) -> Result<WaveformPeaks, PeaksError> {
    let mut stream = PeakStream::new(config, bytes.len() as u64)?;
    for chunk in bytes.chunks(config.chunk_size) {
        stream.push(chunk)?;
    }
    stream.finish()
}
