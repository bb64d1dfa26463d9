//! Streaming peak extraction from raw PCM bytes
//!
//! Couples a [`PcmDecoder`] with a [`PeakAggregator`] so a byte source can be
//! summarized chunk by chunk without holding the decoded audio in memory.

use std::io::{ErrorKind, Read};
use std::time::Instant;

use crate::config::PeaksConfig;
use crate::error::PeaksError;
use crate::io::pcm::PcmDecoder;
use crate::peaks::aggregator::PeakAggregator;
use crate::peaks::output::{PeaksMetadata, WaveformPeaks};

/// Incremental byte-to-peaks pipeline for one PCM stream
#[derive(Debug)]
pub struct PeakStream {
    decoder: PcmDecoder,
    aggregator: PeakAggregator,
    sample_rate: u32,
    expected_bytes: u64,
    bytes_pushed: u64,
    started: Instant,
}

impl PeakStream {
    /// Create a pipeline for a stream of `total_bytes` bytes
    ///
    /// The bucket layout is derived from `total_bytes`, so it must be the
    /// length of the complete stream, not of the first chunk.
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::InvalidConfig` if `config` does not validate.
    pub fn new(config: &PeaksConfig, total_bytes: u64) -> Result<Self, PeaksError> {
        config.validate()?;

        let total_samples = config.total_samples_for_bytes(total_bytes)?;
        log::debug!(
            "Extracting peaks: {} bytes, {} channels, {} samples per channel",
            total_bytes,
            config.num_channels,
            total_samples
        );

        Ok(Self {
            decoder: PcmDecoder::new(config.num_channels)?,
            aggregator: PeakAggregator::new(
                config.width,
                config.precision,
                total_samples,
                config.resolved_split_channels(),
            )?,
            sample_rate: config.sample_rate,
            expected_bytes: total_bytes,
            bytes_pushed: 0,
            started: Instant::now(),
        })
    }

    /// Decode the next chunk of the stream and fold it into the peaks
    ///
    /// # Errors
    ///
    /// Only fails if the aggregator rejects the batch, which the decoder's
    /// fixed channel count rules out in practice.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), PeaksError> {
        let samples = self.decoder.decode_chunk(bytes);
        self.aggregator.update(&samples)?;
        self.bytes_pushed += bytes.len() as u64;
        Ok(())
    }

    /// Bytes received so far
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    /// Peak aggregator driven by this stream
    pub fn aggregator(&self) -> &PeakAggregator {
        &self.aggregator
    }

    /// End the stream and return the peaks with their metadata
    ///
    /// # Errors
    ///
    /// Propagates aggregator errors, see [`push`](Self::push).
    pub fn finish(mut self) -> Result<WaveformPeaks, PeaksError> {
        let num_channels = self.decoder.num_channels();

        if self.aggregator.channel_count() == 0 {
            // Nothing was pushed: an empty batch still sizes the split output
            self.aggregator.update(&vec![Vec::<f32>::new(); num_channels])?;
        }
        if self.decoder.has_pending_byte() {
            log::warn!("Stream ended in the middle of a sample; trailing byte dropped");
        }
        if self.bytes_pushed != self.expected_bytes {
            log::warn!(
                "Stream delivered {} bytes but {} were announced",
                self.bytes_pushed,
                self.expected_bytes
            );
        }

        let total_samples = self.aggregator.total_samples();
        let metadata = PeaksMetadata {
            total_samples,
            num_channels,
            sample_rate: self.sample_rate,
            duration_seconds: if self.sample_rate > 0 {
                total_samples as f32 / self.sample_rate as f32
            } else {
                0.0
            },
            bucket_count: self.aggregator.length(),
            sample_step: self.aggregator.sample_step(),
            split_channels: self.aggregator.split_channels(),
            processing_time_ms: self.started.elapsed().as_secs_f32() * 1000.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        log::debug!(
            "Peak extraction finished: {} buckets in {:.2} ms",
            metadata.bucket_count,
            metadata.processing_time_ms
        );

        Ok(WaveformPeaks {
            peaks: self.aggregator.into_peaks(),
            metadata,
        })
    }
}

/// Extract peaks from a reader yielding raw interleaved 16-bit LE PCM
///
/// Reads `config.chunk_size` bytes at a time until end of stream.
///
/// # Arguments
///
/// * `reader` - Byte source, e.g. a file or a decoder process's stdout
/// * `total_bytes` - Length of the complete stream in bytes
/// * `config` - Extraction parameters
///
/// # Errors
///
/// Returns `PeaksError::InvalidConfig` for an unusable config and
/// `PeaksError::Io` for any read error other than `Interrupted`.
pub fn extract_peaks_from_reader<R: Read>(
    mut reader: R,
    total_bytes: u64,
    config: &PeaksConfig,
) -> Result<WaveformPeaks, PeaksError> {
    let mut stream = PeakStream::new(config, total_bytes)?;
    let mut buf = vec![0u8; config.chunk_size];

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        stream.push(&buf[..read])?;
    }

    stream.finish()
}
