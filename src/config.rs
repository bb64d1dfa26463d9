//! Configuration parameters for peak extraction

use crate::error::PeaksError;

/// Peak extraction configuration parameters
///
/// Describes the raw PCM stream (channel layout, sample rate) and the shape of
/// the waveform summary to build from it.
#[derive(Debug, Clone)]
pub struct PeaksConfig {
    // Stream layout
    /// Number of interleaved channels in the PCM stream (default: 2)
    pub num_channels: usize,

    /// Sample rate in Hz (default: 44100)
    /// Only used to fill in result metadata; the peaks do not depend on it
    pub sample_rate: u32,

    // Output shape
    /// Number of buckets in the summary, typically the display width in pixels (default: 800)
    pub width: usize,

    /// Sample step inside a bucket (default: 5)
    /// Only every `precision`-th sample is inspected; 1 inspects every sample
    pub precision: usize,

    /// Produce one peak array per channel instead of a merged one (default: None)
    /// `None` splits whenever the stream has two or more channels
    pub split_channels: Option<bool>,

    // Streaming
    /// Number of bytes requested per read when extracting from a reader (default: 65536)
    pub chunk_size: usize,
}

impl Default for PeaksConfig {
    fn default() -> Self {
        Self {
            num_channels: 2,
            sample_rate: 44100,
            width: 800,
            precision: 5,
            split_channels: None,
            chunk_size: 64 * 1024,
        }
    }
}

impl PeaksConfig {
    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), PeaksError> {
        if self.num_channels == 0 {
            return Err(PeaksError::InvalidConfig(
                "num_channels must be positive".to_string(),
            ));
        }
        if self.width == 0 {
            return Err(PeaksError::InvalidConfig("width must be positive".to_string()));
        }
        if self.precision == 0 {
            return Err(PeaksError::InvalidConfig(
                "precision must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(PeaksError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the output is split per channel once `split_channels` is resolved
    pub fn resolved_split_channels(&self) -> bool {
        self.split_channels.unwrap_or(self.num_channels >= 2)
    }

    /// Samples per channel contained in `byte_len` bytes of 16-bit interleaved PCM
    ///
    /// Truncates: a trailing half sample or incomplete frame is not counted.
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::InvalidConfig` if `num_channels` is zero or the
    /// sample count does not fit in `usize` (streams over 4 GiB on 32-bit targets).
    pub fn total_samples_for_bytes(&self, byte_len: u64) -> Result<usize, PeaksError> {
        if self.num_channels == 0 {
            return Err(PeaksError::InvalidConfig(
                "num_channels must be positive".to_string(),
            ));
        }
        let samples = (byte_len / 2) / self.num_channels as u64;
        usize::try_from(samples).map_err(|_| {
            PeaksError::InvalidConfig(format!(
                "{} samples per channel exceed the addressable range",
                samples
            ))
        })
    }
}
