//! Peak output types

use serde::{Deserialize, Serialize};

/// Waveform peaks, merged across channels or split per channel
///
/// Every array is flat and holds two slots per bucket: `[2 * i]` is the max and
/// `[2 * i + 1]` the min of bucket `i`. Serializes untagged, i.e. as a plain
/// array (merged) or an array of arrays (split).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Peaks {
    /// One array combining the extremes of every channel
    Merged(Vec<f32>),
    /// One array per channel
    Split(Vec<Vec<f32>>),
}

impl Peaks {
    /// Number of buckets per array
    pub fn bucket_count(&self) -> usize {
        match self {
            Peaks::Merged(peaks) => peaks.len() / 2,
            Peaks::Split(channels) => channels.first().map_or(0, |peaks| peaks.len() / 2),
        }
    }

    /// `(max, min)` of bucket `i` in the merged array
    ///
    /// `None` for split peaks or an out-of-range bucket.
    pub fn bucket(&self, i: usize) -> Option<(f32, f32)> {
        match self {
            Peaks::Merged(peaks) => bucket_of(peaks, i),
            Peaks::Split(_) => None,
        }
    }

    /// Flat peak array of channel `c` (split peaks only)
    pub fn channel(&self, c: usize) -> Option<&[f32]> {
        match self {
            Peaks::Merged(_) => None,
            Peaks::Split(channels) => channels.get(c).map(Vec::as_slice),
        }
    }

    /// True for split peaks
    pub fn is_split(&self) -> bool {
        matches!(self, Peaks::Split(_))
    }
}

pub(crate) fn bucket_of(peaks: &[f32], i: usize) -> Option<(f32, f32)> {
    Some((*peaks.get(2 * i)?, *peaks.get(2 * i + 1)?))
}

/// Peak extraction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformPeaks {
    /// Per-bucket extremes
    pub peaks: Peaks,

    /// Extraction metadata
    pub metadata: PeaksMetadata,
}

/// Peak extraction metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeaksMetadata {
    /// Samples per channel the bucket layout was computed from
    pub total_samples: usize,

    /// Number of interleaved channels
    pub num_channels: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Number of buckets
    pub bucket_count: usize,

    /// Stride used inside each bucket
    pub sample_step: usize,

    /// Whether `peaks` is split per channel
    pub split_channels: bool,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Crate version that produced the peaks
    pub algorithm_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_accessors() {
        let peaks = Peaks::Merged(vec![0.5, -0.25, 0.75, 0.0]);
        assert_eq!(peaks.bucket_count(), 2);
        assert_eq!(peaks.bucket(0), Some((0.5, -0.25)));
        assert_eq!(peaks.bucket(1), Some((0.75, 0.0)));
        assert_eq!(peaks.bucket(2), None);
        assert_eq!(peaks.channel(0), None);
        assert!(!peaks.is_split());
    }

    #[test]
    fn test_split_accessors() {
        let peaks = Peaks::Split(vec![vec![0.5, 0.0], vec![0.0, -0.5]]);
        assert_eq!(peaks.bucket_count(), 1);
        assert_eq!(peaks.bucket(0), None);
        assert_eq!(peaks.channel(1), Some(&[0.0, -0.5][..]));
        assert_eq!(peaks.channel(2), None);
        assert!(peaks.is_split());
        assert_eq!(Peaks::Split(vec![]).bucket_count(), 0);
    }
}
