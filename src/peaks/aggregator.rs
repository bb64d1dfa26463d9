//! Incremental peak aggregation
//!
//! Splits the full sample timeline into `length` buckets and tracks the max and
//! min of every bucket while per-channel batches stream in. A bucket may start
//! in one batch and end several batches later; each channel's
//! [`ChannelCursor`] holds the partial result in between, so feeding a stream
//! in any number of batches gives the same peaks as feeding it in one.
//!
//! # Bucket layout
//!
//! With `span = total_samples / length` (as `f64`), bucket `i` covers absolute
//! sample indices `[trunc(i * span), trunc((i + 1) * span))`. Boundaries are
//! truncated, never rounded, so existing peak files are reproduced exactly.
//! Inside a bucket only every `sample_step`-th index is inspected.
//!
//! # Example
//!
//! ```
//! use waveform_peaks::{PeakAggregator, Peaks};
//!
//! let mut aggregator = PeakAggregator::new(2, 1, 4, false)?;
//! aggregator.update(&[vec![0.5f32, -0.25]])?;
//! aggregator.update(&[vec![0.1f32, 0.75]])?;
//!
//! assert_eq!(aggregator.get(), Peaks::Merged(vec![0.5, -0.25, 0.75, 0.0]));
//! # Ok::<(), waveform_peaks::PeaksError>(())
//! ```

use crate::error::PeaksError;
use crate::peaks::cursor::ChannelCursor;
use crate::peaks::output::{bucket_of, Peaks};

/// Streaming per-bucket max/min aggregator
///
/// # Call contract
///
/// - Every `update` carries one batch per channel, with the same channel count
///   for the lifetime of the aggregator. A count change is rejected with
///   `PeaksError::SequenceViolation`.
/// - Batches arrive in stream order and cover every sample exactly once.
///   Reordered, repeated or skipped batches are not detected and silently
///   corrupt the result.
/// - [`get`](Self::get) is meaningful once the final batch has been passed in.
///
/// Buckets are seeded at 0 rather than at the first sample, so a bucket of
/// strictly positive samples reports a min of 0 (and vice versa). Consumers of
/// existing peak files rely on this.
#[derive(Debug, Clone)]
pub struct PeakAggregator {
    length: usize,
    sample_step: usize,
    total_samples: usize,
    split_channels: bool,
    span: f64,
    cursors: Vec<ChannelCursor>,
    split_peaks: Vec<Vec<f32>>,
    merged_peaks: Vec<f32>,
}

impl PeakAggregator {
    /// Create an aggregator
    ///
    /// # Arguments
    ///
    /// * `length` - Number of buckets in the output
    /// * `sample_step` - Stride inside a bucket (1 = every sample)
    /// * `total_samples` - Samples per channel expected over the whole stream
    /// * `split_channels` - Return per-channel peaks from [`get`](Self::get)
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::InvalidConfig` if `length` or `sample_step` is zero.
    pub fn new(
        length: usize,
        sample_step: usize,
        total_samples: usize,
        split_channels: bool,
    ) -> Result<Self, PeaksError> {
        if length == 0 {
            return Err(PeaksError::InvalidConfig(
                "bucket count must be positive".to_string(),
            ));
        }
        if sample_step == 0 {
            return Err(PeaksError::InvalidConfig(
                "sample step must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            length,
            sample_step,
            total_samples,
            split_channels,
            span: total_samples as f64 / length as f64,
            cursors: Vec::new(),
            split_peaks: Vec::new(),
            merged_peaks: vec![0.0; 2 * length],
        })
    }

    /// Feed the next batch of samples, one slice per channel
    ///
    /// The first call fixes the channel count. Batches may be empty.
    ///
    /// # Errors
    ///
    /// Returns `PeaksError::SequenceViolation` if no channel is given or the
    /// channel count differs from the first call. State is left untouched.
    pub fn update<S: AsRef<[f32]>>(&mut self, samples_by_channel: &[S]) -> Result<(), PeaksError> {
        let channel_count = samples_by_channel.len();

        if self.cursors.is_empty() {
            if channel_count == 0 {
                return Err(PeaksError::SequenceViolation(
                    "update needs at least one channel".to_string(),
                ));
            }
            log::debug!(
                "Peak aggregation: {} channels, {} buckets of {:.3} samples, step {}",
                channel_count,
                self.length,
                self.span,
                self.sample_step
            );
            self.cursors = vec![ChannelCursor::new(); channel_count];
            self.split_peaks = vec![vec![0.0; 2 * self.length]; channel_count];
        } else if channel_count != self.cursors.len() {
            return Err(PeaksError::SequenceViolation(format!(
                "expected {} channels, got {}",
                self.cursors.len(),
                channel_count
            )));
        }

        let was_exhausted = self.is_exhausted();
        for (c, samples) in samples_by_channel.iter().enumerate() {
            self.walk_channel(c, samples.as_ref());
        }
        if !was_exhausted && self.is_exhausted() {
            log::debug!("All {} buckets finalized", self.length);
        }

        Ok(())
    }

    /// Advance channel `c` through `batch`, finalizing every bucket it completes
    fn walk_channel(&mut self, c: usize, batch: &[f32]) {
        let cursor = &mut self.cursors[c];
        let peaks = &mut self.split_peaks[c];
        let merged = &mut self.merged_peaks;

        for bucket in cursor.bucket_index..self.length {
            let start = bucket_boundary(bucket, self.span).max(cursor.consumed_up_to);
            let end = bucket_boundary(bucket + 1, self.span);
            let mut max = cursor.pending_max;
            let mut min = cursor.pending_min;

            let mut j = start;
            while j < end {
                let local = cursor.local_index(j);
                if local >= batch.len() {
                    cursor.suspend(bucket, j, local, batch.len(), max, min);
                    return;
                }

                let value = batch[local];
                if value > max {
                    max = value;
                }
                if value < min {
                    min = value;
                }
                j = match j.checked_add(self.sample_step) {
                    Some(next) => next,
                    None => break,
                };
            }

            cursor.reset_pending();
            peaks[2 * bucket] = max;
            peaks[2 * bucket + 1] = min;

            // Channel 0 claims the merged slot; later channels only widen it
            if c == 0 || max > merged[2 * bucket] {
                merged[2 * bucket] = max;
            }
            if c == 0 || min < merged[2 * bucket + 1] {
                merged[2 * bucket + 1] = min;
            }
        }

        cursor.exhaust(self.length);
    }

    /// Current peaks in the configured output mode
    ///
    /// Buckets not finalized yet read as `(0, 0)`. Before the first `update`
    /// split peaks hold no channel.
    pub fn get(&self) -> Peaks {
        if self.split_channels {
            Peaks::Split(self.split_peaks.clone())
        } else {
            Peaks::Merged(self.merged_peaks.clone())
        }
    }

    /// Consume the aggregator and return its peaks without copying
    pub fn into_peaks(self) -> Peaks {
        if self.split_channels {
            Peaks::Split(self.split_peaks)
        } else {
            Peaks::Merged(self.merged_peaks)
        }
    }

    /// `(max, min)` of bucket `i` merged across channels
    pub fn merged_bucket(&self, i: usize) -> Option<(f32, f32)> {
        bucket_of(&self.merged_peaks, i)
    }

    /// Resumption state of channel `c`
    pub fn cursor(&self, c: usize) -> Option<&ChannelCursor> {
        self.cursors.get(c)
    }

    /// Channel count fixed by the first `update` (0 before it)
    pub fn channel_count(&self) -> usize {
        self.cursors.len()
    }

    /// True once every channel has finalized every bucket
    pub fn is_exhausted(&self) -> bool {
        !self.cursors.is_empty()
            && self
                .cursors
                .iter()
                .all(|cursor| cursor.is_exhausted(self.length))
    }

    /// Number of buckets
    pub fn length(&self) -> usize {
        self.length
    }

    /// Stride inside a bucket
    pub fn sample_step(&self) -> usize {
        self.sample_step
    }

    /// Samples per channel the layout was computed from
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Whether [`get`](Self::get) returns per-channel peaks
    pub fn split_channels(&self) -> bool {
        self.split_channels
    }

    /// Samples per bucket, fractional
    pub fn span(&self) -> f64 {
        self.span
    }
}

/// First absolute sample index of bucket `i` (truncated)
#[inline]
fn bucket_boundary(i: usize, span: f64) -> usize {
    (i as f64 * span) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic samples in [-1, 1)
    fn pseudo_random_samples(count: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                ((state >> 16) as i16) as f32 / 32768.0
            })
            .collect()
    }

    fn aggregate_in_pieces(
        channels: &[Vec<f32>],
        piece_sizes: &[usize],
        length: usize,
        step: usize,
        split: bool,
    ) -> Peaks {
        let total = channels[0].len();
        let mut aggregator = PeakAggregator::new(length, step, total, split).unwrap();
        let mut offset = 0;
        let mut sizes = piece_sizes.iter().cycle();
        while offset < total {
            let size = *sizes.next().unwrap();
            let end = (offset + size).min(total);
            let batch: Vec<&[f32]> = channels.iter().map(|c| &c[offset..end]).collect();
            aggregator.update(&batch).unwrap();
            offset = end;
        }
        aggregator.into_peaks()
    }

    #[test]
    fn test_constant_half_amplitude() {
        let mut aggregator = PeakAggregator::new(10, 1, 100, false).unwrap();
        aggregator.update(&[vec![0.5f32; 100]]).unwrap();

        let peaks = aggregator.get();
        assert_eq!(peaks.bucket_count(), 10);
        for i in 0..10 {
            assert_eq!(peaks.bucket(i), Some((0.5, 0.0)), "bucket {}", i);
        }
        assert!(aggregator.is_exhausted());
    }

    #[test]
    fn test_rejects_zero_length_and_step() {
        assert!(matches!(
            PeakAggregator::new(0, 1, 100, false),
            Err(PeaksError::InvalidConfig(_))
        ));
        assert!(matches!(
            PeakAggregator::new(10, 0, 100, false),
            Err(PeaksError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_huge_step_inspects_first_sample_of_each_bucket() {
        let mut aggregator = PeakAggregator::new(2, usize::MAX, 10, false).unwrap();
        assert_eq!(aggregator.span(), 5.0);

        let samples = vec![0.5f32, 0.9, 0.9, 0.9, 0.9, -0.25, 0.9, 0.9, 0.9, 0.9];
        aggregator.update(&[samples]).unwrap();

        // Bucket 1 starts at index 5, where stepping by usize::MAX overflows
        assert_eq!(aggregator.get(), Peaks::Merged(vec![0.5, 0.0, 0.0, -0.25]));
        assert!(aggregator.is_exhausted());
    }

    #[test]
    fn test_truncated_bucket_boundaries() {
        // span = 10 / 3: buckets [0, 3), [3, 6), [6, 10)
        let samples: Vec<f32> = (0..10).map(|i| -(i as f32) / 10.0).collect();
        let mut aggregator = PeakAggregator::new(3, 1, 10, false).unwrap();
        assert!((aggregator.span() - 10.0 / 3.0).abs() < 1e-12);
        aggregator.update(&[samples]).unwrap();

        assert_eq!(aggregator.merged_bucket(0), Some((0.0, -0.2)));
        assert_eq!(aggregator.merged_bucket(1), Some((0.0, -0.5)));
        assert_eq!(aggregator.merged_bucket(2), Some((0.0, -0.9)));
    }

    #[test]
    fn test_zero_seed_bias() {
        let mut aggregator = PeakAggregator::new(2, 1, 4, false).unwrap();
        aggregator.update(&[vec![0.2f32, 0.4, -0.3, -0.1]]).unwrap();

        // All-positive bucket reports min 0, all-negative bucket reports max 0
        assert_eq!(aggregator.merged_bucket(0), Some((0.4, 0.0)));
        assert_eq!(aggregator.merged_bucket(1), Some((0.0, -0.3)));
    }

    #[test]
    fn test_empty_buckets_when_more_buckets_than_samples() {
        // span = 0.5: every other bucket covers no sample at all
        let mut aggregator = PeakAggregator::new(4, 1, 2, false).unwrap();
        aggregator.update(&[vec![0.9f32, -0.9]]).unwrap();

        let peaks = aggregator.get();
        assert_eq!(peaks.bucket_count(), 4);
        assert_eq!(peaks.bucket(0), Some((0.0, 0.0)));
        assert_eq!(peaks.bucket(1), Some((0.9, 0.0)));
        assert_eq!(peaks.bucket(2), Some((0.0, 0.0)));
        assert_eq!(peaks.bucket(3), Some((0.0, -0.9)));
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let left = pseudo_random_samples(1000, 7);
        let right = pseudo_random_samples(1000, 99);
        let channels = vec![left, right];

        for &step in &[1, 3, 7] {
            for &split in &[false, true] {
                let expected = aggregate_in_pieces(&channels, &[1000], 37, step, split);
                for pieces in [&[1][..], &[2, 5][..], &[13][..], &[64, 1, 0, 3][..], &[333][..]] {
                    let actual = aggregate_in_pieces(&channels, pieces, 37, step, split);
                    assert_eq!(
                        actual, expected,
                        "step {} split {} pieces {:?}",
                        step, split, pieces
                    );
                }
            }
        }
    }

    #[test]
    fn test_step_overflow_resumes_inside_next_batch() {
        // One bucket, step 4: inspects indices 0, 4, 8
        let samples: [f32; 10] = [0.0, 0.9, 0.9, 0.9, 0.1, 0.9, 0.9, 0.9, -0.3, 0.9];
        let mut aggregator = PeakAggregator::new(1, 4, 10, false).unwrap();

        aggregator.update(&[&samples[..5]]).unwrap();
        let cursor = *aggregator.cursor(0).unwrap();
        assert_eq!(cursor.bucket_index, 0);
        assert_eq!(cursor.consumed_up_to, 8);
        assert_eq!(cursor.overflow_offset, 3);
        assert_eq!((cursor.pending_max, cursor.pending_min), (0.1, 0.0));

        aggregator.update(&[&samples[5..]]).unwrap();
        assert_eq!(aggregator.merged_bucket(0), Some((0.1, -0.3)));
        assert!(aggregator.is_exhausted());
    }

    #[test]
    fn test_max_not_below_min() {
        let samples = pseudo_random_samples(500, 3);
        let peaks = aggregate_in_pieces(&[samples], &[17], 50, 2, false);
        for i in 0..peaks.bucket_count() {
            let (max, min) = peaks.bucket(i).unwrap();
            assert!(max >= min, "bucket {}: max {} < min {}", i, max, min);
        }
    }

    #[test]
    fn test_merge_across_channels() {
        let mut aggregator = PeakAggregator::new(2, 1, 2, false).unwrap();
        aggregator
            .update(&[vec![0.5f32, -0.1], vec![0.3, -0.6]])
            .unwrap();
        assert_eq!(
            aggregator.get(),
            Peaks::Merged(vec![0.5, 0.0, 0.0, -0.6])
        );

        let mut split = PeakAggregator::new(2, 1, 2, true).unwrap();
        split.update(&[vec![0.5f32, -0.1], vec![0.3, -0.6]]).unwrap();
        assert_eq!(
            split.get(),
            Peaks::Split(vec![vec![0.5, 0.0, 0.0, -0.1], vec![0.3, 0.0, 0.0, -0.6]])
        );
    }

    #[test]
    fn test_channel_count_change_is_rejected() {
        let mut aggregator = PeakAggregator::new(4, 1, 8, true).unwrap();
        assert!(matches!(
            aggregator.update::<Vec<f32>>(&[]),
            Err(PeaksError::SequenceViolation(_))
        ));

        aggregator.update(&[vec![0.1f32, 0.2], vec![0.3, 0.4]]).unwrap();
        let before = aggregator.get();
        assert!(matches!(
            aggregator.update(&[vec![0.5f32]]),
            Err(PeaksError::SequenceViolation(_))
        ));
        assert_eq!(aggregator.get(), before);
        assert_eq!(aggregator.channel_count(), 2);
    }

    #[test]
    fn test_empty_batches_are_harmless() {
        let samples = pseudo_random_samples(64, 11);
        let mut plain = PeakAggregator::new(8, 3, 64, false).unwrap();
        plain.update(&[&samples[..]]).unwrap();

        let empty: &[f32] = &[];
        let mut padded = PeakAggregator::new(8, 3, 64, false).unwrap();
        padded.update(&[empty]).unwrap();
        padded.update(&[&samples[..20]]).unwrap();
        padded.update(&[empty]).unwrap();
        padded.update(&[&samples[20..]]).unwrap();
        padded.update(&[empty]).unwrap();

        assert_eq!(padded.get(), plain.get());
    }

    #[test]
    fn test_short_stream_leaves_trailing_buckets_zero() {
        let mut aggregator = PeakAggregator::new(4, 1, 8, false).unwrap();
        aggregator.update(&[vec![0.5f32, -0.5, 0.25]]).unwrap();

        assert!(!aggregator.is_exhausted());
        assert_eq!(aggregator.cursor(0).unwrap().bucket_index, 1);
        let peaks = aggregator.get();
        assert_eq!(peaks.bucket_count(), 4);
        assert_eq!(peaks.bucket(0), Some((0.5, -0.5)));
        assert_eq!(peaks.bucket(1), Some((0.0, 0.0)));
        assert_eq!(peaks.bucket(3), Some((0.0, 0.0)));
    }

    #[test]
    fn test_samples_past_total_are_ignored() {
        let mut aggregator = PeakAggregator::new(2, 1, 4, false).unwrap();
        aggregator.update(&[vec![0.1f32, 0.2, 0.3, 0.4]]).unwrap();
        assert!(aggregator.is_exhausted());
        aggregator.update(&[vec![1.0f32, -1.0]]).unwrap();
        assert_eq!(aggregator.get(), Peaks::Merged(vec![0.2, 0.0, 0.4, 0.0]));
    }
}
