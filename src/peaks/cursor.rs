//! Per-channel resumption state for the peak aggregator

/// Where a channel stopped inside the bucket timeline
///
/// One cursor exists per channel. Between two `update` calls it records the
/// bucket still in progress, the absolute sample index reached, the offset of
/// that index inside the next batch, and the partial max/min of the bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCursor {
    /// Next bucket to finalize; equals the bucket count once exhausted
    pub bucket_index: usize,
    /// Absolute sample index the walk resumes from
    pub consumed_up_to: usize,
    /// Index of `consumed_up_to` inside the next batch
    ///
    /// Non-zero when the sample step jumped past the end of the previous batch.
    pub overflow_offset: usize,
    /// Running max of the unfinished bucket
    pub pending_max: f32,
    /// Running min of the unfinished bucket
    pub pending_min: f32,
}

impl Default for ChannelCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCursor {
    /// Cursor at bucket 0 with nothing consumed
    pub const fn new() -> Self {
        Self {
            bucket_index: 0,
            consumed_up_to: 0,
            overflow_offset: 0,
            pending_max: 0.0,
            pending_min: 0.0,
        }
    }

    /// Position of absolute sample `j` inside the batch currently being walked
    ///
    /// `j` must not precede `consumed_up_to`.
    #[inline]
    pub fn local_index(&self, j: usize) -> usize {
        j - self.consumed_up_to + self.overflow_offset
    }

    /// Record a pause inside `bucket` at absolute index `j`
    ///
    /// `local` is `j`'s position in the batch that ran out, `batch_len` that
    /// batch's length; the excess becomes the offset into the next batch.
    pub fn suspend(
        &mut self,
        bucket: usize,
        j: usize,
        local: usize,
        batch_len: usize,
        max: f32,
        min: f32,
    ) {
        self.bucket_index = bucket;
        self.overflow_offset = local - batch_len;
        self.consumed_up_to = j;
        self.pending_max = max;
        self.pending_min = min;
    }

    /// Start the next bucket from a zero seed
    ///
    /// Seeding at 0 (not +/- infinity) is kept for output compatibility: a
    /// bucket whose samples are all positive reports min 0, all negative
    /// reports max 0, and a bucket with no inspected sample reports (0, 0).
    #[inline]
    pub fn reset_pending(&mut self) {
        self.pending_max = 0.0;
        self.pending_min = 0.0;
    }

    /// Mark every bucket as finalized
    pub fn exhaust(&mut self, bucket_count: usize) {
        self.bucket_index = bucket_count;
    }

    /// True once all buckets of this channel are finalized
    pub fn is_exhausted(&self, bucket_count: usize) -> bool {
        self.bucket_index >= bucket_count
    }
}
