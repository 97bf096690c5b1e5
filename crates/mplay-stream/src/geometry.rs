//! Mapping byte intervals onto backing-store chunks.

use crate::range::StreamInterval;

/// Where an interval lives in chunk terms.
///
/// `chunk_size` must equal the granularity the store serves; a mismatch
/// shifts every block and trimming produces garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGeometry {
    /// Index of the chunk containing `interval.start`.
    pub start_chunk_index: u64,
    /// Bytes to drop from the front of the first chunk.
    pub lead_skip: u64,
    /// Chunks required to cover the whole interval.
    pub chunks_needed: u64,
}

impl ChunkGeometry {
    pub fn map(interval: StreamInterval, chunk_size: u64) -> Self {
        debug_assert!(chunk_size > 0);

        let start_chunk_index = interval.start / chunk_size;
        let lead_skip = interval.start % chunk_size;
        let chunks_needed = (interval.len() + lead_skip).div_ceil(chunk_size);

        Self {
            start_chunk_index,
            lead_skip,
            chunks_needed,
        }
    }

    /// Index of the last chunk the interval touches.
    pub fn end_chunk_index(&self) -> u64 {
        self.start_chunk_index + self.chunks_needed - 1
    }
}
