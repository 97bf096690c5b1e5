use bytes::Bytes;
use mplay_common::{Error, Result};

/// Which part of a fetched block belongs to the requested interval.
///
/// Only the first block of a stream has a non-zero `skip`, and only the last
/// one has a `want` shorter than the block. Interior blocks pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trim {
    /// Leading bytes to drop.
    pub skip: u64,
    /// Bytes to keep after the skip.
    pub want: u64,
}

impl Trim {
    /// Slice `block` down to `[skip, skip + want)`.
    ///
    /// A block too short to contain the wanted bytes is a [`Error::ShortRead`]:
    /// emitting it would leave a hole in the output.
    pub fn apply(&self, chunk_index: u64, block: Bytes) -> Result<Bytes> {
        let needed = self.skip + self.want;
        let actual = block.len() as u64;
        if actual < needed {
            return Err(Error::ShortRead {
                chunk_index,
                expected: needed,
                actual,
            });
        }

        if self.skip == 0 && actual == needed {
            return Ok(block);
        }
        Ok(block.slice(self.skip as usize..needed as usize))
    }
}
