use super::Sample;
use crate::utils::Result;

pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Lazily groups a sample stream into fixed-size chunks.
///
/// The underlying stream is consumed as chunks are pulled, so the sequence
/// cannot be restarted. It stops after the first error. Dropping it between
/// chunks abandons the read without side effects.
pub struct SampleChunks<I> {
    rows: I,
    chunk_size: usize,
    done: bool,
}

impl<I> SampleChunks<I>
where
    I: Iterator<Item = Result<Sample>>,
{
    pub fn new(rows: I, chunk_size: usize) -> Self {
        Self {
            rows,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<I> Iterator for SampleChunks<I>
where
    I: Iterator<Item = Result<Sample>>,
{
    type Item = Result<Vec<Sample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            match self.rows.next() {
                Some(Ok(sample)) => chunk.push(sample),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        (!chunk.is_empty()).then_some(Ok(chunk))
    }
}
