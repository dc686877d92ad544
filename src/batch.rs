/// Contiguous `(start, len)` windows over a dataset of `total` examples.
/// The last window may be shorter; nothing is padded or shuffled.
#[derive(Debug, Clone)]
pub struct Batches {
    total: i64,
    batch_size: i64,
    start: i64,
}

pub fn partition(total: i64, batch_size: i64) -> Batches {
    assert!(batch_size > 0, "batch size must be positive");
    Batches { total: total.max(0), batch_size, start: 0 }
}

impl Iterator for Batches {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<(i64, i64)> {
        if self.start >= self.total {
            return None;
        }
        let len = i64::min(self.batch_size, self.total - self.start);
        let window = (self.start, len);
        self.start += len;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.start + self.batch_size - 1) / self.batch_size;
        (remaining as usize, Some(remaining as usize))
    }
}

impl ExactSizeIterator for Batches {}
