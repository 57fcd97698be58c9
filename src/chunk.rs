//! Splitting a payload into bounded-size pieces, one per DATA frame.

use std::num::NonZeroUsize;

/// Split `data` into slices of at most `max` bytes.
///
/// Every slice but the last is exactly `max` bytes long. A buffer whose length
/// is a multiple of `max` does not produce a trailing empty slice, but an
/// empty buffer produces exactly one empty slice so that callers still emit
/// one frame for it.
pub fn chunk_by(data: &[u8], max: NonZeroUsize) -> Chunks<'_> {
    Chunks {
        rest: Some(data),
        max: max.get(),
    }
}

/// Iterator returned by [`chunk_by`]. Clone it to restart from the same point.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: Option<&'a [u8]>,
    max: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        if rest.len() > self.max {
            let (head, tail) = rest.split_at(self.max);
            self.rest = Some(tail);
            Some(head)
        } else {
            self.rest = None;
            Some(rest)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match self.rest {
            None => 0,
            Some(rest) if rest.is_empty() => 1,
            Some(rest) => rest.len().div_ceil(self.max),
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl std::iter::FusedIterator for Chunks<'_> {}
