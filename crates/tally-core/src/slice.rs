//! Python-style slice arithmetic
//!
//! Repeated fields expose slice get/set/delete with the exact index
//! semantics of Python lists: negative indices count from the end, bounds
//! are clamped rather than rejected, and a non-zero step selects every
//! step-th element. [`SliceSpec::indices`] resolves a slice against a length
//! into the concrete index list, in iteration order.

/// A slice `start:stop:step` with Python semantics. `step` must be non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl SliceSpec {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        assert!(step != 0, "slice step cannot be zero");
        Self { start, stop, step }
    }

    /// The full slice `[:]`.
    pub fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// The contiguous slice `[start:stop]`.
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), 1)
    }

    pub fn with_step(mut self, step: isize) -> Self {
        assert!(step != 0, "slice step cannot be zero");
        self.step = step;
        self
    }

    /// Whether this is a unit-step (contiguous) slice. Only contiguous
    /// slices accept assignment of a different length.
    pub fn is_contiguous(&self) -> bool {
        self.step == 1
    }

    /// Clamped `(start, stop)` bounds against `len`, following CPython's
    /// `PySlice_AdjustIndices`. For a negative step the stop bound is
    /// exclusive going downward and may be `-1`.
    fn bounds(&self, len: usize) -> (isize, isize) {
        let len = len as isize;
        let (default_start, default_stop, low) = if self.step > 0 {
            (0, len, 0)
        } else {
            (len - 1, -1, -1)
        };
        let clamp = |index: Option<isize>, default: isize| -> isize {
            let Some(mut index) = index else {
                return default;
            };
            if index < 0 {
                index += len;
            }
            index.clamp(low, if self.step > 0 { len } else { len - 1 })
        };
        (clamp(self.start, default_start), clamp(self.stop, default_stop))
    }

    /// The starting position of the selection; for a contiguous slice this
    /// is where replacement values are inserted even when the selection is
    /// empty.
    pub fn insertion_point(&self, len: usize) -> usize {
        debug_assert!(self.is_contiguous());
        let (start, stop) = self.bounds(len);
        start.min(stop.max(start)) as usize
    }

    /// Resolves the slice into concrete indices, in iteration order
    /// (descending for a negative step).
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let (start, stop) = self.bounds(len);
        let mut out = Vec::new();
        let mut index = start;
        while (self.step > 0 && index < stop) || (self.step < 0 && index > stop) {
            out.push(index as usize);
            index += self.step;
        }
        out
    }
}

/// Resolves a possibly negative integer index against `len`.
///
/// # Panics
///
/// Panics when the index is out of range, mirroring out-of-range indexing
/// on a plain `Vec`.
pub fn resolve_index(index: isize, len: usize) -> usize {
    let resolved = if index < 0 { index + len as isize } else { index };
    assert!(
        resolved >= 0 && (resolved as usize) < len,
        "index {index} out of range for length {len}"
    );
    resolved as usize
}
