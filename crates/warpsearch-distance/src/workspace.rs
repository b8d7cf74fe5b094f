//! Reusable dynamic programming buffers.
//!
//! Every kernel keeps two rolling rows of accumulated cost, two rows of
//! alignment spans for the validity tracking, two rows of match counts for
//! LCSS, and two per-position scratch arrays. Buffers grow to the longest
//! series seen and are reused across calls, so a [`Workspace`] held by one
//! classifier or worker thread avoids per-pair allocation.

/// Scratch buffers reused across distance evaluations.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub(crate) prev: Vec<f64>,
    pub(crate) curr: Vec<f64>,
    pub(crate) prev_span: Vec<usize>,
    pub(crate) curr_span: Vec<usize>,
    pub(crate) prev_count: Vec<usize>,
    pub(crate) curr_count: Vec<usize>,
    pub(crate) local_a: Vec<f64>,
    pub(crate) local_b: Vec<f64>,
}

impl Workspace {
    /// Create an empty workspace. Buffers are sized on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace pre-sized for series of up to `len` points.
    #[must_use]
    pub fn with_capacity(len: usize) -> Self {
        let width = len + 1;
        Self {
            prev: Vec::with_capacity(width),
            curr: Vec::with_capacity(width),
            prev_span: Vec::with_capacity(width),
            curr_span: Vec::with_capacity(width),
            prev_count: Vec::with_capacity(width),
            curr_count: Vec::with_capacity(width),
            local_a: Vec::with_capacity(width),
            local_b: Vec::with_capacity(width),
        }
    }

    /// Largest row width the cost buffers can hold without reallocating.
    #[must_use]
    pub fn row_capacity(&self) -> usize {
        self.prev.capacity().min(self.curr.capacity())
    }

    /// Size both cost rows to `width` and fill them with `value`.
    pub(crate) fn reset_rows(&mut self, width: usize, value: f64) {
        reset(&mut self.prev, width, value);
        reset(&mut self.curr, width, value);
    }

    /// Size both span rows to `width` and zero them.
    pub(crate) fn reset_spans(&mut self, width: usize) {
        reset(&mut self.prev_span, width, 0);
        reset(&mut self.curr_span, width, 0);
    }

    /// Size both count rows to `width` and zero them.
    pub(crate) fn reset_counts(&mut self, width: usize) {
        reset(&mut self.prev_count, width, 0);
        reset(&mut self.curr_count, width, 0);
    }

    /// Make the row just computed the previous row.
    pub(crate) fn swap_rows(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.curr);
        std::mem::swap(&mut self.prev_span, &mut self.curr_span);
        std::mem::swap(&mut self.prev_count, &mut self.curr_count);
    }
}

fn reset<T: Copy>(row: &mut Vec<T>, width: usize, value: T) {
    row.clear();
    row.resize(width, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_resized_and_filled() {
        let mut ws = Workspace::new();
        ws.reset_rows(4, f64::INFINITY);
        assert_eq!(ws.prev.len(), 4);
        assert!(ws.curr.iter().all(|v| v.is_infinite()));

        ws.reset_rows(2, 0.0);
        assert_eq!(ws.prev, vec![0.0, 0.0]);
    }

    #[test]
    fn swap_exchanges_every_row_pair() {
        let mut ws = Workspace::new();
        ws.reset_rows(1, 0.0);
        ws.reset_spans(1);
        ws.reset_counts(1);
        ws.curr[0] = 1.0;
        ws.curr_span[0] = 2;
        ws.curr_count[0] = 3;
        ws.swap_rows();
        assert_eq!((ws.prev[0], ws.prev_span[0], ws.prev_count[0]), (1.0, 2, 3));
    }

    #[test]
    fn capacity_is_retained_between_calls() {
        let mut ws = Workspace::with_capacity(64);
        assert!(ws.row_capacity() >= 65);
        ws.reset_rows(10, 0.0);
        assert!(ws.row_capacity() >= 65);
    }
}
