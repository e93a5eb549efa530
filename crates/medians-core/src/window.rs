//! Running histogram of the square window and median extraction.
//!
//! The coarse level of the window is updated for every output column: one
//! column histogram enters on the right, one leaves on the left. The fine
//! level is only maintained for the coarse bucket that holds the median.
//! Each fine bucket remembers (`luc`) one past the last column folded into
//! it. When the median lands in a bucket whose contents are recent, the
//! bucket is slid column by column; when they are older than a full window
//! width, it is rebuilt from scratch. Either way the cost per output pixel
//! does not depend on the radius once amortized over a row.

use crate::column::ColumnHistograms;
use crate::histogram::{Counters, Histogram, HistogramOps, BUCKETS};
use std::marker::PhantomData;

/// Marker meaning "this fine bucket holds nothing useful".
const STALE: isize = isize::MIN / 2;

#[inline(always)]
fn clamp_column(x: isize, width: usize) -> usize {
    x.clamp(0, width as isize - 1) as usize
}

/// Add columns `first ..= last` (clamped to the table) to `dst`.
///
/// Runs of out-of-range indices all resolve to the edge column, so they are
/// folded in with a single scaled add.
fn accumulate_columns<'c, O: HistogramOps>(
    dst: &mut Counters,
    first: isize,
    last: isize,
    width: usize,
    column: impl Fn(usize) -> &'c Counters,
) {
    if first > last {
        return;
    }
    let span = last - first + 1;
    let n = width as isize;
    let below = (-first).clamp(0, span);
    let above = (last - (n - 1)).clamp(0, span);
    if below > 0 {
        O::mul_add(below as u16, column(0), dst);
    }
    if above > 0 {
        O::mul_add(above as u16, column(width - 1), dst);
    }
    for x in first.max(0)..=last.min(n - 1) {
        O::add(dst, column(x as usize));
    }
}

/// Histogram of the (2r+1)×(2r+1) window around the current output pixel.
pub struct WindowHistogram<O> {
    hist: Histogram,
    luc: [isize; BUCKETS],
    radius: usize,
    threshold: u32,
    _ops: PhantomData<O>,
}

impl<O: HistogramOps> WindowHistogram<O> {
    /// Create an empty window for filter radius `radius`.
    pub fn new(radius: usize) -> Self {
        let r = radius as u32;
        Self {
            hist: Histogram::default(),
            luc: [STALE; BUCKETS],
            radius,
            // Rank of the median in a window of (2r+1)^2 samples.
            threshold: 2 * r * r + 2 * r,
            _ops: PhantomData,
        }
    }

    /// Number of samples in a full window.
    pub fn window_len(&self) -> u32 {
        let side = 2 * self.radius as u32 + 1;
        side * side
    }

    /// Start a new row whose first output column is `x0`.
    ///
    /// The coarse level receives columns `x0 - r ..= x0 + r - 1`; column
    /// `x0 + r` enters on the first call to [`median_at`](Self::median_at).
    pub fn reset(&mut self, columns: &ColumnHistograms<'_>, x0: usize) {
        self.hist = Histogram::default();
        self.luc = [STALE; BUCKETS];
        let r = self.radius as isize;
        let x0 = x0 as isize;
        accumulate_columns::<O>(&mut self.hist.coarse, x0 - r, x0 + r - 1, columns.width(), |x| {
            columns.coarse(x)
        });
    }

    /// Median of the window centered on column `x`, then slide one column right.
    ///
    /// Calls must visit consecutive columns after a [`reset`](Self::reset).
    pub fn median_at(&mut self, columns: &ColumnHistograms<'_>, x: usize) -> u8 {
        let width = columns.width();
        let r = self.radius as isize;
        let x = x as isize;

        O::add(&mut self.hist.coarse, columns.coarse(clamp_column(x + r, width)));
        debug_assert_eq!(self.hist.population(), self.window_len());

        let (k, mut below) = self.median_bucket();
        self.refresh_bucket(columns, k, x);

        O::sub(&mut self.hist.coarse, columns.coarse(clamp_column(x - r, width)));

        for (b, &count) in self.hist.fine[k].iter().enumerate() {
            below += u32::from(count);
            if below > self.threshold {
                return (k * BUCKETS + b) as u8;
            }
        }
        unreachable!("fine bucket {k} disagrees with its coarse count")
    }

    /// Coarse bucket holding the median and the number of samples below it.
    #[inline]
    fn median_bucket(&self) -> (usize, u32) {
        let mut below = 0u32;
        for (k, &count) in self.hist.coarse.iter().enumerate() {
            let count = u32::from(count);
            if below + count > self.threshold {
                return (k, below);
            }
            below += count;
        }
        unreachable!("window holds {below} samples, fewer than its median rank")
    }

    /// Bring `fine[k]` up to date with the window centered on column `x`.
    fn refresh_bucket(&mut self, columns: &ColumnHistograms<'_>, k: usize, x: isize) {
        let width = columns.width();
        let r = self.radius as isize;
        let target = x + r + 1;
        let fine = &mut self.hist.fine[k];

        if self.luc[k] <= x - r {
            *fine = [0; BUCKETS];
            accumulate_columns::<O>(fine, x - r, x + r, width, |c| columns.fine(k, c));
            self.luc[k] = target;
            return;
        }

        let mut next = self.luc[k];
        while next < target {
            O::sub(fine, columns.fine(k, clamp_column(next - 2 * r - 1, width)));
            O::add(fine, columns.fine(k, clamp_column(next, width)));
            next += 1;
        }
        self.luc[k] = next;
    }

    #[cfg(test)]
    fn histogram(&self) -> &Histogram {
        &self.hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{NativeOps, ScalarOps};
    use crate::image::ImageView;
    use bumpalo::Bump;

    fn brute_median(view: &ImageView, x: usize, y: usize, radius: usize) -> u8 {
        let r = radius as isize;
        let mut values = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let yy = (y as isize + dy).clamp(0, view.height as isize - 1) as usize;
                let xx = (x as isize + dx).clamp(0, view.width as isize - 1) as usize;
                values.push(view.get_pixel(xx, yy, 0));
            }
        }
        values.sort_unstable();
        values[values.len() / 2]
    }

    fn run_row<O: HistogramOps>(view: &ImageView, radius: usize, row: usize) -> Vec<u8> {
        let plane = view.plane(0);
        let arena = Bump::new();
        let mut columns = ColumnHistograms::new_in(&arena, view.width);
        columns.seed(&plane, 0, radius);
        for y in 0..=row {
            columns.slide_down(&plane, 0, radius, y);
        }
        let mut window = WindowHistogram::<O>::new(radius);
        window.reset(&columns, 0);
        (0..view.width).map(|x| window.median_at(&columns, x)).collect()
    }

    #[test]
    fn test_threshold_is_median_rank() {
        for radius in 0..10 {
            let window = WindowHistogram::<ScalarOps>::new(radius);
            assert_eq!(window.threshold, (window.window_len() - 1) / 2);
        }
    }

    #[test]
    fn test_row_medians_match_brute_force() {
        let width = 23;
        let height = 11;
        let data: Vec<u8> = (0..width * height)
            .map(|i| ((i * 7919) % 256) as u8)
            .collect();
        let view = ImageView::new(&data, width, height, width).unwrap();

        for radius in 0..=5 {
            for row in [0, 3, height - 1] {
                let got = run_row::<NativeOps>(&view, radius, row);
                let expected: Vec<u8> = (0..width).map(|x| brute_median(&view, x, row, radius)).collect();
                assert_eq!(got, expected, "radius {radius}, row {row}");
                assert_eq!(run_row::<ScalarOps>(&view, radius, row), expected);
            }
        }
    }

    #[test]
    fn test_population_is_full_window_after_entry() {
        let width = 12;
        let height = 7;
        let data: Vec<u8> = (0..width * height).map(|i| (i * 31 % 256) as u8).collect();
        let view = ImageView::new(&data, width, height, width).unwrap();
        let plane = view.plane(0);
        let radius = 2;

        let arena = Bump::new();
        let mut columns = ColumnHistograms::new_in(&arena, width);
        columns.seed(&plane, 0, radius);
        columns.slide_down(&plane, 0, radius, 0);

        let mut window = WindowHistogram::<ScalarOps>::new(radius);
        window.reset(&columns, 0);
        // Before a column enters, the window is one column short.
        assert_eq!(window.histogram().population(), 4 * 5);
        for x in 0..width {
            window.median_at(&columns, x);
            // After leaving, it is again 2r columns of 2r+1 samples.
            assert_eq!(window.histogram().population(), 4 * 5);
        }
    }

    #[test]
    fn test_stale_bucket_is_rebuilt_after_long_absence() {
        // Left half dark, right half bright: the median bucket jumps once and
        // the bright bucket must be rebuilt, not slid, when it becomes active.
        let width = 40;
        let height = 5;
        let mut data = vec![3u8; width * height];
        for y in 0..height {
            for x in width / 2..width {
                data[y * width + x] = 250;
            }
        }
        let view = ImageView::new(&data, width, height, width).unwrap();
        let row = run_row::<ScalarOps>(&view, 1, 2);
        assert!(row[..width / 2].iter().all(|&v| v == 3));
        assert!(row[width / 2..].iter().all(|&v| v == 250));
    }

    #[test]
    fn test_accumulate_columns_folds_edges() {
        let arena = Bump::new();
        let columns = ColumnHistograms::new_in(&arena, 3);
        let table: Vec<Counters> = (0..3).map(|i| [i as u16 + 1; BUCKETS]).collect();

        let mut dst = [0u16; BUCKETS];
        // -2, -1, 0, 1, 2, 3, 4 -> 0, 0, 0, 1, 2, 2, 2
        accumulate_columns::<ScalarOps>(&mut dst, -2, 4, columns.width(), |x| &table[x]);
        assert_eq!(dst[0], 3 * 1 + 2 + 3 * 3);

        let mut dst = [0u16; BUCKETS];
        accumulate_columns::<ScalarOps>(&mut dst, -3, -1, columns.width(), |x| &table[x]);
        assert_eq!(dst[7], 3);

        let mut dst = [0u16; BUCKETS];
        accumulate_columns::<ScalarOps>(&mut dst, 1, 0, columns.width(), |x| &table[x]);
        assert_eq!(dst, [0; BUCKETS]);
    }
}
