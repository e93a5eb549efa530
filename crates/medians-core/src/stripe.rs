//! Vertical striping of wide images.
//!
//! Every column of a stripe needs one two-tier histogram per channel, and a
//! new row touches all of them. When that working set outgrows the cache,
//! every row thrashes to RAM, so the image is cut into vertical stripes whose
//! histogram tables fit a caller-supplied memory budget. Stripes overlap their
//! neighbors by `2r` histogram columns so that output pixels near a seam see
//! real image data; only the outer sides of the first and last stripe fall
//! back to edge replication. The result does not depend on the stripe count.

use crate::column::ColumnHistograms;
use crate::histogram::{Histogram, HistogramOps};
use crate::image::{Plane, PlaneMut};
use crate::window::WindowHistogram;
use bumpalo::Bump;
use std::ops::Range;

/// One vertical stripe of the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stripe {
    /// Image columns that get a column histogram.
    pub columns: Range<usize>,
    /// Image columns whose output this stripe writes.
    pub output: Range<usize>,
}

impl Stripe {
    /// Bytes of histogram memory one channel of this stripe needs.
    pub fn working_set(&self) -> usize {
        self.columns.len() * std::mem::size_of::<Histogram>()
    }
}

/// Number of column histograms that fit the budget, never less than one window.
fn histogram_capacity(memory_budget: usize, radius: usize) -> usize {
    (memory_budget / std::mem::size_of::<Histogram>()).max(2 * radius + 1)
}

/// Split `width` columns into stripes whose histogram tables fit `memory_budget` bytes.
///
/// The stripe count is the smallest one that satisfies the budget and the
/// stripes are as equal in size as possible. The returned output ranges
/// partition `0..width` in order.
///
/// # Panics
/// Panics if `width < 2 * radius + 1`.
pub fn plan_stripes(width: usize, radius: usize, memory_budget: usize) -> Vec<Stripe> {
    let window = 2 * radius + 1;
    assert!(
        width >= window,
        "image width {} is smaller than the {}-pixel filter window",
        width,
        window
    );

    let overlap = 2 * radius;
    let capacity = histogram_capacity(memory_budget, radius);
    let count = (width - overlap).div_ceil(capacity - overlap).max(1);
    let stripe_size = (width + overlap * (count - 1)).div_ceil(count);
    let advance = stripe_size - overlap;

    let mut stripes = Vec::with_capacity(count);
    let mut start = 0;
    loop {
        let next = start + advance;
        let is_last = next >= width || width - next < window;
        let end = if is_last { width } else { start + stripe_size };

        let out_start = if start == 0 { 0 } else { start + radius };
        let out_end = if is_last { width } else { end - radius };
        stripes.push(Stripe {
            columns: start..end,
            output: out_start..out_end,
        });

        if is_last {
            break;
        }
        start = next;
    }
    stripes
}

/// Median-filter one stripe of one channel.
///
/// `dst` receives the stripe's output columns shifted left by `dst_x0`, which
/// lets the caller write either straight into the full destination plane
/// (`dst_x0 == 0`) or into a tile covering only this stripe.
pub fn filter_stripe<O: HistogramOps>(
    arena: &Bump,
    src: &Plane<'_>,
    stripe: &Stripe,
    radius: usize,
    dst: &mut PlaneMut<'_>,
    dst_x0: usize,
) {
    let lo = stripe.columns.start;
    let first = stripe.output.start - lo;
    let last = stripe.output.end - lo;

    let mut columns = ColumnHistograms::new_in(arena, stripe.columns.len());
    columns.seed(src, lo, radius);
    let mut window = WindowHistogram::<O>::new(radius);

    for y in 0..src.height {
        columns.slide_down(src, lo, radius, y);
        window.reset(&columns, first);
        for x in first..last {
            let median = window.median_at(&columns, x);
            dst.set(lo + x - dst_x0, y, median);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HIST: usize = std::mem::size_of::<Histogram>();

    fn check_plan(stripes: &[Stripe], width: usize, radius: usize) {
        assert!(!stripes.is_empty());
        assert_eq!(stripes[0].output.start, 0);
        assert_eq!(stripes[stripes.len() - 1].output.end, width);
        for pair in stripes.windows(2) {
            assert_eq!(pair[0].output.end, pair[1].output.start);
        }
        for s in stripes {
            assert!(s.output.start < s.output.end, "empty stripe {:?}", s);
            assert!(s.columns.len() > 2 * radius);
            assert_eq!(s.columns.start, s.output.start.saturating_sub(radius));
            assert_eq!(s.columns.end, (s.output.end + radius).min(width));
        }
    }

    #[test]
    fn test_large_budget_gives_single_stripe() {
        let stripes = plan_stripes(640, 3, 1 << 30);
        assert_eq!(
            stripes,
            vec![Stripe {
                columns: 0..640,
                output: 0..640
            }]
        );
    }

    #[test]
    fn test_budget_forces_three_stripes() {
        // 30 histograms: ceil((64 - 6) / (30 - 6)) = 3
        let stripes = plan_stripes(64, 3, 30 * HIST);
        assert_eq!(stripes.len(), 3);
        check_plan(&stripes, 64, 3);
        // stripe_size = ceil((64 + 12) / 3) = 26
        assert_eq!(stripes[0].columns, 0..26);
        assert_eq!(stripes[0].output, 0..23);
        assert_eq!(stripes[1].columns, 20..46);
        assert_eq!(stripes[1].output, 23..43);
        assert_eq!(stripes[2].columns, 40..64);
        assert_eq!(stripes[2].output, 43..64);
    }

    #[test]
    fn test_tiny_budget_still_covers_image() {
        let stripes = plan_stripes(20, 2, 0);
        check_plan(&stripes, 20, 2);
        assert!(stripes.iter().all(|s| s.columns.len() >= 5));
    }

    #[test]
    fn test_window_sized_image() {
        let stripes = plan_stripes(7, 3, 0);
        assert_eq!(stripes.len(), 1);
        check_plan(&stripes, 7, 3);
    }

    #[test]
    fn test_working_set_counts_histograms() {
        let stripe = Stripe {
            columns: 10..30,
            output: 12..28,
        };
        assert_eq!(stripe.working_set(), 20 * HIST);
    }

    #[test]
    #[should_panic(expected = "smaller than")]
    fn test_narrow_image_panics() {
        plan_stripes(4, 2, 1 << 20);
    }

    proptest! {
        #[test]
        fn test_plans_partition_the_image(
            radius in 0usize..12,
            extra in 0usize..300,
            budget_hists in 0usize..200,
        ) {
            let width = 2 * radius + 1 + extra;
            let stripes = plan_stripes(width, radius, budget_hists * HIST);
            check_plan(&stripes, width, radius);
        }
    }
}
