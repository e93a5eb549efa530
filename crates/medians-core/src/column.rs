//! Per-column histograms of the vertical window.
//!
//! For the current output row `i`, column `x` of the table counts the pixels
//! of rows `i - r ..= i + r` (clamped to the image) in that column. The table
//! lives in a [`Bump`] arena owned by the stripe being processed: coarse
//! counters are indexed by column, fine counters are bucket-major
//! (`fine[k * width + x]`) so that refreshing one coarse bucket of the running
//! window walks a contiguous run of memory.

use crate::histogram::{split, Counters, BUCKETS};
use crate::image::Plane;
use bumpalo::Bump;
use multiversion::multiversion;

/// Column histogram table for one channel of one stripe.
pub struct ColumnHistograms<'a> {
    width: usize,
    coarse: &'a mut [Counters],
    fine: &'a mut [Counters],
}

impl<'a> ColumnHistograms<'a> {
    /// Allocate a zeroed table for `width` columns in `arena`.
    pub fn new_in(arena: &'a Bump, width: usize) -> Self {
        let coarse = arena.alloc_slice_fill_copy(width, [0u16; BUCKETS]);
        let fine = arena.alloc_slice_fill_copy(width * BUCKETS, [0u16; BUCKETS]);
        Self {
            width,
            coarse,
            fine,
        }
    }

    /// Number of columns in the table.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Coarse counters of column `x`.
    #[inline]
    pub fn coarse(&self, x: usize) -> &Counters {
        &self.coarse[x]
    }

    /// Fine counters of column `x` for coarse bucket `k`.
    #[inline]
    pub fn fine(&self, k: usize, x: usize) -> &Counters {
        &self.fine[k * self.width + x]
    }

    /// Seed the table with the window of the row just above the image.
    ///
    /// After seeding, column `x` holds rows `-r - 1 ..= r - 1` (clamped), so a
    /// single [`slide_down`](Self::slide_down) to row 0 yields rows `-r ..= r`.
    pub fn seed(&mut self, plane: &Plane<'_>, x0: usize, radius: usize) {
        let last_row = plane.height - 1;
        let top = plane.row_span(0, x0, self.width);
        // Rows -r-1 ..= -1 all clamp to row 0.
        accumulate_row(
            self.coarse,
            self.fine,
            self.width,
            top,
            plane.step,
            (radius + 1) as u16,
        );
        for y in 0..radius {
            let row = plane.row_span(y.min(last_row), x0, self.width);
            accumulate_row(self.coarse, self.fine, self.width, row, plane.step, 1);
        }
    }

    /// Advance the vertical window to output row `row`.
    ///
    /// Removes row `row - r - 1` and adds row `row + r`, both clamped to the
    /// image, for every column of the table.
    pub fn slide_down(&mut self, plane: &Plane<'_>, x0: usize, radius: usize, row: usize) {
        let last_row = plane.height - 1;
        let leaving = row.saturating_sub(radius + 1);
        let entering = (row + radius).min(last_row);
        slide_row(
            self.coarse,
            self.fine,
            self.width,
            plane.row_span(leaving, x0, self.width),
            plane.row_span(entering, x0, self.width),
            plane.step,
        );
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn accumulate_row(
    coarse: &mut [Counters],
    fine: &mut [Counters],
    width: usize,
    row: &[u8],
    step: usize,
    weight: u16,
) {
    for (x, &v) in row.iter().step_by(step).enumerate() {
        let (k, b) = split(v);
        coarse[x][k] = coarse[x][k].wrapping_add(weight);
        let f = &mut fine[k * width + x][b];
        *f = f.wrapping_add(weight);
    }
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn slide_row(
    coarse: &mut [Counters],
    fine: &mut [Counters],
    width: usize,
    leaving: &[u8],
    entering: &[u8],
    step: usize,
) {
    let pairs = leaving.iter().step_by(step).zip(entering.iter().step_by(step));
    for (x, (&out, &inc)) in pairs.enumerate() {
        if out == inc {
            continue;
        }
        let (ko, bo) = split(out);
        let (ki, bi) = split(inc);
        coarse[x][ko] = coarse[x][ko].wrapping_sub(1);
        coarse[x][ki] = coarse[x][ki].wrapping_add(1);
        let f = &mut fine[ko * width + x][bo];
        *f = f.wrapping_sub(1);
        let f = &mut fine[ki * width + x][bi];
        *f = f.wrapping_add(1);
    }
}
