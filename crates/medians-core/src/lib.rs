//! Constant-time median filtering of 8-bit images.
//!
//! For every pixel, the filter outputs the median of the (2r+1)×(2r+1)
//! neighborhood around it. The cost per pixel does not depend on r: the
//! implementation follows Perreault and Hébert, "Median Filtering in Constant
//! Time" (IEEE TIP, 2007).
//!
//! # Architecture Overview
//!
//! 1. **Histogram primitives** ([`histogram`]): a two-tier 16×16 histogram and
//!    16-lane add/sub/scaled-add behind the [`histogram::HistogramOps`]
//!    strategy, with SSE2 and NEON backends.
//! 2. **Column histograms** ([`column`]): one histogram per image column
//!    covering the vertical window, updated once per row in O(width).
//! 3. **Window histogram** ([`window`]): the sum of 2r+1 column histograms,
//!    slid once per column; fine buckets are refreshed lazily, only for the
//!    bucket that holds the median.
//! 4. **Striping** ([`stripe`]): wide images are cut into overlapping vertical
//!    stripes so the column histograms of a stripe fit a memory budget.
//!
//! Pixels outside the image are replaced by the nearest edge pixel on both
//! axes. Interleaved channels are filtered as independent planes.
//!
//! # Example
//!
//! ```
//! use medians_core::{MedianConfig, MedianFilter};
//! use medians_core::image::{ImageView, ImageViewMut};
//!
//! let src = vec![0u8, 0, 0, 0, 255, 0, 0, 0, 0];
//! let mut dst = vec![0u8; 9];
//! let input = ImageView::new(&src, 3, 3, 3).unwrap();
//! let mut output = ImageViewMut::new(&mut dst, 3, 3, 3).unwrap();
//!
//! let mut filter = MedianFilter::with_config(MedianConfig::with_radius(1));
//! filter.apply(&input, &mut output);
//! assert_eq!(dst, vec![0u8; 9]);
//! ```

/// Column histograms of the vertical window.
pub mod column;
/// Filter configuration.
pub mod config;
/// Image geometry errors.
pub mod error;
/// Two-tier histograms and counter arithmetic backends.
pub mod histogram;
/// Image buffer abstractions.
pub mod image;
/// Stripe planning and the per-stripe kernel.
pub mod stripe;
/// Utilities for testing and synthetic data generation.
pub mod test_utils;
/// Running window histogram and median extraction.
pub mod window;

pub use crate::config::{Backend, MedianConfig};
pub use crate::error::ImageError;
pub use crate::image::{ImageView, ImageViewMut};

use crate::config::MAX_RADIUS;
use crate::histogram::{HistogramOps, NativeOps, ScalarOps};
use crate::image::PlaneMut;
use crate::stripe::{filter_stripe, plan_stripes, Stripe};
use bumpalo::Bump;
use rayon::prelude::*;
use std::ops::Range;

/// Statistics for a single filter call.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterStats {
    /// Number of vertical stripes per channel.
    pub stripes: usize,
    /// Number of channels filtered.
    pub channels: usize,
    /// Name of the histogram arithmetic backend.
    pub backend: &'static str,
    /// Wall time in milliseconds.
    pub total_ms: f64,
}

/// Reusable median filter.
///
/// The filter owns the arena the per-stripe histogram tables are carved
/// from, so repeated calls on same-sized frames do not allocate.
pub struct MedianFilter {
    arena: Bump,
    config: MedianConfig,
    scratch: Vec<u8>,
}

impl MedianFilter {
    /// Create a filter with the default configuration (3×3 window).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MedianConfig::default())
    }

    /// Create a filter with a custom configuration.
    #[must_use]
    pub fn with_config(config: MedianConfig) -> Self {
        Self {
            arena: Bump::new(),
            config,
            scratch: Vec::new(),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> MedianConfig {
        self.config
    }

    /// Replace the configuration for subsequent calls.
    pub fn set_config(&mut self, config: MedianConfig) {
        self.config = config;
    }

    /// Filter every channel of `src` into `dst`.
    ///
    /// # Panics
    /// Panics if the views differ in geometry, if the image is smaller than
    /// the window in either dimension, or if the radius exceeds
    /// [`MAX_RADIUS`](config::MAX_RADIUS).
    pub fn apply(&mut self, src: &ImageView, dst: &mut ImageViewMut) {
        self.apply_with_stats(src, dst);
    }

    /// Filter every channel of `src` into `dst` and report statistics.
    ///
    /// # Panics
    /// See [`apply`](Self::apply).
    pub fn apply_with_stats(&mut self, src: &ImageView, dst: &mut ImageViewMut) -> FilterStats {
        self.run(src, dst, 0..src.channels)
    }

    /// Filter a single channel; all other destination bytes are left untouched.
    ///
    /// This is how an RGBA caller filters color while passing alpha through.
    ///
    /// # Panics
    /// See [`apply`](Self::apply). Also panics if `channel` is out of range.
    pub fn apply_channel(
        &mut self,
        src: &ImageView,
        dst: &mut ImageViewMut,
        channel: usize,
    ) -> FilterStats {
        assert!(
            channel < src.channels,
            "channel {} out of range for {}-channel image",
            channel,
            src.channels
        );
        self.run(src, dst, channel..channel + 1)
    }

    /// Filter every channel of `img` in place.
    ///
    /// The source is first copied into a buffer owned by the filter, since the
    /// vertical window keeps reading rows that have already been written.
    ///
    /// # Panics
    /// See [`apply`](Self::apply).
    pub fn apply_in_place(&mut self, img: &mut ImageViewMut) -> FilterStats {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend_from_slice(img.data);
        let src = ImageView {
            data: &scratch,
            width: img.width,
            height: img.height,
            stride: img.stride,
            channels: img.channels,
        };
        let stats = self.run(&src, img, 0..img.channels);
        self.scratch = scratch;
        stats
    }

    fn run(&mut self, src: &ImageView, dst: &mut ImageViewMut, channels: Range<usize>) -> FilterStats {
        let radius = self.config.radius;
        check_preconditions(src, dst, radius);

        let _span = tracing::info_span!(
            "median_filter",
            width = src.width,
            height = src.height,
            radius,
        )
        .entered();
        let start = std::time::Instant::now();

        let stripes = plan_stripes(src.width, radius, self.config.memory_budget);
        tracing::debug!(
            stripes = stripes.len(),
            budget = self.config.memory_budget,
            parallel = self.config.parallel,
            "planned stripes"
        );

        let backend = match self.config.backend {
            config::Backend::Auto => {
                self.dispatch::<NativeOps>(src, dst, channels.clone(), &stripes);
                NativeOps::NAME
            }
            config::Backend::Scalar => {
                self.dispatch::<ScalarOps>(src, dst, channels.clone(), &stripes);
                ScalarOps::NAME
            }
        };

        FilterStats {
            stripes: stripes.len(),
            channels: channels.len(),
            backend,
            total_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn dispatch<O: HistogramOps>(
        &mut self,
        src: &ImageView,
        dst: &mut ImageViewMut,
        channels: Range<usize>,
        stripes: &[Stripe],
    ) {
        let radius = self.config.radius;
        if self.config.parallel && channels.len() * stripes.len() > 1 {
            filter_parallel::<O>(src, dst, channels, stripes, radius);
            return;
        }

        for channel in channels {
            let plane = src.plane(channel);
            let mut out = dst.plane_mut(channel);
            for (index, stripe) in stripes.iter().enumerate() {
                tracing::trace!(channel, index, columns = ?stripe.columns, "stripe");
                self.arena.reset();
                filter_stripe::<O>(&self.arena, &plane, stripe, radius, &mut out, 0);
            }
        }
    }
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every (channel, stripe) pair on the rayon pool, then stitch the tiles.
fn filter_parallel<O: HistogramOps>(
    src: &ImageView,
    dst: &mut ImageViewMut,
    channels: Range<usize>,
    stripes: &[Stripe],
    radius: usize,
) {
    let height = src.height;
    let jobs: Vec<(usize, &Stripe)> = channels
        .flat_map(|c| stripes.iter().map(move |s| (c, s)))
        .collect();

    let tiles: Vec<(usize, &Stripe, Vec<u8>)> = jobs
        .into_par_iter()
        .map(|(channel, stripe)| {
            let arena = Bump::with_capacity(stripe.working_set());
            let plane = src.plane(channel);
            let width = stripe.output.len();
            let mut tile = vec![0u8; width * height];
            let mut out = PlaneMut::packed(&mut tile, width, height);
            filter_stripe::<O>(&arena, &plane, stripe, radius, &mut out, stripe.output.start);
            (channel, stripe, tile)
        })
        .collect();

    for (channel, stripe, tile) in tiles {
        let mut out = dst.plane_mut(channel);
        let width = stripe.output.len();
        for (y, row) in tile.chunks_exact(width).enumerate() {
            for (dx, &value) in row.iter().enumerate() {
                out.set(stripe.output.start + dx, y, value);
            }
        }
    }
}

fn check_preconditions(src: &ImageView, dst: &ImageViewMut, radius: usize) {
    if let Err(err) = src.ensure_same_geometry(dst) {
        panic!("{err}");
    }
    assert!(
        radius <= MAX_RADIUS,
        "radius {} exceeds the maximum of {}",
        radius,
        MAX_RADIUS
    );
    let window = 2 * radius + 1;
    assert!(
        src.width >= window && src.height >= window,
        "{}x{} image is smaller than the {}x{} filter window",
        src.width,
        src.height,
        window,
        window
    );
}

/// Median-filter every channel of `src` into `dst` with a one-off filter.
///
/// `memory_budget` is the number of bytes of histograms a stripe may use;
/// it only changes speed, never the result.
///
/// # Panics
/// See [`MedianFilter::apply`].
pub fn median_filter(src: &ImageView, dst: &mut ImageViewMut, radius: usize, memory_budget: usize) {
    let config = MedianConfig::builder()
        .radius(radius)
        .memory_budget(memory_budget)
        .build();
    MedianFilter::with_config(config).apply(src, dst);
}
