#![allow(unsafe_code)]
//! Two-tier histograms and the 16-lane counter primitives used to maintain them.
//!
//! A [`Histogram`] splits the 256 intensity levels into 16 coarse buckets of
//! 16 levels each. A pixel value `v` is counted in `coarse[v >> 4]` and in
//! `fine[v >> 4][v & 0xF]`, so `coarse[k]` always equals the sum of `fine[k]`.
//!
//! All window arithmetic reduces to adding, subtracting and scaling 16-wide
//! `u16` vectors. [`HistogramOps`] abstracts those three operations so the
//! filter kernels can be monomorphized over a scalar or a vectorized backend.
//! Counters are 16 bits wide and wrap; callers keep the window population
//! below `u16::MAX`.

/// A 16-wide vector of bucket counters.
pub type Counters = [u16; 16];

/// Number of coarse buckets, also the number of fine buckets per coarse bucket.
pub const BUCKETS: usize = 16;

/// Two-tier intensity histogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct Histogram {
    /// Counts per group of 16 intensity levels.
    pub coarse: Counters,
    /// Exact counts, grouped by coarse bucket.
    pub fine: [Counters; BUCKETS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            coarse: [0; BUCKETS],
            fine: [[0; BUCKETS]; BUCKETS],
        }
    }
}

impl Histogram {
    /// Count one occurrence of `value`.
    #[inline]
    pub fn insert(&mut self, value: u8) {
        let (k, b) = split(value);
        self.coarse[k] = self.coarse[k].wrapping_add(1);
        self.fine[k][b] = self.fine[k][b].wrapping_add(1);
    }

    /// Remove one occurrence of `value`.
    #[inline]
    pub fn remove(&mut self, value: u8) {
        let (k, b) = split(value);
        self.coarse[k] = self.coarse[k].wrapping_sub(1);
        self.fine[k][b] = self.fine[k][b].wrapping_sub(1);
    }

    /// Total number of samples counted.
    pub fn population(&self) -> u32 {
        self.coarse.iter().map(|&c| u32::from(c)).sum()
    }

    /// Whether every coarse bucket equals the sum of its fine buckets.
    pub fn is_consistent(&self) -> bool {
        self.coarse
            .iter()
            .zip(self.fine.iter())
            .all(|(&c, f)| u32::from(c) == f.iter().map(|&v| u32::from(v)).sum::<u32>())
    }

    /// Value of the sample with zero-based rank `rank`, if the histogram holds that many.
    pub fn value_at_rank(&self, rank: u32) -> Option<u8> {
        let mut below = 0u32;
        for (k, &count) in self.coarse.iter().enumerate() {
            let count = u32::from(count);
            if below + count > rank {
                for (b, &fine) in self.fine[k].iter().enumerate() {
                    below += u32::from(fine);
                    if below > rank {
                        return Some((k * BUCKETS + b) as u8);
                    }
                }
                return None;
            }
            below += count;
        }
        None
    }
}

/// Coarse and fine bucket index of an intensity.
#[inline(always)]
pub fn split(value: u8) -> (usize, usize) {
    (usize::from(value >> 4), usize::from(value & 0x0F))
}

/// Strategy for the 16-lane counter arithmetic.
///
/// Implementations must agree bit for bit: every operation is lane-wise
/// wrapping `u16` arithmetic.
pub trait HistogramOps {
    /// Human-readable backend name, reported in filter statistics.
    const NAME: &'static str;

    /// `dst += src`
    fn add(dst: &mut Counters, src: &Counters);

    /// `dst -= src`
    fn sub(dst: &mut Counters, src: &Counters);

    /// `dst += scale * src`
    #[inline]
    fn mul_add(scale: u16, src: &Counters, dst: &mut Counters) {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = d.wrapping_add(scale.wrapping_mul(s));
        }
    }
}

/// Portable fallback, usually auto-vectorized by the compiler.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarOps;

impl HistogramOps for ScalarOps {
    const NAME: &'static str = "scalar";

    #[inline]
    fn add(dst: &mut Counters, src: &Counters) {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = d.wrapping_add(s);
        }
    }

    #[inline]
    fn sub(dst: &mut Counters, src: &Counters) {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = d.wrapping_sub(s);
        }
    }
}

/// SSE2 implementation: two 128-bit lanes per 16-counter vector.
#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct Sse2Ops;

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
impl HistogramOps for Sse2Ops {
    const NAME: &'static str = "sse2";

    #[inline]
    fn add(dst: &mut Counters, src: &Counters) {
        use std::arch::x86_64::{__m128i, _mm_add_epi16, _mm_loadu_si128, _mm_storeu_si128};
        // Safety: SSE2 is enabled at compile time and both arrays hold exactly
        // two unaligned 128-bit loads worth of data.
        unsafe {
            let d = dst.as_mut_ptr().cast::<__m128i>();
            let s = src.as_ptr().cast::<__m128i>();
            _mm_storeu_si128(d, _mm_add_epi16(_mm_loadu_si128(d), _mm_loadu_si128(s)));
            _mm_storeu_si128(
                d.add(1),
                _mm_add_epi16(_mm_loadu_si128(d.add(1)), _mm_loadu_si128(s.add(1))),
            );
        }
    }

    #[inline]
    fn sub(dst: &mut Counters, src: &Counters) {
        use std::arch::x86_64::{__m128i, _mm_loadu_si128, _mm_storeu_si128, _mm_sub_epi16};
        // Safety: see `add`.
        unsafe {
            let d = dst.as_mut_ptr().cast::<__m128i>();
            let s = src.as_ptr().cast::<__m128i>();
            _mm_storeu_si128(d, _mm_sub_epi16(_mm_loadu_si128(d), _mm_loadu_si128(s)));
            _mm_storeu_si128(
                d.add(1),
                _mm_sub_epi16(_mm_loadu_si128(d.add(1)), _mm_loadu_si128(s.add(1))),
            );
        }
    }
}

/// NEON implementation: two 8-lane `u16` registers per vector.
#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct NeonOps;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
impl HistogramOps for NeonOps {
    const NAME: &'static str = "neon";

    #[inline]
    fn add(dst: &mut Counters, src: &Counters) {
        use std::arch::aarch64::{vaddq_u16, vld1q_u16, vst1q_u16};
        // Safety: NEON is enabled at compile time; each pointer covers 16 u16s.
        unsafe {
            let d = dst.as_mut_ptr();
            let s = src.as_ptr();
            vst1q_u16(d, vaddq_u16(vld1q_u16(d), vld1q_u16(s)));
            vst1q_u16(d.add(8), vaddq_u16(vld1q_u16(d.add(8)), vld1q_u16(s.add(8))));
        }
    }

    #[inline]
    fn sub(dst: &mut Counters, src: &Counters) {
        use std::arch::aarch64::{vld1q_u16, vst1q_u16, vsubq_u16};
        // Safety: see `add`.
        unsafe {
            let d = dst.as_mut_ptr();
            let s = src.as_ptr();
            vst1q_u16(d, vsubq_u16(vld1q_u16(d), vld1q_u16(s)));
            vst1q_u16(d.add(8), vsubq_u16(vld1q_u16(d.add(8)), vld1q_u16(s.add(8))));
        }
    }
}

/// Best backend available for the compilation target.
#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
pub type NativeOps = Sse2Ops;

/// Best backend available for the compilation target.
#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub type NativeOps = NeonOps;

/// Best backend available for the compilation target.
#[cfg(not(any(
    all(target_arch = "x86_64", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
)))]
pub type NativeOps = ScalarOps;
