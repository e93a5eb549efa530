//! Synthetic images and a brute-force reference median for testing.

use crate::image::ImageView;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Median of the (2r+1)×(2r+1) window around `(x, y)` in one channel.
///
/// Out-of-range coordinates are clamped to the nearest edge pixel. This is
/// O(r² log r) per pixel and only meant as ground truth.
#[must_use]
pub fn reference_median_at(img: &ImageView, x: usize, y: usize, channel: usize, radius: usize) -> u8 {
    let r = radius as isize;
    let max_x = img.width as isize - 1;
    let max_y = img.height as isize - 1;
    let mut window = Vec::with_capacity((2 * radius + 1) * (2 * radius + 1));
    for dy in -r..=r {
        let yy = (y as isize + dy).clamp(0, max_y) as usize;
        for dx in -r..=r {
            let xx = (x as isize + dx).clamp(0, max_x) as usize;
            window.push(img.get_pixel(xx, yy, channel));
        }
    }
    window.sort_unstable();
    window[window.len() / 2]
}

/// Brute-force median filter of every channel, returned tightly packed.
#[must_use]
pub fn reference_median(img: &ImageView, radius: usize) -> Vec<u8> {
    let mut out = vec![0u8; img.width * img.height * img.channels];
    for y in 0..img.height {
        for x in 0..img.width {
            for c in 0..img.channels {
                out[(y * img.width + x) * img.channels + c] = reference_median_at(img, x, y, c, radius);
            }
        }
    }
    out
}

/// `value(row, col) = 7 * row + col`, wrapped to 8 bits.
#[must_use]
pub fn gradient_image(width: usize, height: usize) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| ((7 * y + x) % 256) as u8))
        .collect()
}

/// Monotone horizontal ramp spanning 0..=255 across the width.
#[must_use]
pub fn ramp_image(width: usize, height: usize) -> Vec<u8> {
    let denom = width.saturating_sub(1).max(1);
    let row: Vec<u8> = (0..width).map(|x| (x * 255 / denom) as u8).collect();
    row.repeat(height)
}

/// Constant image with a single pixel set to `value`.
#[must_use]
pub fn spike_image(width: usize, height: usize, x: usize, y: usize, value: u8) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    data[y * width + x] = value;
    data
}

/// Uniform random bytes from a seeded generator.
#[must_use]
pub fn noise_image(width: usize, height: usize, channels: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = vec![0u8; width * height * channels];
    rng.fill_bytes(&mut data);
    data
}

/// Random image with a few flat regions, closer to real footage than pure noise.
///
/// Flat patches keep the median inside one coarse bucket for long runs,
/// which exercises the incremental refresh path of the window histogram.
#[must_use]
pub fn patchy_image(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = vec![0u8; width * height];
    rng.fill_bytes(&mut data);
    for _ in 0..4 {
        let pw = rng.gen_range(1..=width);
        let ph = rng.gen_range(1..=height);
        let px = rng.gen_range(0..=width - pw);
        let py = rng.gen_range(0..=height - ph);
        let value: u8 = rng.gen();
        for y in py..py + ph {
            data[y * width + px..y * width + px + pw].fill(value);
        }
    }
    data
}

/// Copy a tightly packed image into a buffer with `stride` bytes per row.
///
/// Padding bytes are filled with `pad` so tests can check they stay untouched.
#[must_use]
pub fn with_stride(packed: &[u8], row_bytes: usize, height: usize, stride: usize, pad: u8) -> Vec<u8> {
    assert!(stride >= row_bytes, "stride {} below row size {}", stride, row_bytes);
    let mut out = vec![pad; stride * height];
    for y in 0..height {
        out[y * stride..y * stride + row_bytes].copy_from_slice(&packed[y * row_bytes..(y + 1) * row_bytes]);
    }
    out
}

/// Interleave single-channel planes of equal size into one buffer.
#[must_use]
pub fn interleave(planes: &[&[u8]]) -> Vec<u8> {
    let len = planes.first().map_or(0, |p| p.len());
    let mut out = Vec::with_capacity(len * planes.len());
    for i in 0..len {
        for plane in planes {
            out.push(plane[i]);
        }
    }
    out
}
