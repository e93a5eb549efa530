#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use divan::bench;
use medians_core::image::{ImageView, ImageViewMut};
use medians_core::test_utils::noise_image;
use medians_core::{Backend, MedianConfig, MedianFilter};

fn main() {
    divan::main();
}

const WIDTH: usize = 1920;
const HEIGHT: usize = 1080;

/// Per-pixel cost should stay flat as the radius grows.
#[bench(args = [1, 3, 7, 15, 31, 63])]
fn bench_radius_1080p(bencher: divan::Bencher, radius: usize) {
    let data = noise_image(WIDTH, HEIGHT, 1, 42);
    let src = ImageView::new(&data, WIDTH, HEIGHT, WIDTH).unwrap();
    let mut output = vec![0u8; WIDTH * HEIGHT];
    let mut filter = MedianFilter::with_config(MedianConfig::with_radius(radius));

    bencher.bench_local(move || {
        let mut dst = ImageViewMut::new(&mut output, WIDTH, HEIGHT, WIDTH).unwrap();
        filter.apply(&src, &mut dst);
    });
}

#[bench(args = ["auto", "scalar"])]
fn bench_backend_1080p(bencher: divan::Bencher, name: &str) {
    let backend = if name == "scalar" { Backend::Scalar } else { Backend::Auto };
    let data = noise_image(WIDTH, HEIGHT, 1, 42);
    let src = ImageView::new(&data, WIDTH, HEIGHT, WIDTH).unwrap();
    let mut output = vec![0u8; WIDTH * HEIGHT];
    let config = MedianConfig::builder().radius(15).backend(backend).build();
    let mut filter = MedianFilter::with_config(config);

    bencher.bench_local(move || {
        let mut dst = ImageViewMut::new(&mut output, WIDTH, HEIGHT, WIDTH).unwrap();
        filter.apply(&src, &mut dst);
    });
}

#[bench]
fn bench_rgb_in_place_720p(bencher: divan::Bencher) {
    let (w, h) = (1280, 720);
    let mut data = noise_image(w, h, 3, 7);
    let mut filter = MedianFilter::with_config(MedianConfig::with_radius(5));

    bencher.bench_local(move || {
        let mut img = ImageViewMut::with_channels(&mut data, w, h, w * 3, 3).unwrap();
        filter.apply_in_place(&mut img);
    });
}
