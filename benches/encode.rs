// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use criterion::{criterion_group, criterion_main, Criterion};
use edgeviewer::{
    frame::FrameEdgeProcessor,
    image,
    image::{encode_jpeg, Image},
};

/// An edge preview of a frame with a bright square in the middle.
fn preview(width: u32, height: u32) -> Image {
    let (w, h) = (width as usize, height as usize);
    let mut nv21 = vec![128u8; w * h * 3 / 2];
    for (i, y) in nv21[..w * h].iter_mut().enumerate() {
        let (x, row) = (i % w, i / w);
        *y = if (w / 4..3 * w / 4).contains(&x) && (h / 4..3 * h / 4).contains(&row) {
            200
        } else {
            40
        };
    }
    let src = Image::from_vec(width, height, image::NV21, nv21).unwrap();
    FrameEdgeProcessor::default().process_image(&src).unwrap()
}

pub fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("jpeg");
    for dim in [
        (320, 240),
        (640, 480),
        (960, 540),
        (1280, 720),
        (1920, 1080),
        (3840, 2160),
    ]
    .iter()
    {
        let img = preview(dim.0, dim.1);
        group.bench_with_input(format!("{}x{}", dim.0, dim.1), &img, |b, img| {
            b.iter(|| encode_jpeg(img, 90).unwrap())
        });
    }
}

criterion_group!(benches, benchmark_encode);
criterion_main!(benches);
