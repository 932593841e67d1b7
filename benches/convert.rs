// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use criterion::{criterion_group, criterion_main, Criterion};
use edgeviewer::{
    convert::{gaussian_blur_5x5, gray_to_rgba, nv21_to_rgb, rgb_to_gray},
    edges::{canny, CannyParams},
    frame::{EdgeParams, FrameEdgeProcessor},
};
use std::hint::black_box;

const DIMS: [(usize, usize); 5] = [
    (320, 240),
    (640, 480),
    (960, 540),
    (1920, 1080),
    (3840, 2160),
];

/// Pseudo-random NV21 frame so that edge tracing has work to do.
fn frame(width: usize, height: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..width * height * 3 / 2)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

pub fn benchmark_stages(c: &mut Criterion) {
    for (width, height) in DIMS.iter().copied() {
        let mut group = c.benchmark_group(format!("stages/{}x{}", width, height));
        let nv21 = frame(width, height);
        let rgb = nv21_to_rgb(&nv21, width, height).unwrap();
        let gray = rgb_to_gray(&rgb);
        let edges = canny(&gray, width, height, &CannyParams::default()).unwrap();

        group.bench_function("nv21_to_rgb", |b| {
            b.iter(|| nv21_to_rgb(black_box(&nv21), width, height))
        });
        group.bench_function("rgb_to_gray", |b| b.iter(|| rgb_to_gray(black_box(&rgb))));
        group.bench_function("gaussian_blur_5x5", |b| {
            b.iter(|| gaussian_blur_5x5(black_box(&gray), width, height))
        });
        group.bench_function("canny", |b| {
            b.iter(|| canny(black_box(&gray), width, height, &CannyParams::default()))
        });
        group.bench_function("gray_to_rgba", |b| {
            b.iter(|| gray_to_rgba(black_box(&edges)))
        });
        group.finish();
    }
}

pub fn benchmark_process(c: &mut Criterion) {
    let processors = [
        ("default", FrameEdgeProcessor::default()),
        ("slider", FrameEdgeProcessor::new(EdgeParams::from_threshold(50.0))),
    ];

    for (name, processor) in processors.iter() {
        let mut group = c.benchmark_group(format!("process/{}", name));
        for (width, height) in DIMS.iter().copied() {
            let nv21 = frame(width, height);
            group.bench_with_input(format!("{}x{}", width, height), &nv21, |b, nv21| {
                b.iter(|| processor.process(black_box(nv21), width, height))
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benchmark_stages, benchmark_process);
criterion_main!(benches);
