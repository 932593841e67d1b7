// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Canny edge detection on 8-bit grayscale images.
//!
//! The detector runs in three stages:
//!
//! 1. 3x3 Sobel derivatives with replicated borders, combined into an L1
//!    (`|dx| + |dy|`) or L2 (`sqrt(dx² + dy²)`) gradient magnitude.
//! 2. Non-maximum suppression along the gradient direction quantised to
//!    0°, 45°, 90° and 135° using a fixed-point tan(22.5°) test. Along a
//!    plateau only the first pixel survives (`m > prev && m >= next`).
//!    Magnitudes outside the image are treated as zero.
//! 3. Hysteresis: magnitudes at or above the high threshold are accepted as
//!    edges, magnitudes below the low threshold are rejected, and the pixels
//!    in between are accepted only when 8-connected to an accepted edge.
//!
//! Edge maps hold `255` for edge pixels and `0` everywhere else.

use crate::error::{Error, Result};
use tracing::instrument;

/// Lower hysteresis threshold used by the camera preview.
pub const LOW_THRESHOLD: f32 = 50.0;

/// Upper hysteresis threshold used by the camera preview.
pub const HIGH_THRESHOLD: f32 = 150.0;

/// Value written for edge pixels.
pub const EDGE: u8 = u8::MAX;

// tan(22.5°) in Q15
const TG22: i64 = 13573;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CannyParams {
    /// Gradient magnitude below which pixels are never edges
    pub low_threshold: f32,
    /// Gradient magnitude at or above which pixels are always edges
    pub high_threshold: f32,
    /// Use the Euclidean gradient magnitude instead of `|dx| + |dy|`
    pub l2_gradient: bool,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low_threshold: LOW_THRESHOLD,
            high_threshold: HIGH_THRESHOLD,
            l2_gradient: false,
        }
    }
}

impl CannyParams {
    /// Thresholds as `(low, high)`, swapped if given in the wrong order.
    pub fn thresholds(&self) -> (f32, f32) {
        if self.low_threshold > self.high_threshold {
            (self.high_threshold, self.low_threshold)
        } else {
            (self.low_threshold, self.high_threshold)
        }
    }
}

/// Per-pixel Sobel derivatives and gradient magnitude.
#[derive(Clone, Debug)]
pub struct Gradients {
    width: usize,
    height: usize,
    dx: Vec<i32>,
    dy: Vec<i32>,
    magnitude: Vec<f32>,
}

impl Gradients {
    /// Computes 3x3 Sobel gradients with replicated borders.
    ///
    /// `gray` must hold at least `width * height` bytes.
    #[instrument(level = "trace", skip(gray))]
    pub fn sobel(gray: &[u8], width: usize, height: usize, l2_gradient: bool) -> Self {
        let len = width * height;
        let mut dx = vec![0i32; len];
        let mut dy = vec![0i32; len];
        let mut magnitude = vec![0f32; len];

        for y in 0..height {
            let rows = [y.saturating_sub(1), y, (y + 1).min(height - 1)];
            for x in 0..width {
                let cols = [x.saturating_sub(1), x, (x + 1).min(width - 1)];
                let p = |r: usize, c: usize| gray[rows[r] * width + cols[c]] as i32;

                let gx = (p(0, 2) + 2 * p(1, 2) + p(2, 2)) - (p(0, 0) + 2 * p(1, 0) + p(2, 0));
                let gy = (p(2, 0) + 2 * p(2, 1) + p(2, 2)) - (p(0, 0) + 2 * p(0, 1) + p(0, 2));

                let i = y * width + x;
                dx[i] = gx;
                dy[i] = gy;
                magnitude[i] = if l2_gradient {
                    ((gx * gx + gy * gy) as f32).sqrt()
                } else {
                    (gx.abs() + gy.abs()) as f32
                };
            }
        }

        Self {
            width,
            height,
            dx,
            dy,
            magnitude,
        }
    }

    /// Assembles gradients from precomputed planes, returning `None` if any
    /// plane does not hold exactly `width * height` values.
    pub fn from_parts(
        width: usize,
        height: usize,
        dx: Vec<i32>,
        dy: Vec<i32>,
        magnitude: Vec<f32>,
    ) -> Option<Self> {
        let len = width.checked_mul(height)?;
        if dx.len() != len || dy.len() != len || magnitude.len() != len {
            return None;
        }
        Some(Self {
            width,
            height,
            dx,
            dy,
            magnitude,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dx(&self) -> &[i32] {
        &self.dx
    }

    pub fn dy(&self) -> &[i32] {
        &self.dy
    }

    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    fn magnitude_at(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.magnitude[y as usize * self.width + x as usize]
    }

    /// Whether the pixel survives non-maximum suppression along its
    /// quantised gradient direction.
    pub fn is_local_maximum(&self, x: usize, y: usize) -> bool {
        let i = y * self.width + x;
        let m = self.magnitude[i];
        let dx = self.dx[i];
        let dy = self.dy[i];
        let (x, y) = (x as isize, y as isize);
        let at = |ox: isize, oy: isize| self.magnitude_at(x + ox, y + oy);

        let ax = dx.unsigned_abs() as i64;
        let ay = dy.unsigned_abs() as i64;
        let tg22x = ax * TG22;
        let yq = ay << 15;

        if yq < tg22x {
            m > at(-1, 0) && m >= at(1, 0)
        } else {
            let tg67x = tg22x + (ax << 16);
            if yq > tg67x {
                m > at(0, -1) && m >= at(0, 1)
            } else {
                let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                m > at(-s, -1) && m > at(s, 1)
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Rejected,
    Weak,
    Edge,
}

/// Runs non-maximum suppression and hysteresis over precomputed gradients.
#[instrument(level = "trace", skip_all)]
pub fn trace_edges(grad: &Gradients, params: &CannyParams) -> Vec<u8> {
    let (low, high) = params.thresholds();
    let (width, height) = (grad.width, grad.height);
    let mut marks = vec![Mark::Rejected; width * height];
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let m = grad.magnitude[i];
            if m < low || !grad.is_local_maximum(x, y) {
                continue;
            }
            if m >= high {
                marks[i] = Mark::Edge;
                stack.push(i);
            } else {
                marks[i] = Mark::Weak;
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % width, i / width);
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                let n = ny * width + nx;
                if marks[n] == Mark::Weak {
                    marks[n] = Mark::Edge;
                    stack.push(n);
                }
            }
        }
    }

    marks
        .into_iter()
        .map(|mark| if mark == Mark::Edge { EDGE } else { 0 })
        .collect()
}

/// Detects edges in a grayscale image.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] for empty images and
/// [`Error::BufferTooShort`] if `gray` is smaller than `width * height`.
///
/// # Example
///
/// ```
/// use edgeviewer::edges::{canny, CannyParams};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let flat = vec![128u8; 16 * 16];
/// let edges = canny(&flat, 16, 16, &CannyParams::default())?;
/// assert!(edges.iter().all(|&v| v == 0));
/// # Ok(())
/// # }
/// ```
pub fn canny(gray: &[u8], width: usize, height: usize, params: &CannyParams) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    let required = width * height;
    if gray.len() < required {
        return Err(Error::BufferTooShort {
            len: gray.len(),
            required,
        });
    }

    let grad = Gradients::sobel(gray, width, height, params.l2_gradient);
    Ok(trace_edges(&grad, params))
}
