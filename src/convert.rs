// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pixel format conversions between semi-planar YUV, RGB, grayscale and
//! RGBA.
//!
//! YUV decoding uses ITU-R BT.601 video range coefficients in 20-bit fixed
//! point and grayscale uses the Rec.601 luma weights in 14-bit fixed point,
//! the same integer arithmetic as OpenCV's `cvtColor`, so results are
//! reproducible across platforms.

use crate::{
    error::{Error, Result},
    image::{FourCC, NV12, NV21},
};
use tracing::instrument;

const ITUR_BT_601_SHIFT: u32 = 20;
const ITUR_BT_601_CY: i32 = 1220542;
const ITUR_BT_601_CUB: i32 = 2116026;
const ITUR_BT_601_CUG: i32 = -409993;
const ITUR_BT_601_CVG: i32 = -852492;
const ITUR_BT_601_CVR: i32 = 1673527;

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

/// Order of the two chroma samples in each interleaved pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChromaOrder {
    /// U (Cb) first, as in NV12
    Uv,
    /// V (Cr) first, as in NV21
    Vu,
}

impl TryFrom<FourCC> for ChromaOrder {
    type Error = Error;

    fn try_from(format: FourCC) -> Result<Self> {
        match format {
            NV12 => Ok(ChromaOrder::Uv),
            NV21 => Ok(ChromaOrder::Vu),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }
}

#[inline]
fn saturate(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Decodes a semi-planar 4:2:0 frame into packed RGB.
///
/// Both dimensions must be even since every chroma pair covers a 2x2 block
/// of luma samples.
///
/// # Errors
///
/// Returns [`Error::Conversion`] for odd dimensions and
/// [`Error::BufferTooShort`] if `src` holds fewer than
/// `width * height * 3 / 2` bytes.
#[instrument(level = "trace", skip(src))]
pub fn yuv420sp_to_rgb(
    src: &[u8],
    width: usize,
    height: usize,
    order: ChromaOrder,
) -> Result<Vec<u8>> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(Error::Conversion(format!(
            "semi-planar frame {}x{} must have non-zero even dimensions",
            width, height
        )));
    }

    let luma_len = width * height;
    let required = luma_len + luma_len / 2;
    if src.len() < required {
        return Err(Error::BufferTooShort {
            len: src.len(),
            required,
        });
    }

    let (luma, chroma) = src[..required].split_at(luma_len);
    let (u_idx, v_idx) = match order {
        ChromaOrder::Uv => (0, 1),
        ChromaOrder::Vu => (1, 0),
    };
    let round = 1 << (ITUR_BT_601_SHIFT - 1);

    let mut rgb = vec![0u8; luma_len * 3];
    for (row, (y_row, rgb_row)) in luma
        .chunks_exact(width)
        .zip(rgb.chunks_exact_mut(width * 3))
        .enumerate()
    {
        let uv_row = &chroma[(row / 2) * width..(row / 2 + 1) * width];
        for ((y_pair, uv), out) in y_row
            .chunks_exact(2)
            .zip(uv_row.chunks_exact(2))
            .zip(rgb_row.chunks_exact_mut(6))
        {
            let u = uv[u_idx] as i32 - 128;
            let v = uv[v_idx] as i32 - 128;

            let ruv = round + ITUR_BT_601_CVR * v;
            let guv = round + ITUR_BT_601_CVG * v + ITUR_BT_601_CUG * u;
            let buv = round + ITUR_BT_601_CUB * u;

            for (&y, px) in y_pair.iter().zip(out.chunks_exact_mut(3)) {
                let y = (y as i32 - 16).max(0) * ITUR_BT_601_CY;
                px[0] = saturate((y + ruv) >> ITUR_BT_601_SHIFT);
                px[1] = saturate((y + guv) >> ITUR_BT_601_SHIFT);
                px[2] = saturate((y + buv) >> ITUR_BT_601_SHIFT);
            }
        }
    }

    Ok(rgb)
}

/// Decodes an NV21 frame into packed RGB.
pub fn nv21_to_rgb(src: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    yuv420sp_to_rgb(src, width, height, ChromaOrder::Vu)
}

/// Decodes an NV21 frame into opaque RGBA, the color preview used when edge
/// rendering is switched off.
pub fn nv21_to_rgba(src: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    nv21_to_rgb(src, width, height).map(|rgb| rgb_to_rgba(&rgb))
}

/// Converts packed RGB to single channel intensity.
#[instrument(level = "trace", skip_all)]
pub fn rgb_to_gray(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| {
            let y = px[0] as u32 * GRAY_R
                + px[1] as u32 * GRAY_G
                + px[2] as u32 * GRAY_B
                + (1 << (GRAY_SHIFT - 1));
            (y >> GRAY_SHIFT) as u8
        })
        .collect()
}

/// Expands packed RGB to RGBA with an opaque alpha channel.
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
        .collect()
}

/// Broadcasts single channel intensity into all four RGBA channels.
///
/// Alpha carries the intensity as well so that dark pixels of an edge map
/// are transparent when composited over the preview surface.
#[instrument(level = "trace", skip_all)]
pub fn gray_to_rgba(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&v| [v; 4]).collect()
}

fn reflect_101(mut i: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Smooths a grayscale image with the 5x5 binomial Gaussian kernel
/// `[1 4 6 4 1] / 16` applied separably, mirroring at the borders without
/// repeating the edge pixel.
#[instrument(level = "trace", skip(gray))]
pub fn gaussian_blur_5x5(gray: &[u8], width: usize, height: usize) -> Vec<u8> {
    const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut horizontal = vec![0u32; width * height];
    for (src, dst) in gray
        .chunks_exact(width)
        .zip(horizontal.chunks_exact_mut(width))
    {
        for (x, out) in dst.iter_mut().enumerate() {
            *out = KERNEL
                .iter()
                .enumerate()
                .map(|(k, w)| w * src[reflect_101(x as isize + k as isize - 2, width)] as u32)
                .sum();
        }
    }

    let mut blurred = vec![0u8; width * height];
    for (y, dst) in blurred.chunks_exact_mut(width).enumerate() {
        for (x, out) in dst.iter_mut().enumerate() {
            let sum: u32 = KERNEL
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let row = reflect_101(y as isize + k as isize - 2, height);
                    w * horizontal[row * width + x]
                })
                .sum();
            *out = ((sum + 128) >> 8) as u8;
        }
    }

    blurred
}
