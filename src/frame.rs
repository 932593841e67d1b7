// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! NV21 camera frame to RGBA edge preview.

use crate::{
    convert::{gaussian_blur_5x5, gray_to_rgba, nv21_to_rgb, rgb_to_gray},
    edges::{canny, CannyParams},
    error::{Error, Result},
    image::{Image, NV21, RGBA},
};
use std::ops::Deref;
use tracing::{error, instrument, trace};

/// A borrowed frame buffer that must be acquired before it can be read.
///
/// The returned guard keeps the buffer acquired and releases it when
/// dropped, so every successful [`FrameSource::acquire`] is paired with
/// exactly one release regardless of how processing exits.
pub trait FrameSource {
    type Guard<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    /// Acquires read access to the frame, `None` if it is unavailable.
    fn acquire(&mut self) -> Option<Self::Guard<'_>>;
}

impl FrameSource for &[u8] {
    type Guard<'a> = &'a [u8] where Self: 'a;

    fn acquire(&mut self) -> Option<Self::Guard<'_>> {
        Some(*self)
    }
}

impl FrameSource for Vec<u8> {
    type Guard<'a> = &'a [u8] where Self: 'a;

    fn acquire(&mut self) -> Option<Self::Guard<'_>> {
        Some(self.as_slice())
    }
}

/// Edge rendering parameters.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct EdgeParams {
    pub canny: CannyParams,
    /// Smooth the intensity image with a 5x5 Gaussian before detection
    pub blur: bool,
}

impl EdgeParams {
    /// Parameters driven by a single threshold, as the preview slider does:
    /// the low threshold is clamped to at least 10, the high threshold is
    /// three times the low one and the image is smoothed first.
    pub fn from_threshold(threshold: f64) -> Self {
        let low = threshold.max(10.0) as f32;
        Self {
            canny: CannyParams {
                low_threshold: low,
                high_threshold: low * 3.0,
                l2_gradient: false,
            },
            blur: true,
        }
    }
}

/// Converts NV21 camera frames into 4 channel edge maps for display.
///
/// The processor holds no per-frame state; a single instance can be shared
/// between threads and every call is independent.
///
/// # Example
///
/// ```
/// use edgeviewer::frame::FrameEdgeProcessor;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (width, height) = (320, 240);
/// let frame = vec![128u8; width * height * 3 / 2];
///
/// let processor = FrameEdgeProcessor::default();
/// let rgba = processor.process(&frame, width, height)?;
/// assert_eq!(rgba.len(), width * height * 4);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameEdgeProcessor {
    params: EdgeParams,
}

impl FrameEdgeProcessor {
    pub fn new(params: EdgeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EdgeParams {
        &self.params
    }

    /// Converts one NV21 frame into an RGBA edge map of exactly
    /// `width * height * 4` bytes.
    ///
    /// Every output pixel is either `[255; 4]` (edge) or `[0; 4]`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] if either dimension is zero or the
    ///   pixel count overflows.
    /// - [`Error::BufferTooShort`] if `frame` holds fewer than
    ///   `width * height * 3 / 2` bytes.
    /// - [`Error::Conversion`] if the frame cannot be decoded, in which case
    ///   nothing further is computed.
    #[instrument(skip(self, frame), fields(len = frame.len()))]
    pub fn process(&self, frame: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
        let pixels = width
            .checked_mul(height)
            .filter(|&pixels| pixels > 0 && pixels.checked_mul(4).is_some())
            .ok_or(Error::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            })?;

        let required = pixels + pixels / 2;
        if frame.len() < required {
            return Err(Error::BufferTooShort {
                len: frame.len(),
                required,
            });
        }

        let rgb = nv21_to_rgb(frame, width, height).inspect_err(|e| {
            error!("nv21 conversion error: {}", e);
        })?;

        let mut gray = rgb_to_gray(&rgb);
        if self.params.blur {
            gray = gaussian_blur_5x5(&gray, width, height);
        }

        let edges = canny(&gray, width, height, &self.params.canny)?;
        let rgba = gray_to_rgba(&edges);
        trace!("processed {}x{} frame into {} bytes", width, height, rgba.len());

        Ok(rgba)
    }

    /// Acquires a frame from `source`, processes it and releases it.
    ///
    /// Returns `Ok(None)` without doing any work when the frame cannot be
    /// acquired. Once acquired the frame is released before returning on
    /// every path, including errors.
    pub fn process_source<S: FrameSource>(
        &self,
        source: &mut S,
        width: usize,
        height: usize,
    ) -> Result<Option<Vec<u8>>> {
        let Some(frame) = source.acquire() else {
            return Ok(None);
        };
        let rgba = self.process(&frame, width, height);
        drop(frame);
        rgba.map(Some)
    }

    /// Processes an NV21 [`Image`] into an RGBA [`Image`] of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `image` is not NV21, otherwise the
    /// errors of [`FrameEdgeProcessor::process`].
    pub fn process_image(&self, image: &Image) -> Result<Image> {
        if image.format() != NV21 {
            return Err(Error::Format {
                expected: NV21,
                found: image.format(),
            });
        }
        let rgba = self.process(
            image.as_slice(),
            image.width() as usize,
            image.height() as usize,
        )?;
        Image::from_vec(image.width(), image.height(), RGBA, rgba)
    }
}
