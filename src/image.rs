// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use core::fmt;
use tracing::debug;
use turbojpeg::OwnedBuf;

/// Four character code identifying a pixel format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0 {
            write!(f, "{}", c as char)?;
        }
        Ok(())
    }
}

/// RGB 24-bit pixel format (8 bits per channel, no alpha)
pub const RGB3: FourCC = FourCC(*b"RGB3");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// 8-bit single channel intensity
pub const GREY: FourCC = FourCC(*b"GREY");

/// NV12 4:2:0 YUV semi-planar format, chroma interleaved as U then V
pub const NV12: FourCC = FourCC(*b"NV12");

/// NV21 4:2:0 YUV semi-planar format, chroma interleaved as V then U.
/// This is the default preview format of Android cameras.
pub const NV21: FourCC = FourCC(*b"NV21");

/// Row stride of the first plane in bytes, `None` for unknown formats.
pub const fn format_row_stride(format: FourCC, width: u32) -> Option<usize> {
    let width = width as usize;
    match format {
        RGB3 => Some(3 * width),
        RGBA => Some(4 * width),
        GREY | NV12 | NV21 => Some(width),
        _ => None,
    }
}

/// Total buffer size in bytes for an image of the given format.
///
/// Semi-planar formats carry a luma plane of `width * height` bytes followed
/// by a half-height interleaved chroma plane, `width * height * 3 / 2` bytes
/// in total.
pub const fn image_size(width: u32, height: u32, format: FourCC) -> Option<usize> {
    let pixels = width as usize * height as usize;
    match format {
        NV12 | NV21 => Some(pixels * 3 / 2),
        _ => match format_row_stride(format, width) {
            Some(stride) => Some(stride * height as usize),
            None => None,
        },
    }
}

/// Heap backed image buffer tagged with its pixel format.
///
/// # Example
///
/// ```
/// use edgeviewer::image::{Image, NV21};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(640, 480, NV21)?;
/// assert_eq!(img.size(), 460800);
/// assert_eq!(img.format(), NV21);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: FourCC,
    data: Vec<u8>,
}

impl Image {
    /// Allocates a zero filled image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format has no known
    /// layout.
    pub fn new(width: u32, height: u32, format: FourCC) -> Result<Self> {
        let size = image_size(width, height, format).ok_or(Error::UnsupportedFormat(format))?;
        debug!("allocated {}x{} {} image ({} bytes)", width, height, format, size);
        Ok(Self {
            width,
            height,
            format,
            data: vec![0; size],
        })
    }

    /// Wraps an existing buffer. Bytes past the end of the image are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooShort`] when `data` cannot hold the image
    /// and [`Error::UnsupportedFormat`] for unknown formats.
    pub fn from_vec(width: u32, height: u32, format: FourCC, mut data: Vec<u8>) -> Result<Self> {
        let size = image_size(width, height, format).ok_or(Error::UnsupportedFormat(format))?;
        if data.len() < size {
            return Err(Error::BufferTooShort {
                len: data.len(),
                required: size,
            });
        }
        data.truncate(size);
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} size:{}",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}

/// Encodes an image to JPEG using turbojpeg.
///
/// RGBA and RGB3 images are compressed with 4:2:0 chroma subsampling, GREY
/// images as single channel JPEG.
///
/// # Errors
///
/// Returns an error if the image format cannot be encoded or if turbojpeg
/// fails to compress the pixels.
///
/// # Example
///
/// ```no_run
/// use edgeviewer::image::{encode_jpeg, Image, RGBA};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(640, 480, RGBA)?;
/// let jpeg = encode_jpeg(&img, 90)?;
/// println!("Compressed to {} bytes", jpeg.len());
/// # Ok(())
/// # }
/// ```
pub fn encode_jpeg(img: &Image, quality: i32) -> Result<OwnedBuf> {
    let (format, subsamp, channels) = match img.format() {
        RGBA => (turbojpeg::PixelFormat::RGBA, turbojpeg::Subsamp::Sub2x2, 4),
        RGB3 => (turbojpeg::PixelFormat::RGB, turbojpeg::Subsamp::Sub2x2, 3),
        GREY => (turbojpeg::PixelFormat::GRAY, turbojpeg::Subsamp::Gray, 1),
        other => return Err(Error::UnsupportedFormat(other)),
    };

    let image = turbojpeg::Image {
        width: img.width() as usize,
        height: img.height() as usize,
        format,
        pixels: img.as_slice(),
        pitch: img.width() as usize * channels,
    };

    Ok(turbojpeg::compress(image, quality, subsamp)?)
}
