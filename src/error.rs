// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::FourCC;
use thiserror::Error;

/// Errors raised while converting or encoding a camera frame.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("frame buffer too short: {len} bytes, {required} required")]
    BufferTooShort { len: usize, required: usize },

    #[error("color conversion failed: {0}")]
    Conversion(String),

    #[error("unexpected pixel format: expected {expected} found {found}")]
    Format { expected: FourCC, found: FourCC },

    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(FourCC),

    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] turbojpeg::Error),

    #[error("jni call failed: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
