// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst Edge Viewer Library
//!
//! This library turns camera preview frames into edge maps ready for
//! display. It is loaded by the Android viewer application through JNI and
//! is also used by the `edgeviewer` command line tool to process recorded
//! frames on the host.
//!
//! ## Features
//!
//! - **Color Conversion**: NV21/NV12 semi-planar YUV to RGB, grayscale and
//!   RGBA using reproducible BT.601 fixed-point arithmetic.
//! - **Edge Detection**: Canny edge detection with Sobel gradients,
//!   non-maximum suppression and 8-connected hysteresis thresholding.
//! - **Frame Processing**: A stateless processor with validated inputs and
//!   scoped acquisition of borrowed frame buffers.
//! - **JPEG Encoding**: Snapshot compression using turbojpeg with SIMD.
//! - **JNI Bindings**: Entry points for `com.example.edgeviewer`.
//!
//! ## Example
//!
//! ```
//! use edgeviewer::frame::FrameEdgeProcessor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (640, 480);
//! let nv21 = vec![16u8; width * height * 3 / 2];
//!
//! let processor = FrameEdgeProcessor::default();
//! let rgba = processor.process(&nv21, width, height)?;
//! assert_eq!(rgba.len(), width * height * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! Unsafe code is limited to pinning Java byte arrays in the [`android`]
//! module, which exposes them through the safe [`frame::FrameSource`]
//! trait.

pub mod android;
pub mod convert;
pub mod edges;
pub mod error;
pub mod frame;
pub mod image;

pub use error::{Error, Result};
