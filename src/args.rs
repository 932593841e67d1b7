// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgeviewer::{
    edges::{CannyParams, HIGH_THRESHOLD, LOW_THRESHOLD},
    frame::EdgeParams,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use zenoh::config::{Config, WhatAmI};

/// Command-line arguments for the EdgeFirst Edge Viewer.
///
/// Reads raw NV21 frames, renders them as edge previews and saves them as
/// JPEG snapshots and/or publishes them over Zenoh. Arguments can be given
/// on the command line or through environment variables.
///
/// # Example
///
/// ```bash
/// # Save every frame of a 640x480 recording
/// edgeviewer --input preview.nv21 --frame-size "640 480" --output-dir edges/
///
/// # Stream a camera pipe with the slider style thresholds
/// ffmpeg -i clip.mp4 -f rawvideo -pix_fmt nv21 - | edgeviewer -i - --low-threshold 80 --high-threshold 240 --blur --publish
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw NV21 frames concatenated back to back, "-" reads stdin
    #[arg(short, long, env = "INPUT")]
    pub input: PathBuf,

    /// Frame resolution in pixels (width height)
    #[arg(
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub frame_size: Vec<u32>,

    /// Hysteresis threshold below which gradients are never edges
    #[arg(long, env = "LOW_THRESHOLD", default_value_t = LOW_THRESHOLD)]
    pub low_threshold: f32,

    /// Hysteresis threshold at or above which gradients are always edges
    #[arg(long, env = "HIGH_THRESHOLD", default_value_t = HIGH_THRESHOLD)]
    pub high_threshold: f32,

    /// Smooth frames with a 5x5 Gaussian before edge detection
    #[arg(long, env = "BLUR")]
    pub blur: bool,

    /// Use the Euclidean gradient magnitude instead of |dx| + |dy|
    #[arg(long, env = "L2_GRADIENT")]
    pub l2_gradient: bool,

    /// Output the color preview instead of the edge map
    #[arg(long, env = "NO_EDGES")]
    pub no_edges: bool,

    /// Directory where every processed frame is saved as a JPEG snapshot
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(
        long,
        env = "JPEG_QUALITY",
        default_value = "90",
        value_parser = clap::value_parser!(i32).range(1..=100)
    )]
    pub jpeg_quality: i32,

    /// Publish previews as sensor_msgs/CompressedImage over Zenoh
    #[arg(long, env = "PUBLISH")]
    pub publish: bool,

    /// Zenoh topic for JPEG compressed previews
    #[arg(long, default_value = "rt/edgeviewer/jpeg")]
    pub jpeg_topic: String,

    /// Frame ID stamped on published previews
    #[arg(long, default_value = "camera_optical")]
    pub frame_id: String,

    /// Application log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub rust_log: LevelFilter,

    /// Enable Tokio async runtime console for debugging
    #[arg(long, env = "TOKIO_CONSOLE")]
    pub tokio_console: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,

    /// Zenoh participant mode (peer, client, or router)
    #[arg(long, env = "MODE", default_value = "peer")]
    mode: WhatAmI,

    /// Zenoh endpoints to connect to (can specify multiple)
    #[arg(long, env = "CONNECT")]
    connect: Vec<String>,

    /// Zenoh endpoints to listen on (can specify multiple)
    #[arg(long, env = "LISTEN")]
    listen: Vec<String>,

    /// Disable Zenoh multicast peer discovery
    #[arg(long, env = "NO_MULTICAST_SCOUTING")]
    no_multicast_scouting: bool,
}

impl Args {
    pub fn width(&self) -> u32 {
        self.frame_size[0]
    }

    pub fn height(&self) -> u32 {
        self.frame_size[1]
    }

    pub fn edge_params(&self) -> EdgeParams {
        EdgeParams {
            canny: CannyParams {
                low_threshold: self.low_threshold,
                high_threshold: self.high_threshold,
                l2_gradient: self.l2_gradient,
            },
            blur: self.blur,
        }
    }
}

impl TryFrom<&Args> for Config {
    type Error = zenoh::Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut config = Config::default();

        config.insert_json5("mode", &json!(args.mode).to_string())?;

        if !args.connect.is_empty() {
            config.insert_json5("connect/endpoints", &json!(args.connect).to_string())?;
        }

        if !args.listen.is_empty() {
            config.insert_json5("listen/endpoints", &json!(args.listen).to_string())?;
        }

        if args.no_multicast_scouting {
            config.insert_json5("scouting/multicast/enabled", &json!(false).to_string())?;
        }

        config.insert_json5("scouting/multicast/interface", &json!("lo").to_string())?;

        Ok(config)
    }
}
