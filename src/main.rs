// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use cdr::{CdrLe, Infinite};
use clap::Parser;
use edgefirst_schemas::{builtin_interfaces::Time, sensor_msgs::CompressedImage, std_msgs};
use edgeviewer::{
    convert::nv21_to_rgba,
    frame::FrameEdgeProcessor,
    image::{encode_jpeg, image_size, Image, NV21, RGBA},
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio::task;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};
use zenoh::{config::Config, pubsub::Publisher};

mod args;

type BoxError = Box<dyn Error + Send + Sync>;

/// A raw NV21 frame read from the input stream.
struct Frame {
    index: u64,
    data: Vec<u8>,
    timestamp: Duration,
}

fn init_tracing(args: &Args) -> Result<(), BoxError> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(args.rust_log);

    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(args.rust_log)),
        Err(_) => None,
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default().with_filter(args.rust_log))
    } else {
        None
    };

    let console = args.tokio_console.then(console_subscriber::spawn);

    let subscriber = Registry::default()
        .with(console)
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(())
}

fn update_fps(prev: &mut Instant, history: &mut [f64], index: &mut usize) -> f64 {
    let now = Instant::now();
    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1.0 / elapsed.as_secs_f64().max(f64::EPSILON);
    *index = (*index + 1) % history.len();

    history.iter().sum::<f64>() / history.len() as f64
}

fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Fills `buf` from `reader`, returning the number of bytes read which is
/// short of `buf.len()` only at end of stream.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reading lives in its own thread so a slow pipe never stalls encoding and
/// publishing of frames already read.
fn spawn_reader(
    input: PathBuf,
    frame_len: usize,
    tx: kanal::Sender<Frame>,
) -> JoinHandle<io::Result<u64>> {
    thread::spawn(move || {
        let source: Box<dyn Read> = if input == Path::new("-") {
            Box::new(io::stdin().lock())
        } else {
            Box::new(File::open(&input)?)
        };
        let mut reader = BufReader::new(source);

        let mut index = 0;
        loop {
            let mut data = vec![0u8; frame_len];
            match read_frame(&mut reader, &mut data)? {
                0 => break,
                n if n < frame_len => {
                    warn!(
                        "discarding trailing partial frame ({} of {} bytes)",
                        n, frame_len
                    );
                    break;
                }
                _ => {}
            }

            let frame = Frame {
                index,
                data,
                timestamp: now(),
            };
            if tx.send(frame).is_err() {
                // processing loop exited
                break;
            }
            index += 1;
        }

        Ok(index)
    })
}

#[instrument(skip_all, fields(index = frame.index))]
fn render(frame: Frame, processor: &FrameEdgeProcessor, args: &Args) -> edgeviewer::Result<Image> {
    let src = Image::from_vec(args.width(), args.height(), NV21, frame.data)?;
    if args.no_edges {
        let rgba = nv21_to_rgba(
            src.as_slice(),
            src.width() as usize,
            src.height() as usize,
        )?;
        Image::from_vec(src.width(), src.height(), RGBA, rgba)
    } else {
        processor.process_image(&src)
    }
}

fn build_jpeg_msg(jpeg: Vec<u8>, ts: Duration, frame_id: &str) -> CompressedImage {
    CompressedImage {
        header: std_msgs::Header {
            stamp: Time {
                sec: ts.as_secs() as i32,
                nanosec: ts.subsec_nanos(),
            },
            frame_id: frame_id.to_string(),
        },
        format: "jpeg".to_string(),
        data: jpeg,
    }
}

/// Renders, compresses and optionally saves one frame. CPU bound and
/// blocking, so it runs off the async runtime.
fn encode_frame(
    frame: Frame,
    processor: &FrameEdgeProcessor,
    args: &Args,
) -> Result<Vec<u8>, BoxError> {
    let index = frame.index;
    let stamp = frame.timestamp;

    let now = Instant::now();
    let preview = render(frame, processor, args)?;
    let render_time = now.elapsed();

    let now = Instant::now();
    let jpeg = encode_jpeg(&preview, args.jpeg_quality)?;
    let encode_time = now.elapsed();

    debug!(
        "frame {} {} jpeg: {}KB render: {:?} encode: {:?}",
        index,
        preview,
        jpeg.len() / 1024,
        render_time,
        encode_time,
    );

    if let Some(dir) = &args.output_dir {
        let path = dir.join(format!("edge_{}_{:06}.jpeg", stamp.as_millis(), index));
        fs::write(&path, &jpeg[..])?;
        debug!("saved {}", path.display());
    }

    Ok(jpeg.to_vec())
}

async fn handle_frame(
    frame: Frame,
    processor: &FrameEdgeProcessor,
    publisher: Option<&Publisher<'_>>,
    args: &Arc<Args>,
) -> Result<(), BoxError> {
    let stamp = frame.timestamp;

    let job_processor = processor.clone();
    let job_args = Arc::clone(args);
    let jpeg = task::spawn_blocking(move || encode_frame(frame, &job_processor, &job_args))
        .await??;

    if let Some(publisher) = publisher {
        let msg = build_jpeg_msg(jpeg, stamp, &args.frame_id);
        let encoded = cdr::serialize::<_, _, CdrLe>(&msg, Infinite)?;
        publisher.put(encoded).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Arc::new(Args::parse());
    init_tracing(&args)?;
    info!("EdgeFirst Edge Viewer {}", env!("CARGO_PKG_VERSION"));

    let frame_len = image_size(args.width(), args.height(), NV21)
        .filter(|&len| len > 0)
        .ok_or("frame size must be non-zero")?;

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    let session = if args.publish {
        Some(zenoh::open(Config::try_from(&*args)?).await?)
    } else {
        None
    };
    let publisher = match &session {
        Some(session) => Some(session.declare_publisher(args.jpeg_topic.clone()).await?),
        None => None,
    };

    let processor = FrameEdgeProcessor::new(args.edge_params());
    info!(
        "processing {}x{} frames from {} with {:?}",
        args.width(),
        args.height(),
        args.input.display(),
        processor.params()
    );

    let (tx, rx) = kanal::bounded(4);
    let reader = spawn_reader(args.input.clone(), frame_len, tx);
    let rx = rx.to_async();

    let started = Instant::now();
    let mut prev = Instant::now();
    let mut history = vec![0.0; 30];
    let mut history_index = 0;
    let mut processed = 0u64;
    let mut failed = 0u64;

    while let Ok(frame) = rx.recv().await {
        let index = frame.index;
        match handle_frame(frame, &processor, publisher.as_ref(), &args).await {
            Ok(()) => processed += 1,
            Err(e) => {
                error!("frame {}: {}", index, e);
                failed += 1;
            }
        }
        let fps = update_fps(&mut prev, &mut history, &mut history_index);
        debug!("fps: {:.1}", fps);
    }

    let read = match reader.join() {
        Ok(result) => result?,
        Err(_) => return Err("frame reader panicked".into()),
    };

    info!(
        "read {} frames, processed {}, failed {} in {:?}",
        read,
        processed,
        failed,
        started.elapsed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn test_handle_frame_saves_snapshot() -> Result<(), BoxError> {
        let dir = std::env::temp_dir().join(format!("edgeviewer-{}", std::process::id()));
        fs::create_dir_all(&dir)?;

        let args = Arc::new(Args::try_parse_from([
            "edgeviewer",
            "--input",
            "-",
            "--frame-size",
            "4",
            "2",
            "--output-dir",
            dir.to_str().ok_or("temp dir is not utf-8")?,
        ])?);
        let frame = Frame {
            index: 3,
            data: vec![40, 40, 200, 200, 40, 40, 200, 200, 128, 128, 128, 128],
            timestamp: Duration::from_millis(1500),
        };

        handle_frame(frame, &FrameEdgeProcessor::default(), None, &args).await?;

        let jpeg = fs::read(dir.join("edge_1500_000003.jpeg"))?;
        fs::remove_dir_all(&dir)?;
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        Ok(())
    }
}
