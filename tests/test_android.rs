// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgeviewer::{
    android::{catch_frame, frame_dimensions, init_logging, LOG_TAG},
    frame::FrameEdgeProcessor,
    Error,
};
use std::{
    error::Error as StdError,
    sync::{Arc, Mutex},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    Layer,
};

/// Records the level of every event it sees.
#[derive(Clone, Default)]
struct Levels(Arc<Mutex<Vec<Level>>>);

impl Levels {
    fn take(&self) -> Vec<Level> {
        self.0.lock().map(|mut v| v.split_off(0)).unwrap_or_default()
    }
}

impl<S: Subscriber> Layer<S> for Levels {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Ok(mut levels) = self.0.lock() {
            levels.push(*event.metadata().level());
        }
    }
}

fn with_levels<T>(f: impl FnOnce() -> T) -> (T, Vec<Level>) {
    let levels = Levels::default();
    let subscriber = tracing_subscriber::registry().with(levels.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, levels.take())
}

#[test]
fn test_frame_dimensions() -> Result<(), Box<dyn StdError>> {
    assert_eq!(frame_dimensions(640, 480)?, (640, 480));
    assert_eq!(frame_dimensions(0, 0)?, (0, 0));

    assert!(matches!(
        frame_dimensions(-4, 2),
        Err(Error::InvalidDimensions {
            width: -4,
            height: 2
        })
    ));
    assert!(matches!(
        frame_dimensions(4, i32::MIN),
        Err(Error::InvalidDimensions { .. })
    ));

    Ok(())
}

#[test]
fn test_catch_frame_success() {
    let (out, levels) = with_levels(|| catch_frame(4, 2, || Ok(Some(32))));
    assert_eq!(out, Some(32));
    assert!(levels.is_empty());
}

#[test]
fn test_catch_frame_unavailable_is_silent() {
    let (out, levels) = with_levels(|| catch_frame::<Vec<u8>>(4, 2, || Ok(None)));
    assert_eq!(out, None);
    assert!(levels.is_empty(), "{:?}", levels);
}

#[test]
fn test_catch_frame_logs_errors() {
    let processor = FrameEdgeProcessor::default();

    // odd dimensions fail in color conversion
    let (out, levels) = with_levels(|| {
        catch_frame(3, 2, || {
            let (w, h) = frame_dimensions(3, 2)?;
            processor.process(&[16u8; 9], w, h).map(Some)
        })
    });
    assert_eq!(out, None);
    assert!(levels.contains(&Level::ERROR));

    let (out, levels) = with_levels(|| {
        catch_frame(-1, 2, || {
            let (w, h) = frame_dimensions(-1, 2)?;
            processor.process(&[], w, h).map(Some)
        })
    });
    assert_eq!(out, None);
    assert_eq!(levels, [Level::ERROR]);
}

#[test]
fn test_catch_frame_panic() {
    let (out, levels) = with_levels(|| {
        catch_frame::<Vec<u8>>(4, 2, || panic!("decoder exploded"))
    });
    assert_eq!(out, None);
    assert_eq!(levels, [Level::ERROR]);
}

#[test]
fn test_init_logging() {
    assert_eq!(LOG_TAG, "native-lib");

    // a second load of the library must not fail
    init_logging();
    init_logging();
    tracing::info!("logging initialised");
}
