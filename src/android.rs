// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! JNI entry points loaded by the Android viewer application.
//!
//! Symbol names follow the JNI mangling of
//! `com.example.edgeviewer.CameraPreview` and
//! `com.example.edgeviewer.MainActivity`. No Rust error or panic crosses
//! the boundary: failures are logged and reported to Java as `null`.

use crate::{
    error::{Error, Result},
    frame::{EdgeParams, FrameEdgeProcessor, FrameSource},
};
use jni::{
    objects::{AutoElements, JByteArray, JObject, ReleaseMode},
    sys::{jbyte, jbyteArray, jdouble, jint, jstring, JavaVM, JNI_VERSION_1_6},
    JNIEnv,
};
use std::{
    ffi::c_void,
    ops::Deref,
    panic::{self, AssertUnwindSafe},
    ptr::null_mut,
    slice::from_raw_parts,
};
use tracing::{error, level_filters::LevelFilter};

/// A Java `byte[]` pinned for reading.
///
/// The elements are released with `JNI_ABORT` semantics when dropped, the
/// frame is never written back to the Java heap.
pub struct JavaBytes<'local, 'array> {
    elements: AutoElements<'local, 'local, 'array, jbyte>,
}

impl Deref for JavaBytes<'_, '_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let bytes: &[jbyte] = &self.elements;
        // SAFETY: jbyte and u8 share size and alignment and the elements stay
        // pinned for the lifetime of self.
        unsafe { from_raw_parts(bytes.as_ptr().cast::<u8>(), bytes.len()) }
    }
}

/// Frame source backed by a Java `byte[]`.
pub struct JavaFrame<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    array: &'a JByteArray<'local>,
}

impl<'a, 'local> JavaFrame<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>, array: &'a JByteArray<'local>) -> Self {
        Self { env, array }
    }
}

impl<'a, 'local> FrameSource for JavaFrame<'a, 'local> {
    type Guard<'g> = JavaBytes<'local, 'a> where Self: 'g;

    fn acquire(&mut self) -> Option<Self::Guard<'_>> {
        // SAFETY: the array is only read through the returned guard and no
        // other JNI call touches it until the guard is dropped.
        let elements =
            unsafe { self.env.get_array_elements(self.array, ReleaseMode::NoCopyBack) }.ok()?;
        Some(JavaBytes { elements })
    }
}

/// Converts JNI frame dimensions, rejecting negative values.
pub fn frame_dimensions(width: jint, height: jint) -> Result<(usize, usize)> {
    match (usize::try_from(width), usize::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(Error::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        }),
    }
}

/// Runs one frame job so that nothing escapes to the JVM.
///
/// Errors and panics are logged at error level and mapped to `None`. A job
/// returning `Ok(None)`, an unavailable frame buffer, is not logged.
pub fn catch_frame<T>(
    width: jint,
    height: jint,
    job: impl FnOnce() -> Result<Option<T>>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            error!("frame {}x{} dropped: {}", width, height, e);
            None
        }
        Err(_) => {
            error!("panic while processing {}x{} frame", width, height);
            None
        }
    }
}

fn try_process_frame<'local>(
    env: &mut JNIEnv<'local>,
    nv21: &JByteArray<'local>,
    width: jint,
    height: jint,
    processor: &FrameEdgeProcessor,
) -> Result<Option<JByteArray<'local>>> {
    let (w, h) = frame_dimensions(width, height)?;

    let mut frame = JavaFrame::new(env, nv21);
    let Some(rgba) = processor.process_source(&mut frame, w, h)? else {
        return Ok(None);
    };

    Ok(Some(env.byte_array_from_slice(&rgba)?))
}

fn process_frame<'local>(
    env: &mut JNIEnv<'local>,
    nv21: &JByteArray<'local>,
    width: jint,
    height: jint,
    processor: &FrameEdgeProcessor,
) -> jbyteArray {
    catch_frame(width, height, || {
        try_process_frame(env, nv21, width, height, processor)
    })
    .map_or(null_mut(), |rgba| rgba.into_raw())
}

/// `CameraPreview.nativeProcessFrame(nv21: ByteArray, w: Int, h: Int): ByteArray`
///
/// Converts an NV21 preview frame to a `w * h * 4` byte RGBA edge map using
/// the fixed 50/150 thresholds. Returns `null` if the frame could not be
/// read or processed.
#[no_mangle]
pub extern "system" fn Java_com_example_edgeviewer_CameraPreview_nativeProcessFrame<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    nv21: JByteArray<'local>,
    width: jint,
    height: jint,
) -> jbyteArray {
    process_frame(
        &mut env,
        &nv21,
        width,
        height,
        &FrameEdgeProcessor::default(),
    )
}

/// `CameraPreview.nativeProcessFrameWithThreshold(nv21: ByteArray, w: Int, h: Int, threshold: Double): ByteArray`
///
/// Slider driven variant: smooths the frame and uses `threshold` (at least
/// 10) and three times `threshold` as the hysteresis thresholds.
#[no_mangle]
pub extern "system" fn Java_com_example_edgeviewer_CameraPreview_nativeProcessFrameWithThreshold<
    'local,
>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    nv21: JByteArray<'local>,
    width: jint,
    height: jint,
    threshold: jdouble,
) -> jbyteArray {
    let processor = FrameEdgeProcessor::new(EdgeParams::from_threshold(threshold));
    process_frame(&mut env, &nv21, width, height, &processor)
}

/// `MainActivity.stringFromJNI(): String`
#[no_mangle]
pub extern "system" fn Java_com_example_edgeviewer_MainActivity_stringFromJNI<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    match env.new_string(concat!("edgeviewer ", env!("CARGO_PKG_VERSION"))) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("stringFromJNI: {}", e);
            null_mut()
        }
    }
}

/// Logcat tag of the library's log records.
pub const LOG_TAG: &str = "native-lib";

/// Installs the library log subscriber unless the host already set one.
///
/// On Android records go to logcat under [`LOG_TAG`], since the stdout of
/// an app process is discarded. Elsewhere a compact fmt subscriber writes
/// to stdout. Calling this more than once is harmless.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    // without logcat there is nowhere else to write to
    if let Ok(logcat) = tracing_android::layer(LOG_TAG) {
        let _ = tracing_subscriber::registry()
            .with(logcat.with_filter(LevelFilter::INFO))
            .try_init();
    }
}

/// Installs a compact stdout subscriber unless one is already set.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_max_level(LevelFilter::INFO)
        .try_init();
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: *mut JavaVM, _reserved: *mut c_void) -> jint {
    init_logging();
    JNI_VERSION_1_6
}
