//! Camera acquisition: a capture thread that decodes frames to RGB and
//! forwards them over a bounded channel, dropping frames when the gesture
//! loop is busy rather than building up latency.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
};

use crate::types::Frame;

// Prefer a high frame rate so the smoothing window spans a short real-time
// interval; fall back to whatever the driver offers.
fn requested_formats() -> [RequestedFormat<'static>; 2] {
    [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_camera(index: &CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

pub fn start_camera_stream(camera_index: u32, frame_tx: Sender<Frame>) -> Result<CameraStream> {
    let index = CameraIndex::Index(camera_index);

    // Fail fast before spawning the capture thread.
    build_camera(&index)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match build_camera(&index) {
            Ok(camera) => camera,
            Err(err) => {
                log::error!("failed to open camera: {err:?}");
                return;
            }
        };

        while !stop_flag.load(Ordering::Relaxed) {
            let frame_start = Instant::now();
            let buffer = match camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!(
                        "camera frame read failed (after {:?}): {err:?}",
                        frame_start.elapsed()
                    );
                    continue;
                }
            };

            let decoded = match buffer.decode_image::<RgbFormat>() {
                Ok(image) => image,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    continue;
                }
            };

            let frame = Frame {
                width: decoded.width(),
                height: decoded.height(),
                rgb: decoded.into_raw(),
                timestamp: Instant::now(),
            };

            // Drop if the gesture loop is busy, otherwise forward.
            let _ = frame_tx.try_send(frame);
        }
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}
