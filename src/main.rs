mod actions;
mod clipboard;
mod config;
mod dispatch;
mod engine;
mod landmarks;
mod model_download;
mod motion;
mod pipeline;
mod server;
mod types;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::{
    actions::DesktopBackend,
    clipboard::SharedClipboard,
    config::Config,
    dispatch::ActionDispatcher,
    engine::GestureEngine,
    pipeline::HandLandmarker,
    server::start_query_server,
    types::Frame,
};

const CONFIG_PATH: &str = "gesture-drop.json";

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default(Path::new(CONFIG_PATH));

    fs::create_dir_all(&config.screenshot_dir).with_context(|| {
        format!(
            "failed to create screenshot directory {}",
            config.screenshot_dir.display()
        )
    })?;

    // Everything below here is startup-fatal; once the loop is running,
    // failures degrade to skipped frames or logged warnings.
    let model_path = model_download::default_model_path();
    model_download::ensure_model_ready(&model_path)?;
    let mut landmarker =
        HandLandmarker::new(&model_path, config.min_confidence, config.mirror_camera)?;

    let clipboard = SharedClipboard::new();
    let query_server = start_query_server(
        config.server_port,
        config.allow_remote_write,
        clipboard.clone(),
    )?;
    log::info!(
        "clipboard endpoint ready at http://{}:{}",
        server::local_ip(),
        query_server.port()
    );

    let (frame_tx, frame_rx) = bounded(1);
    let _camera = start_camera(config.camera_index, frame_tx)?;

    let backend = DesktopBackend::new()?;
    let mut dispatcher = ActionDispatcher::new(Box::new(backend), clipboard.clone(), &config);
    let mut engine = GestureEngine::new(config.gesture.clone());

    run_gesture_loop(&frame_rx, &mut landmarker, &mut engine, &mut dispatcher);

    log::info!("camera stream ended, shutting down");
    query_server.stop();
    Ok(())
}

#[cfg(feature = "camera-nokhwa")]
fn start_camera(index: u32, frame_tx: Sender<Frame>) -> Result<pipeline::CameraStream> {
    pipeline::start_camera_stream(index, frame_tx)
}

#[cfg(not(feature = "camera-nokhwa"))]
fn start_camera(_index: u32, _frame_tx: Sender<Frame>) -> Result<()> {
    anyhow::bail!("built without camera support; enable the camera-nokhwa feature")
}

/// One pass per frame: detect, normalize, classify, dispatch. Runs until
/// the camera stream closes its side of the channel.
fn run_gesture_loop(
    frame_rx: &Receiver<Frame>,
    landmarker: &mut HandLandmarker,
    engine: &mut GestureEngine,
    dispatcher: &mut ActionDispatcher,
) {
    while let Some(frame) = recv_latest_frame(frame_rx) {
        let hand = match landmarker.detect(&frame) {
            Ok(hand) => hand,
            Err(err) => {
                log::warn!("hand inference failed: {err:?}");
                None
            }
        };

        let features = hand.as_ref().and_then(landmarks::extract_features);
        if let Some(event) = engine.advance(features.as_ref(), frame.timestamp) {
            dispatcher.dispatch(event);
        }
    }
}

fn recv_latest_frame(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}
