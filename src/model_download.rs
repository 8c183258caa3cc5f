//! First-run provisioning of the handpose ONNX model.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

const MODEL_FILENAME: &str = "handpose_estimation_mediapipe_2023feb.onnx";
const MODEL_URL: &str = "https://raw.githubusercontent.com/214zzl995/gesture-universe/refs/heads/main/models/handpose_estimation_mediapipe_2023feb.onnx";

pub fn default_model_path() -> PathBuf {
    PathBuf::from("models").join(MODEL_FILENAME)
}

/// Download the handpose model if it is not already on disk. The download
/// lands in a temp file and is renamed into place so a partial transfer
/// never masquerades as a usable model.
pub fn ensure_model_ready(model_path: &Path) -> anyhow::Result<()> {
    if model_path.exists() {
        return Ok(());
    }

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    log::info!(
        "downloading handpose model from {MODEL_URL} to {}",
        model_path.display()
    );

    let client = Client::new();
    let mut response = client
        .get(MODEL_URL)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let progress = create_progress_bar(response.content_length());

    let tmp_path = model_path.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        progress.set_position(downloaded);
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, model_path).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            model_path.display()
        )
    })?;

    progress.finish_with_message("handpose model ready");
    Ok(())
}

fn create_progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} downloading model") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
