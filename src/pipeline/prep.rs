//! Frame preprocessing for the handpose model: letterbox a camera frame
//! into the model's square input and map detections back out to
//! normalized frame coordinates.

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::types::{Frame, landmark};

pub const INPUT_SIZE: u32 = 224;

/// The resize applied on the way in; inverted to project landmark
/// coordinates back onto the source frame.
#[derive(Clone, Debug)]
pub struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    orig_w: u32,
    orig_h: u32,
}

impl Letterbox {
    /// Map a model-input-space point back to normalized [0,1] frame
    /// coordinates, clamped to the frame.
    pub fn to_normalized(&self, x: f32, y: f32) -> (f32, f32) {
        let px = (x - self.pad_x) / self.scale;
        let py = (y - self.pad_y) / self.scale;
        (
            (px / self.orig_w.max(1) as f32).clamp(0.0, 1.0),
            (py / self.orig_h.max(1) as f32).clamp(0.0, 1.0),
        )
    }
}

/// Letterbox-resize an RGB frame to `target_size` and normalize into an
/// NHWC float tensor.
pub fn prepare_input(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, Letterbox)> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(3);
    if frame.rgb.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgb.len(),
            expected_len
        ));
    }

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgb.clone(),
        fir::PixelType::U8x3,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new();
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    // Center the resized frame on a black square canvas.
    let pad_x = ((target_size as i64 - new_w as i64) / 2).max(0) as usize;
    let pad_y = ((target_size as i64 - new_h as i64) / 2).max(0) as usize;
    let mut canvas = vec![0u8; (target_size as usize) * (target_size as usize) * 3];
    let dst_stride = target_size as usize * 3;
    let src_stride = new_w as usize * 3;
    for row in 0..(new_h as usize) {
        let dst_offset = (pad_y + row) * dst_stride + pad_x * 3;
        let src_offset = row * src_stride;
        canvas[dst_offset..dst_offset + src_stride]
            .copy_from_slice(&resized[src_offset..src_offset + src_stride]);
    }

    let normalized: Vec<f32> = canvas
        .par_iter()
        .map(|&value| value as f32 / 255.0)
        .collect();
    let input = Array4::<f32>::from_shape_vec(
        (1, target_size as usize, target_size as usize, 3),
        normalized,
    )
    .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    let letterbox = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((input, letterbox))
}

/// Split the model's flat output into 21 xyz triples.
pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>> {
    if flat.len() < landmark::COUNT * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            landmark::COUNT * 3
        ));
    }

    let mut landmarks = Vec::with_capacity(landmark::COUNT);
    for chunk in flat.chunks_exact(3).take(landmark::COUNT) {
        landmarks.push([chunk[0], chunk[1], chunk[2]]);
    }
    Ok(landmarks)
}
