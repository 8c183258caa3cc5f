//! Hand-landmark detector: the MediaPipe handpose-estimation ONNX model
//! run through ort over the full letterboxed frame. Produces zero or one
//! hand per frame; anything below the confidence gate reads as "no hand".

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::types::{Frame, HandLandmarks};

use super::prep;

pub struct HandLandmarker {
    session: Session,
    min_confidence: f32,
    mirror: bool,
}

impl HandLandmarker {
    /// Load the model. This is the startup-fatal path; detection itself
    /// degrades to "no hand" on low confidence.
    pub fn new(model_path: &Path, min_confidence: f32, mirror: bool) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load handpose model from {}", model_path.display())
            })?;

        log::info!("handpose model ready from {}", model_path.display());
        Ok(Self {
            session,
            min_confidence,
            mirror,
        })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Option<HandLandmarks>> {
        let (input, letterbox) = prep::prepare_input(frame, prep::INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run handpose session")?;

        if outputs.len() == 0 {
            return Err(anyhow!("handpose model returned no outputs"));
        }

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|array| array.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };
        if confidence < self.min_confidence {
            return Ok(None);
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let raw = prep::decode_landmarks(&flattened)?;

        let points = raw
            .iter()
            .map(|[x, y, z]| {
                let (nx, ny) = letterbox.to_normalized(*x, *y);
                let nx = if self.mirror { 1.0 - nx } else { nx };
                [nx, ny, z / prep::INPUT_SIZE as f32]
            })
            .collect();

        Ok(Some(HandLandmarks { points, confidence }))
    }
}
