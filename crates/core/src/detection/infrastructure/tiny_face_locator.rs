/// Lightweight anchor-based face locator (BlazeFace short-range layout).
///
/// Fast enough to run on every detection tick on a laptop CPU. Works best
/// for one or two faces filling a good part of the frame.
use std::path::Path;

use ort::session::Session;

use super::execution_provider::load_session;
use super::face_locator::{Candidate, FaceLocator};
use super::tensor::{nms, resize_rgb, sigmoid, PixelScale};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Model input resolution.
const INPUT_SIZE: u32 = 128;

const NMS_IOU_THRESH: f64 = 0.3;

/// 16×16 grid × 2 anchors + 8×8 grid × 6 anchors.
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints (12).
const REGRESSOR_STRIDE: usize = 16;

pub struct TinyFaceLocator {
    session: Session,
    anchors: Vec<[f32; 2]>,
}

impl TinyFaceLocator {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
            anchors: generate_anchors(),
        })
    }
}

impl FaceLocator for TinyFaceLocator {
    fn locate(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
        let input = resize_rgb(frame, INPUT_SIZE, PixelScale::Unit);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors [1, 896, 16], classificators [1, 896, 1]
        if outputs.len() < 2 {
            return Err(format!("Tiny detector expected 2 outputs, got {}", outputs.len()).into());
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let candidates = decode(
            reg_data,
            score_data,
            &self.anchors,
            min_confidence,
            frame.dimensions(),
        );
        Ok(nms(candidates, NMS_IOU_THRESH))
    }
}

/// Turn raw anchor outputs into frame-space candidates above `min_confidence`.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    min_confidence: f64,
    (fw, fh): (u32, u32),
) -> Vec<Candidate> {
    let size = INPUT_SIZE as f32;
    let mut out = Vec::new();

    for (i, (&raw_score, anchor)) in score_data.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score) as f64;
        if score < min_confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        let Some(reg) = reg_data.get(offset..offset + 4) else {
            break;
        };

        let cx = anchor[0] + reg[0] / size;
        let cy = anchor[1] + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;

        let bbox = BoundingBox::from_corners(
            ((cx - w / 2.0) * fw as f32) as f64,
            ((cy - h / 2.0) * fh as f32) as f64,
            ((cx + w / 2.0) * fw as f32) as f64,
            ((cy + h / 2.0) * fh as f32) as f64,
        )
        .clamped(fw, fh);
        if bbox.area() > 0.0 {
            out.push(Candidate { bbox, score });
        }
    }
    out
}

/// Anchor centers for the short-range model: strides 8 and 16 with 2 and 6
/// anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)];
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, per_cell) in &strides {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }
    anchors
}
