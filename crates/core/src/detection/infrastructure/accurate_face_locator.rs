/// Single-shot face locator for YOLO-style face models.
///
/// Slower than the tiny locator but steadier on small, distant or turned
/// faces. Handles letterbox preprocessing and both output layouts.
use std::path::Path;

use ndarray::Array4;
use ort::session::Session;

use super::execution_provider::{declared_input_size, load_session};
use super::face_locator::{Candidate, FaceLocator};
use super::tensor::nms;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Fallback input resolution when the model input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct AccurateFaceLocator {
    session: Session,
    input_size: u32,
}

impl AccurateFaceLocator {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = declared_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl FaceLocator for AccurateFaceLocator {
    fn locate(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
        let (input, letterbox) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Accurate detector produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected detector output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let candidates = decode(data, &shape, &letterbox, min_confidence, frame.dimensions());
        Ok(nms(candidates, NMS_IOU_THRESH))
    }
}

/// Mapping between letterboxed input and frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Letterbox {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Aspect-preserving resize into a `target × target` gray-padded NCHW tensor.
fn letterbox(frame: &Frame, target: u32) -> (Array4<f32>, Letterbox) {
    let t = target as usize;
    let mut tensor = Array4::<f32>::from_elem((1, 3, t, t), PAD_VALUE);
    if frame.is_empty() {
        return (
            tensor,
            Letterbox {
                scale: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
            },
        );
    }

    let (fw, fh) = (frame.width() as f64, frame.height() as f64);
    let scale = (target as f64 / fw).min(target as f64 / fh);
    let new_w = ((fw * scale).round() as u32).min(target);
    let new_h = ((fh * scale).round() as u32).min(target);
    let pad_x = (target - new_w) / 2;
    let pad_y = (target - new_h) / 2;

    let src = frame.as_ndarray();
    let (src_w, src_h) = (frame.width() as usize, frame.height() as usize);
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, pad_y as usize + y, pad_x as usize + x]] =
                    src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

/// Parse `[1, features, detections]` or `[1, detections, features]` rows of
/// `[cx, cy, w, h, conf, ...]`.
fn decode(
    data: &[f32],
    shape: &[usize],
    letterbox: &Letterbox,
    min_confidence: f64,
    (fw, fh): (u32, u32),
) -> Vec<Candidate> {
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Vec::new();
    }
    let at = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data.get(idx).copied().unwrap_or(0.0) as f64
    };

    let mut out = Vec::new();
    for i in 0..num_dets {
        let conf = at(i, 4);
        if conf < min_confidence {
            continue;
        }
        let (cx, cy, w, h) = (at(i, 0), at(i, 1), at(i, 2), at(i, 3));
        let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);
        let bbox = BoundingBox::from_corners(x1, y1, x2, y2).clamped(fw, fh);
        if bbox.area() > 0.0 {
            out.push(Candidate { bbox, score: conf });
        }
    }
    out
}
