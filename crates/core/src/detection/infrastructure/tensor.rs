//! Tensor preparation and output decoding shared by the ONNX stages.

use ndarray::Array4;

use crate::detection::infrastructure::face_locator::Candidate;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// How pixel bytes map to input values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelScale {
    /// `[0, 1]`.
    Unit,
    /// `[0, 255]` as floats.
    Raw,
}

impl PixelScale {
    fn apply(self, v: u8) -> f32 {
        match self {
            PixelScale::Unit => v as f32 / 255.0,
            PixelScale::Raw => v as f32,
        }
    }
}

/// Resize the whole frame to `size × size`, NCHW RGB.
pub fn resize_rgb(frame: &Frame, size: u32, scale: PixelScale) -> Array4<f32> {
    let full = BoundingBox::new(0.0, 0.0, frame.width() as f64, frame.height() as f64);
    crop_rgb(frame, &full, size, scale)
}

/// Crop `region` out of the frame and resize it to `size × size`, NCHW RGB.
/// Parts of the region outside the frame are zero.
pub fn crop_rgb(frame: &Frame, region: &BoundingBox, size: u32, scale: PixelScale) -> Array4<f32> {
    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
    sample(frame, region, s, |y, x, px| {
        for c in 0..3 {
            tensor[[0, c, y, x]] = scale.apply(px[c]);
        }
    });
    tensor
}

/// Crop `region` and resize it to `size × size` single-channel luma, NCHW.
pub fn crop_gray(frame: &Frame, region: &BoundingBox, size: u32, scale: PixelScale) -> Array4<f32> {
    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 1, s, s));
    sample(frame, region, s, |y, x, px| {
        let luma = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
        tensor[[0, 0, y, x]] = scale.apply(luma.round().clamp(0.0, 255.0) as u8);
    });
    tensor
}

/// Nearest-neighbour sampling of `region` on an `s × s` grid; out-of-frame
/// cells are skipped.
fn sample(frame: &Frame, region: &BoundingBox, s: usize, mut put: impl FnMut(usize, usize, [u8; 3])) {
    if frame.is_empty() || s == 0 {
        return;
    }
    let src = frame.as_ndarray();
    let (fw, fh) = (frame.width() as f64, frame.height() as f64);
    let step_x = region.width / s as f64;
    let step_y = region.height / s as f64;

    for y in 0..s {
        let sy = region.y + (y as f64 + 0.5) * step_y;
        if sy < 0.0 || sy >= fh {
            continue;
        }
        for x in 0..s {
            let sx = region.x + (x as f64 + 0.5) * step_x;
            if sx < 0.0 || sx >= fw {
                continue;
            }
            let (iy, ix) = (sy as usize, sx as usize);
            put(y, x, [src[[iy, ix, 0]], src[[iy, ix, 1]], src[[iy, ix, 2]]]);
        }
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|&v| ((v - max) as f64).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Greedy NMS: highest score first, drop boxes overlapping a kept one by
/// more than `iou_thresh`.
pub fn nms(mut candidates: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if keep.iter().all(|k| k.bbox.iou(&cand.bbox) <= iou_thresh) {
            keep.push(cand);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = (0..width * height).flat_map(|_| rgb).collect();
        Frame::new(data, width, height, 0)
    }

    #[test]
    fn test_resize_shape_and_unit_scale() {
        let tensor = resize_rgb(&solid(200, 100, [255, 0, 51]), 128, PixelScale::Unit);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
        assert_relative_eq!(tensor[[0, 0, 5, 5]], 1.0);
        assert_relative_eq!(tensor[[0, 1, 5, 5]], 0.0);
        assert_relative_eq!(tensor[[0, 2, 5, 5]], 0.2);
    }

    #[test]
    fn test_raw_scale_keeps_byte_values() {
        let tensor = resize_rgb(&solid(10, 10, [12, 34, 56]), 4, PixelScale::Raw);
        assert_relative_eq!(tensor[[0, 1, 0, 0]], 34.0);
    }

    #[test]
    fn test_crop_outside_frame_is_zero_padded() {
        let frame = solid(10, 10, [200, 200, 200]);
        let region = BoundingBox::new(-10.0, 0.0, 20.0, 10.0);
        let tensor = crop_rgb(&frame, &region, 4, PixelScale::Raw);
        // left half of the grid falls outside the frame
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert_relative_eq!(tensor[[0, 0, 0, 3]], 200.0);
    }

    #[test]
    fn test_crop_gray_uses_luma() {
        let tensor = crop_gray(
            &solid(8, 8, [255, 255, 255]),
            &BoundingBox::new(0.0, 0.0, 8.0, 8.0),
            64,
            PixelScale::Raw,
        );
        assert_eq!(tensor.shape(), &[1, 1, 64, 64]);
        assert_relative_eq!(tensor[[0, 0, 10, 10]], 255.0);
    }

    #[test]
    fn test_empty_frame_gives_zero_tensor() {
        let tensor = resize_rgb(&Frame::new(Vec::new(), 0, 0, 0), 4, PixelScale::Unit);
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_softmax_sums_to_one_and_orders() {
        let p = softmax(&[1.0, 3.0, 0.5]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_relative_eq!(p[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_nms_suppresses_overlap_and_keeps_separate() {
        let cands = vec![
            Candidate {
                bbox: BoundingBox::new(5.0, 5.0, 100.0, 100.0),
                score: 0.7,
            },
            Candidate {
                bbox: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
                score: 0.9,
            },
            Candidate {
                bbox: BoundingBox::new(300.0, 300.0, 50.0, 50.0),
                score: 0.8,
            },
        ];
        let kept = nms(cands, 0.3);
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].score, 0.9);
        assert_relative_eq!(kept[1].score, 0.8);
    }
}
