/// 68-point facial landmark regressor.
///
/// Takes a square crop around a detected face and regresses every point as
/// a fraction of the crop, which is mapped back to frame pixels.
use std::path::Path;

use ort::session::Session;

use super::execution_provider::load_session;
use super::tensor::{crop_rgb, PixelScale};
use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: u32 = 112;

/// Crop side relative to the longer detector box edge; detector boxes are
/// tight and cut off the jaw line.
const CROP_SCALE: f64 = 1.2;

pub struct LandmarkRegressor {
    session: Session,
}

impl LandmarkRegressor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }

    pub fn regress(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
        let crop = face.squared(CROP_SCALE);
        let input = crop_rgb(frame, &crop, INPUT_SIZE, PixelScale::Unit);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Landmark model produced no outputs".into());
        }
        let raw = outputs[0].try_extract_array::<f32>()?;
        let values = raw.as_slice().ok_or("Cannot get landmark slice")?;
        Ok(to_frame_points(values, &crop)?)
    }
}

/// Map crop-relative `[x0, y0, x1, y1, ...]` into frame pixels.
fn to_frame_points(values: &[f32], crop: &BoundingBox) -> Result<FaceLandmarks, String> {
    if values.len() < LANDMARK_COUNT * 2 {
        return Err(format!(
            "Landmark model returned {} values, expected {}",
            values.len(),
            LANDMARK_COUNT * 2
        ));
    }
    let points = values[..LANDMARK_COUNT * 2]
        .chunks_exact(2)
        .map(|p| {
            (
                crop.x + p[0] as f64 * crop.width,
                crop.y + p[1] as f64 * crop.height,
            )
        })
        .collect();
    FaceLandmarks::new(points).map_err(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_points_map_into_crop() {
        let crop = BoundingBox::new(100.0, 50.0, 200.0, 200.0);
        let mut values = vec![0.0f32; LANDMARK_COUNT * 2];
        values[0] = 0.5;
        values[1] = 0.25;
        values[LANDMARK_COUNT * 2 - 2] = 1.0;
        values[LANDMARK_COUNT * 2 - 1] = 1.0;

        let lm = to_frame_points(&values, &crop).unwrap();
        let pts = lm.points();
        assert_relative_eq!(pts[0].0, 200.0);
        assert_relative_eq!(pts[0].1, 100.0);
        assert_relative_eq!(pts[LANDMARK_COUNT - 1].0, 300.0);
        assert_relative_eq!(pts[LANDMARK_COUNT - 1].1, 250.0);
        assert_relative_eq!(pts[1].0, 100.0);
    }

    #[test]
    fn test_short_output_is_an_error() {
        let crop = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(to_frame_points(&[0.0; 10], &crop).is_err());
    }

    #[test]
    fn test_extra_values_are_ignored() {
        let crop = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let values = vec![0.1f32; LANDMARK_COUNT * 2 + 6];
        assert_eq!(to_frame_points(&values, &crop).unwrap().points().len(), LANDMARK_COUNT);
    }
}
