/// Joint age and gender estimator.
///
/// The model reads a 96×96 face crop with raw pixel values and outputs
/// `[female_logit, male_logit, age / 100]`.
use std::path::Path;

use ort::session::Session;

use super::execution_provider::load_session;
use super::tensor::{crop_rgb, softmax, PixelScale};
use crate::detection::domain::face_analysis::Gender;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: u32 = 96;

/// The model was trained on loose crops that include hair and chin.
const CROP_SCALE: f64 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgeGender {
    pub age: f64,
    pub gender: Gender,
    pub gender_probability: f64,
}

pub struct AgeGenderClassifier {
    session: Session,
}

impl AgeGenderClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }

    pub fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<AgeGender, Box<dyn std::error::Error>> {
        let input = crop_rgb(frame, &face.squared(CROP_SCALE), INPUT_SIZE, PixelScale::Raw);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Age/gender model produced no outputs".into());
        }
        let raw = outputs[0].try_extract_array::<f32>()?;
        let values = raw.as_slice().ok_or("Cannot get age/gender slice")?;
        Ok(decode(values)?)
    }
}

fn decode(values: &[f32]) -> Result<AgeGender, String> {
    let [female, male, age, ..] = values else {
        return Err(format!(
            "Age/gender model returned {} values, expected 3",
            values.len()
        ));
    };
    let p = softmax(&[*female, *male]);
    let (gender, gender_probability) = if p[1] >= p[0] {
        (Gender::Male, p[1])
    } else {
        (Gender::Female, p[0])
    };
    Ok(AgeGender {
        age: (*age as f64 * 100.0).max(0.0),
        gender,
        gender_probability,
    })
}
