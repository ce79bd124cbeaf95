/// Facial expression classifier (FER+ layout).
///
/// 64×64 grayscale crop in, eight class scores out, in the order of
/// [`Expression::ALL`].
use std::path::Path;

use ort::session::Session;

use super::execution_provider::load_session;
use super::tensor::{crop_gray, softmax, PixelScale};
use crate::detection::domain::expressions::{Expression, Expressions};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: u32 = 64;

pub struct ExpressionClassifier {
    session: Session,
}

impl ExpressionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }

    pub fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<Expressions, Box<dyn std::error::Error>> {
        let input = crop_gray(frame, &face.squared(1.0), INPUT_SIZE, PixelScale::Raw);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Expression model produced no outputs".into());
        }
        let raw = outputs[0].try_extract_array::<f32>()?;
        let logits = raw.as_slice().ok_or("Cannot get expression slice")?;
        Ok(decode(logits)?)
    }
}

fn decode(logits: &[f32]) -> Result<Expressions, String> {
    if logits.len() < Expression::COUNT {
        return Err(format!(
            "Expression model returned {} scores, expected {}",
            logits.len(),
            Expression::COUNT
        ));
    }
    let probs = softmax(&logits[..Expression::COUNT]);
    let mut out = [0.0; Expression::COUNT];
    out.copy_from_slice(&probs);
    Ok(Expressions::new(out))
}
