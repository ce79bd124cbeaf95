use std::fmt;

use crate::detection::domain::expressions::Expressions;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Everything the inference engine reports for one face in one frame.
///
/// Coordinates are in pixels of the analyzed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceAnalysis {
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`.
    pub score: f64,
    pub landmarks: FaceLandmarks,
    /// Estimated age in years (fractional).
    pub age: f64,
    pub gender: Gender,
    pub gender_probability: f64,
    pub expressions: Expressions,
}
