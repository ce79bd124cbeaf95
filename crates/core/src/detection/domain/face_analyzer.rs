use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::shared::frame::Frame;

/// Bounds on what a single analyzer call may return.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionOptions {
    pub max_faces: usize,
    pub min_confidence: f64,
}

/// Domain interface for the face inference engine.
///
/// Given a frame, returns zero or more faces with box, score, landmarks,
/// age, gender and expression probabilities. Implementations own heavy
/// model sessions, hence `&mut self`.
pub trait FaceAnalyzer: Send {
    fn analyze(
        &mut self,
        frame: &Frame,
        options: &DetectionOptions,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>>;
}
