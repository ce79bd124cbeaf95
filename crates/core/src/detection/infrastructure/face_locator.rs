use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A detector hit before attribute estimation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub score: f64,
}

/// First stage of the analyzer: where are the faces.
///
/// Returns candidates in frame pixel coordinates with score at least
/// `min_confidence`, already de-duplicated.
pub trait FaceLocator: Send {
    fn locate(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, Box<dyn std::error::Error>>;
}
