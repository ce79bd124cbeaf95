use std::io::Cursor;

use thiserror::Error;

use crate::detection::domain::analysis_config::AnalysisConfig;
use crate::detection::domain::best_face::select_best;
use crate::detection::domain::face_analysis::{FaceAnalysis, Gender};
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("cannot capture an empty frame")]
    EmptyFrame,
    #[error("frame data does not match its dimensions")]
    InvalidFrame,
    #[error("failed to encode captured image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to decode captured image: {0}")]
    Decode(#[source] image::ImageError),
}

/// A still taken from the live stream, held as PNG bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedImage {
    pub fn encode(frame: &Frame) -> Result<Self, SnapshotError> {
        if frame.is_empty() {
            return Err(SnapshotError::EmptyFrame);
        }
        let img = frame.to_rgb_image().ok_or(SnapshotError::InvalidFrame)?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(SnapshotError::Encode)?;
        Ok(Self {
            png,
            width: frame.width(),
            height: frame.height(),
        })
    }

    pub fn decode(&self) -> Result<Frame, SnapshotError> {
        let img = image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .map_err(SnapshotError::Decode)?
            .to_rgb8();
        Ok(Frame::from_rgb_image(img, 0))
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Outcome of the one-shot analysis of a captured still.
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotReport {
    NoFace,
    Face {
        age: f64,
        gender: Gender,
        is_smiling: bool,
        confidence: f64,
    },
}

impl SnapshotReport {
    pub fn from_faces(faces: &[FaceAnalysis], config: &AnalysisConfig) -> Self {
        match select_best(faces) {
            None => SnapshotReport::NoFace,
            Some(face) => SnapshotReport::Face {
                age: face.age,
                gender: face.gender,
                is_smiling: face.expressions.is_smiling(config.smile_threshold),
                confidence: face.score,
            },
        }
    }
}

/// Analysis attached to the open review.
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewAnalysis {
    Pending,
    Ready(SnapshotReport),
    Failed(String),
}

/// A captured still under review together with its analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Review {
    pub image: CapturedImage,
    pub analysis: ReviewAnalysis,
}

/// Runs the analyzer exactly once against a captured still.
pub fn analyze_snapshot(
    analyzer: &mut dyn FaceAnalyzer,
    captured: &CapturedImage,
    config: &AnalysisConfig,
) -> Result<SnapshotReport, Box<dyn std::error::Error>> {
    let frame = captured.decode()?;
    let faces = analyzer.analyze(&frame, &config.detection_options())?;
    Ok(SnapshotReport::from_faces(&faces, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expressions::{Expression, Expressions};
    use crate::detection::domain::face_analyzer::DetectionOptions;
    use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
    use crate::shared::bounding_box::BoundingBox;

    struct FakeAnalyzer {
        faces: Vec<FaceAnalysis>,
        calls: usize,
        seen_dims: Option<(u32, u32)>,
    }

    impl FaceAnalyzer for FakeAnalyzer {
        fn analyze(
            &mut self,
            frame: &Frame,
            _options: &DetectionOptions,
        ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
            self.calls += 1;
            self.seen_dims = Some(frame.dimensions());
            Ok(self.faces.clone())
        }
    }

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let data = (0..width * height * 3).map(|i| (i % 251) as u8).collect();
        Frame::new(data, width, height, 9)
    }

    fn face(happy: f64) -> FaceAnalysis {
        FaceAnalysis {
            bbox: BoundingBox::new(0.0, 0.0, 40.0, 40.0),
            score: 0.8,
            landmarks: FaceLandmarks::new(vec![(0.0, 0.0); LANDMARK_COUNT]).unwrap(),
            age: 25.0,
            gender: Gender::Female,
            gender_probability: 0.7,
            expressions: Expressions::from_pairs([(Expression::Happy, happy)]),
        }
    }

    #[test]
    fn test_encode_produces_png() {
        let captured = CapturedImage::encode(&gradient_frame(8, 6)).unwrap();
        assert!(!captured.png_bytes().is_empty());
        assert_eq!(&captured.png_bytes()[1..4], b"PNG");
        assert_eq!((captured.width(), captured.height()), (8, 6));
    }

    #[test]
    fn test_decode_restores_pixels() {
        let frame = gradient_frame(5, 4);
        let decoded = CapturedImage::encode(&frame).unwrap().decode().unwrap();
        assert_eq!(decoded.dimensions(), (5, 4));
        assert_eq!(decoded.data(), frame.data());
    }

    #[test]
    fn test_encode_rejects_empty_frame() {
        let result = CapturedImage::encode(&Frame::new(Vec::new(), 0, 0, 0));
        assert!(matches!(result, Err(SnapshotError::EmptyFrame)));
    }

    #[test]
    fn test_report_no_face() {
        assert_eq!(
            SnapshotReport::from_faces(&[], &AnalysisConfig::default()),
            SnapshotReport::NoFace
        );
    }

    #[test]
    fn test_analyze_snapshot_runs_analyzer_once_on_the_still() {
        let captured = CapturedImage::encode(&gradient_frame(16, 12)).unwrap();
        let mut analyzer = FakeAnalyzer {
            faces: vec![face(0.95)],
            calls: 0,
            seen_dims: None,
        };

        let report = analyze_snapshot(&mut analyzer, &captured, &AnalysisConfig::default()).unwrap();

        assert_eq!(analyzer.calls, 1);
        assert_eq!(analyzer.seen_dims, Some((16, 12)));
        assert_eq!(
            report,
            SnapshotReport::Face {
                age: 25.0,
                gender: Gender::Female,
                is_smiling: true,
                confidence: 0.8,
            }
        );
    }
}
