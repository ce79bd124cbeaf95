use std::path::Path;

use crate::detection::domain::analysis_config::AnalysisConfig;
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::overlay::overlay_scene::OverlayScene;
use crate::overlay::raster_painter;
use crate::session::display_state::{DisplayState, GenderLabels};
use crate::session::snapshot::SnapshotReport;
use crate::shared::frame::Frame;

/// Result of analyzing one still image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAnalysis {
    pub report: SnapshotReport,
    /// Faces the analyzer returned before best-face selection.
    pub face_count: usize,
    /// Overlay of the best face, in image pixels.
    pub scene: Option<OverlayScene>,
}

/// Still-image analysis: read → analyze once → report, optionally writing
/// a copy with the overlay burnt in.
pub struct AnalyzeImageUseCase {
    analyzer: Box<dyn FaceAnalyzer>,
    config: AnalysisConfig,
    labels: GenderLabels,
}

impl AnalyzeImageUseCase {
    pub fn new(analyzer: Box<dyn FaceAnalyzer>, config: AnalysisConfig) -> Self {
        Self {
            analyzer,
            config,
            labels: GenderLabels::default(),
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        annotate_path: Option<&Path>,
    ) -> Result<ImageAnalysis, Box<dyn std::error::Error>> {
        let image = image::open(input_path)?.to_rgb8();
        let frame = Frame::from_rgb_image(image, 0);
        let analysis = self.analyze_frame(&frame)?;

        if let Some(out) = annotate_path {
            let mut canvas = frame.to_rgb_image().ok_or("Invalid image buffer")?;
            if let Some(scene) = &analysis.scene {
                raster_painter::paint(&mut canvas, scene);
            }
            canvas.save(out)?;
            log::info!("Wrote annotated image to {}", out.display());
        }

        Ok(analysis)
    }

    pub fn analyze_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<ImageAnalysis, Box<dyn std::error::Error>> {
        let faces = self
            .analyzer
            .analyze(frame, &self.config.detection_options())?;
        log::info!(
            "Found {} face(s) in {}x{} image",
            faces.len(),
            frame.width(),
            frame.height()
        );

        let display = DisplayState::initial().next(&faces, &self.config);
        let (w, h) = frame.dimensions();
        let scene = OverlayScene::build(&display, (w, h), (w as f64, h as f64), &self.labels);

        Ok(ImageAnalysis {
            report: SnapshotReport::from_faces(&faces, &self.config),
            face_count: faces.len(),
            scene,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expressions::{Expression, Expressions};
    use crate::detection::domain::face_analysis::{FaceAnalysis, Gender};
    use crate::detection::domain::face_analyzer::DetectionOptions;
    use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
    use crate::overlay::raster_painter::{AWAY_COLOR, LABEL_BACKGROUND};
    use crate::shared::bounding_box::BoundingBox;
    use std::sync::{Arc, Mutex};

    struct StubAnalyzer {
        faces: Vec<FaceAnalysis>,
        calls: Arc<Mutex<usize>>,
    }

    impl FaceAnalyzer for StubAnalyzer {
        fn analyze(
            &mut self,
            _frame: &Frame,
            _options: &DetectionOptions,
        ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.faces.clone())
        }
    }

    fn face(x: f64, width: f64, age: f64) -> FaceAnalysis {
        let mut pts = vec![(x + width / 2.0, 20.0); LANDMARK_COUNT];
        // eyes far apart around the nose: looking away
        pts[36] = (x, 10.0);
        pts[45] = (x + width + 60.0, 10.0);
        FaceAnalysis {
            bbox: BoundingBox::new(x, 4.0, width, width),
            score: 0.8,
            landmarks: FaceLandmarks::new(pts).unwrap(),
            age,
            gender: Gender::Male,
            gender_probability: 0.9,
            expressions: Expressions::from_pairs([(Expression::Happy, 0.2)]),
        }
    }

    fn use_case(faces: Vec<FaceAnalysis>) -> (AnalyzeImageUseCase, Arc<Mutex<usize>>) {
        let calls = Arc::new(Mutex::new(0));
        let analyzer = StubAnalyzer {
            faces,
            calls: calls.clone(),
        };
        (
            AnalyzeImageUseCase::new(Box::new(analyzer), AnalysisConfig::default()),
            calls,
        )
    }

    fn write_image(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("input.png");
        image::RgbImage::from_pixel(48, 32, image::Rgb([10, 10, 10]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_reports_best_face() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_image(dir.path());
        let (mut uc, calls) = use_case(vec![face(2.0, 8.0, 20.0), face(20.0, 16.0, 45.0)]);

        let analysis = uc.execute(&input, None).unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(analysis.face_count, 2);
        assert_eq!(
            analysis.report,
            SnapshotReport::Face {
                age: 45.0,
                gender: Gender::Male,
                is_smiling: false,
                confidence: 0.8,
            }
        );
        assert!(analysis.scene.is_some());
    }

    #[test]
    fn test_no_face() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_image(dir.path());
        let (mut uc, _) = use_case(Vec::new());

        let analysis = uc.execute(&input, None).unwrap();
        assert_eq!(analysis.report, SnapshotReport::NoFace);
        assert!(analysis.scene.is_none());
    }

    #[test]
    fn test_annotated_copy_has_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_image(dir.path());
        let out = dir.path().join("out.png");
        let (mut uc, _) = use_case(vec![face(20.0, 16.0, 45.0)]);

        uc.execute(&input, Some(&out)).unwrap();

        let written = image::open(&out).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (48, 32));
        assert_eq!(*written.get_pixel(20, 12), AWAY_COLOR);
        assert!(
            written.pixels().any(|p| *p == LABEL_BACKGROUND),
            "caption label missing"
        );
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut uc, calls) = use_case(Vec::new());
        assert!(uc.execute(&dir.path().join("nope.png"), None).is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
