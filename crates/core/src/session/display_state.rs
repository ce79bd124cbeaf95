//! Derived, display-ready state for the current detection tick.
//!
//! A [`DisplayState`] is an immutable value: every tick produces a new one
//! from the analyzer output, so the "no face" reset and the stop reset are
//! single assignments rather than a series of field updates.

use crate::detection::domain::analysis_config::AnalysisConfig;
use crate::detection::domain::best_face::select_best;
use crate::detection::domain::expressions::Expressions;
use crate::detection::domain::face_analysis::{FaceAnalysis, Gender};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;

/// Derived view of the best face of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceReadout {
    pub bbox: BoundingBox,
    pub landmarks: FaceLandmarks,
    pub confidence: f64,
    pub age: f64,
    pub gender: Gender,
    pub expressions: Expressions,
    pub is_smiling: bool,
    pub is_looking: bool,
}

impl FaceReadout {
    pub fn derive(face: &FaceAnalysis, config: &AnalysisConfig) -> Self {
        Self {
            bbox: face.bbox,
            landmarks: face.landmarks.clone(),
            confidence: face.score,
            age: face.age,
            gender: face.gender,
            expressions: face.expressions.clone(),
            is_smiling: face.expressions.is_smiling(config.smile_threshold),
            is_looking: face.landmarks.is_looking(config.gaze_threshold_px),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayState {
    face: Option<FaceReadout>,
    frames_with_face: u64,
}

impl DisplayState {
    /// Nothing detected and nothing counted: the state of a fresh or
    /// stopped session.
    pub fn initial() -> Self {
        Self::default()
    }

    /// "No face" defaults that keep the running counter.
    pub fn no_face(frames_with_face: u64) -> Self {
        Self {
            face: None,
            frames_with_face,
        }
    }

    /// State after a tick whose analyzer returned `faces`.
    pub fn next(&self, faces: &[FaceAnalysis], config: &AnalysisConfig) -> Self {
        match select_best(faces) {
            None => Self::no_face(self.frames_with_face),
            Some(best) => Self {
                face: Some(FaceReadout::derive(best, config)),
                frames_with_face: self.frames_with_face + 1,
            },
        }
    }

    pub fn face(&self) -> Option<&FaceReadout> {
        self.face.as_ref()
    }

    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }

    /// Ticks (since the camera was started) in which a face was found.
    pub fn frames_with_face(&self) -> u64 {
        self.frames_with_face
    }

    pub fn age(&self) -> f64 {
        self.face.as_ref().map_or(0.0, |f| f.age)
    }

    pub fn gender(&self) -> Option<Gender> {
        self.face.as_ref().map(|f| f.gender)
    }

    pub fn confidence(&self) -> f64 {
        self.face.as_ref().map_or(0.0, |f| f.confidence)
    }

    pub fn is_smiling(&self) -> bool {
        self.face.as_ref().is_some_and(|f| f.is_smiling)
    }

    pub fn is_looking(&self) -> bool {
        self.face.as_ref().is_some_and(|f| f.is_looking)
    }

    /// One-line rendering of the status panel.
    pub fn status_line(&self, labels: &GenderLabels) -> String {
        format!(
            "looking: {} | gender: {} | confidence: {:.0}% | age: {:.0} | smiling: {} | frames: {}",
            yes_no(self.is_looking()),
            self.gender().map_or("-", |g| labels.label(g)),
            self.confidence() * 100.0,
            self.age().round(),
            yes_no(self.is_smiling()),
            self.frames_with_face,
        )
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Display text for each gender, so front ends can localize it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenderLabels {
    pub male: String,
    pub female: String,
}

impl Default for GenderLabels {
    fn default() -> Self {
        Self {
            male: "Male".to_string(),
            female: "Female".to_string(),
        }
    }
}

impl GenderLabels {
    pub fn label(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expressions::Expression;
    use crate::detection::domain::face_landmarks::{
        LANDMARK_COUNT, LEFT_EYE_OUTER, NOSE_TIP, RIGHT_EYE_OUTER,
    };

    fn face(width: f64, happy: f64, nose_offset: f64) -> FaceAnalysis {
        let mut pts = vec![(200.0, 200.0); LANDMARK_COUNT];
        pts[LEFT_EYE_OUTER] = (150.0, 150.0);
        pts[RIGHT_EYE_OUTER] = (250.0, 150.0);
        pts[NOSE_TIP] = (200.0 + nose_offset, 200.0);
        FaceAnalysis {
            bbox: BoundingBox::new(100.0, 100.0, width, width),
            score: 0.87,
            landmarks: FaceLandmarks::new(pts).unwrap(),
            age: 31.6,
            gender: Gender::Male,
            gender_probability: 0.95,
            expressions: Expressions::from_pairs([(Expression::Happy, happy)]),
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn test_initial_is_all_defaults() {
        let s = DisplayState::initial();
        assert!(!s.has_face());
        assert_eq!(s.age(), 0.0);
        assert_eq!(s.gender(), None);
        assert_eq!(s.confidence(), 0.0);
        assert!(!s.is_smiling());
        assert!(!s.is_looking());
        assert_eq!(s.frames_with_face(), 0);
    }

    #[test]
    fn test_face_tick_derives_fields_and_counts() {
        let s = DisplayState::initial().next(&[face(100.0, 0.9, 2.0)], &config());
        assert!(s.has_face());
        assert_eq!(s.age(), 31.6);
        assert_eq!(s.gender(), Some(Gender::Male));
        assert_eq!(s.confidence(), 0.87);
        assert!(s.is_smiling());
        assert!(s.is_looking());
        assert_eq!(s.frames_with_face(), 1);
    }

    #[test]
    fn test_no_face_tick_resets_fields_but_keeps_counter() {
        let with_face = DisplayState::initial()
            .next(&[face(100.0, 0.9, 0.0)], &config())
            .next(&[face(100.0, 0.9, 0.0)], &config());
        assert_eq!(with_face.frames_with_face(), 2);

        let empty = with_face.next(&[], &config());
        assert_eq!(empty, DisplayState::no_face(2));
        assert!(!empty.has_face());
        assert_eq!(empty.age(), 0.0);
        assert_eq!(empty.confidence(), 0.0);
        assert!(!empty.is_smiling());
        assert!(!empty.is_looking());
    }

    #[test]
    fn test_best_face_is_used() {
        let faces = [face(50.0, 0.0, 40.0), face(120.0, 0.95, 0.0)];
        let s = DisplayState::initial().next(&faces, &config());
        let readout = s.face().unwrap();
        assert_eq!(readout.bbox.width, 120.0);
        assert!(readout.is_smiling);
        assert!(readout.is_looking);
    }

    #[test]
    fn test_smile_boundary_is_not_smiling() {
        let s = DisplayState::initial().next(&[face(100.0, 0.7, 0.0)], &config());
        assert!(!s.is_smiling());
    }

    #[test]
    fn test_gaze_boundary_is_not_looking() {
        let s = DisplayState::initial().next(&[face(100.0, 0.0, 15.0)], &config());
        assert!(!s.is_looking());
    }

    #[test]
    fn test_status_line() {
        let s = DisplayState::initial().next(&[face(100.0, 0.9, 0.0)], &config());
        assert_eq!(
            s.status_line(&GenderLabels::default()),
            "looking: yes | gender: Male | confidence: 87% | age: 32 | smiling: yes | frames: 1"
        );
    }

    #[test]
    fn test_status_line_without_face() {
        assert_eq!(
            DisplayState::no_face(4).status_line(&GenderLabels::default()),
            "looking: no | gender: - | confidence: 0% | age: 0 | smiling: no | frames: 4"
        );
    }

    #[test]
    fn test_gender_labels_are_configurable() {
        let labels = GenderLabels {
            male: "Erkek".to_string(),
            female: "Kadın".to_string(),
        };
        assert_eq!(labels.label(Gender::Female), "Kadın");
    }
}
