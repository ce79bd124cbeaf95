use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::detection::domain::face_analyzer::DetectionOptions;
use crate::shared::constants::{
    ACCURATE_DETECTOR_MODEL_NAME, ACCURATE_DETECTOR_MODEL_URL, DEFAULT_DETECTION_INTERVAL,
    DEFAULT_GAZE_THRESHOLD_PX, DEFAULT_MAX_FACES, DEFAULT_MIN_CONFIDENCE, SMILE_THRESHOLD,
    TINY_DETECTOR_MODEL_NAME, TINY_DETECTOR_MODEL_URL,
};

/// Which face localization model feeds the analyzer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DetectorModel {
    /// Lightweight anchor-based detector; fast, fine for a single close subject.
    #[default]
    Tiny,
    /// Heavier single-shot detector; slower, steadier on small or turned faces.
    Accurate,
}

impl DetectorModel {
    pub const ALL: &[DetectorModel] = &[DetectorModel::Tiny, DetectorModel::Accurate];

    pub fn model_name(self) -> &'static str {
        match self {
            DetectorModel::Tiny => TINY_DETECTOR_MODEL_NAME,
            DetectorModel::Accurate => ACCURATE_DETECTOR_MODEL_NAME,
        }
    }

    pub fn model_url(self) -> &'static str {
        match self {
            DetectorModel::Tiny => TINY_DETECTOR_MODEL_URL,
            DetectorModel::Accurate => ACCURATE_DETECTOR_MODEL_URL,
        }
    }
}

impl fmt::Display for DetectorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorModel::Tiny => write!(f, "tiny"),
            DetectorModel::Accurate => write!(f, "accurate"),
        }
    }
}

impl FromStr for DetectorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(DetectorModel::Tiny),
            "accurate" => Ok(DetectorModel::Accurate),
            other => Err(format!(
                "Detector must be 'tiny' or 'accurate', got '{other}'"
            )),
        }
    }
}

/// Tunables shared by the live loop and snapshot analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub detector: DetectorModel,
    pub max_faces: usize,
    pub min_confidence: f64,
    pub smile_threshold: f64,
    pub gaze_threshold_px: f64,
    pub detection_interval: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detector: DetectorModel::default(),
            max_faces: DEFAULT_MAX_FACES,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            smile_threshold: SMILE_THRESHOLD,
            gaze_threshold_px: DEFAULT_GAZE_THRESHOLD_PX,
            detection_interval: DEFAULT_DETECTION_INTERVAL,
        }
    }
}

impl AnalysisConfig {
    pub fn detection_options(&self) -> DetectionOptions {
        DetectionOptions {
            max_faces: self.max_faces,
            min_confidence: self.min_confidence,
        }
    }
}
