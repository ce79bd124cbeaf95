use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use facelens_core::detection::domain::analysis_config::{AnalysisConfig, DetectorModel};
use facelens_core::shared::constants::{
    DEFAULT_GAZE_THRESHOLD_PX, DEFAULT_MIN_CONFIDENCE, MAX_GAZE_THRESHOLD_PX, MIN_GAZE_THRESHOLD_PX,
};
use facelens_core::shared::model_resolver::ModelSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorModel,
    /// Minimum detection confidence in percent.
    pub confidence: u32,
    /// Eye/nose offset in pixels below which the subject counts as looking.
    pub gaze_threshold: u32,
    pub camera_index: u32,
    pub show_landmarks: bool,
    pub show_expressions: bool,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
    /// Directory of bundled model files; next to the executable when unset.
    pub models_dir: Option<PathBuf>,
    /// Mirror serving every model as `{model_base_url}/{file name}`.
    pub model_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detector: DetectorModel::Tiny,
            confidence: (DEFAULT_MIN_CONFIDENCE * 100.0).round() as u32,
            gaze_threshold: DEFAULT_GAZE_THRESHOLD_PX as u32,
            camera_index: 0,
            show_landmarks: true,
            show_expressions: true,
            appearance: Appearance::System,
            high_contrast: false,
            font_scale: 1.0,
            models_dir: None,
            model_base_url: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceLens").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Reads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable. Out-of-range values are clamped.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str::<Settings>(&json).ok())
            .map(Settings::sanitized)
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// Resets the detection tunables, keeping appearance and camera choice.
    pub fn restore_detection_defaults(&mut self) {
        let defaults = Settings::default();
        self.detector = defaults.detector;
        self.confidence = defaults.confidence;
        self.gaze_threshold = defaults.gaze_threshold;
        self.show_landmarks = defaults.show_landmarks;
        self.show_expressions = defaults.show_expressions;
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            detector: self.detector,
            min_confidence: self.confidence as f64 / 100.0,
            gaze_threshold_px: self.gaze_threshold as f64,
            ..AnalysisConfig::default()
        }
    }

    pub fn model_source(&self) -> ModelSource {
        let mut source = ModelSource::beside_executable();
        if let Some(dir) = &self.models_dir {
            source.models_dir = dir.clone();
        }
        source.base_url = self.model_base_url.clone();
        source
    }

    fn sanitized(mut self) -> Self {
        self.confidence = self.confidence.clamp(1, 100);
        self.gaze_threshold = self
            .gaze_threshold
            .clamp(MIN_GAZE_THRESHOLD_PX as u32, MAX_GAZE_THRESHOLD_PX as u32);
        self.font_scale = self.font_scale.clamp(0.8, 1.5);
        self.model_base_url = self
            .model_base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }
}
