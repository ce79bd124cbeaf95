/// Face analyzer composed of ONNX Runtime stages: a face locator, then a
/// landmark regressor, an age/gender estimator and an expression classifier
/// run on every located face.
use crate::detection::domain::analysis_config::DetectorModel;
use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::detection::domain::face_analyzer::{DetectionOptions, FaceAnalyzer};
use crate::shared::frame::Frame;
use crate::shared::model_resolver::ModelPaths;

use super::accurate_face_locator::AccurateFaceLocator;
use super::age_gender_classifier::AgeGenderClassifier;
use super::expression_classifier::ExpressionClassifier;
use super::face_locator::{Candidate, FaceLocator};
use super::landmark_regressor::LandmarkRegressor;
use super::tiny_face_locator::TinyFaceLocator;

pub struct OnnxFaceAnalyzer {
    locator: Box<dyn FaceLocator>,
    landmarks: LandmarkRegressor,
    age_gender: AgeGenderClassifier,
    expressions: ExpressionClassifier,
}

impl OnnxFaceAnalyzer {
    /// Load every stage. Only the locator for `detector` is loaded.
    pub fn load(
        paths: &ModelPaths,
        detector: DetectorModel,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let locator: Box<dyn FaceLocator> = match detector {
            DetectorModel::Tiny => Box::new(TinyFaceLocator::new(&paths.detector)?),
            DetectorModel::Accurate => Box::new(AccurateFaceLocator::new(&paths.detector)?),
        };
        log::info!("Face analyzer ready ({detector} detector)");
        Ok(Self {
            locator,
            landmarks: LandmarkRegressor::new(&paths.landmarks)?,
            age_gender: AgeGenderClassifier::new(&paths.age_gender)?,
            expressions: ExpressionClassifier::new(&paths.expressions)?,
        })
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(
        &mut self,
        frame: &Frame,
        options: &DetectionOptions,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.locator.locate(frame, options.min_confidence)?;
        let candidates = limit_candidates(candidates, options);

        let mut faces = Vec::with_capacity(candidates.len());
        for cand in candidates {
            let landmarks = self.landmarks.regress(frame, &cand.bbox)?;
            let age_gender = self.age_gender.classify(frame, &cand.bbox)?;
            let expressions = self.expressions.classify(frame, &cand.bbox)?;
            faces.push(FaceAnalysis {
                bbox: cand.bbox,
                score: cand.score,
                landmarks,
                age: age_gender.age,
                gender: age_gender.gender,
                gender_probability: age_gender.gender_probability,
                expressions,
            });
        }
        Ok(faces)
    }
}

/// Keep the `max_faces` most confident candidates at or above the
/// confidence floor.
fn limit_candidates(mut candidates: Vec<Candidate>, options: &DetectionOptions) -> Vec<Candidate> {
    candidates.retain(|c| c.score >= options.min_confidence);
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(options.max_faces);
    candidates
}
