//! Live face attribute detection: camera session workflow, a gated
//! detection loop, derived smile/gaze heuristics and overlay geometry.
//!
//! Inference itself is delegated to pretrained models behind the
//! [`detection::domain::face_analyzer::FaceAnalyzer`] trait.

pub mod camera;
pub mod detection;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod shared;
