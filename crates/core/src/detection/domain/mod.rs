pub mod analysis_config;
pub mod best_face;
pub mod expressions;
pub mod face_analysis;
pub mod face_analyzer;
pub mod face_landmarks;
