pub mod accurate_face_locator;
pub mod age_gender_classifier;
pub mod execution_provider;
pub mod expression_classifier;
pub mod face_locator;
pub mod landmark_regressor;
pub mod onnx_face_analyzer;
mod tensor;
pub mod tiny_face_locator;
