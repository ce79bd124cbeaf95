use std::time::Duration;

pub const TINY_DETECTOR_MODEL_NAME: &str = "face_detection_tiny.onnx";
pub const TINY_DETECTOR_MODEL_URL: &str =
    "https://github.com/facelens/facelens/releases/download/models-v1/face_detection_tiny.onnx";

pub const ACCURATE_DETECTOR_MODEL_NAME: &str = "face_detection_accurate.onnx";
pub const ACCURATE_DETECTOR_MODEL_URL: &str =
    "https://github.com/facelens/facelens/releases/download/models-v1/face_detection_accurate.onnx";

pub const LANDMARK_MODEL_NAME: &str = "face_landmark_68.onnx";
pub const LANDMARK_MODEL_URL: &str =
    "https://github.com/facelens/facelens/releases/download/models-v1/face_landmark_68.onnx";

pub const AGE_GENDER_MODEL_NAME: &str = "age_gender.onnx";
pub const AGE_GENDER_MODEL_URL: &str =
    "https://github.com/facelens/facelens/releases/download/models-v1/age_gender.onnx";

pub const EXPRESSION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EXPRESSION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/5faef4c33eba0395177850e1e31c4a6a9e634c82/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

/// Static directory (relative to the working directory) holding bundled models.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Minimum time between two live inference launches.
pub const DEFAULT_DETECTION_INTERVAL: Duration = Duration::from_millis(500);

pub const DEFAULT_MAX_FACES: usize = 5;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Happy probability must strictly exceed this to count as smiling.
pub const SMILE_THRESHOLD: f64 = 0.7;

/// Eye-center/nose-tip horizontal offset (px) below which the subject
/// counts as looking at the camera. Tuned at ~1280x720 and arm's length.
pub const DEFAULT_GAZE_THRESHOLD_PX: f64 = 15.0;
pub const MIN_GAZE_THRESHOLD_PX: f64 = 15.0;
pub const MAX_GAZE_THRESHOLD_PX: f64 = 18.0;

pub const IDEAL_CAPTURE_WIDTH: u32 = 1280;
pub const IDEAL_CAPTURE_HEIGHT: u32 = 720;
pub const IDEAL_CAPTURE_FPS: u32 = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
