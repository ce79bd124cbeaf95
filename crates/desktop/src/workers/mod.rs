pub mod camera_worker;
pub mod inference_worker;
