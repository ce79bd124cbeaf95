pub mod camera_session;
pub mod camera_state;
pub mod detection_loop;
pub mod display_state;
pub mod snapshot;
