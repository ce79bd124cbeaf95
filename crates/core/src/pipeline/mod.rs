pub mod analyze_image_use_case;
pub mod live_session_use_case;
