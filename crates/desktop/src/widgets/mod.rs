pub mod action_button;
pub mod overlay_canvas;
pub mod review_modal;
