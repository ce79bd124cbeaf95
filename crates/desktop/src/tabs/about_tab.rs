use iced::widget::{column, text, Space};
use iced::Element;

use facelens_core::shared::constants::{DEFAULT_MODELS_DIR, EXPRESSION_MODEL_URL};

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    column![
        text("FaceLens").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "FaceLens estimates age and gender, spots a smile and tells whether \
             the person in front of the camera is looking at it. Estimates \
             come from pretrained models and can be wrong."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Your camera stays on your device").size(scaled(16.0, fs)),
        Space::new().height(8),
        text(
            "Video frames are analyzed locally and never leave this computer. \
             Photos are only written to disk when you save them."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(20),
        text("Models").size(scaled(16.0, fs)),
        Space::new().height(8),
        text(format!(
            "Model files are read from the user cache or the \"{DEFAULT_MODELS_DIR}\" \
             folder next to the app. The expression model is fetched once from \
             {EXPRESSION_MODEL_URL}"
        ))
        .size(scaled(13.0, fs)),
    ]
    .spacing(0)
    .into()
}
