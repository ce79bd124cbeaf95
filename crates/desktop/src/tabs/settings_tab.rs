use std::fmt;

use iced::widget::{button, checkbox, column, pick_list, row, slider, text, Space};
use iced::Element;

use facelens_core::camera::domain::camera_source::CameraInfo;
use facelens_core::detection::domain::analysis_config::DetectorModel;
use facelens_core::shared::constants::{MAX_GAZE_THRESHOLD_PX, MIN_GAZE_THRESHOLD_PX};

use crate::app::{scaled, Message};
use crate::settings::Settings;

/// Pick-list entry for a capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraChoice {
    pub index: u32,
    pub name: String,
}

impl fmt::Display for CameraChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index, self.name)
    }
}

pub fn choices(cameras: &[CameraInfo], selected: u32) -> Vec<CameraChoice> {
    let mut list: Vec<CameraChoice> = cameras
        .iter()
        .map(|c| CameraChoice {
            index: c.index,
            name: c.name.clone(),
        })
        .collect();
    // Keep a saved device selectable even when it is currently unplugged.
    if !list.iter().any(|c| c.index == selected) {
        list.insert(
            0,
            CameraChoice {
                index: selected,
                name: "Unavailable".to_string(),
            },
        );
    }
    list
}

pub fn view<'a>(settings: &Settings, cameras: &[CameraInfo]) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let camera_choices = choices(cameras, settings.camera_index);
    let selected = camera_choices
        .iter()
        .find(|c| c.index == settings.camera_index)
        .cloned();

    column![
        text("Camera").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Device").size(scaled(13.0, fs)),
            pick_list(camera_choices, selected, Message::CameraSelected)
                .text_size(scaled(13.0, fs)),
            button(text("Refresh").size(scaled(13.0, fs)))
                .on_press(Message::RefreshCameras)
                .style(button::text),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        text("Takes effect the next time the camera starts.").size(scaled(11.0, fs)),
        Space::new().height(20),
        text("Detection").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Face detector").size(scaled(13.0, fs)),
            pick_list(DetectorModel::ALL, Some(settings.detector), Message::DetectorChanged)
                .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        text(format!("Minimum confidence: {}%", settings.confidence)).size(scaled(13.0, fs)),
        slider(10..=95, settings.confidence, Message::ConfidenceChanged).step(5u32),
        Space::new().height(12),
        text(format!(
            "Looking-at-camera tolerance: {} px",
            settings.gaze_threshold
        ))
        .size(scaled(13.0, fs)),
        slider(
            MIN_GAZE_THRESHOLD_PX as u32..=MAX_GAZE_THRESHOLD_PX as u32,
            settings.gaze_threshold,
            Message::GazeThresholdChanged,
        ),
        Space::new().height(20),
        text("Overlay").size(scaled(16.0, fs)),
        Space::new().height(8),
        checkbox(settings.show_landmarks)
            .label("Show facial landmarks")
            .on_toggle(Message::ShowLandmarksChanged)
            .text_size(scaled(13.0, fs)),
        checkbox(settings.show_expressions)
            .label("Show expression scores")
            .on_toggle(Message::ShowExpressionsChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(20),
        button(text("Restore Defaults").size(scaled(13.0, fs)))
            .on_press(Message::RestoreDefaults)
            .style(button::secondary)
            .padding([6, 14]),
    ]
    .spacing(4)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(index: u32, name: &str) -> CameraInfo {
        CameraInfo {
            index,
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_choices_list_devices() {
        let list = choices(&[info(0, "Built-in"), info(1, "USB")], 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].to_string(), "1: USB");
    }

    #[test]
    fn test_missing_saved_device_stays_selectable() {
        let list = choices(&[info(0, "Built-in")], 3);
        assert_eq!(list[0].index, 3);
        assert_eq!(list[0].name, "Unavailable");
        assert_eq!(list.len(), 2);
    }
}
