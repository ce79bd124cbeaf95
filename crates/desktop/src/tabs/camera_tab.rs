use iced::border::Border;
use iced::widget::{canvas, column, container, image, progress_bar, row, stack, text, Space};
use iced::{Color, ContentFit, Element, Length, Theme};

use facelens_core::session::camera_session::CameraSession;
use facelens_core::session::camera_state::{CameraState, PrimaryAction};
use facelens_core::session::display_state::{DisplayState, GenderLabels};

use crate::app::{scaled, Message, ModelStatus, VideoFrame};
use crate::settings::Settings;
use crate::theme::{muted_color, surface_color};
use crate::widgets::action_button::{action_button, Tone};
use crate::widgets::overlay_canvas::FaceOverlay;

const VIDEO_HEIGHT: f32 = 360.0;
const PANEL_RADIUS: f32 = 10.0;

pub struct CameraView<'a> {
    pub session: &'a CameraSession,
    pub video: Option<&'a VideoFrame>,
    pub models: &'a ModelStatus,
    pub settings: &'a Settings,
    pub labels: &'a GenderLabels,
    /// A permission request or camera start is underway.
    pub busy: bool,
    pub primary_hovered: bool,
    pub stop_hovered: bool,
}

pub fn view<'a>(props: CameraView<'a>, theme: &Theme) -> Element<'a, Message> {
    let fs = props.settings.font_scale;

    let mut content = column![].spacing(12);
    if let Some(banner) = model_banner(props.models, fs, theme) {
        content = content.push(banner);
    }
    content
        .push(video_area(&props, theme))
        .push(controls(&props))
        .push(status_panel(props.session.display(), props.labels, fs, theme))
        .into()
}

fn model_banner<'a>(models: &ModelStatus, fs: f32, theme: &Theme) -> Option<Element<'a, Message>> {
    let palette = theme.extended_palette();
    match models {
        ModelStatus::Ready => None,
        ModelStatus::Loading { downloaded, total } => {
            let label = if *total > 0 {
                format!(
                    "Downloading face models... {:.0}%",
                    *downloaded as f32 / *total as f32 * 100.0
                )
            } else {
                "Loading face models...".to_string()
            };
            let progress = if *total > 0 {
                *downloaded as f32 / *total as f32
            } else {
                0.0
            };
            Some(
                column![
                    text(label).size(scaled(12.0, fs)),
                    progress_bar(0.0..=1.0, progress),
                ]
                .spacing(4)
                .into(),
            )
        }
        ModelStatus::Failed(error) => {
            let danger = palette.danger.base.color;
            Some(
                container(
                    column![
                        text("Face detection is unavailable")
                            .size(scaled(13.0, fs))
                            .color(danger),
                        text(error.clone()).size(scaled(12.0, fs)),
                        iced::widget::button(text("Retry").size(scaled(12.0, fs)))
                            .on_press(Message::RetryModels)
                            .padding([4, 12]),
                    ]
                    .spacing(4),
                )
                .padding(10)
                .width(Length::Fill)
                .style(move |_theme: &Theme| container::Style {
                    background: Some(Color { a: 0.1, ..danger }.into()),
                    border: Border {
                        radius: PANEL_RADIUS.into(),
                        ..Border::default()
                    },
                    ..container::Style::default()
                })
                .into(),
            )
        }
    }
}

fn video_area<'a>(props: &CameraView<'a>, theme: &Theme) -> Element<'a, Message> {
    let fs = props.settings.font_scale;
    let height = Length::Fixed(scaled(VIDEO_HEIGHT, fs));

    let inner: Element<'a, Message> = match props.video {
        Some(video) => {
            let picture = image(video.handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill);
            let overlay = canvas(FaceOverlay {
                display: props.session.display(),
                source: (video.width, video.height),
                labels: props.labels,
                show_landmarks: props.settings.show_landmarks,
                show_expressions: props.settings.show_expressions,
                font_scale: fs,
            })
            .width(Length::Fill)
            .height(Length::Fill);
            stack![picture, overlay].into()
        }
        None => container(
            text(placeholder(props.session.state(), props.busy))
                .size(scaled(13.0, fs))
                .color(muted_color(theme)),
        )
        .center(Length::Fill)
        .into(),
    };

    container(inner)
        .width(Length::Fill)
        .height(height)
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::BLACK.into()),
            border: Border {
                radius: PANEL_RADIUS.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

fn placeholder(state: CameraState, busy: bool) -> &'static str {
    match (state, busy) {
        (CameraState::NoPermission, true) => "Waiting for camera access...",
        (CameraState::NoPermission, false) => "Allow camera access to see live face details",
        (CameraState::PermissionGranted, true) => "Starting camera...",
        (CameraState::PermissionGranted, false) => "Camera is off",
        (CameraState::CameraActive, _) => "Waiting for the first frame...",
    }
}

fn controls<'a>(props: &CameraView<'a>) -> Element<'a, Message> {
    let fs = props.settings.font_scale;
    let action = props.session.primary_action();
    let on_press = (!props.busy).then_some(Message::PrimaryPressed);

    let mut buttons = row![action_button(
        action.label(),
        Tone::Primary,
        on_press,
        props.primary_hovered,
        Message::PrimaryHovered,
        fs,
    )]
    .spacing(12)
    .align_y(iced::Alignment::Center);

    if action == PrimaryAction::CapturePhoto {
        buttons = buttons.push(action_button(
            "Stop",
            Tone::Danger,
            Some(Message::StopPressed),
            props.stop_hovered,
            Message::StopHovered,
            fs,
        ));
    }

    container(buttons).center_x(Length::Fill).into()
}

fn status_panel<'a>(
    display: &DisplayState,
    labels: &GenderLabels,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let surface = surface_color(theme);

    let rows = status_rows(display, labels)
        .into_iter()
        .map(|(name, value)| {
            row![
                text(name).size(scaled(13.0, fs)).color(muted),
                Space::new().width(Length::Fill),
                text(value).size(scaled(13.0, fs)),
            ]
            .into()
        })
        .collect::<Vec<Element<'a, Message>>>();

    container(column(rows).spacing(6))
        .padding(12)
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                radius: PANEL_RADIUS.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}

fn status_rows(display: &DisplayState, labels: &GenderLabels) -> Vec<(&'static str, String)> {
    let face_value = |value: String| {
        if display.has_face() {
            value
        } else {
            "-".to_string()
        }
    };
    vec![
        ("Looking at camera", yes_no(display.is_looking())),
        (
            "Gender",
            display
                .gender()
                .map(|g| labels.label(g).to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Confidence",
            face_value(format!("{:.0}%", display.confidence() * 100.0)),
        ),
        ("Age", face_value(format!("{:.0}", display.age().round()))),
        ("Smiling", yes_no(display.is_smiling())),
        ("Frames with face", display.frames_with_face().to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelens_core::detection::domain::analysis_config::AnalysisConfig;
    use facelens_core::detection::domain::expressions::{Expression, Expressions};
    use facelens_core::detection::domain::face_analysis::{FaceAnalysis, Gender};
    use facelens_core::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
    use facelens_core::shared::bounding_box::BoundingBox;

    fn value<'a>(rows: &'a [(&'static str, String)], name: &str) -> &'a str {
        rows.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_rows_without_face() {
        let rows = status_rows(&DisplayState::initial(), &GenderLabels::default());
        assert_eq!(value(&rows, "Gender"), "-");
        assert_eq!(value(&rows, "Age"), "-");
        assert_eq!(value(&rows, "Smiling"), "No");
        assert_eq!(value(&rows, "Frames with face"), "0");
    }

    #[test]
    fn test_rows_with_face() {
        let face = FaceAnalysis {
            bbox: BoundingBox::new(0.0, 0.0, 50.0, 50.0),
            score: 0.934,
            landmarks: FaceLandmarks::new(vec![(25.0, 25.0); LANDMARK_COUNT]).unwrap(),
            age: 41.6,
            gender: Gender::Male,
            gender_probability: 0.9,
            expressions: Expressions::from_pairs([(Expression::Happy, 0.9)]),
        };
        let display = DisplayState::initial().next(&[face], &AnalysisConfig::default());
        let rows = status_rows(&display, &GenderLabels::default());

        assert_eq!(value(&rows, "Gender"), "Male");
        assert_eq!(value(&rows, "Confidence"), "93%");
        assert_eq!(value(&rows, "Age"), "42");
        assert_eq!(value(&rows, "Smiling"), "Yes");
        assert_eq!(value(&rows, "Looking at camera"), "Yes");
        assert_eq!(value(&rows, "Frames with face"), "1");
    }

    #[test]
    fn test_placeholder_follows_state() {
        assert_eq!(placeholder(CameraState::PermissionGranted, false), "Camera is off");
        assert_eq!(
            placeholder(CameraState::PermissionGranted, true),
            "Starting camera..."
        );
    }
}
