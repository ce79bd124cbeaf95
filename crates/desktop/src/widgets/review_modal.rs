use iced::border::Border;
use iced::widget::{button, center, column, container, image, mouse_area, opaque, row, stack, text};
use iced::{Color, ContentFit, Element, Length, Theme};

use facelens_core::session::display_state::GenderLabels;
use facelens_core::session::snapshot::{Review, ReviewAnalysis, SnapshotReport};

use crate::app::{scaled, Message};

const CARD_WIDTH: f32 = 460.0;
const PHOTO_HEIGHT: f32 = 260.0;
const CORNER_RADIUS: f32 = 12.0;
const BACKDROP: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.6);

/// Lays the captured-photo review over `base`. Clicking the backdrop closes
/// it, like the Close button.
pub fn review_modal<'a>(
    base: Element<'a, Message>,
    review: &Review,
    photo: &image::Handle,
    labels: &GenderLabels,
    fs: f32,
) -> Element<'a, Message> {
    let lines = report_lines(&review.analysis, labels)
        .into_iter()
        .map(|line| text(line).size(scaled(13.0, fs)).into())
        .collect::<Vec<Element<'a, Message>>>();

    let card = container(
        column![
            text("Photo").size(scaled(16.0, fs)),
            image(photo.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(scaled(PHOTO_HEIGHT, fs)),
            column(lines).spacing(4),
            row![
                button(text("Save Photo...").size(scaled(13.0, fs)))
                    .on_press(Message::SavePhoto)
                    .style(button::secondary)
                    .padding([6, 14]),
                button(text("Close").size(scaled(13.0, fs)))
                    .on_press(Message::CloseReview)
                    .style(button::primary)
                    .padding([6, 14]),
            ]
            .spacing(8),
        ]
        .spacing(12),
    )
    .width(CARD_WIDTH)
    .padding(20)
    .style(|theme: &Theme| container::Style {
        background: Some(theme.palette().background.into()),
        border: Border {
            radius: CORNER_RADIUS.into(),
            ..Border::default()
        },
        ..container::Style::default()
    });

    let backdrop = mouse_area(center(opaque(card)).style(|_theme: &Theme| container::Style {
        background: Some(BACKDROP.into()),
        ..container::Style::default()
    }))
    .on_press(Message::CloseReview);

    stack![base, opaque(backdrop)].into()
}

fn report_lines(analysis: &ReviewAnalysis, labels: &GenderLabels) -> Vec<String> {
    match analysis {
        ReviewAnalysis::Pending => vec!["Analyzing...".to_string()],
        ReviewAnalysis::Failed(error) => vec![format!("Analysis failed: {error}")],
        ReviewAnalysis::Ready(SnapshotReport::NoFace) => vec!["No face found".to_string()],
        ReviewAnalysis::Ready(SnapshotReport::Face {
            age,
            gender,
            is_smiling,
            confidence,
        }) => vec![
            format!("Age: {:.0}", age.round()),
            format!("Gender: {}", labels.label(*gender)),
            format!("Smiling: {}", if *is_smiling { "Yes" } else { "No" }),
            format!("Confidence: {:.0}%", confidence * 100.0),
        ],
    }
}
