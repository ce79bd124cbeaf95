//! Transparent canvas layered over the live video that paints the current
//! face: box, landmark dots, the age/gender caption and expression labels.

use iced::mouse;
use iced::widget::canvas::{self, Frame, Path, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};

use facelens_core::overlay::overlay_scene::{OverlayLabel, OverlayScene};
use facelens_core::session::display_state::{DisplayState, GenderLabels};

const BOX_WIDTH: f32 = 2.0;
const LANDMARK_RADIUS: f32 = 1.5;
const CAPTION_SIZE: f32 = 14.0;
const EXPRESSION_SIZE: f32 = 12.0;
const LABEL_PAD: f32 = 3.0;

const LOOKING_COLOR: Color = Color::from_rgb(0.0, 0.784, 0.325);
const AWAY_COLOR: Color = Color::from_rgb(1.0, 0.671, 0.0);
const LANDMARK_COLOR: Color = Color::from_rgb(0.0, 0.69, 1.0);
const LABEL_BACKGROUND: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.55);

pub struct FaceOverlay<'a> {
    pub display: &'a DisplayState,
    /// Source frame size the detections are expressed in.
    pub source: (u32, u32),
    pub labels: &'a GenderLabels,
    pub show_landmarks: bool,
    pub show_expressions: bool,
    pub font_scale: f32,
}

impl<Message> canvas::Program<Message> for FaceOverlay<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let video = fit_contain(bounds.size(), self.source);

        let scene = OverlayScene::build(
            self.display,
            self.source,
            (video.width as f64, video.height as f64),
            self.labels,
        );
        if let Some(scene) = scene {
            frame.translate(Vector::new(video.x, video.y));
            self.paint(&mut frame, &scene);
        }

        vec![frame.into_geometry()]
    }
}

impl FaceOverlay<'_> {
    fn paint(&self, frame: &mut Frame, scene: &OverlayScene) {
        let color = if scene.is_looking {
            LOOKING_COLOR
        } else {
            AWAY_COLOR
        };

        let bbox = &scene.bbox;
        frame.stroke(
            &Path::rectangle(
                Point::new(bbox.x as f32, bbox.y as f32),
                Size::new(bbox.width as f32, bbox.height as f32),
            ),
            Stroke::default().with_color(color).with_width(BOX_WIDTH),
        );

        if self.show_landmarks {
            for &(x, y) in &scene.landmarks {
                frame.fill(
                    &Path::circle(Point::new(x as f32, y as f32), LANDMARK_RADIUS),
                    LANDMARK_COLOR,
                );
            }
        }

        self.label(frame, &scene.caption, CAPTION_SIZE, color);
        if self.show_expressions {
            for label in &scene.expressions {
                self.label(frame, label, EXPRESSION_SIZE, Color::WHITE);
            }
        }
    }

    fn label(&self, frame: &mut Frame, label: &OverlayLabel, size: f32, color: Color) {
        let size = size * self.font_scale;
        // Rough advance width; exact text metrics are not available here.
        let width = label.text.chars().count() as f32 * size * 0.55 + LABEL_PAD * 2.0;
        let origin = Point::new(label.x as f32, label.y as f32);

        frame.fill_rectangle(origin, Size::new(width, size + LABEL_PAD), LABEL_BACKGROUND);
        frame.fill_text(Text {
            content: label.text.clone(),
            position: Point::new(origin.x + LABEL_PAD, origin.y + LABEL_PAD / 2.0),
            color,
            size: Pixels(size),
            ..Text::default()
        });
    }
}

/// Where an image of `source` size lands inside `bounds` when scaled to fit
/// while keeping its aspect ratio, centered. Matches `ContentFit::Contain`.
pub fn fit_contain(bounds: Size, source: (u32, u32)) -> Rectangle {
    if source.0 == 0 || source.1 == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Rectangle::new(Point::ORIGIN, Size::ZERO);
    }
    let scale = (bounds.width / source.0 as f32).min(bounds.height / source.1 as f32);
    let size = Size::new(source.0 as f32 * scale, source.1 as f32 * scale);
    Rectangle::new(
        Point::new(
            (bounds.width - size.width) / 2.0,
            (bounds.height - size.height) / 2.0,
        ),
        size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wider_bounds_pillarbox() {
        let r = fit_contain(Size::new(1000.0, 450.0), (1280, 720));
        assert_relative_eq!(r.height, 450.0);
        assert_relative_eq!(r.width, 800.0);
        assert_relative_eq!(r.x, 100.0);
        assert_relative_eq!(r.y, 0.0);
    }

    #[test]
    fn test_taller_bounds_letterbox() {
        let r = fit_contain(Size::new(640.0, 600.0), (1280, 720));
        assert_relative_eq!(r.width, 640.0);
        assert_relative_eq!(r.height, 360.0);
        assert_relative_eq!(r.y, 120.0);
    }

    #[test]
    fn test_degenerate_source_is_empty() {
        let r = fit_contain(Size::new(640.0, 480.0), (0, 480));
        assert_eq!(r.size(), Size::ZERO);
    }
}
