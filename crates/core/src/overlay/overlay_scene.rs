//! Display-space geometry for the face overlay.
//!
//! Detection runs on source-frame pixels; the video is shown at whatever
//! size the window gives it. The scene holds everything a painter needs,
//! already scaled to the displayed size.

use crate::detection::domain::expressions::Expression;
use crate::session::display_state::{DisplayState, GenderLabels};
use crate::shared::bounding_box::BoundingBox;

/// Height reserved for the age/gender caption above the box.
pub const LABEL_HEIGHT: f64 = 20.0;

/// Line height of the expression list under the box.
pub const EXPRESSION_LINE_HEIGHT: f64 = 16.0;

/// Expressions below this probability are not listed.
pub const MIN_EXPRESSION_PROBABILITY: f64 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    /// Top-left corner in display pixels.
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayScene {
    pub bbox: BoundingBox,
    pub landmarks: Vec<(f64, f64)>,
    pub caption: OverlayLabel,
    pub expressions: Vec<OverlayLabel>,
    pub is_smiling: bool,
    pub is_looking: bool,
}

impl OverlayScene {
    /// `None` when there is no current face or either size is degenerate.
    pub fn build(
        display: &DisplayState,
        source: (u32, u32),
        target: (f64, f64),
        labels: &GenderLabels,
    ) -> Option<Self> {
        let face = display.face()?;
        if source.0 == 0 || source.1 == 0 || target.0 <= 0.0 || target.1 <= 0.0 {
            return None;
        }
        let sx = target.0 / source.0 as f64;
        let sy = target.1 / source.1 as f64;

        let bbox = face.bbox.scaled(sx, sy);
        let landmarks = face.landmarks.scaled(sx, sy).points().to_vec();

        let caption = OverlayLabel {
            text: format!(
                "{:.0} years · {}",
                face.age.round(),
                labels.label(face.gender)
            ),
            x: bbox.x,
            y: (bbox.y - LABEL_HEIGHT).max(0.0),
        };

        let expressions = face
            .expressions
            .ranked(MIN_EXPRESSION_PROBABILITY)
            .into_iter()
            .enumerate()
            .map(|(i, (expr, p))| OverlayLabel {
                text: expression_text(expr, p),
                x: bbox.x,
                y: bbox.bottom() + i as f64 * EXPRESSION_LINE_HEIGHT,
            })
            .collect();

        Some(Self {
            bbox,
            landmarks,
            caption,
            expressions,
            is_smiling: face.is_smiling,
            is_looking: face.is_looking,
        })
    }
}

fn expression_text(expression: Expression, probability: f64) -> String {
    format!("{expression} {:.0}%", probability * 100.0)
}
