//! 68-point face landmarks (iBUG 300-W / Multi-PIE layout) and the frontal
//! gaze heuristic built on them.
//!
//! The heuristic compares the horizontal position of the nose tip with the
//! midpoint of the two outer eye corners. It is a pixel threshold, not a
//! gaze model: it only holds near the distance and resolution it was tuned
//! at, and it is not scale-invariant.

pub const LANDMARK_COUNT: usize = 68;

/// Outer corner of the subject's right eye (image left).
pub const LEFT_EYE_OUTER: usize = 36;
/// Outer corner of the subject's left eye (image right).
pub const RIGHT_EYE_OUTER: usize = 45;
pub const NOSE_TIP: usize = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<(f64, f64)>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, &'static str> {
        if points.len() != LANDMARK_COUNT {
            return Err("Face landmarks must have exactly 68 points");
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn eye_center_x(&self) -> f64 {
        (self.points[LEFT_EYE_OUTER].0 + self.points[RIGHT_EYE_OUTER].0) / 2.0
    }

    pub fn nose_tip_x(&self) -> f64 {
        self.points[NOSE_TIP].0
    }

    /// Absolute horizontal distance (px) between eye center and nose tip.
    pub fn gaze_offset(&self) -> f64 {
        (self.eye_center_x() - self.nose_tip_x()).abs()
    }

    /// Strictly below `threshold_px`; the boundary itself does not count.
    pub fn is_looking(&self, threshold_px: f64) -> bool {
        self.gaze_offset() < threshold_px
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            points: self.points.iter().map(|&(x, y)| (x * sx, y * sy)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Frontal face: eyes at 440/560, nose tip at `nose_x`.
    fn landmarks_with_nose(nose_x: f64) -> FaceLandmarks {
        let mut pts = vec![(500.0, 400.0); LANDMARK_COUNT];
        pts[LEFT_EYE_OUTER] = (440.0, 350.0);
        pts[RIGHT_EYE_OUTER] = (560.0, 350.0);
        pts[NOSE_TIP] = (nose_x, 420.0);
        FaceLandmarks::new(pts).unwrap()
    }

    #[test]
    fn test_rejects_wrong_point_count() {
        assert!(FaceLandmarks::new(vec![(0.0, 0.0); 5]).is_err());
        assert!(FaceLandmarks::new(vec![(0.0, 0.0); 69]).is_err());
    }

    #[test]
    fn test_eye_center_is_midpoint_of_outer_corners() {
        assert_relative_eq!(landmarks_with_nose(500.0).eye_center_x(), 500.0);
    }

    #[test]
    fn test_gaze_offset_frontal() {
        assert_relative_eq!(landmarks_with_nose(500.0).gaze_offset(), 0.0);
    }

    #[test]
    fn test_gaze_offset_is_absolute() {
        assert_relative_eq!(landmarks_with_nose(480.0).gaze_offset(), 20.0);
        assert_relative_eq!(landmarks_with_nose(520.0).gaze_offset(), 20.0);
    }

    #[rstest]
    #[case::frontal(500.0, true)]
    #[case::just_inside(514.9, true)]
    #[case::exactly_threshold(515.0, false)]
    #[case::exactly_threshold_other_side(485.0, false)]
    #[case::turned(540.0, false)]
    fn test_is_looking_is_strict(#[case] nose_x: f64, #[case] expected: bool) {
        assert_eq!(landmarks_with_nose(nose_x).is_looking(15.0), expected);
    }

    #[test]
    fn test_larger_threshold_accepts_more_turn() {
        let lm = landmarks_with_nose(517.0);
        assert!(!lm.is_looking(15.0));
        assert!(lm.is_looking(18.0));
    }

    #[test]
    fn test_scaled() {
        let lm = landmarks_with_nose(500.0).scaled(0.5, 2.0);
        assert_eq!(lm.points()[NOSE_TIP], (250.0, 840.0));
        assert_relative_eq!(lm.eye_center_x(), 250.0);
    }
}
