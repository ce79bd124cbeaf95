use crate::detection::domain::face_analysis::FaceAnalysis;

/// The face with the largest bounding-box area.
///
/// Ties keep the earliest candidate, so the result only depends on the
/// analyzer's output order when areas are exactly equal.
pub fn select_best(faces: &[FaceAnalysis]) -> Option<&FaceAnalysis> {
    let mut best: Option<&FaceAnalysis> = None;
    for face in faces {
        match best {
            Some(b) if face.bbox.area() <= b.bbox.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expressions::Expressions;
    use crate::detection::domain::face_analysis::Gender;
    use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
    use crate::shared::bounding_box::BoundingBox;
    use rstest::rstest;

    fn face(width: f64, height: f64, age: f64) -> FaceAnalysis {
        FaceAnalysis {
            bbox: BoundingBox::new(0.0, 0.0, width, height),
            score: 0.9,
            landmarks: FaceLandmarks::new(vec![(0.0, 0.0); LANDMARK_COUNT]).unwrap(),
            age,
            gender: Gender::Female,
            gender_probability: 0.9,
            expressions: Expressions::default(),
        }
    }

    #[test]
    fn test_empty_has_no_best() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_single_face_is_best() {
        let faces = vec![face(10.0, 10.0, 30.0)];
        assert_eq!(select_best(&faces).unwrap().age, 30.0);
    }

    #[rstest]
    #[case::small_first(vec![face(10.0, 10.0, 1.0), face(10.0, 20.0, 2.0)])]
    #[case::large_first(vec![face(10.0, 20.0, 2.0), face(10.0, 10.0, 1.0)])]
    fn test_largest_area_wins_regardless_of_order(#[case] faces: Vec<FaceAnalysis>) {
        // areas 100 and 200
        assert_eq!(select_best(&faces).unwrap().age, 2.0);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let faces = vec![
            face(20.0, 10.0, 1.0),
            face(10.0, 20.0, 2.0),
            face(5.0, 5.0, 3.0),
        ];
        assert_eq!(select_best(&faces).unwrap().age, 1.0);
    }
}
