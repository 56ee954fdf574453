use approx::assert_abs_diff_eq;
use phonalyzer::acoustics::{FrameAxis, Intensity};
use phonalyzer::annotation::{AnnotationTier, Interval, Point};
use phonalyzer::features::{landmark_features, locate_landmarks, RATIO_KEYS};

/// Frames every 10 ms from 5 ms on, each frame's value is `50 + frame`.
fn ramp_intensity() -> Intensity {
    let values = (0..100).map(|frame| 50.0 + frame as f64).collect();
    Intensity::from_values(FrameAxis::new(0.005, 0.01, 100), values)
}

fn tier(points: &[(f64, &str)]) -> AnnotationTier {
    AnnotationTier::Point {
        name: "landmarks".into(),
        points: points
            .iter()
            .map(|&(time, mark)| Point {
                time,
                mark: mark.to_string(),
            })
            .collect(),
    }
}

#[test]
fn samples_recording_intensity_at_each_landmark() {
    let landmarks = locate_landmarks(
        &ramp_intensity(),
        &tier(&[(0.105, "p1"), (0.205, "v"), (0.305, "p2")]),
        0.1,
        0.3,
        0.2,
    );
    assert_abs_diff_eq!(landmarks.p1.unwrap(), 60.0, epsilon = 1e-9);
    assert_abs_diff_eq!(landmarks.v.unwrap(), 70.0, epsilon = 1e-9);
    assert_abs_diff_eq!(landmarks.p2.unwrap(), 80.0, epsilon = 1e-9);
}

#[test]
fn tolerance_is_strict_and_marks_must_match() {
    let landmarks = locate_landmarks(
        &ramp_intensity(),
        &tier(&[(0.35, "p1"), (0.2, "V"), (0.3, "p2")]),
        0.1,
        0.3,
        0.2,
    );
    assert_eq!(landmarks.p1, None);
    assert_eq!(landmarks.v, None);
    assert!(landmarks.p2.is_some());
}

#[test]
fn later_matching_point_wins() {
    let landmarks = locate_landmarks(
        &ramp_intensity(),
        &tier(&[(0.105, "v"), (0.255, "v")]),
        0.1,
        0.3,
        0.2,
    );
    assert_abs_diff_eq!(landmarks.v.unwrap(), 75.0, epsilon = 1e-9);
}

#[test]
fn points_outside_the_contour_do_not_match() {
    let landmarks = locate_landmarks(
        &ramp_intensity(),
        &tier(&[(1.2, "p2")]),
        0.9,
        1.1,
        0.2,
    );
    assert_eq!(landmarks.p2, None);
}

#[test]
fn interval_tier_yields_no_landmarks() {
    let intervals = AnnotationTier::Interval {
        name: "landmarks".into(),
        intervals: vec![Interval {
            start: 0.0,
            end: 1.0,
            text: "p1".into(),
        }],
    };
    let landmarks = locate_landmarks(&ramp_intensity(), &intervals, 0.1, 0.3, 0.2);
    let group = landmark_features(&landmarks);
    assert!(group.iter().all(|(_, value)| value == 0.0));
    assert_eq!(group.len(), 3 + RATIO_KEYS.len());
}

#[test]
fn complete_landmarks_give_ratios() {
    let landmarks = locate_landmarks(
        &ramp_intensity(),
        &tier(&[(0.105, "p1"), (0.205, "v"), (0.305, "p2")]),
        0.1,
        0.3,
        0.2,
    );
    let group = landmark_features(&landmarks);
    assert_abs_diff_eq!(group.get("mean_intensity_ratio").unwrap(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(group.get("max_contrast").unwrap(), 70.0 / 60.0, epsilon = 1e-9);
    assert_abs_diff_eq!(group.get("mean_log_ratio").unwrap(), 0.0, epsilon = 1e-9);
    assert_eq!(group.get("v_intensity"), Some(landmarks.v.unwrap()));
}
