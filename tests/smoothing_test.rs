//! Tests for temporal smoothing of estimated poses


use eyewear_tryon::{
    config::PlacementConfig,
    filters::{adaptive::AdaptiveSmoother, create_filter, TransformFilter},
    landmarks::FaceLandmarks,
    pose_estimation::PoseEstimator,
    synthetic::SyntheticFace,
};
use rand::{rngs::StdRng, SeedableRng};

/// Sum of squared frame-to-frame position changes
fn roughness(positions: &[nalgebra::Point3<f64>]) -> f64 {
    positions
        .windows(2)
        .map(|w| nalgebra::distance_squared(&w[0], &w[1]))
        .sum()
}

#[test]
fn test_smoothing_reduces_landmark_jitter() {
    let face = SyntheticFace::frontal(640, 480);
    let estimator = PoseEstimator::new(PlacementConfig::default());
    let mut rng = StdRng::seed_from_u64(11);
    let mut smoother = AdaptiveSmoother::default();

    let mut raw = Vec::new();
    let mut filtered = Vec::new();
    for _ in 0..200 {
        let set = face.landmarks_with_noise(&mut rng, 1.5);
        let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = estimator.estimate(&landmarks, None).unwrap();
        raw.push(pose.transform.position);
        filtered.push(smoother.apply(&pose.transform).transform.position);
    }

    assert!(roughness(&filtered) < 0.5 * roughness(&raw));
}

#[test]
fn test_fast_motion_is_followed() {
    let estimator = PoseEstimator::new(PlacementConfig::default());
    let mut smoother = AdaptiveSmoother::default();
    let mut slow = AdaptiveSmoother::default();

    let mut last_fast = None;
    let mut last_slow = None;
    for i in 0..8 {
        let face = SyntheticFace::frontal(640, 480).with_offset(f64::from(i) * 40.0, 0.0);
        let set = face.landmarks();
        let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = estimator.estimate(&landmarks, None).unwrap();
        last_fast = Some(smoother.apply(&pose.transform));

        let still = SyntheticFace::frontal(640, 480).with_offset(f64::from(i) * 0.5, 0.0);
        let set = still.landmarks();
        let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = estimator.estimate(&landmarks, None).unwrap();
        last_slow = Some(slow.apply(&pose.transform));
    }

    let (fast, slow) = (last_fast.unwrap(), last_slow.unwrap());
    assert_eq!(fast.position_blend, smoother.config().position.max);
    assert!(fast.position_blend > slow.position_blend);
}

#[test]
fn test_pass_through_filter_keeps_raw_pose() {
    let mut filter = create_filter("none").unwrap();
    let pose = test_helpers::estimate(
        &SyntheticFace::frontal(640, 480).with_yaw(12.0),
        PlacementConfig::default(),
    )
    .unwrap();

    filter.apply(&pose.transform);
    let step = filter.apply(&pose.transform);
    assert!(step.snapped);
    assert_eq!(step.transform, pose.transform);
}
