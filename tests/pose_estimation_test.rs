//! Tests for landmark-based pose estimation


use approx::assert_relative_eq;
use eyewear_tryon::{
    config::{FacingCorrection, PlacementConfig},
    filters::{adaptive::AdaptiveSmoother, TransformFilter},
    landmarks::FaceLandmarks,
    pose_estimation::PoseEstimator,
    synthetic::SyntheticFace,
};
use nalgebra::UnitQuaternion;
use proptest::prelude::*;
use test_helpers::{estimate, unit_scale_placement};

fn any_face() -> impl Strategy<Value = SyntheticFace> {
    (
        -45.0..45.0f64,
        -25.0..25.0f64,
        -40.0..40.0f64,
        0.6..1.6f64,
        -120.0..120.0f64,
        -80.0..80.0f64,
    )
        .prop_map(|(yaw, pitch, roll, size, dx, dy)| {
            SyntheticFace::frontal(640, 480)
                .with_yaw(yaw)
                .with_pitch(pitch)
                .with_roll(roll)
                .with_scale(size)
                .with_offset(dx, dy)
        })
}

proptest! {
    #[test]
    fn basis_is_orthonormal(face in any_face()) {
        let pose = estimate(&face, PlacementConfig::default()).unwrap();
        prop_assert!(pose.basis.orthonormality_error() < 1e-9);
        prop_assert!(pose.transform.is_valid());
    }

    #[test]
    fn estimation_is_idempotent(face in any_face()) {
        let first = estimate(&face, PlacementConfig::default()).unwrap();
        let second = estimate(&face, PlacementConfig::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn orientation_follows_head_rotation(face in any_face()) {
        let pose = estimate(&face, unit_scale_placement()).unwrap();
        let expected = UnitQuaternion::from_rotation_matrix(&face.rotation());
        prop_assert!(pose.transform.orientation.angle_to(&expected) < 1e-4);
    }

    #[test]
    fn scale_tracks_face_size_under_roll(roll in -60.0..60.0f64, size in 0.5..2.0f64) {
        let face = SyntheticFace::frontal(640, 480).with_roll(roll).with_scale(size);
        let pose = estimate(&face, unit_scale_placement()).unwrap();
        prop_assert!((pose.transform.scale.x - size).abs() < 1e-4);
    }
}

#[test]
fn test_canonical_face_is_identity_at_unit_scale() {
    let pose = estimate(&SyntheticFace::frontal(640, 480), unit_scale_placement()).unwrap();

    assert!(pose.transform.orientation.angle() < 1e-5);
    assert_relative_eq!(pose.transform.scale.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(pose.transform.scale.y, 1.0, epsilon = 1e-5);
    assert_relative_eq!(pose.transform.scale.z, 1.0, epsilon = 1e-5);
}

#[test]
fn test_roll_drives_rotation_blend() {
    let mut smoother = AdaptiveSmoother::default();
    let upright = estimate(&SyntheticFace::frontal(640, 480), PlacementConfig::default()).unwrap();
    let rolled = estimate(
        &SyntheticFace::frontal(640, 480).with_roll(10.0),
        PlacementConfig::default(),
    )
    .unwrap();

    smoother.apply(&upright.transform);
    let step = smoother.apply(&rolled.transform);

    assert!(step.angle_delta > 0.0);
    assert_relative_eq!(step.angle_delta, 10f64.to_radians(), epsilon = 1e-4);
    assert!(step.rotation_blend > smoother.config().rotation.min);
}

#[test]
fn test_scale_is_stable_under_yaw() {
    let frontal = estimate(&SyntheticFace::frontal(640, 480), unit_scale_placement()).unwrap();
    let turned = estimate(&SyntheticFace::frontal(640, 480).with_yaw(35.0), unit_scale_placement()).unwrap();

    // Measurements include depth, so turning the head does not shrink them
    assert_relative_eq!(
        turned.measurements.face_width(),
        frontal.measurements.face_width(),
        epsilon = 1e-3
    );
    assert_relative_eq!(turned.transform.scale.x, frontal.transform.scale.x, epsilon = 1e-5);
}

#[test]
fn test_fixed_sign_facing_on_turned_face() {
    let face = SyntheticFace::frontal(640, 480).with_yaw(-30.0).with_pitch(10.0);
    let set = face.landmarks();
    let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();

    let fixed = PoseEstimator::new(PlacementConfig {
        facing_correction: FacingCorrection::FixedSign,
        ..PlacementConfig::default()
    })
    .estimate(&landmarks, None)
    .unwrap();

    // Forward axis points toward the camera, which sits on +z
    assert!(fixed.basis.z.z > 0.0);
}
