//! Tests for the face occluder mesh

use eyewear_tryon::{
    config::{OccluderConfig, PlacementConfig},
    constants::FACE_OVAL,
    landmarks::FaceLandmarks,
    occlusion::OcclusionMesh,
    pose_estimation::PoseEstimator,
    synthetic::SyntheticFace,
};
use nalgebra::Vector3;

#[test]
fn test_mesh_counts_match_contour() {
    let mesh = OcclusionMesh::face_oval(&OccluderConfig::default()).unwrap();
    assert_eq!(mesh.contour_len(), FACE_OVAL.len());
    assert_eq!(mesh.vertex_count(), FACE_OVAL.len() + 1);
    assert_eq!(mesh.triangle_count(), FACE_OVAL.len());
    assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));

    let custom = OcclusionMesh::new(&[10, 454, 152, 234], &OccluderConfig::default()).unwrap();
    assert_eq!(custom.vertex_count(), 5);
    assert_eq!(custom.indices().len(), 12);
}

#[test]
fn test_apex_recedes_into_turned_head() {
    let face = SyntheticFace::frontal(640, 480).with_yaw(25.0).with_pitch(-10.0);
    let set = face.landmarks();
    let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();
    let pose = PoseEstimator::new(PlacementConfig::default())
        .estimate(&landmarks, None)
        .unwrap();

    let mut mesh = OcclusionMesh::face_oval(&OccluderConfig::default()).unwrap();
    mesh.update(&landmarks, &pose.basis, pose.measurements.face_width()).unwrap();

    let vertices = mesh.vertices();
    assert!(vertices.iter().all(|v| v.coords.iter().all(|c| c.is_finite())));

    let centroid: Vector3<f64> = vertices[1..]
        .iter()
        .map(|v| v.coords.cast::<f64>())
        .sum::<Vector3<f64>>()
        / FACE_OVAL.len() as f64;
    let apex = vertices[0].coords.cast::<f64>();
    let recess = (apex - centroid).dot(&pose.basis.z);

    let expected = pose.measurements.face_width() * 0.5;
    assert!((recess + expected).abs() < 1e-2, "recess {recess}, expected {}", -expected);
}

#[test]
fn test_out_of_range_contour_fails_cleanly() {
    let set = SyntheticFace::frontal(640, 480).landmarks();
    let landmarks = FaceLandmarks::new(&set, 640, 480).unwrap();
    let pose = PoseEstimator::new(PlacementConfig::default())
        .estimate(&landmarks, None)
        .unwrap();

    let mut mesh = OcclusionMesh::new(&[10, 454, 9999], &OccluderConfig::default()).unwrap();
    assert!(mesh.update(&landmarks, &pose.basis, 140.0).is_err());
    assert!(!mesh.is_dirty());
}
