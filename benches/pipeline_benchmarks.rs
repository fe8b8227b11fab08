//! Benchmarks for pose estimation, occluder updates and full cycles

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eyewear_tryon::{
    config::{Config, OccluderConfig, OrientationSource, PlacementConfig},
    landmarks::FaceLandmarks,
    occlusion::OcclusionMesh,
    pose_estimation::PoseEstimator,
    scene::{HeadlessNode, HeadlessOccluder, SceneHandles},
    session::TryOnSession,
    synthetic::{SyntheticDetector, SyntheticFace, SyntheticLoader},
    video::StaticVideo,
};

fn benchmark_pose_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_estimation");

    let face = SyntheticFace::frontal(640, 480).with_yaw(20.0).with_roll(-5.0);
    let set = face.landmarks();
    let landmarks = FaceLandmarks::new(&set, 640, 480).expect("valid frame size");
    let matrix = face.transformation_matrix();

    let from_landmarks = PoseEstimator::new(PlacementConfig::default());
    group.bench_function("estimate_from_landmarks", |b| {
        b.iter(|| black_box(from_landmarks.estimate(black_box(&landmarks), None)));
    });

    let from_matrix = PoseEstimator::new(PlacementConfig {
        orientation_source: OrientationSource::DetectorMatrix,
        ..PlacementConfig::default()
    });
    group.bench_function("estimate_from_detector_matrix", |b| {
        b.iter(|| black_box(from_matrix.estimate(black_box(&landmarks), Some(&matrix))));
    });

    group.finish();
}

fn benchmark_occluder(c: &mut Criterion) {
    let set = SyntheticFace::frontal(640, 480).landmarks();
    let landmarks = FaceLandmarks::new(&set, 640, 480).expect("valid frame size");
    let pose = PoseEstimator::new(PlacementConfig::default())
        .estimate(&landmarks, None)
        .expect("frontal face is not degenerate");
    let mut mesh = OcclusionMesh::face_oval(&OccluderConfig::default()).expect("face oval has enough points");

    c.bench_function("occluder_update_36", |b| {
        b.iter(|| {
            mesh.update(black_box(&landmarks), &pose.basis, pose.measurements.face_width())
                .expect("update succeeds");
            black_box(mesh.take_dirty());
        });
    });
}

fn benchmark_session_cycle(c: &mut Criterion) {
    let scene = SceneHandles::new(Box::new(HeadlessNode::new()), Box::new(HeadlessOccluder::new()));
    let mut session = TryOnSession::new(Config::default(), scene).expect("default config is valid");
    let mut video = StaticVideo::new(640, 480);
    let mut loader = SyntheticLoader::new(SyntheticDetector::new(7).with_noise(0.8));
    session.start(&mut loader, &video, |_| {}).expect("synthetic detector loads");

    let mut timestamp = 0.0;
    c.bench_function("session_cycle", |b| {
        b.iter(|| {
            video.advance();
            timestamp += 33.3;
            black_box(session.run_cycle(&video, timestamp));
        });
    });
}

criterion_group!(
    benches,
    benchmark_pose_estimation,
    benchmark_occluder,
    benchmark_session_cycle
);
criterion_main!(benches);
