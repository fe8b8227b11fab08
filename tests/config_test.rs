//! Tests for configuration files and the demo application

use eyewear_tryon::{
    app::TryOnApp,
    config::{Config, FacingCorrection, EXAMPLE_CONFIG},
    Error,
};
use std::io::Write;

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tryon.yaml");

    let mut config = Config::default();
    config.placement.model_scale = 0.95;
    config.placement.facing_correction = FacingCorrection::FixedSign;
    config.smoothing.rotation.max = 0.6;
    config.demo.frames = 42;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_example_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE_CONFIG.as_bytes()).unwrap();

    let loaded = Config::from_file(file.path()).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::from_file(dir.path().join("absent.yaml")),
        Err(Error::Io(_))
    ));

    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "placement: [1, 2\n").unwrap();
    assert!(matches!(Config::from_file(&path), Err(Error::ConfigError(_))));
}

#[test]
fn test_demo_run_counts() {
    let mut config = Config::default();
    config.demo.frames = 60;
    config.demo.dropout_every = 10;
    config.demo.failure_every = 7;

    let mut app = TryOnApp::new(config).unwrap();
    assert_eq!(app.frame_size(), (640, 480));
    let summary = app.run().unwrap();
    app.shutdown();

    assert_eq!(summary.detector.calls, 60);
    assert_eq!(summary.detector.failures, 8);
    assert_eq!(summary.detector.dropouts, 6);
    assert_eq!(summary.session.detection_errors, 8);
    assert_eq!(summary.session.hidden, 14);
    assert_eq!(summary.session.tracked, 46);
    assert_eq!(summary.occluder_uploads, 46);
    // Frame 60 drops the face, so the last transform comes from frame 59
    assert!(summary.last_transform.is_some_and(|t| t.is_valid()));
}

#[test]
fn test_demo_rejects_invalid_config() {
    let mut config = Config::default();
    config.demo.width = 0;
    assert!(TryOnApp::new(config).is_err());
}
