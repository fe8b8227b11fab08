//! Seam to the external face-landmark detector.
//!
//! The detector is a black box: given a video frame and a monotonic timestamp
//! it returns zero or more faces. It is treated as stateful and
//! non-reentrant, so the frame driver never has more than one call
//! outstanding.

use crate::{landmarks::LandmarkSet, video::VideoFrame, Result};
use nalgebra::Matrix4;

/// One detected face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub landmarks: LandmarkSet,
    /// Facial transformation matrix, when the detector provides one
    pub transformation: Option<Matrix4<f64>>,
}

impl FaceObservation {
    #[must_use]
    pub fn new(landmarks: LandmarkSet) -> Self {
        Self {
            landmarks,
            transformation: None,
        }
    }

    #[must_use]
    pub fn with_transformation(mut self, matrix: Matrix4<f64>) -> Self {
        self.transformation = Some(matrix);
        self
    }
}

/// Result of one detection call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub faces: Vec<FaceObservation>,
}

impl Detection {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(face: FaceObservation) -> Self {
        Self { faces: vec![face] }
    }

    /// The tracked face; only the first candidate is ever used
    #[must_use]
    pub fn primary(&self) -> Option<&FaceObservation> {
        self.faces.first()
    }
}

/// A loaded landmark detector
pub trait LandmarkDetector {
    /// Run detection on one frame
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails for this frame
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<Detection>;

    /// Release the detector's resources
    ///
    /// # Errors
    ///
    /// Returns an error if release fails; callers treat this as best effort
    fn close(&mut self) -> Result<()>;

    /// Detector name for logs
    fn name(&self) -> &str;
}

/// Loads a detector; called once per session start
pub trait DetectorLoader {
    /// Load the detector
    ///
    /// # Errors
    ///
    /// Returns `Error::DetectorInit` if the detector cannot be loaded
    fn load(&mut self) -> Result<Box<dyn LandmarkDetector>>;
}

impl<F> DetectorLoader for F
where
    F: FnMut() -> Result<Box<dyn LandmarkDetector>>,
{
    fn load(&mut self) -> Result<Box<dyn LandmarkDetector>> {
        self()
    }
}
