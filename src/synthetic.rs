//! Synthetic faces and a scripted detector for the headless demo and tests.
//!
//! `SyntheticFace` lays out a full face mesh from a small canonical template
//! rotated and placed in image space, then normalizes it the way a real
//! detector reports landmarks. `SyntheticDetector` replays a slowly swaying
//! head with optional jitter, dropouts and detection failures.

use crate::{
    constants::{landmark_index, FACE_OVAL, NUM_FACE_MESH_LANDMARKS},
    detector::{Detection, DetectorLoader, FaceObservation, LandmarkDetector},
    landmarks::{Landmark, LandmarkSet},
    video::VideoFrame,
    Error, Result,
};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{cell::RefCell, f64::consts::TAU, rc::Rc};

/// A face in image space, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFace {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Face center in pixels, origin top-left
    pub center: (f64, f64),
    /// Degrees about the image y axis
    pub yaw: f64,
    /// Degrees about the image x axis
    pub pitch: f64,
    /// Degrees about the viewing axis
    pub roll: f64,
    /// Multiplier on the canonical face size
    pub size: f64,
}

impl SyntheticFace {
    /// Upright face looking straight at the camera, centered in the frame
    #[must_use]
    pub fn frontal(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            center: (f64::from(frame_width) / 2.0, f64::from(frame_height) / 2.0),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            size: 1.0,
        }
    }

    #[must_use]
    pub fn with_yaw(mut self, degrees: f64) -> Self {
        self.yaw = degrees;
        self
    }

    #[must_use]
    pub fn with_pitch(mut self, degrees: f64) -> Self {
        self.pitch = degrees;
        self
    }

    #[must_use]
    pub fn with_roll(mut self, degrees: f64) -> Self {
        self.roll = degrees;
        self
    }

    /// Move the face center by `(dx, dy)` pixels
    #[must_use]
    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.center.0 += dx;
        self.center.1 += dy;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Head rotation in image space (x right, y down, z away from the camera)
    #[must_use]
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.pitch.to_radians(), self.yaw.to_radians(), self.roll.to_radians())
    }

    /// Normalized landmarks as a detector would report them
    #[must_use]
    pub fn landmarks(&self) -> LandmarkSet {
        LandmarkSet::from_mesh(self.pixels().iter().map(|p| self.normalize(p)).collect())
    }

    /// Landmarks with uniform jitter of up to `noise` pixels per component
    #[must_use]
    pub fn landmarks_with_noise<R: Rng>(&self, rng: &mut R, noise: f64) -> LandmarkSet {
        if noise <= 0.0 {
            return self.landmarks();
        }
        let points = self
            .pixels()
            .iter()
            .map(|p| {
                let jitter = Vector3::new(
                    rng.gen_range(-noise..=noise),
                    rng.gen_range(-noise..=noise),
                    rng.gen_range(-noise..=noise),
                );
                self.normalize(&(p + jitter))
            })
            .collect();
        LandmarkSet::from_mesh(points)
    }

    /// Facial transformation matrix in the detector's metric frame
    ///
    /// That frame has y up and z toward the viewer, so the image-space
    /// rotation is conjugated by a flip of both axes.
    #[must_use]
    pub fn transformation_matrix(&self) -> Matrix4<f64> {
        let flip = Matrix3::from_diagonal(&Vector3::new(1.0, -1.0, -1.0));
        let block = flip * self.rotation().matrix() * flip;

        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&block);
        // Translation in centimeters, roughly half a meter from the camera
        matrix[(0, 3)] = (self.center.0 - f64::from(self.frame_width) / 2.0) / 20.0;
        matrix[(1, 3)] = -(self.center.1 - f64::from(self.frame_height) / 2.0) / 20.0;
        matrix[(2, 3)] = -50.0 / self.size;
        matrix
    }

    fn pixels(&self) -> Vec<Point3<f64>> {
        let rotation = self.rotation();
        let center = Point3::new(self.center.0, self.center.1, 0.0);
        template()
            .into_iter()
            .map(|offset| center + rotation * (offset * self.size))
            .collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn normalize(&self, p: &Point3<f64>) -> Landmark {
        let w = f64::from(self.frame_width);
        let h = f64::from(self.frame_height);
        Landmark::new((p.x / w) as f32, (p.y / h) as f32, (p.z / w) as f32)
    }
}

/// Canonical face offsets in pixels around the face center
///
/// Eye width 64, temple width 130, cheek width 140, forehead to chin 210.
fn template() -> Vec<Vector3<f64>> {
    let mut offsets = vec![Vector3::zeros(); NUM_FACE_MESH_LANDMARKS];

    #[allow(clippy::cast_precision_loss)]
    let steps = FACE_OVAL.len() as f64;
    for (k, &index) in FACE_OVAL.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let theta = TAU * k as f64 / steps;
        offsets[index] = Vector3::new(70.0 * theta.sin(), -110.0 * theta.cos(), 20.0);
    }

    let named = [
        (landmark_index::LEFT_EYE_OUTER, -48.0, -30.0, 5.0),
        (landmark_index::LEFT_EYE_INNER, -16.0, -30.0, 5.0),
        (landmark_index::RIGHT_EYE_INNER, 16.0, -30.0, 5.0),
        (landmark_index::RIGHT_EYE_OUTER, 48.0, -30.0, 5.0),
        (landmark_index::LEFT_TEMPLE, -65.0, -40.0, 25.0),
        (landmark_index::RIGHT_TEMPLE, 65.0, -40.0, 25.0),
        (landmark_index::LEFT_CHEEK, -70.0, 0.0, 20.0),
        (landmark_index::RIGHT_CHEEK, 70.0, 0.0, 20.0),
        (landmark_index::FOREHEAD, 0.0, -110.0, 5.0),
        (landmark_index::CHIN, 0.0, 100.0, 5.0),
        (landmark_index::NOSE_BRIDGE, 0.0, -30.0, -5.0),
        (landmark_index::NOSE_TIP, 0.0, 20.0, -25.0),
    ];
    for (index, x, y, z) in named {
        offsets[index] = Vector3::new(x, y, z);
    }

    offsets
}

/// Counters shared between a synthetic detector and its observers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorStats {
    pub calls: u64,
    pub faces: u64,
    pub dropouts: u64,
    pub failures: u64,
    pub closed: bool,
}

/// Scripted detector replaying a swaying head
#[derive(Debug, Clone)]
pub struct SyntheticDetector {
    rng: StdRng,
    noise: f64,
    dropout_every: u32,
    failure_every: u32,
    with_matrix: bool,
    stats: Rc<RefCell<DetectorStats>>,
}

impl SyntheticDetector {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise: 0.0,
            dropout_every: 0,
            failure_every: 0,
            with_matrix: false,
            stats: Rc::default(),
        }
    }

    /// Landmark jitter in pixels
    #[must_use]
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Report no face on every `n`th call (0 disables)
    #[must_use]
    pub fn with_dropout_every(mut self, n: u32) -> Self {
        self.dropout_every = n;
        self
    }

    /// Fail every `n`th call (0 disables)
    #[must_use]
    pub fn with_failure_every(mut self, n: u32) -> Self {
        self.failure_every = n;
        self
    }

    /// Attach a facial transformation matrix to every face
    #[must_use]
    pub fn with_matrix(mut self) -> Self {
        self.with_matrix = true;
        self
    }

    /// Handle on the counters; stays valid after the detector is boxed
    #[must_use]
    pub fn stats(&self) -> Rc<RefCell<DetectorStats>> {
        Rc::clone(&self.stats)
    }

    /// Head pose at `seconds` into the script
    #[must_use]
    pub fn scripted_face(frame: &VideoFrame, seconds: f64) -> SyntheticFace {
        SyntheticFace::frontal(frame.width, frame.height)
            .with_yaw(18.0 * (0.9 * seconds).sin())
            .with_pitch(6.0 * (0.6 * seconds).sin())
            .with_roll(8.0 * (0.4 * seconds).sin())
            .with_offset(40.0 * (0.5 * seconds).sin(), 15.0 * (0.3 * seconds).cos())
    }
}

fn every(n: u32, call: u64) -> bool {
    n > 0 && call % u64::from(n) == 0
}

impl LandmarkDetector for SyntheticDetector {
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<Detection> {
        let call = {
            let mut stats = self.stats.borrow_mut();
            stats.calls += 1;
            stats.calls
        };

        if every(self.failure_every, call) {
            self.stats.borrow_mut().failures += 1;
            return Err(Error::Detection(format!("scripted failure on call {call}")));
        }
        if every(self.dropout_every, call) {
            self.stats.borrow_mut().dropouts += 1;
            return Ok(Detection::empty());
        }

        let face = Self::scripted_face(frame, timestamp_ms / 1000.0);
        let mut observation = FaceObservation::new(face.landmarks_with_noise(&mut self.rng, self.noise));
        if self.with_matrix {
            observation = observation.with_transformation(face.transformation_matrix());
        }

        self.stats.borrow_mut().faces += 1;
        Ok(Detection::single(observation))
    }

    fn close(&mut self) -> Result<()> {
        self.stats.borrow_mut().closed = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "SyntheticDetector"
    }
}

/// Loader handing out a prepared synthetic detector
#[derive(Debug, Clone)]
pub struct SyntheticLoader {
    detector: SyntheticDetector,
    failure: Option<String>,
    loads: u32,
}

impl SyntheticLoader {
    #[must_use]
    pub fn new(detector: SyntheticDetector) -> Self {
        Self {
            detector,
            failure: None,
            loads: 0,
        }
    }

    /// Loader whose every load fails with `reason`
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            detector: SyntheticDetector::new(0),
            failure: Some(reason.into()),
            loads: 0,
        }
    }

    /// Number of load attempts so far
    #[must_use]
    pub fn loads(&self) -> u32 {
        self.loads
    }
}

impl DetectorLoader for SyntheticLoader {
    fn load(&mut self) -> Result<Box<dyn LandmarkDetector>> {
        self.loads += 1;
        match &self.failure {
            Some(reason) => Err(Error::DetectorInit(reason.clone())),
            None => Ok(Box::new(self.detector.clone())),
        }
    }
}
