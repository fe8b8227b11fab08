//! Landmark storage and conversion from detector space into scene space.
//!
//! The detector reports every point normalized to the frame: `x` and `y` in
//! `[0, 1]`, `z` as relative depth on roughly the same scale as `x`. The scene
//! works in pixel units with the camera view mirrored, so every component is
//! scaled (`x` by width, `y` by height, `z` by width) and then negated.

use crate::{
    constants::{landmark_index, NUM_FACE_MESH_LANDMARKS},
    Error, Result,
};
use nalgebra::Point3;

/// A single landmark in normalized detector space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Whether all three components are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The landmarks of one face for one frame
///
/// Holds at least [`NUM_FACE_MESH_LANDMARKS`] points. Iris-refined models emit
/// ten extra points after the mesh; those are kept but never read.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Wrap detector output
    ///
    /// # Errors
    ///
    /// Returns an error if fewer points than the face mesh defines are given
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        if points.len() < NUM_FACE_MESH_LANDMARKS {
            return Err(Error::InvalidInput(format!(
                "Expected at least {} landmarks, got {}",
                NUM_FACE_MESH_LANDMARKS,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Wrap a full mesh built inside the crate
    pub(crate) fn from_mesh(points: Vec<Landmark>) -> Self {
        debug_assert!(points.len() >= NUM_FACE_MESH_LANDMARKS);
        Self { points }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

/// Semantic landmarks used for pose estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedLandmark {
    LeftEyeOuter,
    RightEyeOuter,
    LeftEyeInner,
    RightEyeInner,
    LeftTemple,
    RightTemple,
    LeftCheek,
    RightCheek,
    Forehead,
    Chin,
    NoseBridge,
    NoseTip,
}

impl NamedLandmark {
    pub const ALL: [Self; 12] = [
        Self::LeftEyeOuter,
        Self::RightEyeOuter,
        Self::LeftEyeInner,
        Self::RightEyeInner,
        Self::LeftTemple,
        Self::RightTemple,
        Self::LeftCheek,
        Self::RightCheek,
        Self::Forehead,
        Self::Chin,
        Self::NoseBridge,
        Self::NoseTip,
    ];

    /// Index into the 468-point face mesh
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::LeftEyeOuter => landmark_index::LEFT_EYE_OUTER,
            Self::RightEyeOuter => landmark_index::RIGHT_EYE_OUTER,
            Self::LeftEyeInner => landmark_index::LEFT_EYE_INNER,
            Self::RightEyeInner => landmark_index::RIGHT_EYE_INNER,
            Self::LeftTemple => landmark_index::LEFT_TEMPLE,
            Self::RightTemple => landmark_index::RIGHT_TEMPLE,
            Self::LeftCheek => landmark_index::LEFT_CHEEK,
            Self::RightCheek => landmark_index::RIGHT_CHEEK,
            Self::Forehead => landmark_index::FOREHEAD,
            Self::Chin => landmark_index::CHIN,
            Self::NoseBridge => landmark_index::NOSE_BRIDGE,
            Self::NoseTip => landmark_index::NOSE_TIP,
        }
    }
}

/// Which eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Read access to a landmark set in scene coordinates
#[derive(Debug, Clone, Copy)]
pub struct FaceLandmarks<'a> {
    set: &'a LandmarkSet,
    width: f64,
    height: f64,
}

impl<'a> FaceLandmarks<'a> {
    /// Bind a landmark set to the pixel dimensions of the frame it came from
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn new(set: &'a LandmarkSet, frame_width: u32, frame_height: u32) -> Result<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidInput(format!(
                "Frame dimensions must be non-zero, got {frame_width}x{frame_height}"
            )));
        }
        Ok(Self {
            set,
            width: f64::from(frame_width),
            height: f64::from(frame_height),
        })
    }

    /// Landmark `index` in scene space
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is outside the set
    pub fn world(&self, index: usize) -> Result<Point3<f64>> {
        let lm = self.set.get(index).ok_or(Error::LandmarkIndex {
            index,
            len: self.set.len(),
        })?;
        Ok(Point3::new(
            -f64::from(lm.x) * self.width,
            -f64::from(lm.y) * self.height,
            -f64::from(lm.z) * self.width,
        ))
    }

    /// Named landmark in scene space
    ///
    /// # Errors
    ///
    /// Returns an error if the set does not cover the named index
    pub fn named(&self, landmark: NamedLandmark) -> Result<Point3<f64>> {
        self.world(landmark.index())
    }

    /// Midpoint of the inner and outer corner of one eye
    ///
    /// # Errors
    ///
    /// Returns an error if the set does not cover the eye corner indices
    pub fn eye_center(&self, side: Side) -> Result<Point3<f64>> {
        let (inner, outer) = match side {
            Side::Left => (NamedLandmark::LeftEyeInner, NamedLandmark::LeftEyeOuter),
            Side::Right => (NamedLandmark::RightEyeInner, NamedLandmark::RightEyeOuter),
        };
        Ok(midpoint(&self.named(inner)?, &self.named(outer)?))
    }

    #[must_use]
    pub fn set(&self) -> &'a LandmarkSet {
        self.set
    }
}

/// Midpoint of two scene points
#[must_use]
pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    nalgebra::center(a, b)
}
