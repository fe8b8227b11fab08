use crate::{
    config::{FacingCorrection, OrientationSource, PlacementConfig},
    constants::EPSILON,
    landmarks::{midpoint, FaceLandmarks, NamedLandmark, Side},
    transform::RigidTransform,
    Error, Result,
};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// Orthonormal face frame in scene space
///
/// `x` runs from the left eye to the right eye, `y` points down the face and
/// `z` points out of the face toward the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBasis {
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
}

impl FaceBasis {
    /// Largest deviation from orthonormality over all axis pairs and lengths
    #[must_use]
    pub fn orthonormality_error(&self) -> f64 {
        [
            self.x.dot(&self.y).abs(),
            self.y.dot(&self.z).abs(),
            self.z.dot(&self.x).abs(),
            (self.x.norm() - 1.0).abs(),
            (self.y.norm() - 1.0).abs(),
            (self.z.norm() - 1.0).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[self.x, self.y, self.z]))
    }
}

/// Facial dimensions measured in scene units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMeasurements {
    /// Distance between the two eye centers
    pub eye_width: f64,
    /// Distance between the temples
    pub temple_width: f64,
    /// Distance between the cheeks
    pub cheek_width: f64,
    /// Forehead to chin distance
    pub face_height: f64,
}

impl FaceMeasurements {
    /// Widest of the three width estimates; the others foreshorten under yaw
    #[must_use]
    pub fn face_width(&self) -> f64 {
        self.eye_width.max(self.temple_width).max(self.cheek_width)
    }
}

/// Raw per-frame placement of the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePose {
    pub transform: RigidTransform,
    pub basis: FaceBasis,
    pub measurements: FaceMeasurements,
    /// Source the orientation was actually taken from
    pub orientation_source: OrientationSource,
}

/// Named points read once per frame
struct KeyPoints {
    left_eye: Point3<f64>,
    right_eye: Point3<f64>,
    left_eye_outer: Point3<f64>,
    right_eye_outer: Point3<f64>,
    left_temple: Point3<f64>,
    right_temple: Point3<f64>,
    left_cheek: Point3<f64>,
    right_cheek: Point3<f64>,
    forehead: Point3<f64>,
    chin: Point3<f64>,
    nose_bridge: Point3<f64>,
    nose_tip: Point3<f64>,
}

impl KeyPoints {
    fn read(face: &FaceLandmarks<'_>) -> Result<Self> {
        let points = Self {
            left_eye: face.eye_center(Side::Left)?,
            right_eye: face.eye_center(Side::Right)?,
            left_eye_outer: face.named(NamedLandmark::LeftEyeOuter)?,
            right_eye_outer: face.named(NamedLandmark::RightEyeOuter)?,
            left_temple: face.named(NamedLandmark::LeftTemple)?,
            right_temple: face.named(NamedLandmark::RightTemple)?,
            left_cheek: face.named(NamedLandmark::LeftCheek)?,
            right_cheek: face.named(NamedLandmark::RightCheek)?,
            forehead: face.named(NamedLandmark::Forehead)?,
            chin: face.named(NamedLandmark::Chin)?,
            nose_bridge: face.named(NamedLandmark::NoseBridge)?,
            nose_tip: face.named(NamedLandmark::NoseTip)?,
        };

        let all = [
            &points.left_eye,
            &points.right_eye,
            &points.left_eye_outer,
            &points.right_eye_outer,
            &points.left_temple,
            &points.right_temple,
            &points.left_cheek,
            &points.right_cheek,
            &points.forehead,
            &points.chin,
            &points.nose_bridge,
            &points.nose_tip,
        ];
        if all.iter().any(|p| p.coords.iter().any(|v| !v.is_finite())) {
            return Err(Error::DegenerateGeometry("non-finite landmark".to_string()));
        }

        Ok(points)
    }
}

/// Computes the raw overlay transform from one face's landmarks
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    config: PlacementConfig,
    /// Static turn taking the face basis to the model's neutral orientation
    model_correction: UnitQuaternion<f64>,
}

impl PoseEstimator {
    /// Create a new pose estimator with the given calibration
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        log::debug!(
            "Initializing PoseEstimator (facing: {:?}, orientation: {:?})",
            config.facing_correction,
            config.orientation_source
        );
        Self {
            config,
            // Frame model is built facing the opposite way around the forward axis
            model_correction: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Estimate the raw overlay transform for one face
    ///
    /// `detector_matrix` is the detector's facial transformation matrix, used
    /// for orientation only when the configuration asks for it.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if landmarks are non-finite, coincide so
    /// that an axis has zero length, or yield a non-positive scale.
    pub fn estimate(&self, face: &FaceLandmarks<'_>, detector_matrix: Option<&Matrix4<f64>>) -> Result<FacePose> {
        let points = KeyPoints::read(face)?;

        let (orientation, basis, source) = match (self.config.orientation_source, detector_matrix) {
            (OrientationSource::DetectorMatrix, Some(matrix)) => {
                let orientation = Self::orientation_from_matrix(matrix)?;
                (orientation, self.basis_from_orientation(&orientation), OrientationSource::DetectorMatrix)
            }
            _ => {
                let basis = self.landmark_basis(&points)?;
                let orientation = self.orientation_from_basis(&basis);
                (orientation, basis, OrientationSource::Landmarks)
            }
        };

        let position = self.position(&points, &basis);
        let measurements = Self::measure(&points);
        let scale = self.scale(&measurements)?;

        let transform = RigidTransform::uniform(position, orientation, scale);
        if !transform.is_valid() {
            return Err(Error::DegenerateGeometry("non-finite transform".to_string()));
        }

        Ok(FacePose {
            transform,
            basis,
            measurements,
            orientation_source: source,
        })
    }

    /// Build the face basis from eye, forehead and chin landmarks
    fn landmark_basis(&self, points: &KeyPoints) -> Result<FaceBasis> {
        let x = unit(points.right_eye - points.left_eye, "eye axis")?;
        let y_raw = unit(points.forehead - points.chin, "vertical axis")?;
        let z = unit(x.cross(&y_raw), "forward axis")?;
        let z = self.face_camera(z, points);

        // Re-derive y so the basis is exactly orthogonal
        let y = unit(z.cross(&x), "down axis")?;

        Ok(FaceBasis { x, y, z })
    }

    /// Flip the forward axis so it points toward the camera
    fn face_camera(&self, z: Vector3<f64>, points: &KeyPoints) -> Vector3<f64> {
        match self.config.facing_correction {
            FacingCorrection::FixedSign => fixed_sign(z),
            FacingCorrection::FaceNormal => {
                let across = points.right_eye_outer - points.left_eye_outer;
                let down = points.chin - points.left_eye_outer;
                let normal = across.cross(&down);
                if normal.norm() <= EPSILON {
                    log::trace!("Face normal collapsed, falling back to fixed-sign facing");
                    return fixed_sign(z);
                }
                if normal.dot(&z) < 0.0 {
                    -z
                } else {
                    z
                }
            }
        }
    }

    fn orientation_from_basis(&self, basis: &FaceBasis) -> UnitQuaternion<f64> {
        let q = UnitQuaternion::from_rotation_matrix(&basis.rotation()) * self.model_correction;
        UnitQuaternion::new_normalize(q.into_inner())
    }

    /// Recover the working basis from a final orientation
    fn basis_from_orientation(&self, orientation: &UnitQuaternion<f64>) -> FaceBasis {
        let basis = orientation * self.model_correction.inverse();
        FaceBasis {
            x: basis * Vector3::x(),
            y: basis * Vector3::y(),
            z: basis * Vector3::z(),
        }
    }

    /// Rotation block of the detector's transformation matrix in scene space
    ///
    /// The detector reports in a metric camera frame (x right, y up, z toward
    /// the viewer); the scene mirrors x.
    fn orientation_from_matrix(matrix: &Matrix4<f64>) -> Result<UnitQuaternion<f64>> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::DegenerateGeometry("non-finite detector matrix".to_string()));
        }
        let block: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        if block.determinant().abs() <= EPSILON {
            return Err(Error::DegenerateGeometry("singular detector matrix".to_string()));
        }

        let mirror = Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0));
        let rotation = Rotation3::from_matrix(&(mirror * block * mirror));
        Ok(UnitQuaternion::from_rotation_matrix(&rotation))
    }

    fn position(&self, points: &KeyPoints, basis: &FaceBasis) -> Point3<f64> {
        let eye_mid = midpoint(&points.left_eye, &points.right_eye);

        // Apparent nose protrusion changes with pitch
        let nose_length = (points.nose_tip - points.nose_bridge).norm();
        let depth_adjust = (nose_length * self.config.nose_depth_gain).clamp(0.0, self.config.nose_depth_max);

        eye_mid
            + basis.x * self.config.center_x
            + basis.y * self.config.down
            + basis.z * (self.config.depth + depth_adjust)
    }

    fn measure(points: &KeyPoints) -> FaceMeasurements {
        FaceMeasurements {
            eye_width: nalgebra::distance(&points.left_eye, &points.right_eye),
            temple_width: nalgebra::distance(&points.left_temple, &points.right_temple),
            cheek_width: nalgebra::distance(&points.left_cheek, &points.right_cheek),
            face_height: nalgebra::distance(&points.forehead, &points.chin),
        }
    }

    /// Uniform scale from measured face size
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the result is not strictly positive
    pub fn scale(&self, measurements: &FaceMeasurements) -> Result<f64> {
        let width_scale = measurements.face_width() / self.config.ref_head_width;
        let height_scale = measurements.face_height / self.config.ref_face_height;
        let base = self
            .config
            .width_weight
            .mul_add(width_scale, (1.0 - self.config.width_weight) * height_scale);
        let scale = base * self.config.model_scale;

        if scale.is_finite() && scale > EPSILON {
            Ok(scale)
        } else {
            Err(Error::DegenerateGeometry(format!("face scale {scale} is not positive")))
        }
    }
}

fn unit(v: Vector3<f64>, what: &str) -> Result<Vector3<f64>> {
    v.try_normalize(EPSILON)
        .ok_or_else(|| Error::DegenerateGeometry(format!("zero-length {what}")))
}

fn fixed_sign(z: Vector3<f64>) -> Vector3<f64> {
    if z.z < 0.0 {
        -z
    } else {
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{landmark_index, NUM_FACE_MESH_LANDMARKS},
        landmarks::{Landmark, LandmarkSet},
        synthetic::SyntheticFace,
    };
    use approx::assert_relative_eq;

    fn unit_scale_estimator() -> PoseEstimator {
        PoseEstimator::new(PlacementConfig {
            model_scale: 1.0,
            ..PlacementConfig::default()
        })
    }

    #[test]
    fn test_frontal_face_is_identity() {
        let synthetic = SyntheticFace::frontal(640, 480);
        let set = synthetic.landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = unit_scale_estimator().estimate(&face, None).unwrap();

        assert!(pose.transform.orientation.angle() < 1e-5);
        assert_relative_eq!(pose.transform.scale.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pose.basis.z, Vector3::z(), epsilon = 1e-5);
        assert_relative_eq!(pose.measurements.face_width(), 140.0, epsilon = 1e-3);
        assert_relative_eq!(pose.measurements.face_height, 210.0, epsilon = 1e-3);
    }

    #[test]
    fn test_model_scale_multiplies() {
        let set = SyntheticFace::frontal(640, 480).landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = PoseEstimator::new(PlacementConfig::default()).estimate(&face, None).unwrap();

        assert_relative_eq!(pose.transform.scale.x, 1.05, epsilon = 1e-5);
        assert_eq!(pose.transform.scale.x, pose.transform.scale.z);
    }

    #[test]
    fn test_position_offsets() {
        let synthetic = SyntheticFace::frontal(640, 480);
        let set = synthetic.landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = unit_scale_estimator().estimate(&face, None).unwrap();

        // Eye midpoint sits at the face center raised by 30px; y axis points down
        let (cx, cy) = synthetic.center;
        assert_relative_eq!(pose.transform.position.x, -cx, epsilon = 1e-3);
        assert_relative_eq!(pose.transform.position.y, -(cy - 30.0) - 2.0, epsilon = 1e-3);

        // Bridge-to-tip length is sqrt(50² + 20²), below the clamp
        let eye_z = face.eye_center(Side::Left).unwrap().z;
        assert_relative_eq!(pose.transform.position.z, eye_z + 10.0 + 5.385_164_807, epsilon = 1e-3);
    }

    #[test]
    fn test_coincident_landmarks_are_degenerate() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0); NUM_FACE_MESH_LANDMARKS]).unwrap();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let result = unit_scale_estimator().estimate(&face, None);
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_nan_landmark_is_degenerate() {
        let mut points = SyntheticFace::frontal(640, 480).landmarks().points().to_vec();
        points[landmark_index::CHIN].y = f32::NAN;
        let set = LandmarkSet::new(points).unwrap();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        assert!(matches!(
            unit_scale_estimator().estimate(&face, None),
            Err(Error::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_facing_strategies_agree() {
        let set = SyntheticFace::frontal(640, 480).with_yaw(30.0).landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();

        let normal = unit_scale_estimator().estimate(&face, None).unwrap();
        let fixed = PoseEstimator::new(PlacementConfig {
            model_scale: 1.0,
            facing_correction: FacingCorrection::FixedSign,
            ..PlacementConfig::default()
        })
        .estimate(&face, None)
        .unwrap();

        assert!(normal.transform.orientation.angle_to(&fixed.transform.orientation) < 1e-9);
    }

    #[test]
    fn test_detector_matrix_matches_landmarks() {
        let synthetic = SyntheticFace::frontal(640, 480).with_yaw(15.0).with_roll(-8.0);
        let set = synthetic.landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let matrix = synthetic.transformation_matrix();

        let estimator = PoseEstimator::new(PlacementConfig {
            orientation_source: OrientationSource::DetectorMatrix,
            ..PlacementConfig::default()
        });
        let from_matrix = estimator.estimate(&face, Some(&matrix)).unwrap();
        let from_landmarks = estimator.estimate(&face, None).unwrap();

        assert_eq!(from_matrix.orientation_source, OrientationSource::DetectorMatrix);
        assert_eq!(from_landmarks.orientation_source, OrientationSource::Landmarks);
        assert!(from_matrix.transform.orientation.angle_to(&from_landmarks.transform.orientation) < 1e-4);
        assert!(from_matrix.basis.orthonormality_error() < 1e-9);
    }

    #[test]
    fn test_matrix_ignored_when_landmarks_configured() {
        let synthetic = SyntheticFace::frontal(640, 480);
        let set = synthetic.landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let pose = unit_scale_estimator()
            .estimate(&face, Some(&Matrix4::zeros()))
            .unwrap();
        assert_eq!(pose.orientation_source, OrientationSource::Landmarks);
    }

    #[test]
    fn test_singular_matrix_is_degenerate() {
        let set = SyntheticFace::frontal(640, 480).landmarks();
        let face = FaceLandmarks::new(&set, 640, 480).unwrap();
        let estimator = PoseEstimator::new(PlacementConfig {
            orientation_source: OrientationSource::DetectorMatrix,
            ..PlacementConfig::default()
        });
        assert!(matches!(
            estimator.estimate(&face, Some(&Matrix4::zeros())),
            Err(Error::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_scale_takes_widest_estimate() {
        let estimator = unit_scale_estimator();
        let narrow = FaceMeasurements {
            eye_width: 64.0,
            temple_width: 130.0,
            cheek_width: 140.0,
            face_height: 210.0,
        };
        let turned = FaceMeasurements {
            cheek_width: 90.0,
            temple_width: 140.0,
            ..narrow
        };
        assert_relative_eq!(estimator.scale(&narrow).unwrap(), 1.0);
        assert_relative_eq!(estimator.scale(&turned).unwrap(), 1.0);

        let collapsed = FaceMeasurements {
            eye_width: 0.0,
            temple_width: 0.0,
            cheek_width: 0.0,
            face_height: 0.0,
        };
        assert!(estimator.scale(&collapsed).is_err());
    }
}
