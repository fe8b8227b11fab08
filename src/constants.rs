//! Constants used throughout the tracking pipeline

/// Number of points produced by the face mesh landmark model
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Face mesh indices of the landmarks the pose estimator reads
pub mod landmark_index {
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const LEFT_TEMPLE: usize = 127;
    pub const RIGHT_TEMPLE: usize = 356;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 175;
    pub const NOSE_BRIDGE: usize = 168;
    pub const NOSE_TIP: usize = 1;
}

/// Face oval traced in order; consecutive entries must not self-intersect
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, //
    397, 365, 379, 378, 400, 377, 152, 148, 176, 149, 150, 136, //
    172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Reference head width (pixels) for scale normalization
pub const DEFAULT_REF_HEAD_WIDTH: f64 = 140.0;
/// Reference forehead-to-chin height (pixels)
pub const DEFAULT_REF_FACE_HEIGHT: f64 = 210.0;
/// Weight of the width estimate in the blended scale; height gets the rest
pub const DEFAULT_WIDTH_WEIGHT: f64 = 0.7;

/// Placement calibration for the bundled frame model
pub const DEFAULT_GLASSES_DEPTH: f64 = 10.0;
pub const DEFAULT_GLASSES_DOWN: f64 = 2.0;
pub const DEFAULT_GLASSES_CENTER_X: f64 = 0.0;
pub const DEFAULT_GLASSES_SCALE: f64 = 1.05;

/// Nose-length depth compensation
pub const DEFAULT_NOSE_DEPTH_GAIN: f64 = 0.1;
pub const DEFAULT_NOSE_DEPTH_MAX: f64 = 6.0;

/// Adaptive smoothing: position blend
pub const DEFAULT_POSITION_BASE: f64 = 0.12;
pub const DEFAULT_POSITION_GAIN: f64 = 0.012;
pub const DEFAULT_POSITION_MAX: f64 = 0.5;

/// Adaptive smoothing: rotation blend (gain per radian)
pub const DEFAULT_ROTATION_BASE: f64 = 0.12;
pub const DEFAULT_ROTATION_GAIN: f64 = 0.4;
pub const DEFAULT_ROTATION_MAX: f64 = 0.55;

/// Adaptive smoothing: scale blend
pub const DEFAULT_SCALE_BASE: f64 = 0.14;
pub const DEFAULT_SCALE_GAIN: f64 = 0.008;
pub const DEFAULT_SCALE_MAX: f64 = 0.4;

/// Occluder offsets
pub const DEFAULT_OCCLUDER_FORWARD_OFFSET: f64 = 8.0;
pub const DEFAULT_OCCLUDER_CONE_RATIO: f64 = 0.5;

/// Render order of the depth-only occluder; must be drawn before the overlay
pub const OCCLUDER_RENDER_ORDER: i32 = 1;
/// Render order of the eyewear overlay
pub const OVERLAY_RENDER_ORDER: i32 = 3;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;

/// Tolerance used when spherical interpolation is ill-conditioned
pub const SLERP_EPSILON: f64 = 1e-6;
