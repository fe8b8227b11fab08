//! Configuration management for the try-on tracking core

use crate::{
    constants::{
        DEFAULT_GLASSES_CENTER_X, DEFAULT_GLASSES_DEPTH, DEFAULT_GLASSES_DOWN, DEFAULT_GLASSES_SCALE,
        DEFAULT_NOSE_DEPTH_GAIN, DEFAULT_NOSE_DEPTH_MAX, DEFAULT_OCCLUDER_CONE_RATIO,
        DEFAULT_OCCLUDER_FORWARD_OFFSET, DEFAULT_POSITION_BASE, DEFAULT_POSITION_GAIN, DEFAULT_POSITION_MAX,
        DEFAULT_REF_FACE_HEIGHT, DEFAULT_REF_HEAD_WIDTH, DEFAULT_ROTATION_BASE, DEFAULT_ROTATION_GAIN,
        DEFAULT_ROTATION_MAX, DEFAULT_SCALE_BASE, DEFAULT_SCALE_GAIN, DEFAULT_SCALE_MAX, DEFAULT_WIDTH_WEIGHT,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay placement and calibration
    pub placement: PlacementConfig,

    /// Temporal smoothing
    pub smoothing: SmoothingConfig,

    /// Depth-only face occluder
    pub occluder: OccluderConfig,

    /// Frame driver behaviour
    pub tracking: TrackingConfig,

    /// Headless demo run
    pub demo: DemoConfig,
}

/// How the face normal is made to point toward the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingCorrection {
    /// Negate the forward axis when its z component is negative
    FixedSign,
    /// Compare against the normal of the eye-corner/chin triangle
    FaceNormal,
}

/// Where the overlay orientation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSource {
    /// Orthonormal basis built from eye, forehead and chin landmarks
    Landmarks,
    /// Detector transformation matrix when present, landmarks otherwise
    DetectorMatrix,
}

/// Overlay placement and calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Reference head width (pixels) giving a width scale of 1.0
    pub ref_head_width: f64,

    /// Reference forehead-to-chin height (pixels) giving a height scale of 1.0
    pub ref_face_height: f64,

    /// Weight of the width scale in the blended scale (height gets the rest)
    pub width_weight: f64,

    /// Base distance in front of the eyes
    pub depth: f64,

    /// Offset along the face's down axis
    pub down: f64,

    /// Horizontal offset along the eye axis
    pub center_x: f64,

    /// Per-model scale tuning
    pub model_scale: f64,

    /// Depth added per unit of nose bridge to tip length
    pub nose_depth_gain: f64,

    /// Upper clamp for the nose depth term
    pub nose_depth_max: f64,

    /// Camera-facing correction strategy
    pub facing_correction: FacingCorrection,

    /// Orientation source
    pub orientation_source: OrientationSource,
}

/// Blend factor parameters for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendConfig {
    /// Blend factor at rest
    pub base: f64,

    /// Increase per unit of movement (or radian for rotation)
    pub gain: f64,

    /// Lower clamp
    pub min: f64,

    /// Upper clamp
    pub max: f64,
}

impl BlendConfig {
    #[must_use]
    pub const fn new(base: f64, gain: f64, max: f64) -> Self {
        Self {
            base,
            gain,
            min: base,
            max,
        }
    }

    /// Blend factor for a given amount of change
    #[must_use]
    pub fn factor(&self, delta: f64) -> f64 {
        let raw = self.gain.mul_add(delta, self.base);
        if raw.is_nan() {
            return self.max;
        }
        // Inverted bounds resolve to max
        raw.max(self.min).min(self.max)
    }

    fn validate(&self, channel: &str) -> Result<()> {
        for (name, value) in [("base", self.base), ("min", self.min), ("max", self.max)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "{channel} blend {name} must be between 0.0 and 1.0"
                )));
            }
        }
        if self.min > self.max {
            return Err(Error::ConfigError(format!(
                "{channel} blend min must not exceed max"
            )));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(Error::ConfigError(format!(
                "{channel} blend gain must be non-negative"
            )));
        }
        Ok(())
    }
}

/// Temporal smoothing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type ("adaptive" or "none")
    pub filter: String,

    /// Position blend, driven by movement
    pub position: BlendConfig,

    /// Rotation blend, driven by angular change in radians
    pub rotation: BlendConfig,

    /// Scale blend, driven by movement
    pub scale: BlendConfig,
}

impl SmoothingConfig {
    /// Check every blend curve
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a factor outside `[0, 1]`, a negative gain
    /// or a lower clamp above the upper one
    pub fn validate(&self) -> Result<()> {
        self.position.validate("Position")?;
        self.rotation.validate("Rotation")?;
        self.scale.validate("Scale")
    }
}

/// Occluder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccluderConfig {
    /// Build and update the occluder
    pub enabled: bool,

    /// Push of each contour point toward the camera
    pub forward_offset: f64,

    /// Recession of the centroid as a fraction of face width
    pub cone_depth_ratio: f64,
}

/// Frame driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Use new-video-frame callbacks when the source supports them
    pub prefer_video_frame_callback: bool,
}

/// Headless demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of cycles to run
    pub frames: u32,

    /// Synthetic frame width
    pub width: u32,

    /// Synthetic frame height
    pub height: u32,

    /// Landmark jitter in pixels
    pub noise: f64,

    /// Random seed for the jitter
    pub seed: u64,

    /// Drop the face every N frames (0 disables)
    pub dropout_every: u32,

    /// Fail a detection every N frames (0 disables)
    pub failure_every: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            ref_head_width: DEFAULT_REF_HEAD_WIDTH,
            ref_face_height: DEFAULT_REF_FACE_HEIGHT,
            width_weight: DEFAULT_WIDTH_WEIGHT,
            depth: DEFAULT_GLASSES_DEPTH,
            down: DEFAULT_GLASSES_DOWN,
            center_x: DEFAULT_GLASSES_CENTER_X,
            model_scale: DEFAULT_GLASSES_SCALE,
            nose_depth_gain: DEFAULT_NOSE_DEPTH_GAIN,
            nose_depth_max: DEFAULT_NOSE_DEPTH_MAX,
            facing_correction: FacingCorrection::FaceNormal,
            orientation_source: OrientationSource::Landmarks,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "adaptive".to_string(),
            position: BlendConfig::new(DEFAULT_POSITION_BASE, DEFAULT_POSITION_GAIN, DEFAULT_POSITION_MAX),
            rotation: BlendConfig::new(DEFAULT_ROTATION_BASE, DEFAULT_ROTATION_GAIN, DEFAULT_ROTATION_MAX),
            scale: BlendConfig::new(DEFAULT_SCALE_BASE, DEFAULT_SCALE_GAIN, DEFAULT_SCALE_MAX),
        }
    }
}

impl Default for OccluderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            forward_offset: DEFAULT_OCCLUDER_FORWARD_OFFSET,
            cone_depth_ratio: DEFAULT_OCCLUDER_CONE_RATIO,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            prefer_video_frame_callback: true,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            width: 640,
            height: 480,
            noise: 0.8,
            seed: 7,
            dropout_every: 0,
            failure_every: 0,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Serialize configuration to YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let p = &self.placement;
        if !(p.ref_head_width > 0.0 && p.ref_face_height > 0.0) {
            return Err(Error::ConfigError(
                "Reference head width and face height must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&p.width_weight) {
            return Err(Error::ConfigError(
                "Width weight must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(p.model_scale > 0.0 && p.model_scale.is_finite()) {
            return Err(Error::ConfigError("Model scale must be positive".to_string()));
        }
        if !(p.nose_depth_max >= 0.0 && p.nose_depth_gain >= 0.0) {
            return Err(Error::ConfigError(
                "Nose depth gain and clamp must be non-negative".to_string(),
            ));
        }
        if ![p.depth, p.down, p.center_x].iter().all(|v| v.is_finite()) {
            return Err(Error::ConfigError("Placement offsets must be finite".to_string()));
        }

        self.smoothing.validate()?;

        if !self.occluder.forward_offset.is_finite() {
            return Err(Error::ConfigError("Occluder forward offset must be finite".to_string()));
        }
        if !(self.occluder.cone_depth_ratio >= 0.0) {
            return Err(Error::ConfigError(
                "Occluder cone depth ratio must be non-negative".to_string(),
            ));
        }

        if self.demo.width == 0 || self.demo.height == 0 {
            return Err(Error::ConfigError("Demo frame size must be non-zero".to_string()));
        }
        if !(self.demo.noise >= 0.0) {
            return Err(Error::ConfigError("Demo noise must be non-negative".to_string()));
        }

        Ok(())
    }

    /// Create the configured smoothing filter
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown filter name
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::TransformFilter>> {
        use crate::filters::{adaptive::AdaptiveSmoother, create_filter};

        match self.smoothing.filter.to_lowercase().as_str() {
            "adaptive" => Ok(Box::new(AdaptiveSmoother::new(self.smoothing.clone())?)),
            name => create_filter(name),
        }
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Eyewear Try-On Configuration

# Overlay placement and calibration
placement:
  ref_head_width: 140.0
  ref_face_height: 210.0
  width_weight: 0.7
  depth: 10.0
  down: 2.0
  center_x: 0.0
  model_scale: 1.05
  nose_depth_gain: 0.1
  nose_depth_max: 6.0
  facing_correction: face_normal
  orientation_source: landmarks

# Adaptive smoothing
smoothing:
  filter: "adaptive"
  position:
    base: 0.12
    gain: 0.012
    min: 0.12
    max: 0.5
  rotation:
    base: 0.12
    gain: 0.4
    min: 0.12
    max: 0.55
  scale:
    base: 0.14
    gain: 0.008
    min: 0.14
    max: 0.4

# Depth-only face occluder
occluder:
  enabled: true
  forward_offset: 8.0
  cone_depth_ratio: 0.5

# Frame driver
tracking:
  prefer_video_frame_callback: true

# Headless demo
demo:
  frames: 300
  width: 640
  height: 480
  noise: 0.8
  seed: 7
  dropout_every: 0
  failure_every: 0
"#;
