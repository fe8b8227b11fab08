use super::{SmoothingStep, TransformFilter};
use crate::{config::SmoothingConfig, constants::SLERP_EPSILON, transform::RigidTransform, Result};
use nalgebra::{Point3, UnitQuaternion};

/// Movement-adaptive exponential smoother
///
/// Small changes get a low blend factor and are smoothed heavily; large
/// movements raise the factor (up to a clamp) so the overlay keeps up.
/// The first transform after creation or [`reset`](TransformFilter::reset)
/// is copied without blending.
#[derive(Debug)]
pub struct AdaptiveSmoother {
    config: SmoothingConfig,
    state: Option<SmoothingState>,
}

#[derive(Debug, Clone, Copy)]
struct SmoothingState {
    filtered: RigidTransform,
    /// Raw position of the previous frame
    previous_target: Point3<f64>,
}

impl Default for AdaptiveSmoother {
    fn default() -> Self {
        Self {
            config: SmoothingConfig::default(),
            state: None,
        }
    }
}

impl AdaptiveSmoother {
    /// Create a smoother with custom blend curves
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a blend curve is out of range or its lower
    /// clamp exceeds its upper clamp
    pub fn new(config: SmoothingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, state: None })
    }

    /// Current filtered transform, if any
    #[must_use]
    pub fn current(&self) -> Option<RigidTransform> {
        self.state.map(|s| s.filtered)
    }

    #[must_use]
    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }
}

impl TransformFilter for AdaptiveSmoother {
    fn apply(&mut self, raw: &RigidTransform) -> SmoothingStep {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(SmoothingState {
                filtered: *raw,
                previous_target: raw.position,
            });
            return SmoothingStep::snap(*raw);
        };

        let movement = nalgebra::distance(&raw.position, &state.previous_target);
        let angle_delta = angle_between(&state.filtered.orientation, &raw.orientation);

        let position_blend = self.config.position.factor(movement);
        let rotation_blend = self.config.rotation.factor(angle_delta);
        let scale_blend = self.config.scale.factor(movement);

        let filtered = &mut state.filtered;
        filtered.position = Point3::from(filtered.position.coords.lerp(&raw.position.coords, position_blend));
        filtered.orientation = slerp_shortest(&filtered.orientation, &raw.orientation, rotation_blend);
        filtered.scale = filtered.scale.lerp(&raw.scale, scale_blend);

        state.previous_target = raw.position;

        SmoothingStep {
            transform: *filtered,
            snapped: false,
            movement,
            angle_delta,
            position_blend,
            rotation_blend,
            scale_blend,
        }
    }

    fn reset(&mut self) {
        self.state = None;
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn name(&self) -> &str {
        "AdaptiveSmoother"
    }
}

/// Rotation angle in radians between two orientations
#[must_use]
pub fn angle_between(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    2.0 * a.coords.dot(&b.coords).abs().clamp(0.0, 1.0).acos()
}

/// Spherical interpolation along the shorter arc, renormalized
///
/// Falls back to normalized linear interpolation when the two orientations
/// are too close for slerp to be well conditioned.
#[must_use]
pub fn slerp_shortest(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    let to = if from.coords.dot(&to.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-to.into_inner())
    } else {
        *to
    };
    let blended = from
        .try_slerp(&to, t, SLERP_EPSILON)
        .unwrap_or_else(|| from.nlerp(&to, t));
    UnitQuaternion::new_normalize(blended.into_inner())
}
