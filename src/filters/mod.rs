//! Temporal filtering of the overlay transform.
//!
//! Raw per-frame transforms jitter with landmark noise. Filters in this
//! module hold the smoothed transform across frames and blend each new raw
//! measurement into it.

/// Movement-adaptive smoothing of position, orientation and scale
pub mod adaptive;

use crate::{transform::RigidTransform, Result};

/// Outcome of feeding one raw transform to a filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingStep {
    /// Filtered transform after this update
    pub transform: RigidTransform,
    /// The filter had no prior state and copied the raw transform
    pub snapped: bool,
    /// Distance between this and the previous raw position
    pub movement: f64,
    /// Angle in radians between the previous filtered and the raw orientation
    pub angle_delta: f64,
    pub position_blend: f64,
    pub rotation_blend: f64,
    pub scale_blend: f64,
}

impl SmoothingStep {
    /// Step for a filter that took the raw transform as is
    #[must_use]
    pub fn snap(transform: RigidTransform) -> Self {
        Self {
            transform,
            snapped: true,
            movement: 0.0,
            angle_delta: 0.0,
            position_blend: 1.0,
            rotation_blend: 1.0,
            scale_blend: 1.0,
        }
    }
}

/// Trait for all transform filters
pub trait TransformFilter: Send + Sync {
    /// Blend a raw transform into the filter state
    fn apply(&mut self, raw: &RigidTransform) -> SmoothingStep;

    /// Drop the filter state so the next transform snaps
    fn reset(&mut self);

    /// Whether the filter holds state from an earlier frame
    fn is_ready(&self) -> bool;

    /// Get filter name
    fn name(&self) -> &str;
}

/// Filter that passes raw transforms through unchanged
#[derive(Debug, Default)]
pub struct PassThroughFilter {
    ready: bool,
}

impl TransformFilter for PassThroughFilter {
    fn apply(&mut self, raw: &RigidTransform) -> SmoothingStep {
        self.ready = true;
        SmoothingStep::snap(*raw)
    }

    fn reset(&mut self) {
        self.ready = false;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn name(&self) -> &str {
        "PassThroughFilter"
    }
}

/// Create a transform filter by type name with default parameters
///
/// # Errors
///
/// Returns an error for an unknown filter name
pub fn create_filter(filter_type: &str) -> Result<Box<dyn TransformFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "passthrough" | "raw" => Ok(Box::new(PassThroughFilter::default())),
        "adaptive" => Ok(Box::new(adaptive::AdaptiveSmoother::default())),
        _ => Err(crate::Error::ConfigError(format!("Unknown filter type: {filter_type}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, UnitQuaternion};

    #[test]
    fn test_pass_through() {
        let mut filter = PassThroughFilter::default();
        assert!(!filter.is_ready());

        let raw = RigidTransform::uniform(Point3::new(1.0, 2.0, 3.0), UnitQuaternion::identity(), 1.2);
        let step = filter.apply(&raw);
        assert_eq!(step.transform, raw);
        assert!(filter.is_ready());

        filter.reset();
        assert!(!filter.is_ready());
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert_eq!(create_filter("Adaptive").unwrap().name(), "AdaptiveSmoother");
        assert!(create_filter("kalman").is_err());
    }
}
