//! Depth-only face occluder.
//!
//! A triangle fan spanning the face oval, rebuilt from landmarks every frame.
//! Contour points are pushed slightly toward the camera so the mask does not
//! z-fight with the face itself; the fan center is pulled back into the head
//! by a fraction of the face width, turning the flat oval into a shallow
//! cone. Temple arms behind that surface fail the depth test and vanish.

use crate::{
    config::OccluderConfig,
    constants::FACE_OVAL,
    landmarks::FaceLandmarks,
    pose_estimation::FaceBasis,
    Error, Result,
};
use nalgebra::{Point3, Vector3};

/// Dynamic occluder geometry
#[derive(Debug, Clone)]
pub struct OcclusionMesh {
    contour: Vec<usize>,
    vertices: Vec<Point3<f32>>,
    indices: Vec<u32>,
    scratch: Vec<Point3<f64>>,
    forward_offset: f64,
    cone_depth_ratio: f64,
    dirty: bool,
}

impl OcclusionMesh {
    /// Build a mesh over an ordered, non-self-intersecting contour
    ///
    /// # Errors
    ///
    /// Returns an error if the contour has fewer than three points
    pub fn new(contour: &[usize], config: &OccluderConfig) -> Result<Self> {
        if contour.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "Occluder contour needs at least 3 points, got {}",
                contour.len()
            )));
        }
        let indices = fan_indices(contour.len())?;

        Ok(Self {
            contour: contour.to_vec(),
            vertices: vec![Point3::origin(); contour.len() + 1],
            indices,
            scratch: Vec::with_capacity(contour.len()),
            forward_offset: config.forward_offset,
            cone_depth_ratio: config.cone_depth_ratio,
            dirty: false,
        })
    }

    /// Mesh over the 36-point face oval
    ///
    /// # Errors
    ///
    /// Never fails for the built-in oval; kept fallible to share `new`
    pub fn face_oval(config: &OccluderConfig) -> Result<Self> {
        Self::new(&FACE_OVAL, config)
    }

    /// Recompute every vertex from this frame's landmarks
    ///
    /// On error the previous vertices are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a contour index is outside the landmark set or
    /// the result is not finite
    pub fn update(&mut self, face: &FaceLandmarks<'_>, basis: &FaceBasis, face_width: f64) -> Result<()> {
        let forward: Vector3<f64> = basis.z * self.forward_offset;

        self.scratch.clear();
        let mut sum = Vector3::zeros();
        for &index in &self.contour {
            let pushed = face.world(index)? + forward;
            sum += pushed.coords;
            self.scratch.push(pushed);
        }

        // Contour length is at least three, checked in `new`
        #[allow(clippy::cast_precision_loss)]
        let centroid = Point3::from(sum / self.contour.len() as f64);
        let apex = centroid - basis.z * (face_width * self.cone_depth_ratio);

        if !finite(&apex) || !self.scratch.iter().all(finite) {
            return Err(Error::DegenerateGeometry("non-finite occluder vertex".to_string()));
        }

        self.vertices[0] = apex.cast::<f32>();
        for (slot, point) in self.vertices[1..].iter_mut().zip(&self.scratch) {
            *slot = point.cast::<f32>();
        }
        self.dirty = true;

        Ok(())
    }

    /// Fan center followed by the contour vertices
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Triangle list, three indices per triangle
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn contour_len(&self) -> usize {
        self.contour.len()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear and return the dirty flag; true means the buffer needs re-upload
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

fn finite(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|v| v.is_finite())
}

/// Triangle fan indices around vertex 0 for a closed contour of `n` points
///
/// # Errors
///
/// Returns an error if the vertex count does not fit a 32-bit index buffer
pub fn fan_indices(n: usize) -> Result<Vec<u32>> {
    let too_large = || Error::InvalidInput(format!("Contour of {n} points exceeds u32 indices"));
    if u32::try_from(n + 1).is_err() {
        return Err(too_large());
    }

    let mut indices = Vec::with_capacity(n * 3);
    for i in 0..n {
        let a = u32::try_from(i + 1).map_err(|_| too_large())?;
        let b = u32::try_from((i + 1) % n + 1).map_err(|_| too_large())?;
        indices.extend_from_slice(&[0, a, b]);
    }
    Ok(indices)
}
