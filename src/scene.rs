//! Seam to the renderer's scene graph.
//!
//! The renderer is external; the tracking core only needs to place nodes,
//! toggle their visibility, order them, and push new occluder vertices.
//! `HeadlessNode` and `HeadlessOccluder` record what was applied so the
//! demo and tests can inspect it without a GPU.

use crate::transform::RigidTransform;
use nalgebra::Point3;

/// A transformable scene node
pub trait SceneNode {
    fn set_transform(&mut self, transform: &RigidTransform);

    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    /// Lower values are drawn first
    fn set_render_order(&mut self, order: i32);
}

/// A node whose mesh vertices are rewritten by the tracking core
///
/// Implementations must draw the mesh into the depth buffer only.
pub trait OccluderSurface: SceneNode {
    /// Replace the index buffer; called once when the session is created
    fn set_indices(&mut self, indices: &[u32]);

    /// Replace the vertex buffer and schedule a re-upload
    fn write_vertices(&mut self, vertices: &[Point3<f32>]);
}

/// The two nodes the tracking core drives
pub struct SceneHandles {
    pub overlay: Box<dyn SceneNode>,
    pub occluder: Box<dyn OccluderSurface>,
}

impl SceneHandles {
    #[must_use]
    pub fn new(overlay: Box<dyn SceneNode>, occluder: Box<dyn OccluderSurface>) -> Self {
        Self { overlay, occluder }
    }

    /// Show or hide overlay and occluder together
    pub fn set_visible(&mut self, visible: bool) {
        self.overlay.set_visible(visible);
        self.occluder.set_visible(visible);
    }
}

/// Recorded state of a headless node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    pub transform: Option<RigidTransform>,
    pub visible: bool,
    pub render_order: i32,
    pub transform_updates: u64,
}

/// Scene node without a renderer
///
/// Clones share state, so a caller can keep a handle for inspection after
/// giving the node to a session.
#[derive(Debug, Clone, Default)]
pub struct HeadlessNode {
    state: std::rc::Rc<std::cell::RefCell<NodeState>>,
}

impl HeadlessNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state.borrow().clone()
    }
}

impl SceneNode for HeadlessNode {
    fn set_transform(&mut self, transform: &RigidTransform) {
        let mut state = self.state.borrow_mut();
        state.transform = Some(*transform);
        state.transform_updates += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn set_render_order(&mut self, order: i32) {
        self.state.borrow_mut().render_order = order;
    }
}

/// Recorded buffers of a headless occluder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccluderBuffers {
    pub vertices: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
    pub uploads: u64,
}

/// Occluder without a renderer; clones share state
#[derive(Debug, Clone, Default)]
pub struct HeadlessOccluder {
    node: HeadlessNode,
    buffers: std::rc::Rc<std::cell::RefCell<OccluderBuffers>>,
}

impl HeadlessOccluder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.node.state()
    }

    #[must_use]
    pub fn buffers(&self) -> OccluderBuffers {
        self.buffers.borrow().clone()
    }
}

impl SceneNode for HeadlessOccluder {
    fn set_transform(&mut self, transform: &RigidTransform) {
        self.node.set_transform(transform);
    }

    fn set_visible(&mut self, visible: bool) {
        self.node.set_visible(visible);
    }

    fn is_visible(&self) -> bool {
        self.node.is_visible()
    }

    fn set_render_order(&mut self, order: i32) {
        self.node.set_render_order(order);
    }
}

impl OccluderSurface for HeadlessOccluder {
    fn set_indices(&mut self, indices: &[u32]) {
        self.buffers.borrow_mut().indices = indices.to_vec();
    }

    fn write_vertices(&mut self, vertices: &[Point3<f32>]) {
        let mut buffers = self.buffers.borrow_mut();
        buffers.vertices.clear();
        buffers.vertices.extend_from_slice(vertices);
        buffers.uploads += 1;
    }
}
