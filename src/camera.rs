//! Camera value object.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::graph::ResourceRegistry;

/// GPU layout of the per-frame camera uniform.
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuCamera {
    /// Projection * view.
    pub view_projection: Mat4,
    /// World-to-view transform.
    pub view: Mat4,
    /// Camera position, w unused.
    pub position: Vec4,
    /// Normalized view direction, w unused.
    pub view_direction: Vec4,
}

static_assertions::const_assert_eq!(std::mem::size_of::<GpuCamera>(), 160);

/// A camera with its view/projection state and the resource registry its
/// frames render through.
///
/// Cameras are value objects: cloning one shares the registry (and with it
/// every per-frame resource) while the matrices remain independent.
#[derive(Debug, Clone)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
    position: Vec3,
    forward: Vec3,
    registry: Arc<ResourceRegistry>,
}

impl Camera {
    /// Create a camera with identity matrices.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            registry,
        }
    }

    /// Point the camera at `center` from `eye`.
    pub fn set_look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.view = Mat4::look_at_rh(eye, center, up);
        self.position = eye;
        self.forward = (center - eye).normalize_or_zero();
    }

    /// Set a perspective projection.
    pub fn set_perspective(&mut self, fov_y_radians: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
    }

    /// World-to-view transform.
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// View-to-clip transform.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Projection * view.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalized view direction.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// The registry this camera's frames render through.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// The uniform data uploaded at the start of every frame.
    pub fn gpu_layout(&self) -> GpuCamera {
        GpuCamera {
            view_projection: self.view_projection(),
            view: self.view,
            position: self.position.extend(0.0),
            view_direction: self.forward.extend(0.0),
        }
    }
}
