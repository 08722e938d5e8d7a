//! # Vermilion Graphics
//!
//! Rendering core built around a dependency-ordered render graph,
//! frames-in-flight resource management and bindless asset tables.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderGraph`] - passes compiled once into a fixed execution order,
//!   with semaphore wiring derived from the dependency edges
//! - [`ResourceRegistry`] - every declared resource materialized once per
//!   frame slot, with fences gating slot reuse
//! - [`IndexTable`] - stable asset identities mapped to compact bindless
//!   indices with free-list reuse
//! - [`Renderer`] - top-level orchestrator owning the graph, the bindless
//!   tables and the submission queue
//!
//! ## Example
//!
//! ```ignore
//! use vermilion_graphics::{Renderer, RendererDescriptor, Camera, CommandList};
//!
//! let renderer = Renderer::new(RendererDescriptor::default())?;
//! let registry = renderer.create_resource_registry()?;
//! let camera = Camera::new(registry);
//!
//! renderer.submit(camera.clone(), CommandList::new());
//! renderer.render()?;
//! ```

pub mod backend;
pub mod bindless;
pub mod camera;
pub mod error;
pub mod graph;
pub mod material;
pub mod pipeline;
pub mod renderer;
pub mod resources;
pub mod sync;
pub mod types;

// Re-export main types for convenience
pub use backend::{DummyQueue, GpuQueue, Submission};
pub use bindless::{AssetId, IndexTable};
pub use camera::{Camera, GpuCamera};
pub use error::{GraphError, GraphicsError};
pub use graph::{
    CommandList, DrawCommand, PassKind, RenderCommand, RenderGraph, RenderPass, ResourceAccess,
    ResourceBuilder, ResourceHandle, ResourceRegistry, ResourceType,
};
pub use material::{GpuMaterial, Material};
pub use renderer::{Renderer, RendererDescriptor};
pub use sync::{Fence, FenceStatus, Semaphore, TimelineSemaphore};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Vermilion Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_renderer_construction() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
        assert_eq!(renderer.frames_in_flight(), 2);
    }
}
