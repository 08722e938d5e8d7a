//! Declarative render commands.
//!
//! A [`CommandList`] is an ordered sequence of [`RenderCommand`]s referencing
//! resources by handle. Lists come from two places: passes stage their own
//! pre/post-draw commands at Bake time (layout transitions, rendering scope,
//! pipeline binds), and scene traversal produces the per-frame draw lists
//! submitted with each camera. Neither kind touches live resources; the
//! [`CommandExecutor`](super::executor::CommandExecutor) resolves handles at
//! execution time against the current frame's instances.

use std::sync::Arc;

use glam::Mat4;

use crate::pipeline::{ComputePipeline, GraphicsPipeline};
use crate::types::ImageLayout;

use super::handle::ResourceHandle;

/// A draw of one object, produced by scene traversal.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// Number of vertices to draw.
    pub vertex_count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// Bindless index of the material to shade with.
    pub material_index: u32,
    /// Object-to-world transform.
    pub model: Mat4,
}

/// One declarative command.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Clear every attachment of a framebuffer.
    ClearFramebuffer { framebuffer: ResourceHandle },
    /// Transition a texture, or every attachment of a framebuffer, into a
    /// new image layout.
    TransitionLayout {
        target: ResourceHandle,
        layout: ImageLayout,
    },
    /// Begin rendering into a framebuffer's attachments.
    BeginRendering {
        framebuffer: ResourceHandle,
        clear_on_load: bool,
    },
    /// End the current rendering scope.
    EndRendering,
    /// Bind a graphics pipeline and its shader resource groups.
    BindGraphicsPipeline {
        pipeline: Arc<GraphicsPipeline>,
        groups: Vec<ResourceHandle>,
    },
    /// Bind a compute pipeline and its shader resource groups.
    BindComputePipeline {
        pipeline: Arc<ComputePipeline>,
        groups: Vec<ResourceHandle>,
    },
    /// Draw one object.
    Draw(DrawCommand),
    /// Dispatch a compute grid.
    Dispatch { x: u32, y: u32, z: u32 },
}

/// An ordered sequence of render commands.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

impl CommandList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn add(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Append every command of another list.
    pub fn extend(&mut self, other: &CommandList) {
        self.commands.extend(other.commands.iter().cloned());
    }

    /// The commands in order.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove every command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
