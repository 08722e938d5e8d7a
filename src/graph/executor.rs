//! Command list interpretation.
//!
//! [`CommandExecutor`] is a stateless dispatch from command tag to a
//! resource-resolution plus native-call sequence. Handles are resolved
//! against the registry at the current frame index, so the same command list
//! records against different instances on different frames.

use std::mem;
use std::sync::Arc;

use crate::resources::{CommandBuffer, Framebuffer, Texture2D};
use crate::types::ImageLayout;

use super::command::{CommandList, DrawCommand, RenderCommand};
use super::handle::{ResourceHandle, ResourceType};
use super::registry::ResourceRegistry;

/// Push constant block accompanying each draw.
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct DrawPushConstants {
    model: [[f32; 4]; 4],
    material_index: u32,
    _padding: [u32; 3],
}

static_assertions::const_assert_eq!(mem::size_of::<DrawPushConstants>(), 80);

/// Interprets declarative command lists against live registry state.
pub struct CommandExecutor;

impl CommandExecutor {
    /// Record every command of `list` into `cmd`, resolving handles for
    /// `frame_index`.
    pub fn execute(
        cmd: &Arc<CommandBuffer>,
        list: &CommandList,
        registry: &ResourceRegistry,
        frame_index: usize,
    ) {
        for command in list.commands() {
            match command {
                RenderCommand::ClearFramebuffer { framebuffer } => {
                    let framebuffer: Arc<Framebuffer> = registry.get(framebuffer, frame_index);
                    cmd.clear_framebuffer(&framebuffer);
                }
                RenderCommand::TransitionLayout { target, layout } => {
                    Self::transition(cmd, target, *layout, registry, frame_index);
                }
                RenderCommand::BeginRendering {
                    framebuffer,
                    clear_on_load,
                } => {
                    let framebuffer: Arc<Framebuffer> = registry.get(framebuffer, frame_index);
                    cmd.begin_rendering(&framebuffer, *clear_on_load);
                }
                RenderCommand::EndRendering => {
                    cmd.end_rendering();
                }
                RenderCommand::BindGraphicsPipeline { pipeline, groups } => {
                    let groups = Self::resolve_groups(groups, registry, frame_index);
                    cmd.bind_graphics_pipeline(pipeline.label(), groups);
                }
                RenderCommand::BindComputePipeline { pipeline, groups } => {
                    let groups = Self::resolve_groups(groups, registry, frame_index);
                    cmd.bind_compute_pipeline(pipeline.label(), groups);
                }
                RenderCommand::Draw(draw) => {
                    Self::draw(cmd, draw);
                }
                RenderCommand::Dispatch { x, y, z } => {
                    cmd.dispatch(*x, *y, *z);
                }
            }
        }
    }

    fn transition(
        cmd: &Arc<CommandBuffer>,
        target: &ResourceHandle,
        layout: ImageLayout,
        registry: &ResourceRegistry,
        frame_index: usize,
    ) {
        match target.resource_type() {
            ResourceType::Texture2D => {
                let texture: Arc<Texture2D> = registry.get(target, frame_index);
                cmd.transition_image_layout(&texture, layout);
            }
            ResourceType::Framebuffer => {
                let framebuffer: Arc<Framebuffer> = registry.get(target, frame_index);
                if layout == ImageLayout::DepthAttachment {
                    if let Some(depth) = framebuffer.depth_attachment() {
                        cmd.transition_image_layout(&depth, layout);
                    }
                } else {
                    for attachment in framebuffer.color_attachments() {
                        cmd.transition_image_layout(&attachment, layout);
                    }
                }
            }
            other => {
                panic!("cannot transition layout of `{}` ({:?})", target, other);
            }
        }
    }

    fn resolve_groups(
        groups: &[ResourceHandle],
        registry: &ResourceRegistry,
        frame_index: usize,
    ) -> Vec<String> {
        groups
            .iter()
            .map(|handle| {
                let group: Arc<crate::resources::ShaderResourceGroup> =
                    registry.get(handle, frame_index);
                group.label().to_string()
            })
            .collect()
    }

    fn draw(cmd: &Arc<CommandBuffer>, draw: &DrawCommand) {
        let push = DrawPushConstants {
            model: draw.model.to_cols_array_2d(),
            material_index: draw.material_index,
            _padding: [0; 3],
        };
        cmd.push_constants(mem::size_of_val(&push) as u32);
        cmd.draw(draw.vertex_count, draw.instance_count, 0, 0);
    }
}
