//! Command buffers.
//!
//! A command buffer cycles through `Initial -> Recording -> Executable` every
//! frame: reset, begin, record the pass's commands, end, submit. State
//! transitions are enforced with panics because a misordered recording is a
//! programmer error, not a recoverable condition.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{Extent2d, ImageLayout};

use super::framebuffer::Framebuffer;
use super::texture::Texture2D;

/// Recording state of a command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferState {
    /// Reset, ready to begin recording.
    Initial,
    /// Between `begin` and `end`.
    Recording,
    /// Recording finished, ready to submit.
    Executable,
}

/// A command in its resolved, backend-facing form.
///
/// Resource references are stored as labels: this is the record a backend
/// would translate one-to-one into native calls, and what tests inspect to
/// verify recording order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// Clear every attachment of a framebuffer.
    ClearFramebuffer { framebuffer: String },
    /// Transition a texture into a new image layout.
    TransitionImageLayout {
        texture: String,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    },
    /// Begin dynamic rendering into a set of attachments.
    BeginRendering {
        extent: Extent2d,
        color_attachments: Vec<String>,
        depth_attachment: Option<String>,
        clear_on_load: bool,
    },
    /// End dynamic rendering.
    EndRendering,
    /// Bind a graphics pipeline with its shader resource groups.
    BindGraphicsPipeline {
        pipeline: String,
        groups: Vec<String>,
    },
    /// Bind a compute pipeline with its shader resource groups.
    BindComputePipeline {
        pipeline: String,
        groups: Vec<String>,
    },
    /// Push a block of constants.
    PushConstants { size: u32 },
    /// Non-indexed draw.
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    /// Compute dispatch.
    Dispatch { x: u32, y: u32, z: u32 },
}

/// A recordable, resettable command buffer.
#[derive(Debug)]
pub struct CommandBuffer {
    label: String,
    state: Mutex<CommandBufferState>,
    commands: Mutex<Vec<RecordedCommand>>,
}

impl CommandBuffer {
    /// Create a command buffer in the initial state.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(CommandBufferState::Initial),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current recording state.
    pub fn state(&self) -> CommandBufferState {
        *self.state.lock()
    }

    /// Discard recorded commands and return to the initial state.
    ///
    /// Must only be called once the fence guarding the previous submission
    /// has signaled.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        assert!(
            *state != CommandBufferState::Recording,
            "command buffer `{}` reset while recording",
            self.label
        );
        self.commands.lock().clear();
        *state = CommandBufferState::Initial;
    }

    /// Begin recording.
    pub fn begin(&self) {
        let mut state = self.state.lock();
        assert!(
            *state == CommandBufferState::Initial,
            "command buffer `{}` must be reset before begin",
            self.label
        );
        *state = CommandBufferState::Recording;
    }

    /// Finish recording.
    pub fn end(&self) {
        let mut state = self.state.lock();
        assert!(
            *state == CommandBufferState::Recording,
            "command buffer `{}` end without begin",
            self.label
        );
        *state = CommandBufferState::Executable;
    }

    fn record(&self, command: RecordedCommand) {
        assert!(
            *self.state.lock() == CommandBufferState::Recording,
            "command buffer `{}` is not recording",
            self.label
        );
        self.commands.lock().push(command);
    }

    /// Snapshot of the recorded commands.
    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.commands.lock().clone()
    }

    /// Number of recorded commands.
    pub fn recorded_len(&self) -> usize {
        self.commands.lock().len()
    }

    // Native recording interface. Each method resolves resources into their
    // recorded form and tracks the side effects a backend would apply.

    /// Clear every attachment of `framebuffer`.
    pub fn clear_framebuffer(&self, framebuffer: &Framebuffer) {
        self.record(RecordedCommand::ClearFramebuffer {
            framebuffer: framebuffer.label().to_string(),
        });
    }

    /// Transition `texture` into `new_layout`.
    pub fn transition_image_layout(&self, texture: &Arc<Texture2D>, new_layout: ImageLayout) {
        let old_layout = texture.set_layout(new_layout);
        self.record(RecordedCommand::TransitionImageLayout {
            texture: texture.label().to_string(),
            old_layout,
            new_layout,
        });
    }

    /// Begin rendering into the framebuffer's attachments.
    pub fn begin_rendering(&self, framebuffer: &Framebuffer, clear_on_load: bool) {
        self.record(RecordedCommand::BeginRendering {
            extent: framebuffer.extent(),
            color_attachments: framebuffer
                .color_attachments()
                .iter()
                .map(|t| t.label().to_string())
                .collect(),
            depth_attachment: framebuffer.depth_attachment().map(|t| t.label().to_string()),
            clear_on_load,
        });
    }

    /// End the current rendering scope.
    pub fn end_rendering(&self) {
        self.record(RecordedCommand::EndRendering);
    }

    /// Bind a graphics pipeline together with its resource groups.
    pub fn bind_graphics_pipeline(&self, pipeline: &str, groups: Vec<String>) {
        self.record(RecordedCommand::BindGraphicsPipeline {
            pipeline: pipeline.to_string(),
            groups,
        });
    }

    /// Bind a compute pipeline together with its resource groups.
    pub fn bind_compute_pipeline(&self, pipeline: &str, groups: Vec<String>) {
        self.record(RecordedCommand::BindComputePipeline {
            pipeline: pipeline.to_string(),
            groups,
        });
    }

    /// Push a block of constants.
    pub fn push_constants(&self, size: u32) {
        self.record(RecordedCommand::PushConstants { size });
    }

    /// Record a non-indexed draw.
    pub fn draw(
        &self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.record(RecordedCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    /// Record a compute dispatch.
    pub fn dispatch(&self, x: u32, y: u32, z: u32) {
        self.record(RecordedCommand::Dispatch { x, y, z });
    }
}
