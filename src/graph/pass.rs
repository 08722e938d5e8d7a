//! Render passes.
//!
//! A pass is a named unit of GPU work: a kind (graphics or compute), the
//! names of the passes it depends on, declared resource usage, and callbacks
//! invoked across its lifecycle. Passes are configured fully, handed to the
//! graph, compiled into a fixed order at Bake, set up once per frame slot,
//! then executed every frame.
//!
//! Declared resource usage is metadata. It drives the command staging done
//! at Bake and is available to validation tooling, but it never inserts a
//! barrier by itself; layout transitions are explicit commands, so the cost
//! of every transition stays visible in the pass that pays it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::pipeline::{ComputePipeline, GraphicsPipeline};
use crate::resources::CommandBuffer;
use crate::sync::{Fence, Semaphore};

use super::command::CommandList;
use super::executor::CommandExecutor;
use super::handle::{ResourceHandle, ResourceType};
use super::registry::ResourceRegistry;

/// The kind of work a pass records, with its kind-specific pipeline.
///
/// The set of pass kinds is fixed; call sites match exhaustively instead of
/// dispatching through a trait object.
#[derive(Debug, Clone)]
pub enum PassKind {
    /// Rasterization work driven by a graphics pipeline.
    Graphics(Arc<GraphicsPipeline>),
    /// Compute work driven by a compute pipeline.
    Compute(Arc<ComputePipeline>),
}

/// How a pass accesses a declared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
    /// The pass reads the resource.
    Read,
    /// The pass writes the resource.
    Write,
}

/// Declared usage of one resource by one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUsage {
    /// Access direction.
    pub access: ResourceAccess,
    /// Binding or attachment slot the resource occupies in the pass.
    pub slot: u32,
}

/// Read-only view handed to a pass's render callback.
///
/// Everything a callback may touch flows in through this context; passes
/// hold no references back into the graph or the renderer.
pub struct RenderContext<'a> {
    /// The externally produced draw list for this frame.
    pub commands: &'a CommandList,
    /// Resource lookup for the current frame.
    pub registry: &'a ResourceRegistry,
    /// The frame slot being recorded.
    pub frame_index: usize,
}

type RenderCallback = Box<dyn Fn(&Arc<CommandBuffer>, &RenderContext<'_>) + Send + Sync>;
type SetupCallback = Box<dyn Fn(&ResourceRegistry, usize) + Send + Sync>;
type ResizeCallback = Box<dyn Fn(&ResourceRegistry, usize, u32, u32) + Send + Sync>;

/// A named unit of GPU work in the render graph.
pub struct RenderPass {
    name: String,
    kind: PassKind,
    dependencies: Vec<String>,
    resource_usage: HashMap<ResourceHandle, ResourceUsage>,
    pre_draw: CommandList,
    post_draw: CommandList,
    fence_handle: ResourceHandle,
    command_buffer_handle: ResourceHandle,
    semaphore_handle: ResourceHandle,
    /// Semaphores of this pass's dependencies, wired at Bake.
    wait_semaphore_handles: Vec<ResourceHandle>,
    render_callback: Option<RenderCallback>,
    setup_callback: Option<SetupCallback>,
    resize_callback: Option<ResizeCallback>,
}

impl RenderPass {
    /// Create a pass. The name identifies it in dependency declarations.
    pub fn new(name: impl Into<String>, kind: PassKind) -> Self {
        let name = name.into();
        let fence_handle = ResourceHandle::new(format!("{}.fence", name), ResourceType::Fence);
        let command_buffer_handle =
            ResourceHandle::new(format!("{}.cmd", name), ResourceType::CommandBuffer);
        let semaphore_handle =
            ResourceHandle::new(format!("{}.semaphore", name), ResourceType::Semaphore);
        Self {
            name,
            kind,
            dependencies: Vec::new(),
            resource_usage: HashMap::new(),
            pre_draw: CommandList::new(),
            post_draw: CommandList::new(),
            fence_handle,
            command_buffer_handle,
            semaphore_handle,
            wait_semaphore_handles: Vec::new(),
            render_callback: None,
            setup_callback: None,
            resize_callback: None,
        }
    }

    /// The pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pass kind and pipeline.
    pub fn kind(&self) -> &PassKind {
        &self.kind
    }

    /// Declare that this pass runs after `pass_name`.
    ///
    /// Consumed at Bake time only.
    pub fn add_dependency(&mut self, pass_name: impl Into<String>) {
        let pass_name = pass_name.into();
        if !self.dependencies.contains(&pass_name) {
            self.dependencies.push(pass_name);
        }
    }

    /// Names of the passes this one depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Declare resource usage metadata.
    ///
    /// `slot` is the attachment or binding slot the resource occupies.
    pub fn add_resource(&mut self, handle: ResourceHandle, access: ResourceAccess, slot: u32) {
        self.resource_usage
            .insert(handle, ResourceUsage { access, slot });
    }

    /// Declared resource usage.
    pub fn resource_usage(&self) -> &HashMap<ResourceHandle, ResourceUsage> {
        &self.resource_usage
    }

    /// Set the callback recording the pass's actual work.
    ///
    /// The callback runs between the staged pre-draw and post-draw commands
    /// and must not block.
    pub fn set_render_callback(
        &mut self,
        callback: impl Fn(&Arc<CommandBuffer>, &RenderContext<'_>) + Send + Sync + 'static,
    ) {
        self.render_callback = Some(Box::new(callback));
    }

    /// Set the callback run once per frame slot after registry
    /// initialization, before the slot's first render.
    pub fn set_setup_callback(
        &mut self,
        callback: impl Fn(&ResourceRegistry, usize) + Send + Sync + 'static,
    ) {
        self.setup_callback = Some(Box::new(callback));
    }

    /// Set the callback applying a deferred resize to one frame slot.
    pub fn set_resize_callback(
        &mut self,
        callback: impl Fn(&ResourceRegistry, usize, u32, u32) + Send + Sync + 'static,
    ) {
        self.resize_callback = Some(Box::new(callback));
    }

    /// Handle of this pass's per-slot fence.
    pub fn fence_handle(&self) -> &ResourceHandle {
        &self.fence_handle
    }

    /// Handle of this pass's per-slot command buffer.
    pub fn command_buffer_handle(&self) -> &ResourceHandle {
        &self.command_buffer_handle
    }

    /// Handle of this pass's per-slot completion semaphore.
    pub fn semaphore_handle(&self) -> &ResourceHandle {
        &self.semaphore_handle
    }

    /// Semaphore handles this pass waits on, wired at Bake.
    pub fn wait_semaphore_handles(&self) -> &[ResourceHandle] {
        &self.wait_semaphore_handles
    }

    pub(crate) fn set_wait_semaphore_handles(&mut self, handles: Vec<ResourceHandle>) {
        self.wait_semaphore_handles = handles;
    }

    pub(crate) fn add_pre_draw_command(&mut self, command: super::command::RenderCommand) {
        self.pre_draw.add(command);
    }

    pub(crate) fn add_post_draw_command(&mut self, command: super::command::RenderCommand) {
        self.post_draw.add(command);
    }

    /// Register this pass's per-slot fence, command buffer and semaphore.
    ///
    /// Fences start signaled so the first frame through each slot does not
    /// wait.
    pub fn init_registry(&self, registry: &ResourceRegistry) {
        let name = self.name.clone();
        registry.add_resource(self.fence_handle.clone(), |i| {
            Arc::new(Fence::new_signaled(format!("{}.fence[{}]", name, i)))
        });
        let name = self.name.clone();
        registry.add_resource(self.command_buffer_handle.clone(), |i| {
            Arc::new(CommandBuffer::new(format!("{}.cmd[{}]", name, i)))
        });
        let name = self.name.clone();
        registry.add_resource(self.semaphore_handle.clone(), |i| {
            Arc::new(Semaphore::new(format!("{}.semaphore[{}]", name, i)))
        });
    }

    /// Run the per-slot setup callback.
    pub fn setup(&self, registry: &ResourceRegistry, frame_index: usize) {
        if let Some(callback) = &self.setup_callback {
            callback(registry, frame_index);
        }
    }

    /// Apply a deferred resize to one frame slot.
    pub fn resize(&self, registry: &ResourceRegistry, frame_index: usize, width: u32, height: u32) {
        if let Some(callback) = &self.resize_callback {
            callback(registry, frame_index, width, height);
        }
    }

    /// Record this pass's commands for one frame slot.
    ///
    /// Waits on and resets the slot fence, resets and begins the slot
    /// command buffer, then records pre-draw commands, the render callback,
    /// and post-draw commands. The buffer is returned still recording; the
    /// graph ends and submits it.
    pub fn execute(
        &self,
        commands: &CommandList,
        registry: &ResourceRegistry,
        frame_index: usize,
    ) -> Arc<CommandBuffer> {
        let fence: Arc<Fence> = registry.get(&self.fence_handle, frame_index);
        let cmd: Arc<CommandBuffer> = registry.get(&self.command_buffer_handle, frame_index);

        // The slot's previous submission must retire before its command
        // buffer is recycled.
        fence.wait();
        fence.reset();

        cmd.reset();
        cmd.begin();

        CommandExecutor::execute(&cmd, &self.pre_draw, registry, frame_index);

        if let Some(callback) = &self.render_callback {
            let ctx = RenderContext {
                commands,
                registry,
                frame_index,
            };
            callback(&cmd, &ctx);
        }

        CommandExecutor::execute(&cmd, &self.post_draw, registry, frame_index);

        cmd
    }
}

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("resource_usage", &self.resource_usage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::GraphicsPipelineDescriptor;
    use crate::resources::CommandBufferState;
    use crate::types::TextureFormat;

    fn graphics_kind() -> PassKind {
        PassKind::Graphics(Arc::new(
            GraphicsPipeline::new(GraphicsPipelineDescriptor {
                label: "geometry".into(),
                vertex_entry: "vs_main".into(),
                fragment_entry: "fs_main".into(),
                color_formats: vec![TextureFormat::Rgba16Float],
                depth_format: None,
            })
            .unwrap(),
        ))
    }

    #[test]
    fn test_derived_handles() {
        let pass = RenderPass::new("geometry", graphics_kind());
        assert_eq!(pass.fence_handle().name(), "geometry.fence");
        assert_eq!(pass.command_buffer_handle().name(), "geometry.cmd");
        assert_eq!(pass.semaphore_handle().name(), "geometry.semaphore");
    }

    #[test]
    fn test_dependency_dedup() {
        let mut pass = RenderPass::new("lighting", graphics_kind());
        pass.add_dependency("geometry");
        pass.add_dependency("geometry");
        assert_eq!(pass.dependencies(), &["geometry".to_string()]);
    }

    #[test]
    fn test_execute_records_callback() {
        let mut pass = RenderPass::new("geometry", graphics_kind());
        pass.set_render_callback(|cmd, ctx| {
            assert_eq!(ctx.frame_index, 0);
            cmd.draw(3, 1, 0, 0);
        });

        let registry = ResourceRegistry::new(2);
        pass.init_registry(&registry);

        let cmd = pass.execute(&CommandList::new(), &registry, 0);
        assert_eq!(cmd.state(), CommandBufferState::Recording);
        assert_eq!(cmd.recorded_len(), 1);
        cmd.end();
    }

    #[test]
    fn test_execute_waits_on_signaled_fence() {
        let pass = RenderPass::new("geometry", graphics_kind());
        let registry = ResourceRegistry::new(1);
        pass.init_registry(&registry);

        // First execute passes because fences start signaled; the fence is
        // left reset afterwards, pending the graph's submission.
        let cmd = pass.execute(&CommandList::new(), &registry, 0);
        cmd.end();
        let fence: Arc<Fence> = registry.get(pass.fence_handle(), 0);
        assert!(!fence.is_signaled());
    }
}
