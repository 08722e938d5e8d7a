//! Render graph infrastructure.
//!
//! The render graph provides a declarative way to describe rendering work
//! and its dependencies:
//!
//! - passes declare the names of the passes they depend on,
//! - [`RenderGraph::bake`] compiles the declarations into one fixed
//!   topological execution order and derives the semaphore wiring between
//!   passes from the dependency edges,
//! - [`RenderGraph::execute`] drives the baked order once per frame,
//!   submitting each pass with the waits and signals Bake derived for it.
//!
//! Baking happens exactly once. A graph that cannot be ordered (a dependency
//! cycle, a reference to an unknown pass) fails Bake with a diagnostic; it is
//! never truncated to a partial order, because a partial order has no safe
//! execution semantics.
//!
//! # Example
//!
//! ```ignore
//! let mut graph = RenderGraph::new(queue);
//!
//! let mut geometry = RenderPass::new("geometry", PassKind::Graphics(pipeline.clone()));
//! geometry.add_resource(gbuffer.clone(), ResourceAccess::Write, 0);
//! graph.add_pass(geometry)?;
//!
//! let mut lighting = RenderPass::new("lighting", PassKind::Graphics(lighting_pipeline));
//! lighting.add_dependency("geometry");
//! graph.add_pass(lighting)?;
//!
//! graph.bake()?;
//! ```

mod builder;
mod command;
mod executor;
mod handle;
mod pass;
mod registry;

pub use builder::ResourceBuilder;
pub use command::{CommandList, DrawCommand, RenderCommand};
pub use executor::CommandExecutor;
pub use handle::{ResourceHandle, ResourceType};
pub use pass::{PassKind, RenderContext, RenderPass, ResourceAccess, ResourceUsage};
pub use registry::{InFlightResource, RegistryResource, ResourceRegistry, ResourceVariant};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::backend::{GpuQueue, Submission, TimelinePoint};
use crate::camera::Camera;
use crate::error::{GraphError, GraphicsError};
use crate::sync::Semaphore;
use crate::types::ImageLayout;

/// CPU-side timing for one pass in one executed frame.
#[derive(Debug, Clone)]
pub struct PassStats {
    /// Pass name.
    pub name: String,
    /// Time spent recording and submitting the pass.
    pub cpu_execute: Duration,
}

type PreExecutionCallback = Box<dyn Fn(&Camera, &CommandList, usize) + Send + Sync>;

/// Compiles passes into a fixed execution order and drives per-frame
/// execution.
pub struct RenderGraph {
    queue: Arc<dyn GpuQueue>,
    /// Declaration order before Bake, baked order after.
    passes: Vec<RenderPass>,
    baked: bool,
    output_semaphore_handle: ResourceHandle,
    pre_execution: Option<PreExecutionCallback>,
    stats: Mutex<HashMap<usize, Vec<PassStats>>>,
}

impl RenderGraph {
    /// Create an empty graph submitting to `queue`.
    pub fn new(queue: Arc<dyn GpuQueue>) -> Self {
        Self {
            queue,
            passes: Vec::new(),
            baked: false,
            output_semaphore_handle: ResourceHandle::new(
                "graph.output.semaphore",
                ResourceType::Semaphore,
            ),
            pre_execution: None,
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Add a fully configured pass.
    ///
    /// Declaration order breaks ties among passes that become placeable at
    /// the same time during Bake, keeping execution order deterministic.
    pub fn add_pass(&mut self, pass: RenderPass) -> Result<(), GraphError> {
        if self.baked {
            return Err(GraphError::AlreadyBaked);
        }
        if self.passes.iter().any(|p| p.name() == pass.name()) {
            return Err(GraphError::DuplicatePass(pass.name().to_string()));
        }
        self.passes.push(pass);
        Ok(())
    }

    /// Add a dependency edge between two declared passes.
    ///
    /// After Bake the order is fixed; the request is logged and ignored.
    pub fn add_dependency(&mut self, pass_name: &str, dependency: &str) {
        if self.baked {
            log::warn!(
                "dependency `{}` -> `{}` added after bake, ignored",
                pass_name,
                dependency
            );
            return;
        }
        if let Some(pass) = self.passes.iter_mut().find(|p| p.name() == pass_name) {
            pass.add_dependency(dependency);
        } else {
            log::warn!("add_dependency: unknown pass `{}`", pass_name);
        }
    }

    /// Whether the graph has been baked.
    pub fn is_baked(&self) -> bool {
        self.baked
    }

    /// The passes, in declaration order before Bake and execution order
    /// after.
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    /// Pass names in the current order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Handle of the externally visible output semaphore.
    ///
    /// The last pass of every executed frame signals it; a presenter or
    /// viewport must wait on it before sampling the graph's output.
    pub fn output_semaphore_handle(&self) -> &ResourceHandle {
        &self.output_semaphore_handle
    }

    /// Set the callback invoked at the start of every `execute`, before any
    /// pass records. Used to upload per-frame data such as the camera
    /// uniform.
    pub fn set_pre_execution_callback(
        &mut self,
        callback: impl Fn(&Camera, &CommandList, usize) + Send + Sync + 'static,
    ) {
        self.pre_execution = Some(Box::new(callback));
    }

    /// Compile the declared passes into a fixed execution order.
    ///
    /// Kahn's algorithm over the dependency names: repeatedly place the
    /// first (by declaration order) unplaced pass whose dependencies are all
    /// placed. If a full scan places nothing while passes remain, the
    /// remainder forms a cycle and Bake fails.
    ///
    /// Baking also wires synchronization: each pass waits on the completion
    /// semaphores of its dependencies and signals its own, and each graphics
    /// pass gets its attachment transitions, rendering scope and pipeline
    /// bind staged from its declared resource usage.
    pub fn bake(&mut self) -> Result<(), GraphError> {
        if self.baked {
            return Err(GraphError::AlreadyBaked);
        }

        let declared: HashSet<String> =
            self.passes.iter().map(|p| p.name().to_string()).collect();
        for pass in &self.passes {
            for dependency in pass.dependencies() {
                if !declared.contains(dependency) {
                    return Err(GraphError::UnknownDependency {
                        pass: pass.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut remaining = std::mem::take(&mut self.passes);
        let mut placed: Vec<RenderPass> = Vec::with_capacity(remaining.len());
        let mut placed_names: HashSet<String> = HashSet::new();

        while !remaining.is_empty() {
            let next = remaining.iter().position(|pass| {
                pass.dependencies()
                    .iter()
                    .all(|dependency| placed_names.contains(dependency))
            });
            match next {
                Some(index) => {
                    let pass = remaining.remove(index);
                    placed_names.insert(pass.name().to_string());
                    placed.push(pass);
                }
                None => {
                    let stuck: Vec<String> =
                        remaining.iter().map(|p| p.name().to_string()).collect();
                    // Restore declaration order so the caller can inspect.
                    placed.extend(remaining);
                    self.passes = placed;
                    return Err(GraphError::CyclicDependency(stuck));
                }
            }
        }

        self.passes = placed;
        self.wire_semaphores();
        self.stage_pass_commands();
        self.baked = true;

        log::info!(
            "render graph baked: [{}]",
            self.pass_names().join(" -> ")
        );
        Ok(())
    }

    /// Derive each pass's wait set from the dependency edges.
    fn wire_semaphores(&mut self) {
        let semaphores: HashMap<String, ResourceHandle> = self
            .passes
            .iter()
            .map(|p| (p.name().to_string(), p.semaphore_handle().clone()))
            .collect();

        for pass in &mut self.passes {
            let waits: Vec<ResourceHandle> = pass
                .dependencies()
                .iter()
                .map(|dependency| semaphores[dependency].clone())
                .collect();
            pass.set_wait_semaphore_handles(waits);
        }
    }

    /// Stage pre and post-draw commands from declared resource usage.
    fn stage_pass_commands(&mut self) {
        for pass in &mut self.passes {
            let mut written_framebuffers: Vec<(ResourceHandle, u32)> = Vec::new();
            let mut read_targets: Vec<ResourceHandle> = Vec::new();
            let mut groups: Vec<(ResourceHandle, u32)> = Vec::new();

            for (handle, usage) in pass.resource_usage() {
                match handle.resource_type() {
                    ResourceType::Framebuffer => match usage.access {
                        ResourceAccess::Write => {
                            written_framebuffers.push((handle.clone(), usage.slot));
                        }
                        ResourceAccess::Read => read_targets.push(handle.clone()),
                    },
                    ResourceType::Texture2D => {
                        if usage.access == ResourceAccess::Read {
                            read_targets.push(handle.clone());
                        }
                    }
                    ResourceType::ShaderResourceGroup => {
                        groups.push((handle.clone(), usage.slot));
                    }
                    _ => {}
                }
            }

            written_framebuffers.sort_by_key(|(_, slot)| *slot);
            groups.sort_by_key(|(_, slot)| *slot);
            // Deterministic staging order for the read transitions too.
            read_targets.sort_by(|a, b| a.name().cmp(b.name()));
            let group_handles: Vec<ResourceHandle> =
                groups.into_iter().map(|(handle, _)| handle).collect();

            for target in read_targets {
                pass.add_pre_draw_command(RenderCommand::TransitionLayout {
                    target,
                    layout: ImageLayout::ShaderReadOnly,
                });
            }

            match pass.kind().clone() {
                PassKind::Graphics(pipeline) => {
                    if let Some((framebuffer, _)) = written_framebuffers.first().cloned() {
                        pass.add_pre_draw_command(RenderCommand::TransitionLayout {
                            target: framebuffer.clone(),
                            layout: ImageLayout::ColorAttachment,
                        });
                        pass.add_pre_draw_command(RenderCommand::TransitionLayout {
                            target: framebuffer.clone(),
                            layout: ImageLayout::DepthAttachment,
                        });
                        pass.add_pre_draw_command(RenderCommand::BeginRendering {
                            framebuffer,
                            clear_on_load: true,
                        });
                        pass.add_pre_draw_command(RenderCommand::BindGraphicsPipeline {
                            pipeline,
                            groups: group_handles,
                        });
                        pass.add_post_draw_command(RenderCommand::EndRendering);
                    }
                }
                PassKind::Compute(pipeline) => {
                    pass.add_pre_draw_command(RenderCommand::BindComputePipeline {
                        pipeline,
                        groups: group_handles,
                    });
                }
            }
        }
    }

    /// Register every pass's per-slot resources plus the graph's output
    /// semaphore into `registry`.
    pub fn initialize_registry(&self, registry: &ResourceRegistry) -> Result<(), GraphicsError> {
        if !self.baked {
            return Err(GraphError::NotBaked.into());
        }
        for pass in &self.passes {
            pass.init_registry(registry);
        }
        registry.add_resource(self.output_semaphore_handle.clone(), |i| {
            Arc::new(Semaphore::new(format!("graph.output.semaphore[{}]", i)))
        });
        Ok(())
    }

    /// Run every pass's setup callback for every frame slot.
    ///
    /// Called once per registry, after global resources are shared in, so
    /// descriptor bindings exist before the first render.
    pub fn setup_registry(&self, registry: &ResourceRegistry) -> Result<(), GraphicsError> {
        if !self.baked {
            return Err(GraphError::NotBaked.into());
        }
        for frame_index in 0..registry.frames_in_flight() {
            for pass in &self.passes {
                pass.setup(registry, frame_index);
            }
        }
        Ok(())
    }

    /// Execute every pass in baked order for one frame slot.
    ///
    /// Per pass: wait and reset its slot fence, record its commands, submit
    /// to the queue waiting on its dependencies' semaphores and signaling
    /// its own. The slot's timeline semaphore advances once per submission.
    /// The last pass transitions the designated output for sampling and
    /// signals the externally visible output semaphore.
    pub fn execute(
        &self,
        commands: &CommandList,
        camera: &Camera,
        frame_index: usize,
    ) -> Result<(), GraphicsError> {
        if !self.baked {
            return Err(GraphError::NotBaked.into());
        }
        let registry = camera.registry();

        if let Some(callback) = &self.pre_execution {
            callback(camera, commands, frame_index);
        }

        if let Some(extent) = registry.resize_dimensions(frame_index) {
            for pass in &self.passes {
                pass.resize(registry, frame_index, extent.width, extent.height);
            }
            registry.set_resize_handled(frame_index);
        }

        let timeline = registry.timeline(frame_index);
        let base_value = timeline.value();
        let mut frame_stats = Vec::with_capacity(self.passes.len());
        let last = self.passes.len().saturating_sub(1);

        for (i, pass) in self.passes.iter().enumerate() {
            let started = Instant::now();

            let cmd = pass.execute(commands, registry, frame_index);

            if i == last && registry.output().is_some() {
                let output = registry.color_output(frame_index);
                cmd.transition_image_layout(&output, ImageLayout::ShaderReadOnly);
            }

            cmd.end();

            let wait_semaphores: Vec<Arc<Semaphore>> = pass
                .wait_semaphore_handles()
                .iter()
                .map(|handle| registry.get(handle, frame_index))
                .collect();
            let mut signal_semaphores: Vec<Arc<Semaphore>> =
                vec![registry.get(pass.semaphore_handle(), frame_index)];
            if i == last {
                signal_semaphores
                    .push(registry.get(&self.output_semaphore_handle, frame_index));
            }
            let fence = registry.get(pass.fence_handle(), frame_index);

            self.queue.submit(Submission {
                command_buffer: cmd,
                wait_semaphores,
                signal_semaphores,
                timeline: Some(TimelinePoint {
                    timeline: timeline.clone(),
                    wait_value: base_value + i as u64,
                    signal_value: base_value + i as u64 + 1,
                }),
                fence: Some(fence),
            })?;

            frame_stats.push(PassStats {
                name: pass.name().to_string(),
                cpu_execute: started.elapsed(),
            });
        }

        self.stats.lock().insert(frame_index, frame_stats);
        Ok(())
    }

    /// The output semaphore instance for one frame slot.
    pub fn output_semaphore(
        &self,
        registry: &ResourceRegistry,
        frame_index: usize,
    ) -> Arc<Semaphore> {
        registry.get(&self.output_semaphore_handle, frame_index)
    }

    /// Timing of the most recent execution of one frame slot.
    pub fn stats(&self, frame_index: usize) -> Vec<PassStats> {
        self.stats.lock().get(&frame_index).cloned().unwrap_or_default()
    }
}

impl std::fmt::Debug for RenderGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraph")
            .field("queue", &self.queue.name())
            .field("passes", &self.pass_names())
            .field("baked", &self.baked)
            .finish_non_exhaustive()
    }
}
