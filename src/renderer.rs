//! Top-level renderer orchestration.
//!
//! [`Renderer`] owns the render graph, the resource builder it was declared
//! through, the shared global registry backing the bindless tables, and a
//! thread-safe submission queue of per-camera work. It is an explicitly
//! constructed service object: build one, pass it where it is needed, drop
//! it to tear down.
//!
//! # Frame loop
//!
//! ```ignore
//! let renderer = Renderer::new(RendererDescriptor::default())?;
//! let registry = renderer.create_resource_registry()?;
//! let camera = Camera::new(registry);
//!
//! // Any thread, any time:
//! renderer.submit(camera.clone(), command_list);
//!
//! // Render thread, once per frame:
//! renderer.render()?;
//! ```
//!
//! # Bindless tables
//!
//! Asset callbacks (`add_texture`, `add_material`, ...) mutate the CPU-side
//! tables immediately under a mutex and stage GPU-side writes into one
//! pending queue per frame slot. Each slot applies and clears only its own
//! queue when it is next rendered, so updates made while a slot's frame is
//! in flight are deferred to that slot's next turn instead of racing it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{DummyQueue, GpuQueue};
use crate::bindless::{AssetId, IndexTable};
use crate::camera::{Camera, GpuCamera};
use crate::error::GraphicsError;
use crate::graph::{
    CommandExecutor, CommandList, PassKind, RenderGraph, RenderPass, ResourceAccess,
    ResourceBuilder, ResourceHandle, ResourceRegistry,
};
use crate::material::{GpuMaterial, Material};
use crate::pipeline::{GraphicsPipeline, GraphicsPipelineDescriptor};
use crate::resources::{
    Framebuffer, FramebufferAttachment, FramebufferDescription, Sampler,
    ShaderResourceDescription, ShaderResourceGroup, ShaderResourceType, ShaderStages, Texture2D,
    UniformBuffer,
};
use crate::sync::Semaphore;
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage};

/// Array slots in the bindless texture binding.
pub const MAX_BINDLESS_TEXTURES: u32 = 4096;

/// Records in the bindless material buffer.
pub const MAX_MATERIALS: u32 = 800;

/// Asset identity of the built-in white placeholder texture.
pub const WHITE_TEXTURE: AssetId = AssetId(1);

/// Asset identity of the built-in black placeholder texture.
pub const BLACK_TEXTURE: AssetId = AssetId(2);

const MATERIAL_STRIDE: u64 = std::mem::size_of::<GpuMaterial>() as u64;

/// Construction parameters for a [`Renderer`].
#[derive(Debug, Clone)]
pub struct RendererDescriptor {
    /// Number of frame slots. Typically 2.
    pub frames_in_flight: usize,
    /// Initial output width in pixels.
    pub width: u32,
    /// Initial output height in pixels.
    pub height: u32,
}

impl Default for RendererDescriptor {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            width: 1280,
            height: 720,
        }
    }
}

/// One queued unit of work: a camera and the draw list rendered through it.
struct RenderRequest {
    camera: Camera,
    commands: CommandList,
}

/// A staged GPU-side bindless write, applied when its slot is next rendered.
enum BindlessUpdate {
    Texture { index: u32, texture: Arc<Texture2D> },
    Material { index: u32, material: GpuMaterial },
}

/// CPU-side bindless state, guarded by one mutex.
struct BindlessTables {
    textures: IndexTable<AssetId, Arc<Texture2D>>,
    materials: IndexTable<AssetId, GpuMaterial>,
    /// Source materials by identity, kept to re-derive records when a
    /// referenced texture's index changes.
    material_sources: HashMap<AssetId, Material>,
    /// One pending queue per frame slot.
    pending: Vec<Vec<BindlessUpdate>>,
    white_index: u32,
    black_index: u32,
}

impl BindlessTables {
    fn stage_for_all_slots(&mut self, make: impl Fn() -> BindlessUpdate) {
        for queue in &mut self.pending {
            queue.push(make());
        }
    }

    /// Build the GPU record for a material, resolving texture identities to
    /// bindless indices. Unknown references degrade to the placeholders.
    fn resolve(&self, material: &Material) -> GpuMaterial {
        let resolve_or = |map: Option<AssetId>, fallback: u32| {
            map.and_then(|id| self.textures.query_index(&id))
                .unwrap_or(fallback)
        };
        GpuMaterial {
            albedo_color: material.albedo_color,
            texture_scale: material.texture_scale,
            metalness: material.metalness,
            roughness: material.roughness,
            ambient_occlusion: material.ambient_occlusion,
            albedo_index: resolve_or(material.albedo_map, self.white_index),
            normal_index: resolve_or(material.normal_map, self.white_index),
            metalness_index: resolve_or(material.metalness_map, self.white_index),
            roughness_index: resolve_or(material.roughness_map, self.white_index),
            ao_index: resolve_or(material.ao_map, self.white_index),
            emissive_index: resolve_or(material.emissive_map, self.black_index),
            _padding: 0,
        }
    }

    /// Re-derive and stage every material record referencing `texture_id`.
    fn rederive_dependents(&mut self, texture_id: AssetId) {
        let dependents: Vec<AssetId> = self
            .material_sources
            .iter()
            .filter(|(_, source)| {
                [
                    source.albedo_map,
                    source.normal_map,
                    source.metalness_map,
                    source.roughness_map,
                    source.ao_map,
                    source.emissive_map,
                ]
                .contains(&Some(texture_id))
            })
            .map(|(id, _)| *id)
            .collect();

        for material_id in dependents {
            let source = self.material_sources[&material_id].clone();
            let record = self.resolve(&source);
            if let Some(index) = self.materials.query_index(&material_id) {
                self.materials.update(index, record);
                self.stage_for_all_slots(|| BindlessUpdate::Material {
                    index,
                    material: record,
                });
            }
        }
    }
}

/// Top-level orchestrator of graph execution and bindless state.
pub struct Renderer {
    frames_in_flight: usize,
    frame_index: Mutex<usize>,
    queue: Arc<dyn GpuQueue>,
    builder: ResourceBuilder,
    graph: RenderGraph,
    global_registry: Arc<ResourceRegistry>,
    requests: Mutex<Vec<RenderRequest>>,
    bindless: Mutex<BindlessTables>,

    framebuffer_handle: ResourceHandle,
    camera_buffer_handle: ResourceHandle,
    bindless_texture_srg_handle: ResourceHandle,
    material_buffer_handle: ResourceHandle,
    sampler_handle: ResourceHandle,
}

impl Renderer {
    /// Build a renderer with the in-tree CPU queue.
    pub fn new(descriptor: RendererDescriptor) -> Result<Self, GraphicsError> {
        Self::with_queue(Arc::new(DummyQueue::new()), descriptor)
    }

    /// Build a renderer submitting to `queue`.
    ///
    /// Declares the resource blueprints and the pass graph, bakes the graph,
    /// and materializes the shared global registry. Any conflict or invalid
    /// pipeline aborts construction here.
    pub fn with_queue(
        queue: Arc<dyn GpuQueue>,
        descriptor: RendererDescriptor,
    ) -> Result<Self, GraphicsError> {
        let frames_in_flight = descriptor.frames_in_flight;
        assert!(frames_in_flight > 0, "frames_in_flight must be at least 1");

        let mut builder = ResourceBuilder::new();

        // Per-camera blueprints.
        let camera_buffer_handle = builder
            .create_uniform_buffer("camera.buffer", std::mem::size_of::<GpuCamera>() as u64)?;
        let framebuffer_handle = builder.create_framebuffer(
            "gbuffer",
            FramebufferDescription::new(descriptor.width, descriptor.height)
                .with_color(FramebufferAttachment::new(TextureFormat::Rgba16Float))
                .with_depth(FramebufferAttachment::new(TextureFormat::Depth32Float)),
        )?;
        let geometry_srg_handle = builder.create_shader_resource_group(
            "geometry.srg",
            vec![ShaderResourceDescription::new(
                0,
                ShaderResourceType::UniformBuffer,
                ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            )],
        )?;

        // Blueprints shared by every camera registry.
        let material_buffer_handle = builder.create_global_uniform_buffer(
            "bindless.materials.buffer",
            MAX_MATERIALS as u64 * MATERIAL_STRIDE,
        )?;
        let material_srg_handle = builder.create_global_shader_resource_group(
            "bindless.materials.srg",
            vec![ShaderResourceDescription::new(
                0,
                ShaderResourceType::UniformBuffer,
                ShaderStages::FRAGMENT,
            )],
        )?;
        let bindless_texture_srg_handle = builder.create_global_shader_resource_group(
            "bindless.textures.srg",
            vec![ShaderResourceDescription::new(
                0,
                ShaderResourceType::Sampler,
                ShaderStages::FRAGMENT,
            )
            .with_count(MAX_BINDLESS_TEXTURES)],
        )?;
        let sampler_handle =
            builder.create_global_sampler("bindless.sampler", SamplerDescriptor::linear())?;

        let geometry_pipeline = Arc::new(GraphicsPipeline::new(GraphicsPipelineDescriptor {
            label: "geometry".into(),
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            color_formats: vec![TextureFormat::Rgba16Float],
            depth_format: Some(TextureFormat::Depth32Float),
        })?);

        let mut graph = RenderGraph::new(queue.clone());
        graph.add_pass(Self::build_geometry_pass(
            geometry_pipeline,
            &framebuffer_handle,
            &camera_buffer_handle,
            &geometry_srg_handle,
            &bindless_texture_srg_handle,
            &material_srg_handle,
        ))?;

        let upload_handle = camera_buffer_handle.clone();
        graph.set_pre_execution_callback(move |camera, _commands, frame_index| {
            let buffer: Arc<UniformBuffer> = camera.registry().get(&upload_handle, frame_index);
            if let Err(err) = buffer.write_pod(0, &camera.gpu_layout()) {
                log::error!("camera upload failed: {}", err);
            }
        });

        graph.bake()?;

        let global_registry = Arc::new(ResourceRegistry::new(frames_in_flight));
        builder.initialize_global_registry(&global_registry)?;

        // The material buffer backs the material group on every slot.
        for frame_index in 0..frames_in_flight {
            let group: Arc<ShaderResourceGroup> =
                global_registry.get(&material_srg_handle, frame_index);
            let buffer: Arc<UniformBuffer> =
                global_registry.get(&material_buffer_handle, frame_index);
            group.update_uniform_buffer(0, 0, buffer)?;
        }

        let renderer = Self {
            frames_in_flight,
            frame_index: Mutex::new(0),
            queue,
            builder,
            graph,
            global_registry,
            requests: Mutex::new(Vec::new()),
            bindless: Mutex::new(BindlessTables {
                textures: IndexTable::new(),
                materials: IndexTable::new(),
                material_sources: HashMap::new(),
                pending: (0..frames_in_flight).map(|_| Vec::new()).collect(),
                white_index: 0,
                black_index: 0,
            }),
            framebuffer_handle,
            camera_buffer_handle,
            bindless_texture_srg_handle,
            material_buffer_handle,
            sampler_handle,
        };

        renderer.insert_placeholder_textures()?;
        Ok(renderer)
    }

    fn build_geometry_pass(
        pipeline: Arc<GraphicsPipeline>,
        framebuffer: &ResourceHandle,
        camera_buffer: &ResourceHandle,
        geometry_srg: &ResourceHandle,
        bindless_texture_srg: &ResourceHandle,
        material_srg: &ResourceHandle,
    ) -> RenderPass {
        let mut pass = RenderPass::new("geometry", PassKind::Graphics(pipeline));
        pass.add_resource(framebuffer.clone(), ResourceAccess::Write, 0);
        pass.add_resource(camera_buffer.clone(), ResourceAccess::Read, 0);
        pass.add_resource(geometry_srg.clone(), ResourceAccess::Read, 0);
        pass.add_resource(bindless_texture_srg.clone(), ResourceAccess::Read, 1);
        pass.add_resource(material_srg.clone(), ResourceAccess::Read, 2);

        let camera_buffer = camera_buffer.clone();
        let geometry_srg = geometry_srg.clone();
        pass.set_setup_callback(move |registry, frame_index| {
            let group: Arc<ShaderResourceGroup> = registry.get(&geometry_srg, frame_index);
            let buffer: Arc<UniformBuffer> = registry.get(&camera_buffer, frame_index);
            if let Err(err) = group.update_uniform_buffer(0, 0, buffer) {
                log::error!("geometry pass setup failed: {}", err);
            }
        });

        let framebuffer = framebuffer.clone();
        pass.set_resize_callback(move |registry, frame_index, width, height| {
            let fb: Arc<Framebuffer> = registry.get(&framebuffer, frame_index);
            if let Err(err) = fb.resize(width, height) {
                log::error!("framebuffer resize failed: {}", err);
            }
        });

        pass.set_render_callback(|cmd, ctx| {
            CommandExecutor::execute(cmd, ctx.commands, ctx.registry, ctx.frame_index);
        });

        pass
    }

    fn insert_placeholder_textures(&self) -> Result<(), GraphicsError> {
        let white = Arc::new(Texture2D::new(
            TextureDescriptor::new_2d(1, 1, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED)
                .with_label("builtin.white"),
        )?);
        let black = Arc::new(Texture2D::new(
            TextureDescriptor::new_2d(1, 1, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED)
                .with_label("builtin.black"),
        )?);

        let mut bindless = self.bindless.lock();
        let white_index = bindless.textures.insert(WHITE_TEXTURE, white.clone());
        let black_index = bindless.textures.insert(BLACK_TEXTURE, black.clone());
        bindless.white_index = white_index;
        bindless.black_index = black_index;
        bindless.stage_for_all_slots(|| BindlessUpdate::Texture {
            index: white_index,
            texture: white.clone(),
        });
        bindless.stage_for_all_slots(|| BindlessUpdate::Texture {
            index: black_index,
            texture: black.clone(),
        });
        Ok(())
    }

    /// Number of frame slots.
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    /// The slot the next `render` call will use.
    pub fn frame_index(&self) -> usize {
        *self.frame_index.lock()
    }

    /// The render graph.
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// The registry holding the shared bindless resources.
    pub fn global_registry(&self) -> &Arc<ResourceRegistry> {
        &self.global_registry
    }

    /// The queue submissions go to.
    pub fn queue(&self) -> &Arc<dyn GpuQueue> {
        &self.queue
    }

    /// The resource builder the graph was declared through.
    pub fn builder(&self) -> &ResourceBuilder {
        &self.builder
    }

    /// Handle of the per-camera output framebuffer.
    pub fn framebuffer_handle(&self) -> &ResourceHandle {
        &self.framebuffer_handle
    }

    /// Handle of the per-camera camera uniform buffer.
    pub fn camera_buffer_handle(&self) -> &ResourceHandle {
        &self.camera_buffer_handle
    }

    /// Build a registry for one camera.
    ///
    /// Materializes every local blueprint, registers the graph's per-pass
    /// resources, shares the global bindless instances in, and runs every
    /// pass's one-time setup for every slot so descriptor bindings exist
    /// before the first render.
    pub fn create_resource_registry(&self) -> Result<Arc<ResourceRegistry>, GraphicsError> {
        let registry = Arc::new(ResourceRegistry::new(self.frames_in_flight));
        self.builder.initialize_registry(&registry)?;
        self.graph.initialize_registry(&registry)?;
        registry.copy_registry_resources(&self.global_registry);
        self.graph.setup_registry(&registry)?;
        registry.set_output(self.framebuffer_handle.clone(), 0);
        Ok(registry)
    }

    /// Enqueue one frame of work for one camera. Thread-safe.
    pub fn submit(&self, camera: Camera, commands: CommandList) {
        self.requests.lock().push(RenderRequest { camera, commands });
    }

    /// Drain the submission queue and execute one frame.
    ///
    /// For each queued request: wait on that camera's slot fences, apply the
    /// slot's pending bindless updates, then drive one graph execution.
    /// Advances to the next frame slot afterwards.
    pub fn render(&self) -> Result<(), GraphicsError> {
        let frame_index = *self.frame_index.lock();
        let requests = std::mem::take(&mut *self.requests.lock());

        for request in &requests {
            request.camera.registry().wait_for_fences(frame_index);
            self.apply_pending_updates(frame_index);
            self.graph
                .execute(&request.commands, &request.camera, frame_index)?;
        }

        *self.frame_index.lock() = (frame_index + 1) % self.frames_in_flight;
        Ok(())
    }

    /// Apply and clear one slot's pending bindless queue.
    fn apply_pending_updates(&self, frame_index: usize) {
        let updates = std::mem::take(&mut self.bindless.lock().pending[frame_index]);
        if updates.is_empty() {
            return;
        }
        log::trace!(
            "applying {} bindless updates to slot {}",
            updates.len(),
            frame_index
        );

        let group: Arc<ShaderResourceGroup> = self
            .global_registry
            .get(&self.bindless_texture_srg_handle, frame_index);
        let sampler: Arc<Sampler> = self.global_registry.get(&self.sampler_handle, frame_index);
        let material_buffer: Arc<UniformBuffer> = self
            .global_registry
            .get(&self.material_buffer_handle, frame_index);

        for update in updates {
            match update {
                BindlessUpdate::Texture { index, texture } => {
                    if let Err(err) = group.update_texture(0, index, texture, sampler.clone()) {
                        log::error!("bindless texture update failed: {}", err);
                    }
                }
                BindlessUpdate::Material { index, material } => {
                    let offset = index as u64 * MATERIAL_STRIDE;
                    if let Err(err) = material_buffer.write_pod(offset, &material) {
                        log::error!("bindless material update failed: {}", err);
                    }
                }
            }
        }
    }

    // Asset callbacks. All thread-safe; GPU-side writes are staged per frame
    // slot and applied when that slot is next rendered.

    /// Register a loaded texture, returning its bindless index.
    pub fn add_texture(&self, id: AssetId, texture: Arc<Texture2D>) -> u32 {
        let mut bindless = self.bindless.lock();
        let index = bindless.textures.insert(id, texture.clone());
        if index >= MAX_BINDLESS_TEXTURES {
            log::error!(
                "bindless texture table full, `{}` degrades to placeholder",
                id
            );
            bindless.textures.remove(&id);
            return bindless.white_index;
        }
        bindless.stage_for_all_slots(|| BindlessUpdate::Texture {
            index,
            texture: texture.clone(),
        });
        bindless.rederive_dependents(id);
        index
    }

    /// Create and register a texture, degrading to the white placeholder on
    /// creation failure.
    pub fn add_texture_from_descriptor(&self, id: AssetId, descriptor: TextureDescriptor) -> u32 {
        match Texture2D::new(descriptor) {
            Ok(texture) => self.add_texture(id, Arc::new(texture)),
            Err(err) => {
                log::error!("texture `{}` creation failed, using placeholder: {}", id, err);
                self.bindless.lock().white_index
            }
        }
    }

    /// Release a texture's bindless index.
    ///
    /// Materials referencing the texture are re-derived against the
    /// placeholders.
    pub fn remove_texture(&self, id: AssetId) {
        let mut bindless = self.bindless.lock();
        bindless.textures.remove(&id);
        bindless.rederive_dependents(id);
    }

    /// Register a material, returning its bindless index.
    pub fn add_material(&self, id: AssetId, material: Material) -> u32 {
        let mut bindless = self.bindless.lock();
        let record = bindless.resolve(&material);
        let index = bindless.materials.insert(id, record);
        if index >= MAX_MATERIALS {
            log::error!("bindless material table full, `{}` dropped", id);
            bindless.materials.remove(&id);
            return 0;
        }
        bindless.material_sources.insert(id, material);
        bindless.stage_for_all_slots(|| BindlessUpdate::Material {
            index,
            material: record,
        });
        index
    }

    /// Re-derive and rewrite an existing material's record in place.
    pub fn update_material(&self, id: AssetId, material: Material) {
        let mut bindless = self.bindless.lock();
        let Some(index) = bindless.materials.query_index(&id) else {
            log::warn!("update for unknown material `{}` ignored", id);
            return;
        };
        let record = bindless.resolve(&material);
        bindless.materials.update(index, record);
        bindless.material_sources.insert(id, material);
        bindless.stage_for_all_slots(|| BindlessUpdate::Material {
            index,
            material: record,
        });
    }

    /// Release a material's bindless index.
    pub fn remove_material(&self, id: AssetId) {
        let mut bindless = self.bindless.lock();
        bindless.materials.remove(&id);
        bindless.material_sources.remove(&id);
    }

    /// Bindless index of a resident texture.
    pub fn texture_index(&self, id: AssetId) -> Option<u32> {
        self.bindless.lock().textures.query_index(&id)
    }

    /// Bindless index of a resident material.
    pub fn material_index(&self, id: AssetId) -> Option<u32> {
        self.bindless.lock().materials.query_index(&id)
    }

    /// The material record currently derived for `id`.
    pub fn material_record(&self, id: AssetId) -> Option<GpuMaterial> {
        let bindless = self.bindless.lock();
        bindless.materials.get_by_key(&id).copied()
    }

    /// Number of staged bindless updates for one slot.
    pub fn pending_update_count(&self, frame_index: usize) -> usize {
        self.bindless.lock().pending[frame_index].len()
    }

    // Presenter-facing output.

    /// The output image of `camera`'s current frame slot.
    pub fn frame_buffer(&self, camera: &Camera) -> Arc<Texture2D> {
        camera.registry().color_output(self.frame_index())
    }

    /// The semaphore a presenter must wait on before consuming the output
    /// of `camera`'s current frame slot.
    pub fn output_semaphore(&self, camera: &Camera) -> Arc<Semaphore> {
        self.graph
            .output_semaphore(camera.registry(), self.frame_index())
    }

    /// Request a deferred resize of `camera`'s output.
    ///
    /// Each frame slot applies the new dimensions the next time it is
    /// executed; in-flight frames keep the old ones.
    pub fn resize(&self, camera: &Camera, width: u32, height: u32) {
        camera.registry().resize(width, height);
    }

    /// Block until every slot of `camera`'s registry is idle.
    pub fn wait_idle(&self, camera: &Camera) {
        camera.registry().wait_idle();
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("frames_in_flight", &self.frames_in_flight)
            .field("frame_index", &self.frame_index())
            .field("queue", &self.queue.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampled_texture(label: &str) -> Arc<Texture2D> {
        Arc::new(
            Texture2D::new(
                TextureDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED)
                    .with_label(label),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_placeholders_inserted_at_construction() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
        assert_eq!(renderer.texture_index(WHITE_TEXTURE), Some(0));
        assert_eq!(renderer.texture_index(BLACK_TEXTURE), Some(1));
    }

    #[test]
    fn test_material_resolves_placeholder_for_unknown_texture() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();

        let material = Material {
            albedo_map: Some(AssetId(100)), // never loaded
            emissive_map: Some(AssetId(101)),
            ..Default::default()
        };
        let id = AssetId(10);
        renderer.add_material(id, material);

        let record = renderer.material_record(id).unwrap();
        assert_eq!(record.albedo_index, 0); // white
        assert_eq!(record.emissive_index, 1); // black
    }

    #[test]
    fn test_material_rederived_when_texture_arrives() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();

        let texture_id = AssetId(100);
        let material_id = AssetId(10);
        renderer.add_material(
            material_id,
            Material {
                albedo_map: Some(texture_id),
                ..Default::default()
            },
        );
        assert_eq!(
            renderer.material_record(material_id).unwrap().albedo_index,
            0
        );

        let index = renderer.add_texture(texture_id, sampled_texture("albedo"));
        assert_eq!(
            renderer.material_record(material_id).unwrap().albedo_index,
            index
        );

        renderer.remove_texture(texture_id);
        assert_eq!(
            renderer.material_record(material_id).unwrap().albedo_index,
            0
        );
    }

    #[test]
    fn test_failed_texture_creation_degrades() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
        let zero_extent =
            TextureDescriptor::new_2d(0, 0, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED);
        let index = renderer.add_texture_from_descriptor(AssetId(50), zero_extent);
        assert_eq!(index, 0); // white placeholder
        assert_eq!(renderer.texture_index(AssetId(50)), None);
    }

    #[test]
    fn test_update_unknown_material_ignored() {
        let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
        renderer.update_material(AssetId(99), Material::default());
        assert_eq!(renderer.material_index(AssetId(99)), None);
    }
}
