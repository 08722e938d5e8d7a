//! End-to-end tests driving the render graph through the CPU queue.

use std::sync::Arc;

use rstest::rstest;

use vermilion_graphics::graph::{
    CommandList, PassKind, RenderGraph, RenderPass, ResourceRegistry, ResourceType,
};
use vermilion_graphics::pipeline::{GraphicsPipeline, GraphicsPipelineDescriptor};
use vermilion_graphics::resources::{CommandBuffer, Framebuffer};
use vermilion_graphics::types::{Extent2d, TextureFormat};
use vermilion_graphics::{
    AssetId, Camera, DummyQueue, Fence, GraphError, Material, Renderer, RendererDescriptor,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn test_pipeline() -> Arc<GraphicsPipeline> {
    Arc::new(
        GraphicsPipeline::new(GraphicsPipelineDescriptor {
            label: "test".into(),
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            color_formats: vec![TextureFormat::Rgba16Float],
            depth_format: None,
        })
        .unwrap(),
    )
}

fn pass(name: &str, dependencies: &[&str]) -> RenderPass {
    let mut pass = RenderPass::new(name, PassKind::Graphics(test_pipeline()));
    for dependency in dependencies {
        pass.add_dependency(*dependency);
    }
    pass
}

/// Build passes A (no deps), B (dep A), C (dep A, B); bake; assert the
/// execution order is [A, B, C].
#[test]
fn bake_orders_dependent_passes() {
    init_logs();
    let mut graph = RenderGraph::new(Arc::new(DummyQueue::new()));
    graph.add_pass(pass("a", &[])).unwrap();
    graph.add_pass(pass("b", &["a"])).unwrap();
    graph.add_pass(pass("c", &["a", "b"])).unwrap();

    graph.bake().unwrap();

    let order = graph.pass_names();
    assert_eq!(order, vec!["a", "b", "c"]);
    for p in graph.passes() {
        for dependency in p.dependencies() {
            let own = order.iter().position(|n| *n == p.name()).unwrap();
            let dep = order.iter().position(|n| n == dependency).unwrap();
            assert!(dep < own, "{} must run before {}", dependency, p.name());
        }
    }
}

/// A cyclic graph must fail Bake deterministically, every time.
#[test]
fn cyclic_graph_fails_every_bake() {
    init_logs();
    for _ in 0..3 {
        let mut graph = RenderGraph::new(Arc::new(DummyQueue::new()));
        graph.add_pass(pass("a", &["c"])).unwrap();
        graph.add_pass(pass("b", &["a"])).unwrap();
        graph.add_pass(pass("c", &["b"])).unwrap();

        assert!(matches!(
            graph.bake(),
            Err(GraphError::CyclicDependency(_))
        ));
        assert!(!graph.is_baked());
    }
}

/// With two frames in flight, slot 0 and slot 1 own distinct fence and
/// command buffer instances.
#[rstest]
#[case(2)]
#[case(3)]
fn slots_own_distinct_sync_objects(#[case] frames_in_flight: usize) {
    init_logs();
    let queue = Arc::new(DummyQueue::new());
    let mut graph = RenderGraph::new(queue.clone());
    graph.add_pass(pass("a", &[])).unwrap();
    graph.add_pass(pass("b", &["a"])).unwrap();
    graph.bake().unwrap();

    let registry = Arc::new(ResourceRegistry::new(frames_in_flight));
    graph.initialize_registry(&registry).unwrap();
    graph.setup_registry(&registry).unwrap();

    for p in graph.passes() {
        let mut fences: Vec<Arc<Fence>> = Vec::new();
        let mut buffers: Vec<Arc<CommandBuffer>> = Vec::new();
        for frame_index in 0..frames_in_flight {
            fences.push(registry.get(p.fence_handle(), frame_index));
            buffers.push(registry.get(p.command_buffer_handle(), frame_index));
        }
        for i in 0..frames_in_flight {
            for j in (i + 1)..frames_in_flight {
                assert!(!Arc::ptr_eq(&fences[i], &fences[j]));
                assert!(!Arc::ptr_eq(&buffers[i], &buffers[j]));
            }
        }
    }

    // Execute two consecutive frames across distinct slots.
    let camera = Camera::new(registry.clone());
    graph.execute(&CommandList::new(), &camera, 0).unwrap();
    graph.execute(&CommandList::new(), &camera, 1).unwrap();
    assert_eq!(queue.submission_count(), 4);
}

/// Each pass waits on its dependencies' semaphores; the last pass also
/// signals the externally visible output semaphore.
#[test]
fn execute_wires_semaphores_from_dependencies() {
    init_logs();
    let queue = Arc::new(DummyQueue::new());
    let mut graph = RenderGraph::new(queue.clone());
    graph.add_pass(pass("geometry", &[])).unwrap();
    graph.add_pass(pass("lighting", &["geometry"])).unwrap();
    graph.bake().unwrap();

    let registry = Arc::new(ResourceRegistry::new(2));
    graph.initialize_registry(&registry).unwrap();
    graph.setup_registry(&registry).unwrap();

    let camera = Camera::new(registry.clone());
    graph.execute(&CommandList::new(), &camera, 0).unwrap();

    let submissions = queue.submissions();
    assert_eq!(submissions.len(), 2);

    assert_eq!(submissions[0].command_buffer, "geometry.cmd[0]");
    assert!(submissions[0].waits.is_empty());
    assert_eq!(submissions[0].signals, vec!["geometry.semaphore[0]"]);

    assert_eq!(submissions[1].command_buffer, "lighting.cmd[0]");
    assert_eq!(submissions[1].waits, vec!["geometry.semaphore[0]"]);
    assert_eq!(
        submissions[1].signals,
        vec!["lighting.semaphore[0]", "graph.output.semaphore[0]"]
    );

    // The presenter-facing semaphore was signaled exactly once.
    assert_eq!(graph.output_semaphore(&registry, 0).signal_count(), 1);
    // The slot's timeline advanced once per pass.
    assert_eq!(registry.timeline(0).value(), 2);
}

/// The baked order is fixed: every executed frame submits the same sequence.
#[test]
fn execution_order_is_stable_across_frames() {
    init_logs();
    let queue = Arc::new(DummyQueue::new());
    let mut graph = RenderGraph::new(queue.clone());
    graph.add_pass(pass("shadow", &[])).unwrap();
    graph.add_pass(pass("geometry", &["shadow"])).unwrap();
    graph.add_pass(pass("post", &["geometry"])).unwrap();
    graph.bake().unwrap();

    let registry = Arc::new(ResourceRegistry::new(2));
    graph.initialize_registry(&registry).unwrap();
    graph.setup_registry(&registry).unwrap();
    let camera = Camera::new(registry);

    for frame in 0..4u64 {
        graph
            .execute(&CommandList::new(), &camera, (frame % 2) as usize)
            .unwrap();
    }

    let submissions = queue.submissions();
    assert_eq!(submissions.len(), 12);
    for frame in 0..4 {
        let slot = frame % 2;
        assert_eq!(
            submissions[frame * 3].command_buffer,
            format!("shadow.cmd[{}]", slot)
        );
        assert_eq!(
            submissions[frame * 3 + 1].command_buffer,
            format!("geometry.cmd[{}]", slot)
        );
        assert_eq!(
            submissions[frame * 3 + 2].command_buffer,
            format!("post.cmd[{}]", slot)
        );
    }
}

/// wait_for_fences returns once every slot fence has signaled and returns
/// immediately when called again without a new submission.
#[test]
fn wait_for_fences_idempotent_until_reset() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
    let registry = renderer.create_resource_registry().unwrap();
    let camera = Camera::new(registry.clone());

    renderer.submit(camera.clone(), CommandList::new());
    renderer.render().unwrap();

    // The queue signaled the fences at submit time; both calls return
    // without blocking.
    registry.wait_for_fences(0);
    registry.wait_for_fences(0);
    registry.wait_idle();
}

/// A resize requested between frames is not applied to a slot until that
/// slot's next execution.
#[test]
fn resize_is_deferred_per_slot() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor {
        frames_in_flight: 2,
        width: 800,
        height: 600,
    })
    .unwrap();
    let registry = renderer.create_resource_registry().unwrap();
    let camera = Camera::new(registry.clone());
    let fb_handle = renderer.framebuffer_handle().clone();

    // Frame 0 renders slot 0 at the original size.
    renderer.submit(camera.clone(), CommandList::new());
    renderer.render().unwrap();

    renderer.resize(&camera, 1024, 768);

    // The request is pending; no instance has been touched yet.
    let slot0: Arc<Framebuffer> = registry.get(&fb_handle, 0);
    let slot1: Arc<Framebuffer> = registry.get(&fb_handle, 1);
    assert_eq!(slot0.extent(), Extent2d::new(800, 600));
    assert_eq!(slot1.extent(), Extent2d::new(800, 600));

    // Frame 1 uses slot 1 and applies its resize; slot 0 still holds the
    // old dimensions.
    renderer.submit(camera.clone(), CommandList::new());
    renderer.render().unwrap();
    assert_eq!(slot1.extent(), Extent2d::new(1024, 768));
    assert_eq!(slot0.extent(), Extent2d::new(800, 600));
    assert!(registry.is_resize_requested(0));

    // Frame 2 returns to slot 0 and applies it there too.
    renderer.submit(camera.clone(), CommandList::new());
    renderer.render().unwrap();
    assert_eq!(slot0.extent(), Extent2d::new(1024, 768));
    assert!(!registry.is_resize_requested(0));
}

/// Pending bindless updates are applied and cleared per slot, once.
#[test]
fn bindless_updates_drain_per_slot() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
    let registry = renderer.create_resource_registry().unwrap();
    let camera = Camera::new(registry);

    // Construction staged the two placeholder textures for both slots.
    assert_eq!(renderer.pending_update_count(0), 2);
    assert_eq!(renderer.pending_update_count(1), 2);

    renderer.add_material(AssetId(10), Material::default());
    assert_eq!(renderer.pending_update_count(0), 3);
    assert_eq!(renderer.pending_update_count(1), 3);

    // Two cameras in the same frame: the slot's queue drains exactly once.
    let second_registry = renderer.create_resource_registry().unwrap();
    let second_camera = Camera::new(second_registry);
    renderer.submit(camera.clone(), CommandList::new());
    renderer.submit(second_camera, CommandList::new());
    renderer.render().unwrap();

    assert_eq!(renderer.pending_update_count(0), 0);
    assert_eq!(renderer.pending_update_count(1), 3);

    // Updates made while slot 1's queue is still pending simply append.
    renderer.add_material(AssetId(11), Material::default());
    assert_eq!(renderer.pending_update_count(0), 1);
    assert_eq!(renderer.pending_update_count(1), 4);

    renderer.submit(camera, CommandList::new());
    renderer.render().unwrap();
    assert_eq!(renderer.pending_update_count(1), 0);
}

/// Two camera registries share the same global bindless instances.
#[test]
fn global_resources_are_shared_across_registries() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
    let registry_a = renderer.create_resource_registry().unwrap();
    let registry_b = renderer.create_resource_registry().unwrap();

    let handle = renderer
        .builder()
        .global_handle("bindless.materials.buffer")
        .unwrap();
    assert_eq!(handle.resource_type(), ResourceType::UniformBuffer);

    let a: Arc<vermilion_graphics::resources::UniformBuffer> = registry_a.get(&handle, 0);
    let b: Arc<vermilion_graphics::resources::UniformBuffer> = registry_b.get(&handle, 0);
    assert!(Arc::ptr_eq(&a, &b));

    // Per-camera resources stay independent.
    let fb = renderer.framebuffer_handle();
    let fb_a: Arc<Framebuffer> = registry_a.get(fb, 0);
    let fb_b: Arc<Framebuffer> = registry_b.get(fb, 0);
    assert!(!Arc::ptr_eq(&fb_a, &fb_b));
}

/// Full frame through the renderer: the output is presentable and the output
/// semaphore was signaled for the rendered slot.
#[test]
fn renderer_end_to_end_frame() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
    let registry = renderer.create_resource_registry().unwrap();
    let mut camera = Camera::new(registry.clone());
    camera.set_look_at(glam_eye(), glam::Vec3::ZERO, glam::Vec3::Y);
    camera.set_perspective(1.0, 16.0 / 9.0, 0.1, 100.0);

    let mut commands = CommandList::new();
    commands.add(vermilion_graphics::RenderCommand::Draw(
        vermilion_graphics::DrawCommand {
            vertex_count: 36,
            instance_count: 1,
            material_index: 0,
            model: glam::Mat4::IDENTITY,
        },
    ));

    renderer.submit(camera.clone(), commands);
    renderer.render().unwrap();

    // The frame advanced to the next slot.
    assert_eq!(renderer.frame_index(), 1);

    // Slot 0's output semaphore fired and its pass recorded work.
    assert_eq!(renderer.graph().output_semaphore(&registry, 0).signal_count(), 1);
    let stats = renderer.graph().stats(0);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].name, "geometry");

    // The camera uniform was uploaded for slot 0.
    let camera_buffer: Arc<vermilion_graphics::resources::UniformBuffer> =
        registry.get(renderer.camera_buffer_handle(), 0);
    assert_ne!(camera_buffer.data(), vec![0u8; camera_buffer.size() as usize]);
}

fn glam_eye() -> glam::Vec3 {
    glam::Vec3::new(0.0, 2.0, 5.0)
}

/// Declared pass usage stages the attachment transitions and rendering
/// scope; the recorded command stream shows them around the draw.
#[test]
fn staged_commands_bracket_the_draw() {
    init_logs();
    let renderer = Renderer::new(RendererDescriptor::default()).unwrap();
    let registry = renderer.create_resource_registry().unwrap();
    let camera = Camera::new(registry.clone());

    let mut commands = CommandList::new();
    commands.add(vermilion_graphics::RenderCommand::Draw(
        vermilion_graphics::DrawCommand {
            vertex_count: 3,
            instance_count: 1,
            material_index: 0,
            model: glam::Mat4::IDENTITY,
        },
    ));
    renderer.submit(camera, commands);
    renderer.render().unwrap();

    let geometry = &renderer.graph().passes()[0];
    let cmd: Arc<CommandBuffer> = registry.get(geometry.command_buffer_handle(), 0);
    let recorded = cmd.recorded();

    use vermilion_graphics::resources::RecordedCommand;
    let begin = recorded
        .iter()
        .position(|c| matches!(c, RecordedCommand::BeginRendering { .. }))
        .expect("BeginRendering staged");
    let draw = recorded
        .iter()
        .position(|c| matches!(c, RecordedCommand::Draw { .. }))
        .expect("draw recorded");
    let end = recorded
        .iter()
        .position(|c| matches!(c, RecordedCommand::EndRendering))
        .expect("EndRendering staged");
    assert!(begin < draw && draw < end);

    // The last pass leaves the output readable for the presenter.
    assert!(matches!(
        recorded.last().unwrap(),
        RecordedCommand::TransitionImageLayout { .. }
    ));
}
