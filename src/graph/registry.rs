//! Per-frame resource storage.
//!
//! A [`ResourceRegistry`] maps [`ResourceHandle`]s to [`InFlightResource`]s:
//! fixed-length sequences holding one concrete instance per frame slot. The
//! registry also owns the per-slot synchronization primitives and the
//! deferred resize state, making it the single object a pass needs to turn a
//! handle plus a frame index into a live resource.
//!
//! # Frame slots
//!
//! With `frames_in_flight = N`, slot `i` of frame `F + N` may only reuse
//! slot `i`'s resources after that slot's fences have signaled. That wait,
//! [`wait_for_fences`](ResourceRegistry::wait_for_fences), is the only
//! mechanism keeping the CPU off memory the GPU still owns.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::resources::{
    CommandBuffer, Framebuffer, Sampler, ShaderResourceGroup, Texture2D, UniformBuffer,
};
use crate::sync::{Fence, Semaphore, TimelineSemaphore};
use crate::types::Extent2d;

use super::handle::{ResourceHandle, ResourceType};

/// Closed set of resources a registry can store.
#[derive(Debug, Clone)]
pub enum ResourceVariant {
    UniformBuffer(Arc<UniformBuffer>),
    Texture2D(Arc<Texture2D>),
    Framebuffer(Arc<Framebuffer>),
    ShaderResourceGroup(Arc<ShaderResourceGroup>),
    Sampler(Arc<Sampler>),
    Fence(Arc<Fence>),
    Semaphore(Arc<Semaphore>),
    TimelineSemaphore(Arc<TimelineSemaphore>),
    CommandBuffer(Arc<CommandBuffer>),
}

/// Types storable in a registry.
///
/// The set is closed; each member maps to exactly one [`ResourceVariant`]
/// arm and one [`ResourceType`] tag.
pub trait RegistryResource: Send + Sync + Sized + 'static {
    /// The handle type tag for this resource.
    const RESOURCE_TYPE: ResourceType;

    /// Wrap an instance into the variant.
    fn into_variant(this: Arc<Self>) -> ResourceVariant;

    /// Unwrap the variant, if it holds this type.
    fn from_variant(variant: &ResourceVariant) -> Option<&Arc<Self>>;
}

macro_rules! registry_resource {
    ($ty:ident) => {
        impl RegistryResource for $ty {
            const RESOURCE_TYPE: ResourceType = ResourceType::$ty;

            fn into_variant(this: Arc<Self>) -> ResourceVariant {
                ResourceVariant::$ty(this)
            }

            fn from_variant(variant: &ResourceVariant) -> Option<&Arc<Self>> {
                match variant {
                    ResourceVariant::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

registry_resource!(UniformBuffer);
registry_resource!(Texture2D);
registry_resource!(Framebuffer);
registry_resource!(ShaderResourceGroup);
registry_resource!(Sampler);
registry_resource!(Fence);
registry_resource!(Semaphore);
registry_resource!(TimelineSemaphore);
registry_resource!(CommandBuffer);

/// One concrete instance per frame slot.
///
/// Invariant: `instances.len()` always equals the owning registry's frame
/// count.
#[derive(Debug, Clone)]
pub struct InFlightResource {
    instances: Vec<ResourceVariant>,
}

impl InFlightResource {
    /// The per-slot instances, in slot order.
    pub fn instances(&self) -> &[ResourceVariant] {
        &self.instances
    }

    /// Number of slots, always the owning registry's frame count.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Never true for a materialized resource.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn instance(&self, frame_index: usize) -> &ResourceVariant {
        &self.instances[frame_index]
    }
}

/// Owns every concrete resource of one render-graph consumer.
///
/// Shared behind an `Arc`: the camera carries it, passes resolve against it,
/// and the renderer waits on it. All interior state is lock-guarded; reads
/// dominate after construction.
#[derive(Debug)]
pub struct ResourceRegistry {
    frames_in_flight: usize,
    resources: RwLock<HashMap<ResourceHandle, InFlightResource>>,
    /// Fences registered per frame slot, gathered as fence resources are
    /// added.
    fences: RwLock<Vec<Vec<Arc<Fence>>>>,
    /// One submission timeline per frame slot.
    timelines: Vec<Arc<TimelineSemaphore>>,
    /// Pending resize per frame slot.
    resize: Mutex<Vec<Option<Extent2d>>>,
    /// Designated output resource and array layer.
    output: Mutex<Option<(ResourceHandle, u32)>>,
}

impl ResourceRegistry {
    /// Create an empty registry for `frames_in_flight` slots.
    ///
    /// # Panics
    ///
    /// Panics if `frames_in_flight` is 0.
    pub fn new(frames_in_flight: usize) -> Self {
        assert!(frames_in_flight > 0, "frames_in_flight must be at least 1");
        Self {
            frames_in_flight,
            resources: RwLock::new(HashMap::new()),
            fences: RwLock::new(vec![Vec::new(); frames_in_flight]),
            timelines: (0..frames_in_flight)
                .map(|i| Arc::new(TimelineSemaphore::new(format!("frame{}.timeline", i))))
                .collect(),
            resize: Mutex::new(vec![None; frames_in_flight]),
            output: Mutex::new(None),
        }
    }

    /// Number of frame slots.
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    /// Materialize a resource outside the builder path.
    ///
    /// `make` is invoked once per frame slot with the slot index. Fence
    /// instances are additionally registered for
    /// [`wait_for_fences`](Self::wait_for_fences).
    ///
    /// Re-adding an existing handle replaces nothing and returns quietly;
    /// blueprint materialization and graph initialization may both touch the
    /// same registry.
    pub fn add_resource<T, F>(&self, handle: ResourceHandle, mut make: F)
    where
        T: RegistryResource,
        F: FnMut(usize) -> Arc<T>,
    {
        debug_assert_eq!(handle.resource_type(), T::RESOURCE_TYPE);

        let mut resources = self.resources.write();
        if resources.contains_key(&handle) {
            log::debug!("registry: `{}` already materialized", handle);
            return;
        }

        let instances: Vec<ResourceVariant> = (0..self.frames_in_flight)
            .map(|i| T::into_variant(make(i)))
            .collect();

        let mut fences = self.fences.write();
        for (slot, instance) in instances.iter().enumerate() {
            if let ResourceVariant::Fence(fence) = instance {
                fences[slot].push(fence.clone());
            }
        }

        resources.insert(handle, InFlightResource { instances });
    }

    /// Whether a handle has been materialized.
    pub fn contains(&self, handle: &ResourceHandle) -> bool {
        self.resources.read().contains_key(handle)
    }

    /// Resolve a handle for one frame slot.
    ///
    /// # Panics
    ///
    /// Panics when the handle is absent or its stored type disagrees with
    /// `T`. Either means pass setup and pass execution disagree about the
    /// resource set, which has no recovery.
    pub fn get<T: RegistryResource>(&self, handle: &ResourceHandle, frame_index: usize) -> Arc<T> {
        assert!(
            frame_index < self.frames_in_flight,
            "frame index {} out of range ({} frames in flight)",
            frame_index,
            self.frames_in_flight
        );
        let resources = self.resources.read();
        let in_flight = resources
            .get(handle)
            .unwrap_or_else(|| panic!("registry has no resource `{}`", handle));
        let variant = in_flight.instance(frame_index);
        T::from_variant(variant)
            .unwrap_or_else(|| {
                panic!(
                    "resource `{}` holds a different type than requested",
                    handle
                )
            })
            .clone()
    }

    /// Share another registry's instances into this one.
    ///
    /// Existing handles are kept; only absent entries are copied. The copied
    /// entries alias the other registry's instances (`Arc` clones), which is
    /// what global bindless resources rely on: every consumer sees the same
    /// physical table.
    pub fn copy_registry_resources(&self, other: &ResourceRegistry) {
        assert_eq!(
            self.frames_in_flight, other.frames_in_flight,
            "registries disagree on frames in flight"
        );
        let other_resources = other.resources.read();
        let mut resources = self.resources.write();
        for (handle, in_flight) in other_resources.iter() {
            if !resources.contains_key(handle) {
                resources.insert(handle.clone(), in_flight.clone());
            }
        }
    }

    // Synchronization.

    /// Block until every fence registered for `frame_index` has signaled.
    ///
    /// Fences stay signaled until their next reset, so calling this again
    /// without an intervening submission returns immediately.
    pub fn wait_for_fences(&self, frame_index: usize) {
        let fences: Vec<Arc<Fence>> = self.fences.read()[frame_index].clone();
        for fence in fences {
            fence.wait();
        }
    }

    /// Block until every slot's fences have signaled.
    ///
    /// Call before tearing down resources the GPU may still reference.
    pub fn wait_idle(&self) {
        for frame_index in 0..self.frames_in_flight {
            self.wait_for_fences(frame_index);
        }
    }

    /// Fences registered for one slot.
    pub fn slot_fences(&self, frame_index: usize) -> Vec<Arc<Fence>> {
        self.fences.read()[frame_index].clone()
    }

    /// The submission timeline of one slot.
    pub fn timeline(&self, frame_index: usize) -> Arc<TimelineSemaphore> {
        self.timelines[frame_index].clone()
    }

    // Deferred resize.

    /// Request a resize of every frame slot.
    ///
    /// Nothing is reallocated here. Each slot applies the request the next
    /// time it is executed, so in-flight work referencing the old dimensions
    /// is never disturbed.
    pub fn resize(&self, width: u32, height: u32) {
        let mut resize = self.resize.lock();
        for slot in resize.iter_mut() {
            *slot = Some(Extent2d::new(width, height));
        }
        log::debug!("registry: resize to {}x{} requested for all slots", width, height);
    }

    /// Whether a resize is pending for a slot.
    pub fn is_resize_requested(&self, frame_index: usize) -> bool {
        self.resize.lock()[frame_index].is_some()
    }

    /// The pending dimensions for a slot, if any.
    pub fn resize_dimensions(&self, frame_index: usize) -> Option<Extent2d> {
        self.resize.lock()[frame_index]
    }

    /// Clear a slot's pending resize after applying it.
    pub fn set_resize_handled(&self, frame_index: usize) {
        self.resize.lock()[frame_index] = None;
    }

    // Output designation.

    /// Designate the resource external consumers read as the graph output.
    ///
    /// `layer` selects the array layer for layered or cube resources.
    pub fn set_output(&self, handle: ResourceHandle, layer: u32) {
        *self.output.lock() = Some((handle, layer));
    }

    /// The designated output handle and layer.
    pub fn output(&self) -> Option<(ResourceHandle, u32)> {
        self.output.lock().clone()
    }

    /// Resolve the designated output to its color texture for one slot.
    ///
    /// Framebuffer outputs resolve to their first color attachment.
    ///
    /// # Panics
    ///
    /// Panics if no output was designated, matching [`get`](Self::get)'s
    /// policy for unresolvable handles.
    pub fn color_output(&self, frame_index: usize) -> Arc<Texture2D> {
        let (handle, _layer) = self
            .output
            .lock()
            .clone()
            .expect("no output resource designated");
        match handle.resource_type() {
            ResourceType::Framebuffer => {
                let framebuffer: Arc<Framebuffer> = self.get(&handle, frame_index);
                framebuffer.color_attachment(0)
            }
            _ => self.get(&handle, frame_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fence_handle(name: &str) -> ResourceHandle {
        ResourceHandle::new(name, ResourceType::Fence)
    }

    #[test]
    fn test_instances_per_slot() {
        let registry = ResourceRegistry::new(2);
        let handle = ResourceHandle::new("camera.buffer", ResourceType::UniformBuffer);
        registry.add_resource(handle.clone(), |i| {
            Arc::new(UniformBuffer::new(format!("camera.buffer[{}]", i), 64).unwrap())
        });

        let slot0: Arc<UniformBuffer> = registry.get(&handle, 0);
        let slot1: Arc<UniformBuffer> = registry.get(&handle, 1);
        assert!(!Arc::ptr_eq(&slot0, &slot1));
        assert_eq!(slot0.label(), "camera.buffer[0]");
    }

    #[test]
    #[should_panic(expected = "registry has no resource")]
    fn test_missing_handle_panics() {
        let registry = ResourceRegistry::new(2);
        let _: Arc<Fence> = registry.get(&fence_handle("nope"), 0);
    }

    #[test]
    #[should_panic(expected = "holds a different type")]
    fn test_type_mismatch_panics() {
        let registry = ResourceRegistry::new(1);
        let handle = ResourceHandle::new("camera.buffer", ResourceType::UniformBuffer);
        registry.add_resource(handle.clone(), |_| {
            Arc::new(UniformBuffer::new("camera.buffer", 64).unwrap())
        });
        let _: Arc<Fence> = registry.get(&handle, 0);
    }

    #[test]
    fn test_fences_registered_per_slot() {
        let registry = ResourceRegistry::new(2);
        registry.add_resource(fence_handle("geometry.fence"), |i| {
            Arc::new(Fence::new_signaled(format!("geometry.fence[{}]", i)))
        });
        registry.add_resource(fence_handle("lighting.fence"), |i| {
            Arc::new(Fence::new_signaled(format!("lighting.fence[{}]", i)))
        });

        assert_eq!(registry.slot_fences(0).len(), 2);
        assert_eq!(registry.slot_fences(1).len(), 2);
        // All fences start signaled, so this returns immediately.
        registry.wait_for_fences(0);
        registry.wait_idle();
    }

    #[test]
    fn test_wait_for_fences_blocks_until_all_signal() {
        let registry = Arc::new(ResourceRegistry::new(1));
        registry.add_resource(fence_handle("geometry.fence"), |_| {
            Arc::new(Fence::new_signaled("geometry.fence"))
        });
        registry.add_resource(fence_handle("lighting.fence"), |_| {
            Arc::new(Fence::new_signaled("lighting.fence"))
        });

        let fences = registry.slot_fences(0);
        for fence in &fences {
            fence.reset();
        }

        let waiter = Arc::clone(&registry);
        let handle = std::thread::spawn(move || waiter.wait_for_fences(0));

        // Signaling only one fence must not release the wait.
        fences[0].signal();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(!handle.is_finished());

        fences[1].signal();
        handle.join().unwrap();

        // Fences stay signaled until reset, so a second wait is free.
        registry.wait_for_fences(0);
    }

    #[test]
    fn test_resize_deferred_per_slot() {
        let registry = ResourceRegistry::new(2);
        assert!(!registry.is_resize_requested(0));

        registry.resize(1024, 768);
        assert!(registry.is_resize_requested(0));
        assert!(registry.is_resize_requested(1));

        registry.set_resize_handled(0);
        assert!(!registry.is_resize_requested(0));
        // Slot 1 still sees the request.
        assert_eq!(registry.resize_dimensions(1), Some(Extent2d::new(1024, 768)));
    }

    #[test]
    fn test_copy_shares_instances() {
        let global = ResourceRegistry::new(2);
        let handle = ResourceHandle::new("bindless.materials", ResourceType::UniformBuffer);
        global.add_resource(handle.clone(), |_| {
            Arc::new(UniformBuffer::new("bindless.materials", 256).unwrap())
        });

        let camera = ResourceRegistry::new(2);
        camera.copy_registry_resources(&global);

        let from_global: Arc<UniformBuffer> = global.get(&handle, 0);
        let from_camera: Arc<UniformBuffer> = camera.get(&handle, 0);
        assert!(Arc::ptr_eq(&from_global, &from_camera));
    }
}
