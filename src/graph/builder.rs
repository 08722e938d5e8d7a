//! Resource blueprints.
//!
//! A [`ResourceBuilder`] collects declarations of resources before any
//! concrete instance exists. Registries are then materialized from the
//! builder: every blueprint becomes `frames_in_flight` instances.
//!
//! Blueprints come in two scopes:
//!
//! - local: materialized into each registry built from this builder (one set
//!   of instances per registry),
//! - global: materialized exactly once into a shared registry whose
//!   instances are then aliased into every consumer registry. This is how a
//!   single bindless texture table serves every camera.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphicsError;
use crate::resources::{
    Framebuffer, FramebufferDescription, Sampler, ShaderResourceDescription, ShaderResourceGroup,
    UniformBuffer,
};
use crate::types::SamplerDescriptor;

use super::handle::{ResourceHandle, ResourceType};
use super::registry::ResourceRegistry;

/// Declaration of a resource that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
enum ResourceBlueprint {
    UniformBuffer {
        size: u64,
    },
    Framebuffer {
        description: FramebufferDescription,
    },
    ShaderResourceGroup {
        resources: Vec<ShaderResourceDescription>,
    },
    Sampler {
        descriptor: SamplerDescriptor,
    },
}

impl ResourceBlueprint {
    fn resource_type(&self) -> ResourceType {
        match self {
            Self::UniformBuffer { .. } => ResourceType::UniformBuffer,
            Self::Framebuffer { .. } => ResourceType::Framebuffer,
            Self::ShaderResourceGroup { .. } => ResourceType::ShaderResourceGroup,
            Self::Sampler { .. } => ResourceType::Sampler,
        }
    }
}

/// Collects resource blueprints and materializes registries from them.
#[derive(Debug, Default)]
pub struct ResourceBuilder {
    blueprints: HashMap<ResourceHandle, ResourceBlueprint>,
    globals: HashMap<ResourceHandle, ResourceBlueprint>,
}

impl ResourceBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the handle for `(name, type)` without registering anything.
    ///
    /// Equal to the handle returned by the corresponding `create_*` call.
    pub fn handle(&self, name: impl AsRef<str>, ty: ResourceType) -> ResourceHandle {
        ResourceHandle::new(name, ty)
    }

    /// Resolve a global blueprint's handle by name.
    pub fn global_handle(&self, name: impl AsRef<str>) -> Option<ResourceHandle> {
        let name = name.as_ref();
        self.globals.keys().find(|h| h.name() == name).cloned()
    }

    fn register(
        &mut self,
        global: bool,
        handle: ResourceHandle,
        blueprint: ResourceBlueprint,
    ) -> Result<ResourceHandle, GraphicsError> {
        // A (name, type) pair owns one blueprint across both scopes.
        let existing = self
            .blueprints
            .get(&handle)
            .or_else(|| self.globals.get(&handle));
        if let Some(existing) = existing {
            if *existing == blueprint {
                return Ok(handle);
            }
            return Err(GraphicsError::Configuration(format!(
                "resource `{}` registered twice with different parameters",
                handle
            )));
        }

        let map = if global {
            &mut self.globals
        } else {
            &mut self.blueprints
        };
        map.insert(handle.clone(), blueprint);
        Ok(handle)
    }

    /// Declare a uniform buffer of `size` bytes.
    pub fn create_uniform_buffer(
        &mut self,
        name: impl AsRef<str>,
        size: u64,
    ) -> Result<ResourceHandle, GraphicsError> {
        if size == 0 {
            return Err(GraphicsError::Configuration(format!(
                "uniform buffer `{}` declared with zero size",
                name.as_ref()
            )));
        }
        let handle = ResourceHandle::new(name, ResourceType::UniformBuffer);
        self.register(false, handle, ResourceBlueprint::UniformBuffer { size })
    }

    /// Declare a framebuffer.
    pub fn create_framebuffer(
        &mut self,
        name: impl AsRef<str>,
        description: FramebufferDescription,
    ) -> Result<ResourceHandle, GraphicsError> {
        let handle = ResourceHandle::new(name, ResourceType::Framebuffer);
        self.register(false, handle, ResourceBlueprint::Framebuffer { description })
    }

    /// Declare a shader resource group.
    pub fn create_shader_resource_group(
        &mut self,
        name: impl AsRef<str>,
        resources: Vec<ShaderResourceDescription>,
    ) -> Result<ResourceHandle, GraphicsError> {
        let handle = ResourceHandle::new(name, ResourceType::ShaderResourceGroup);
        self.register(
            false,
            handle,
            ResourceBlueprint::ShaderResourceGroup { resources },
        )
    }

    /// Declare a sampler.
    pub fn create_sampler(
        &mut self,
        name: impl AsRef<str>,
        descriptor: SamplerDescriptor,
    ) -> Result<ResourceHandle, GraphicsError> {
        let handle = ResourceHandle::new(name, ResourceType::Sampler);
        self.register(false, handle, ResourceBlueprint::Sampler { descriptor })
    }

    /// Declare a uniform buffer shared by every registry built from this
    /// builder.
    pub fn create_global_uniform_buffer(
        &mut self,
        name: impl AsRef<str>,
        size: u64,
    ) -> Result<ResourceHandle, GraphicsError> {
        if size == 0 {
            return Err(GraphicsError::Configuration(format!(
                "uniform buffer `{}` declared with zero size",
                name.as_ref()
            )));
        }
        let handle = ResourceHandle::new(name, ResourceType::UniformBuffer);
        self.register(true, handle, ResourceBlueprint::UniformBuffer { size })
    }

    /// Declare a shared shader resource group.
    pub fn create_global_shader_resource_group(
        &mut self,
        name: impl AsRef<str>,
        resources: Vec<ShaderResourceDescription>,
    ) -> Result<ResourceHandle, GraphicsError> {
        let handle = ResourceHandle::new(name, ResourceType::ShaderResourceGroup);
        self.register(
            true,
            handle,
            ResourceBlueprint::ShaderResourceGroup { resources },
        )
    }

    /// Declare a shared sampler.
    pub fn create_global_sampler(
        &mut self,
        name: impl AsRef<str>,
        descriptor: SamplerDescriptor,
    ) -> Result<ResourceHandle, GraphicsError> {
        let handle = ResourceHandle::new(name, ResourceType::Sampler);
        self.register(true, handle, ResourceBlueprint::Sampler { descriptor })
    }

    /// Materialize every local blueprint into `registry`.
    pub fn initialize_registry(&self, registry: &ResourceRegistry) -> Result<(), GraphicsError> {
        for (handle, blueprint) in &self.blueprints {
            Self::materialize(handle, blueprint, registry)?;
        }
        Ok(())
    }

    /// Materialize every global blueprint into `registry`.
    ///
    /// Called once on the shared registry; consumer registries pick the
    /// instances up through
    /// [`copy_registry_resources`](ResourceRegistry::copy_registry_resources).
    pub fn initialize_global_registry(
        &self,
        registry: &ResourceRegistry,
    ) -> Result<(), GraphicsError> {
        for (handle, blueprint) in &self.globals {
            Self::materialize(handle, blueprint, registry)?;
        }
        Ok(())
    }

    fn materialize(
        handle: &ResourceHandle,
        blueprint: &ResourceBlueprint,
        registry: &ResourceRegistry,
    ) -> Result<(), GraphicsError> {
        debug_assert_eq!(handle.resource_type(), blueprint.resource_type());
        let frames = registry.frames_in_flight();
        match blueprint {
            ResourceBlueprint::UniformBuffer { size } => {
                let instances = (0..frames)
                    .map(|i| {
                        UniformBuffer::new(format!("{}[{}]", handle.name(), i), *size).map(Arc::new)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                registry.add_resource(handle.clone(), |i| instances[i].clone());
            }
            ResourceBlueprint::Framebuffer { description } => {
                let instances = (0..frames)
                    .map(|i| {
                        Framebuffer::new(format!("{}[{}]", handle.name(), i), description.clone())
                            .map(Arc::new)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                registry.add_resource(handle.clone(), |i| instances[i].clone());
            }
            ResourceBlueprint::ShaderResourceGroup { resources } => {
                let instances = (0..frames)
                    .map(|i| {
                        ShaderResourceGroup::new(
                            format!("{}[{}]", handle.name(), i),
                            resources.clone(),
                        )
                        .map(Arc::new)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                registry.add_resource(handle.clone(), |i| instances[i].clone());
            }
            ResourceBlueprint::Sampler { descriptor } => {
                let sampler = Arc::new(Sampler::new(handle.name(), descriptor.clone()));
                registry.add_resource(handle.clone(), |_| sampler.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::FramebufferAttachment;
    use crate::types::TextureFormat;

    #[test]
    fn test_create_is_idempotent() {
        let mut builder = ResourceBuilder::new();
        let a = builder.create_uniform_buffer("camera.buffer", 128).unwrap();
        let b = builder.create_uniform_buffer("camera.buffer", 128).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_conflicting_params_rejected() {
        let mut builder = ResourceBuilder::new();
        builder.create_uniform_buffer("camera.buffer", 128).unwrap();
        let conflict = builder.create_uniform_buffer("camera.buffer", 256);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_handle_round_trip() {
        let mut builder = ResourceBuilder::new();
        let created = builder.create_uniform_buffer("camera.buffer", 128).unwrap();
        let derived = builder.handle("camera.buffer", ResourceType::UniformBuffer);
        assert_eq!(created, derived);
    }

    #[test]
    fn test_global_handle_lookup() {
        let mut builder = ResourceBuilder::new();
        let created = builder
            .create_global_uniform_buffer("bindless.materials", 1024)
            .unwrap();
        assert_eq!(builder.global_handle("bindless.materials"), Some(created));
        assert_eq!(builder.global_handle("missing"), None);
    }

    #[test]
    fn test_materialization_fills_registry() {
        let mut builder = ResourceBuilder::new();
        let buffer = builder.create_uniform_buffer("camera.buffer", 128).unwrap();
        let framebuffer = builder
            .create_framebuffer(
                "main",
                FramebufferDescription::new(640, 480)
                    .with_color(FramebufferAttachment::new(TextureFormat::Rgba16Float)),
            )
            .unwrap();

        let registry = ResourceRegistry::new(2);
        builder.initialize_registry(&registry).unwrap();

        assert!(registry.contains(&buffer));
        assert!(registry.contains(&framebuffer));
        let fb: Arc<Framebuffer> = registry.get(&framebuffer, 1);
        assert_eq!(fb.label(), "main[1]");
    }

    #[test]
    fn test_globals_shared_across_registries() {
        let mut builder = ResourceBuilder::new();
        let handle = builder
            .create_global_uniform_buffer("bindless.materials", 1024)
            .unwrap();

        let global = ResourceRegistry::new(2);
        builder.initialize_global_registry(&global).unwrap();

        let camera_a = ResourceRegistry::new(2);
        let camera_b = ResourceRegistry::new(2);
        builder.initialize_registry(&camera_a).unwrap();
        builder.initialize_registry(&camera_b).unwrap();
        camera_a.copy_registry_resources(&global);
        camera_b.copy_registry_resources(&global);

        let a: Arc<UniformBuffer> = camera_a.get(&handle, 0);
        let b: Arc<UniformBuffer> = camera_b.get(&handle, 0);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
