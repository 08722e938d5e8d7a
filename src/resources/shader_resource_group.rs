//! Shader resource groups (descriptor groups).
//!
//! A group is declared by a list of [`ShaderResourceDescription`]s fixing the
//! binding layout, then populated by binding concrete resources into slots.
//! Arrayed bindings (`count > 1`) back the bindless texture table: one
//! binding, thousands of array slots addressed by compact indices.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::error::GraphicsError;

use super::buffer::UniformBuffer;
use super::sampler::Sampler;
use super::texture::Texture2D;

/// The kind of resource a binding accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderResourceType {
    /// A uniform buffer.
    UniformBuffer,
    /// A storage buffer.
    StorageBuffer,
    /// A sampled texture with its sampler.
    Sampler,
}

bitflags! {
    /// Shader stages a binding is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

/// Declaration of one binding in a shader resource group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderResourceDescription {
    /// Binding index within the group.
    pub binding: u32,
    /// The kind of resource this binding accepts.
    pub kind: ShaderResourceType,
    /// Stages the binding is visible to.
    pub stages: ShaderStages,
    /// Array slot count. 1 for non-arrayed bindings.
    pub count: u32,
}

impl ShaderResourceDescription {
    /// Create a non-arrayed binding description.
    pub fn new(binding: u32, kind: ShaderResourceType, stages: ShaderStages) -> Self {
        Self {
            binding,
            kind,
            stages,
            count: 1,
        }
    }

    /// Set the array slot count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

/// A concrete resource bound into a group slot.
#[derive(Debug, Clone)]
pub enum BoundResource {
    /// A uniform buffer.
    UniformBuffer(Arc<UniformBuffer>),
    /// A texture sampled through `sampler`.
    Texture {
        texture: Arc<Texture2D>,
        sampler: Arc<Sampler>,
    },
}

/// A shader resource group: a binding layout plus the resources currently
/// bound into it.
#[derive(Debug)]
pub struct ShaderResourceGroup {
    label: String,
    descriptions: Vec<ShaderResourceDescription>,
    bindings: Mutex<HashMap<(u32, u32), BoundResource>>,
}

impl ShaderResourceGroup {
    /// Create a group from its binding layout.
    pub fn new(
        label: impl Into<String>,
        descriptions: Vec<ShaderResourceDescription>,
    ) -> Result<Self, GraphicsError> {
        let label = label.into();
        if descriptions.is_empty() {
            return Err(GraphicsError::ResourceCreation(format!(
                "shader resource group `{}` declares no bindings",
                label
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for description in &descriptions {
            if !seen.insert(description.binding) {
                return Err(GraphicsError::ResourceCreation(format!(
                    "shader resource group `{}` declares binding {} twice",
                    label, description.binding
                )));
            }
            if description.count == 0 {
                return Err(GraphicsError::ResourceCreation(format!(
                    "shader resource group `{}` binding {} has zero slots",
                    label, description.binding
                )));
            }
        }
        Ok(Self {
            label,
            descriptions,
            bindings: Mutex::new(HashMap::new()),
        })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The binding layout.
    pub fn descriptions(&self) -> &[ShaderResourceDescription] {
        &self.descriptions
    }

    fn description(&self, binding: u32) -> Option<&ShaderResourceDescription> {
        self.descriptions.iter().find(|d| d.binding == binding)
    }

    fn check_slot(
        &self,
        binding: u32,
        index: u32,
        kind: ShaderResourceType,
    ) -> Result<(), GraphicsError> {
        let description = self.description(binding).ok_or_else(|| {
            GraphicsError::ResourceCreation(format!(
                "group `{}` has no binding {}",
                self.label, binding
            ))
        })?;
        if description.kind != kind {
            return Err(GraphicsError::ResourceCreation(format!(
                "group `{}` binding {} expects {:?}, got {:?}",
                self.label, binding, description.kind, kind
            )));
        }
        if index >= description.count {
            return Err(GraphicsError::ResourceCreation(format!(
                "group `{}` binding {} slot {} out of range ({} slots)",
                self.label, binding, index, description.count
            )));
        }
        Ok(())
    }

    /// Bind a uniform buffer into `(binding, index)`.
    pub fn update_uniform_buffer(
        &self,
        binding: u32,
        index: u32,
        buffer: Arc<UniformBuffer>,
    ) -> Result<(), GraphicsError> {
        self.check_slot(binding, index, ShaderResourceType::UniformBuffer)?;
        self.bindings
            .lock()
            .insert((binding, index), BoundResource::UniformBuffer(buffer));
        Ok(())
    }

    /// Bind a sampled texture into `(binding, index)`.
    pub fn update_texture(
        &self,
        binding: u32,
        index: u32,
        texture: Arc<Texture2D>,
        sampler: Arc<Sampler>,
    ) -> Result<(), GraphicsError> {
        self.check_slot(binding, index, ShaderResourceType::Sampler)?;
        self.bindings
            .lock()
            .insert((binding, index), BoundResource::Texture { texture, sampler });
        Ok(())
    }

    /// The resource currently bound into `(binding, index)`, if any.
    pub fn bound(&self, binding: u32, index: u32) -> Option<BoundResource> {
        self.bindings.lock().get(&(binding, index)).cloned()
    }

    /// Number of populated slots.
    pub fn bound_count(&self) -> usize {
        self.bindings.lock().len()
    }
}
