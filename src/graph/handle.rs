//! Resource handles.

use std::fmt;
use std::sync::Arc;

/// The kind of resource a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A uniform buffer.
    UniformBuffer,
    /// A standalone 2D texture.
    Texture2D,
    /// A framebuffer with its attachments.
    Framebuffer,
    /// A shader resource group.
    ShaderResourceGroup,
    /// A sampler.
    Sampler,
    /// A fence.
    Fence,
    /// A binary semaphore.
    Semaphore,
    /// A timeline semaphore.
    TimelineSemaphore,
    /// A command buffer.
    CommandBuffer,
}

/// Key identifying one logical resource across a registry's lifetime.
///
/// A handle is a pure function of `(name, type)`: deriving the same pair
/// twice yields equal handles, so two independently built passes can refer to
/// the same physical resource without ever exchanging references.
///
/// # Example
///
/// ```
/// use vermilion_graphics::graph::{ResourceHandle, ResourceType};
///
/// let a = ResourceHandle::new("camera.buffer", ResourceType::UniformBuffer);
/// let b = ResourceHandle::new("camera.buffer", ResourceType::UniformBuffer);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    name: Arc<str>,
    ty: ResourceType,
}

impl ResourceHandle {
    /// Derive the handle for `(name, type)`.
    pub fn new(name: impl AsRef<str>, ty: ResourceType) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            ty,
        }
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource type.
    pub fn resource_type(&self) -> ResourceType {
        self.ty
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_idempotent_derivation() {
        let a = ResourceHandle::new("gbuffer", ResourceType::Framebuffer);
        let b = ResourceHandle::new("gbuffer", ResourceType::Framebuffer);
        assert_eq!(a, b);

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn test_type_distinguishes_handles() {
        let buffer = ResourceHandle::new("shadow", ResourceType::UniformBuffer);
        let texture = ResourceHandle::new("shadow", ResourceType::Texture2D);
        assert_ne!(buffer, texture);
    }
}
