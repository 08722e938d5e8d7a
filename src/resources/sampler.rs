//! Samplers.

use crate::types::SamplerDescriptor;

/// An immutable sampler object.
#[derive(Debug, Clone)]
pub struct Sampler {
    label: String,
    descriptor: SamplerDescriptor,
}

impl Sampler {
    /// Create a sampler from a descriptor.
    pub fn new(label: impl Into<String>, descriptor: SamplerDescriptor) -> Self {
        Self {
            label: label.into(),
            descriptor,
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The creation descriptor.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }
}
