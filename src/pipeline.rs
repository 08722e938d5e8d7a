//! Graphics and compute pipeline objects.
//!
//! Pipelines are immutable once created. Descriptor validation happens at
//! construction: an invalid pipeline is a configuration error that aborts
//! startup, never something to limp past at draw time.

use crate::error::GraphicsError;
use crate::types::TextureFormat;

/// Descriptor for a graphics pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsPipelineDescriptor {
    /// Debug label.
    pub label: String,
    /// Entry point of the vertex stage.
    pub vertex_entry: String,
    /// Entry point of the fragment stage.
    pub fragment_entry: String,
    /// Formats of the color targets, in attachment order.
    pub color_formats: Vec<TextureFormat>,
    /// Format of the depth target, if any.
    pub depth_format: Option<TextureFormat>,
}

/// A validated graphics pipeline.
#[derive(Debug)]
pub struct GraphicsPipeline {
    descriptor: GraphicsPipelineDescriptor,
}

impl GraphicsPipeline {
    /// Create a pipeline, validating the descriptor.
    pub fn new(descriptor: GraphicsPipelineDescriptor) -> Result<Self, GraphicsError> {
        if descriptor.vertex_entry.is_empty() || descriptor.fragment_entry.is_empty() {
            return Err(GraphicsError::Configuration(format!(
                "pipeline `{}` is missing a shader entry point",
                descriptor.label
            )));
        }
        if descriptor.color_formats.is_empty() && descriptor.depth_format.is_none() {
            return Err(GraphicsError::Configuration(format!(
                "pipeline `{}` writes no attachments",
                descriptor.label
            )));
        }
        if let Some(format) = descriptor.color_formats.iter().find(|f| f.is_depth_stencil()) {
            return Err(GraphicsError::Configuration(format!(
                "pipeline `{}` uses depth format {:?} as a color target",
                descriptor.label, format
            )));
        }
        if descriptor.depth_format.is_some_and(|f| !f.is_depth_stencil()) {
            return Err(GraphicsError::Configuration(format!(
                "pipeline `{}` uses a color format as its depth target",
                descriptor.label
            )));
        }
        Ok(Self { descriptor })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    /// The creation descriptor.
    pub fn descriptor(&self) -> &GraphicsPipelineDescriptor {
        &self.descriptor
    }
}

/// Descriptor for a compute pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePipelineDescriptor {
    /// Debug label.
    pub label: String,
    /// Entry point of the compute stage.
    pub entry: String,
}

/// A validated compute pipeline.
#[derive(Debug)]
pub struct ComputePipeline {
    descriptor: ComputePipelineDescriptor,
}

impl ComputePipeline {
    /// Create a pipeline, validating the descriptor.
    pub fn new(descriptor: ComputePipelineDescriptor) -> Result<Self, GraphicsError> {
        if descriptor.entry.is_empty() {
            return Err(GraphicsError::Configuration(format!(
                "compute pipeline `{}` is missing its entry point",
                descriptor.label
            )));
        }
        Ok(Self { descriptor })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    /// The creation descriptor.
    pub fn descriptor(&self) -> &ComputePipelineDescriptor {
        &self.descriptor
    }
}
