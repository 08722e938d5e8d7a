//! Framebuffers: named groups of render attachments.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraphicsError;
use crate::types::{Extent2d, TextureDescriptor, TextureFormat, TextureUsage};

use super::texture::Texture2D;

/// One attachment of a framebuffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferAttachment {
    /// Pixel format of the attachment.
    pub format: TextureFormat,
    /// Extra usage on top of `RENDER_ATTACHMENT | SAMPLED`.
    pub usage: TextureUsage,
}

impl FramebufferAttachment {
    /// Create an attachment with the given format.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            usage: TextureUsage::empty(),
        }
    }

    /// Add extra usage flags.
    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }
}

/// Description of a framebuffer's layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDescription {
    /// Initial width in pixels.
    pub width: u32,
    /// Initial height in pixels.
    pub height: u32,
    /// Number of array layers shared by every attachment.
    pub layers: u32,
    /// Color attachments in slot order.
    pub color_attachments: Vec<FramebufferAttachment>,
    /// Optional depth attachment.
    pub depth_attachment: Option<FramebufferAttachment>,
}

impl FramebufferDescription {
    /// Create a single-layer description with no attachments.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: 1,
            color_attachments: Vec::new(),
            depth_attachment: None,
        }
    }

    /// Append a color attachment.
    pub fn with_color(mut self, attachment: FramebufferAttachment) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    /// Set the depth attachment.
    pub fn with_depth(mut self, attachment: FramebufferAttachment) -> Self {
        self.depth_attachment = Some(attachment);
        self
    }

    /// Set the layer count.
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }
}

/// A framebuffer owning its attachment textures.
///
/// Resizing recreates every attachment at the new extent for this instance
/// only; other frame slots keep their instances until their own resize is
/// applied.
#[derive(Debug)]
pub struct Framebuffer {
    label: String,
    description: FramebufferDescription,
    extent: RwLock<Extent2d>,
    color: RwLock<Vec<Arc<Texture2D>>>,
    depth: RwLock<Option<Arc<Texture2D>>>,
}

impl Framebuffer {
    /// Create a framebuffer and allocate its attachments.
    pub fn new(
        label: impl Into<String>,
        description: FramebufferDescription,
    ) -> Result<Self, GraphicsError> {
        let label = label.into();
        if description.color_attachments.is_empty() && description.depth_attachment.is_none() {
            return Err(GraphicsError::ResourceCreation(format!(
                "framebuffer `{}` declares no attachments",
                label
            )));
        }
        if description.depth_attachment.as_ref().is_some_and(|a| !a.format.is_depth_stencil()) {
            return Err(GraphicsError::ResourceCreation(format!(
                "framebuffer `{}` depth attachment has a color format",
                label
            )));
        }

        let extent = Extent2d::new(description.width, description.height);
        let color = Self::create_color_attachments(&label, &description, extent)?;
        let depth = Self::create_depth_attachment(&label, &description, extent)?;

        Ok(Self {
            label,
            description,
            extent: RwLock::new(extent),
            color: RwLock::new(color),
            depth: RwLock::new(depth),
        })
    }

    fn create_color_attachments(
        label: &str,
        description: &FramebufferDescription,
        extent: Extent2d,
    ) -> Result<Vec<Arc<Texture2D>>, GraphicsError> {
        description
            .color_attachments
            .iter()
            .enumerate()
            .map(|(i, attachment)| {
                let desc = TextureDescriptor::new_2d(
                    extent.width,
                    extent.height,
                    attachment.format,
                    TextureUsage::RENDER_ATTACHMENT | TextureUsage::SAMPLED | attachment.usage,
                )
                .with_label(format!("{}.color{}", label, i))
                .with_layers(description.layers);
                Texture2D::new(desc).map(Arc::new)
            })
            .collect()
    }

    fn create_depth_attachment(
        label: &str,
        description: &FramebufferDescription,
        extent: Extent2d,
    ) -> Result<Option<Arc<Texture2D>>, GraphicsError> {
        description
            .depth_attachment
            .as_ref()
            .map(|attachment| {
                let desc = TextureDescriptor::new_2d(
                    extent.width,
                    extent.height,
                    attachment.format,
                    TextureUsage::RENDER_ATTACHMENT | TextureUsage::SAMPLED | attachment.usage,
                )
                .with_label(format!("{}.depth", label))
                .with_layers(description.layers);
                Texture2D::new(desc).map(Arc::new)
            })
            .transpose()
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The creation description.
    pub fn description(&self) -> &FramebufferDescription {
        &self.description
    }

    /// Current extent.
    pub fn extent(&self) -> Extent2d {
        *self.extent.read()
    }

    /// Number of color attachments.
    pub fn color_attachment_count(&self) -> usize {
        self.color.read().len()
    }

    /// Color attachment at `index`. Panics on an out-of-range index.
    pub fn color_attachment(&self, index: usize) -> Arc<Texture2D> {
        self.color.read()[index].clone()
    }

    /// All color attachments in slot order.
    pub fn color_attachments(&self) -> Vec<Arc<Texture2D>> {
        self.color.read().clone()
    }

    /// The depth attachment, if one was declared.
    pub fn depth_attachment(&self) -> Option<Arc<Texture2D>> {
        self.depth.read().clone()
    }

    /// Reallocate every attachment at the new extent.
    ///
    /// Old attachment `Arc`s stay alive for as long as submitted work still
    /// holds them; this instance hands out the new ones from here on.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), GraphicsError> {
        let extent = Extent2d::new(width, height);
        let color = Self::create_color_attachments(&self.label, &self.description, extent)?;
        let depth = Self::create_depth_attachment(&self.label, &self.description, extent)?;

        *self.extent.write() = extent;
        *self.color.write() = color;
        *self.depth.write() = depth;

        log::debug!("framebuffer `{}` resized to {}x{}", self.label, width, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_description() -> FramebufferDescription {
        FramebufferDescription::new(800, 600)
            .with_color(FramebufferAttachment::new(TextureFormat::Rgba16Float))
            .with_depth(FramebufferAttachment::new(TextureFormat::Depth32Float))
    }

    #[test]
    fn test_attachments_created() {
        let fb = Framebuffer::new("main", test_description()).unwrap();
        assert_eq!(fb.color_attachment_count(), 1);
        assert!(fb.depth_attachment().is_some());
        assert_eq!(fb.color_attachment(0).label(), "main.color0");
        assert_eq!(fb.color_attachment(0).extent(), Extent2d::new(800, 600));
    }

    #[test]
    fn test_no_attachments_rejected() {
        assert!(Framebuffer::new("empty", FramebufferDescription::new(4, 4)).is_err());
    }

    #[test]
    fn test_color_format_depth_rejected() {
        let desc = FramebufferDescription::new(4, 4)
            .with_depth(FramebufferAttachment::new(TextureFormat::Rgba8Unorm));
        assert!(Framebuffer::new("bad", desc).is_err());
    }

    #[test]
    fn test_resize_recreates_attachments() {
        let fb = Framebuffer::new("main", test_description()).unwrap();
        let old = fb.color_attachment(0);

        fb.resize(1024, 768).unwrap();

        let new = fb.color_attachment(0);
        assert_eq!(fb.extent(), Extent2d::new(1024, 768));
        assert_eq!(new.extent(), Extent2d::new(1024, 768));
        // The old instance is untouched, still referenced by in-flight work.
        assert_eq!(old.extent(), Extent2d::new(800, 600));
        assert!(!Arc::ptr_eq(&old, &new));
    }
}
