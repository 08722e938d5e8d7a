//! 2D textures with layout tracking.

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::{Extent2d, ImageLayout, TextureDescriptor, TextureUsage};

/// A 2D texture (optionally layered) with an explicitly tracked image layout.
///
/// Layout transitions are recorded by passes as explicit commands; the
/// texture only tracks which layout those commands have moved it into so the
/// executor can validate and a backend can emit the matching barrier.
#[derive(Debug)]
pub struct Texture2D {
    descriptor: TextureDescriptor,
    extent: Mutex<Extent2d>,
    layout: Mutex<ImageLayout>,
}

impl Texture2D {
    /// Create a texture from a descriptor.
    ///
    /// Fails on combinations a backend cannot express: zero extent, zero
    /// layers, no usage, or a depth format used as a storage image.
    pub fn new(descriptor: TextureDescriptor) -> Result<Self, GraphicsError> {
        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture `{}` has zero extent",
                descriptor.label.as_deref().unwrap_or("<unlabeled>")
            )));
        }
        if descriptor.layers == 0 {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture `{}` has zero layers",
                descriptor.label.as_deref().unwrap_or("<unlabeled>")
            )));
        }
        if descriptor.usage.is_empty() {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture `{}` declares no usage",
                descriptor.label.as_deref().unwrap_or("<unlabeled>")
            )));
        }
        if descriptor.format.is_depth_stencil() && descriptor.usage.contains(TextureUsage::STORAGE)
        {
            return Err(GraphicsError::Unsupported(format!(
                "texture `{}`: depth formats cannot be storage images",
                descriptor.label.as_deref().unwrap_or("<unlabeled>")
            )));
        }
        let extent = descriptor.size;
        Ok(Self {
            descriptor,
            extent: Mutex::new(extent),
            layout: Mutex::new(ImageLayout::Undefined),
        })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        self.descriptor.label.as_deref().unwrap_or("<unlabeled>")
    }

    /// The creation descriptor. The extent inside it is the original one;
    /// use [`extent`](Self::extent) for the current size.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Current size.
    pub fn extent(&self) -> Extent2d {
        *self.extent.lock()
    }

    /// Number of array layers.
    pub fn layers(&self) -> u32 {
        self.descriptor.layers
    }

    /// Current image layout.
    pub fn layout(&self) -> ImageLayout {
        *self.layout.lock()
    }

    /// Move the texture into `layout`. Returns the previous layout.
    pub fn set_layout(&self, layout: ImageLayout) -> ImageLayout {
        std::mem::replace(&mut self.layout.lock(), layout)
    }

    /// Reallocate the texture at a new size.
    ///
    /// Contents are discarded and the layout returns to `Undefined`, the same
    /// as a fresh allocation.
    pub fn resize(&self, width: u32, height: u32) {
        *self.extent.lock() = Extent2d::new(width, height);
        *self.layout.lock() = ImageLayout::Undefined;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureFormat;

    #[test]
    fn test_invalid_descriptors_rejected() {
        let zero = TextureDescriptor::new_2d(0, 4, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED);
        assert!(Texture2D::new(zero).is_err());

        let depth_storage =
            TextureDescriptor::new_2d(4, 4, TextureFormat::Depth32Float, TextureUsage::STORAGE);
        assert!(Texture2D::new(depth_storage).is_err());
    }

    #[test]
    fn test_layout_tracking() {
        let texture = Texture2D::new(TextureDescriptor::new_2d(
            4,
            4,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT,
        ))
        .unwrap();

        assert_eq!(texture.layout(), ImageLayout::Undefined);
        let previous = texture.set_layout(ImageLayout::ColorAttachment);
        assert_eq!(previous, ImageLayout::Undefined);
        assert_eq!(texture.layout(), ImageLayout::ColorAttachment);
    }

    #[test]
    fn test_resize_resets_layout() {
        let texture = Texture2D::new(TextureDescriptor::new_2d(
            4,
            4,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT,
        ))
        .unwrap();
        texture.set_layout(ImageLayout::ShaderReadOnly);

        texture.resize(8, 8);

        assert_eq!(texture.extent(), Extent2d::new(8, 8));
        assert_eq!(texture.layout(), ImageLayout::Undefined);
    }
}
