//! Plain data types shared across the rendering core.

mod buffer;
mod sampler;
mod texture;

pub use buffer::BufferUsage;
pub use sampler::{AddressMode, FilterMode, SamplerDescriptor};
pub use texture::{ImageLayout, TextureDescriptor, TextureFormat, TextureUsage};

/// A two-dimensional extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    /// Create a new extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
