//! Uniform buffers.

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::types::BufferUsage;

/// A fixed-size uniform buffer with a CPU-visible shadow copy.
///
/// The shadow bytes are what a backend would upload to device memory. Writes
/// go through [`set_data`](Self::set_data) or
/// [`write_pod`](Self::write_pod); both bounds-check against the size fixed
/// at creation.
#[derive(Debug)]
pub struct UniformBuffer {
    label: String,
    size: u64,
    usage: BufferUsage,
    data: Mutex<Vec<u8>>,
}

impl UniformBuffer {
    /// Create a zero-initialized uniform buffer of `size` bytes.
    pub fn new(label: impl Into<String>, size: u64) -> Result<Self, GraphicsError> {
        if size == 0 {
            return Err(GraphicsError::ResourceCreation(
                "uniform buffer size must be non-zero".into(),
            ));
        }
        Ok(Self {
            label: label.into(),
            size,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            data: Mutex::new(vec![0u8; size as usize]),
        })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Write raw bytes at `offset`.
    pub fn set_data(&self, offset: u64, bytes: &[u8]) -> Result<(), GraphicsError> {
        let end = offset + bytes.len() as u64;
        if end > self.size {
            return Err(GraphicsError::ResourceCreation(format!(
                "write of {} bytes at offset {} overflows buffer `{}` ({} bytes)",
                bytes.len(),
                offset,
                self.label,
                self.size
            )));
        }
        let mut data = self.data.lock();
        data[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }

    /// Write a plain-old-data value at `offset`.
    pub fn write_pod<T: bytemuck::Pod>(&self, offset: u64, value: &T) -> Result<(), GraphicsError> {
        self.set_data(offset, bytemuck::bytes_of(value))
    }

    /// Snapshot of the shadow bytes.
    pub fn data(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}
