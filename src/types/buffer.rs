//! Buffer usage flags.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 0;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 1;
        /// Buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be bound as a storage buffer.
        const STORAGE = 1 << 3;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}
