//! Concrete GPU-side resources.
//!
//! Everything here is instantiated per frame slot by the
//! [`ResourceRegistry`](crate::graph::ResourceRegistry): a blueprint declared
//! once turns into `frames_in_flight` independent instances, so the CPU can
//! mutate slot N+1's copy while slot N's copy is still referenced by
//! submitted work.
//!
//! Each type carries the CPU-visible state a backend needs to mirror into a
//! native object. Interior mutability is used where the registry hands out
//! shared `Arc`s but per-frame code still records into the object (command
//! buffers, layout tracking, uniform uploads).

mod buffer;
mod command_buffer;
mod framebuffer;
mod sampler;
mod shader_resource_group;
mod texture;

pub use buffer::UniformBuffer;
pub use command_buffer::{CommandBuffer, CommandBufferState, RecordedCommand};
pub use framebuffer::{Framebuffer, FramebufferAttachment, FramebufferDescription};
pub use sampler::Sampler;
pub use shader_resource_group::{
    BoundResource, ShaderResourceDescription, ShaderResourceGroup, ShaderResourceType,
    ShaderStages,
};
pub use texture::Texture2D;
