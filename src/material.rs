//! Materials and their GPU layout.
//!
//! A [`Material`] references its textures by [`AssetId`]; the renderer
//! resolves those identities through the bindless texture table into compact
//! indices when building the [`GpuMaterial`] record that lands in the
//! bindless material buffer. Unresolvable references fall back to the
//! built-in white (or, for emissive, black) placeholder so a missing texture
//! shows up as flat shading instead of a crash.

use glam::{Vec2, Vec4};

use crate::bindless::AssetId;

/// CPU-side material description with asset-identity texture references.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color multiplier.
    pub albedo_color: Vec4,
    /// UV scale applied to every map.
    pub texture_scale: Vec2,
    /// Metalness multiplier.
    pub metalness: f32,
    /// Roughness multiplier.
    pub roughness: f32,
    /// Ambient occlusion multiplier.
    pub ambient_occlusion: f32,
    /// Albedo map.
    pub albedo_map: Option<AssetId>,
    /// Normal map.
    pub normal_map: Option<AssetId>,
    /// Metalness map.
    pub metalness_map: Option<AssetId>,
    /// Roughness map.
    pub roughness_map: Option<AssetId>,
    /// Ambient occlusion map.
    pub ao_map: Option<AssetId>,
    /// Emissive map.
    pub emissive_map: Option<AssetId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_color: Vec4::ONE,
            texture_scale: Vec2::ONE,
            metalness: 0.0,
            roughness: 1.0,
            ambient_occlusion: 1.0,
            albedo_map: None,
            normal_map: None,
            metalness_map: None,
            roughness_map: None,
            ao_map: None,
            emissive_map: None,
        }
    }
}

/// One record of the bindless material buffer.
///
/// Texture references are compact bindless indices, resolved from the
/// material's asset identities at ingestion time. Whenever a referenced
/// texture's index changes, the record must be re-derived and rewritten.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuMaterial {
    /// Base color multiplier.
    pub albedo_color: Vec4,
    /// UV scale applied to every map.
    pub texture_scale: Vec2,
    /// Metalness multiplier.
    pub metalness: f32,
    /// Roughness multiplier.
    pub roughness: f32,
    /// Ambient occlusion multiplier.
    pub ambient_occlusion: f32,
    /// Bindless index of the albedo map.
    pub albedo_index: u32,
    /// Bindless index of the normal map.
    pub normal_index: u32,
    /// Bindless index of the metalness map.
    pub metalness_index: u32,
    /// Bindless index of the roughness map.
    pub roughness_index: u32,
    /// Bindless index of the ambient occlusion map.
    pub ao_index: u32,
    /// Bindless index of the emissive map.
    pub emissive_index: u32,
    pub _padding: u32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<GpuMaterial>(), 64);
