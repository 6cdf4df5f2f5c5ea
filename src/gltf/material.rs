//! glTF 2.0 material and texture types.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::Extensions;

/// Image, either embedded in the binary buffer or as a data URI
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageDef {
    #[serde(rename = "bufferView", skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Texture sampler defining filtering and wrapping
#[derive(Debug, Clone, Serialize)]
pub struct SamplerDef {
    #[serde(rename = "magFilter")]
    pub mag_filter: u32,
    #[serde(rename = "minFilter")]
    pub min_filter: u32,
    #[serde(rename = "wrapS")]
    pub wrap_s: u32,
    #[serde(rename = "wrapT")]
    pub wrap_t: u32,
}

/// Texture referencing an image and sampler
#[derive(Debug, Clone, Default, Serialize)]
pub struct TextureDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
}

/// Texture info used in materials
#[derive(Debug, Clone, Default, Serialize)]
pub struct TextureInfoDef {
    pub index: usize,
    #[serde(rename = "texCoord", skip_serializing_if = "Option::is_none")]
    pub tex_coord: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
}

/// Normal texture info with scale
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalTextureInfoDef {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(rename = "texCoord", skip_serializing_if = "Option::is_none")]
    pub tex_coord: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
}

/// Occlusion texture info with strength
#[derive(Debug, Clone, Default, Serialize)]
pub struct OcclusionTextureInfoDef {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(rename = "texCoord", skip_serializing_if = "Option::is_none")]
    pub tex_coord: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
}

/// PBR Metallic-Roughness material model
#[derive(Debug, Clone, Default, Serialize)]
pub struct PbrMetallicRoughnessDef {
    #[serde(rename = "baseColorFactor", skip_serializing_if = "Option::is_none")]
    pub base_color_factor: Option<[f32; 4]>,
    #[serde(rename = "baseColorTexture", skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfoDef>,
    #[serde(rename = "metallicFactor", skip_serializing_if = "Option::is_none")]
    pub metallic_factor: Option<f32>,
    #[serde(rename = "roughnessFactor", skip_serializing_if = "Option::is_none")]
    pub roughness_factor: Option<f32>,
    #[serde(
        rename = "metallicRoughnessTexture",
        skip_serializing_if = "Option::is_none"
    )]
    pub metallic_roughness_texture: Option<TextureInfoDef>,
}

/// Material definition
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterialDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "pbrMetallicRoughness")]
    pub pbr_metallic_roughness: PbrMetallicRoughnessDef,
    #[serde(rename = "normalTexture", skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<NormalTextureInfoDef>,
    #[serde(rename = "occlusionTexture", skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<OcclusionTextureInfoDef>,
    #[serde(rename = "emissiveTexture", skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfoDef>,
    #[serde(rename = "emissiveFactor", skip_serializing_if = "Option::is_none")]
    pub emissive_factor: Option<[f32; 3]>,
    #[serde(rename = "alphaMode", skip_serializing_if = "Option::is_none")]
    pub alpha_mode: Option<&'static str>,
    #[serde(rename = "alphaCutoff", skip_serializing_if = "Option::is_none")]
    pub alpha_cutoff: Option<f32>,
    #[serde(rename = "doubleSided", skip_serializing_if = "Option::is_none")]
    pub double_sided: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}
