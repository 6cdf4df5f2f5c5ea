//! Core glTF 2.0 structure types.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::material::{ImageDef, MaterialDef, SamplerDef, TextureDef};
use super::Extensions;

/// Asset metadata
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: Some(concat!("scenegltf glTF 2.0 exporter v", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

/// Scene definition
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Node in the scene graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Mesh primitive (geometry + material)
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrimitiveDef {
    pub mode: u32,
    pub attributes: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Mesh definition
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeshDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weights: Vec<f32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Accessor for typed buffer data
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessorDef {
    #[serde(rename = "bufferView")]
    pub buffer_view: usize,
    #[serde(rename = "byteOffset", skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<usize>,
    #[serde(rename = "componentType")]
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<serde_json::Number>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<serde_json::Number>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<bool>,
}

/// Buffer view (slice of the binary buffer)
#[derive(Debug, Clone, Default, Serialize)]
pub struct BufferViewDef {
    pub buffer: usize,
    #[serde(rename = "byteOffset")]
    pub byte_offset: usize,
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(rename = "byteStride", skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
}

/// Binary buffer
#[derive(Debug, Clone, Default, Serialize)]
pub struct BufferDef {
    #[serde(rename = "byteLength")]
    pub byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Skin for skeletal animation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkinDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "inverseBindMatrices")]
    pub inverse_bind_matrices: usize,
    pub joints: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<usize>,
}

/// Animation sampler: input times, output values, interpolation.
#[derive(Debug, Clone, Serialize)]
pub struct AnimationSamplerDef {
    pub input: usize,
    pub output: usize,
    pub interpolation: &'static str,
}

/// Animation channel target
#[derive(Debug, Clone, Serialize)]
pub struct ChannelTargetDef {
    pub node: usize,
    pub path: &'static str,
}

/// Animation channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDef {
    pub sampler: usize,
    pub target: ChannelTargetDef,
}

/// Animation definition
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnimationDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub samplers: Vec<AnimationSamplerDef>,
    pub channels: Vec<ChannelDef>,
}

/// Perspective projection parameters
#[derive(Debug, Clone, Serialize)]
pub struct PerspectiveDef {
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    pub yfov: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfar: Option<f32>,
    pub znear: f32,
}

/// Orthographic projection parameters
#[derive(Debug, Clone, Serialize)]
pub struct OrthographicDef {
    pub xmag: f32,
    pub ymag: f32,
    pub zfar: f32,
    pub znear: f32,
}

/// Camera definition
#[derive(Debug, Clone, Serialize)]
pub struct CameraDef {
    #[serde(rename = "type")]
    pub camera_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<OrthographicDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Complete glTF document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub asset: Asset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<SceneDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<MeshDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<TextureDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<SamplerDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<CameraDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<SkinDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<AnimationDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<AccessorDef>,
    #[serde(rename = "bufferViews", skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferViewDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<BufferDef>,
    #[serde(rename = "extensionsUsed", skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(rename = "extensionsRequired", skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: Extensions,
}
