//! Emitted glTF 2.0 document types.
//!
//! Closed serde structs mirroring the glTF schema. Cross-references are
//! dense indices into the document's arrays. Extension payloads live in
//! open `extensions` maps keyed by extension name.

mod document;
mod material;

pub use document::{
    AccessorDef, AnimationDef, AnimationSamplerDef, Asset, BufferDef, BufferViewDef, CameraDef,
    ChannelDef, ChannelTargetDef, Document, MeshDef, NodeDef, OrthographicDef, PerspectiveDef,
    PrimitiveDef, SceneDef, SkinDef,
};
pub use material::{
    ImageDef, MaterialDef, NormalTextureInfoDef, OcclusionTextureInfoDef, PbrMetallicRoughnessDef,
    SamplerDef, TextureDef, TextureInfoDef,
};

/// Open per-definition extension map.
pub type Extensions = std::collections::BTreeMap<String, serde_json::Value>;
