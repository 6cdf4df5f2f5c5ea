//! Meshes: geometry plus material binding and morph influences.

use super::{GeometryId, MaterialId};

/// Primitive topology of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
}

/// A drawable mesh. Multi-material meshes bind one material per geometry
/// group, in group `material_index` order.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryId,
    pub materials: Vec<MaterialId>,
    pub mode: PrimitiveMode,
    /// Current morph target influences, one weight per target.
    pub weights: Vec<f32>,
    /// Optional morph target names, emitted as `extras.targetNames`.
    pub target_names: Vec<String>,
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            geometry,
            materials: vec![material],
            ..Self::default()
        }
    }
}
