//! Scene nodes and their local transforms.

use super::{CameraId, LightId, MeshId, NodeId, SkinId};
use crate::utils::IDENTITY_MATRIX;

/// Local transform of a node, either decomposed or as a column-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTransform {
    /// Translation, rotation quaternion `[x, y, z, w]`, scale.
    Trs {
        translation: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
    },
    /// Column-major 4x4 matrix.
    Matrix([f32; 16]),
}

impl NodeTransform {
    /// Identity in decomposed form.
    #[must_use]
    pub fn identity() -> Self {
        Self::Trs {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }

    /// The transform as a column-major matrix.
    #[must_use]
    pub fn to_matrix(&self) -> [f32; 16] {
        match self {
            Self::Matrix(m) => *m,
            Self::Trs {
                translation,
                rotation,
                scale,
            } => glam::Mat4::from_scale_rotation_translation(
                glam::Vec3::from_array(*scale),
                glam::Quat::from_array(*rotation),
                glam::Vec3::from_array(*translation),
            )
            .to_cols_array(),
        }
    }

    /// The transform decomposed into translation, rotation, scale.
    #[must_use]
    pub fn to_trs(&self) -> ([f32; 3], [f32; 4], [f32; 3]) {
        match self {
            Self::Trs {
                translation,
                rotation,
                scale,
            } => (*translation, *rotation, *scale),
            Self::Matrix(m) => {
                let (scale, rotation, translation) =
                    glam::Mat4::from_cols_array(m).to_scale_rotation_translation();
                (
                    translation.to_array(),
                    rotation.to_array(),
                    scale.to_array(),
                )
            }
        }
    }

    /// Whether the transform is exactly the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Matrix(m) => *m == IDENTITY_MATRIX,
            Self::Trs {
                translation,
                rotation,
                scale,
            } => {
                *translation == [0.0; 3]
                    && *rotation == [0.0, 0.0, 0.0, 1.0]
                    && *scale == [1.0; 3]
            }
        }
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Per-instance tables for GPU-instanced meshes.
#[derive(Debug, Clone, Default)]
pub struct MeshInstances {
    /// One column-major matrix per instance.
    pub matrices: Vec<[f32; 16]>,
    /// Optional per-instance RGB color.
    pub colors: Option<Vec<[f32; 3]>>,
}

impl MeshInstances {
    #[must_use]
    pub fn count(&self) -> usize {
        self.matrices.len()
    }
}

/// A scene-graph node.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub transform: NodeTransform,
    /// Invisible nodes (and their subtrees) are skipped under `only_visible`.
    pub visible: bool,
    pub mesh: Option<MeshId>,
    pub camera: Option<CameraId>,
    pub light: Option<LightId>,
    pub skin: Option<SkinId>,
    /// Bind matrix of a skinned mesh, column-major. Identity when absent.
    pub bind_matrix: Option<[f32; 16]>,
    /// Present when the node's mesh is drawn instanced.
    pub instances: Option<MeshInstances>,
    pub children: Vec<NodeId>,
    /// Open metadata map, serialized into `extras` (and, under
    /// `include_custom_extensions`, its `gltfExtensions` key into
    /// `extensions`).
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mesh(name: impl Into<String>, mesh: MeshId) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::new(name)
        }
    }
}
