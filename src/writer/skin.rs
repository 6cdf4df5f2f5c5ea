//! Skin emission: joints, skeleton root, inverse bind matrices.

use glam::Mat4;

use crate::error::Result;
use crate::gltf::SkinDef;
use crate::scene::{NodeId, VertexAttribute};
use crate::utils::IDENTITY_MATRIX;

use super::{AccessorUsage, GltfWriter};

impl GltfWriter<'_> {
    /// Emit the skin recorded for a skinned node and back-write the skin
    /// index onto the node's definition. Runs strictly after node traversal,
    /// so every bone resolves through the completed node map.
    pub(crate) fn process_skin(&mut self, node_id: NodeId) -> Result<()> {
        let scene = self.scene;
        let node = scene.node(node_id);
        let Some(skin_id) = node.skin else {
            return Ok(());
        };
        let Some(&node_index) = self.node_map.get(&node_id) else {
            return Ok(());
        };
        let skin = scene.skin(skin_id);
        if skin.bones.is_empty() {
            return Ok(());
        }

        let bind_matrix = Mat4::from_cols_array(&node.bind_matrix.unwrap_or(IDENTITY_MATRIX));

        let mut joints = Vec::with_capacity(skin.bones.len());
        let mut inverse_bind = Vec::with_capacity(skin.bones.len() * 16);
        for (i, &bone) in skin.bones.iter().enumerate() {
            let Some(&joint_index) = self.node_map.get(&bone) else {
                tracing::warn!(
                    skin = skin.name.as_str(),
                    "skin references a bone outside the exported scene, skin skipped"
                );
                return Ok(());
            };
            joints.push(joint_index);

            let bone_inverse =
                Mat4::from_cols_array(&skin.bone_inverses.get(i).copied().unwrap_or(IDENTITY_MATRIX));
            inverse_bind.extend_from_slice(&(bone_inverse * bind_matrix).to_cols_array());
        }

        let matrices = VertexAttribute::f32(inverse_bind, 16);
        let Some(accessor) = self.process_full_accessor(&matrices, AccessorUsage::Plain)? else {
            return Ok(());
        };

        let skeleton = self.node_map.get(&skin.bones[0]).copied();
        let skin_index = self.json.skins.len();
        self.json.skins.push(SkinDef {
            name: (!skin.name.is_empty()).then(|| skin.name.clone()),
            inverse_bind_matrices: accessor,
            joints,
            skeleton,
        });
        self.json.nodes[node_index].skin = Some(skin_index);
        Ok(())
    }
}
