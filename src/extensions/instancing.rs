//! `EXT_mesh_gpu_instancing`: per-instance TRS tables.

use glam::Mat4;
use serde_json::{json, Map};

use crate::error::Result;
use crate::gltf::NodeDef;
use crate::scene::{Node, NodeId, VertexAttribute};
use crate::writer::{AccessorUsage, GltfWriter};

use super::WriterPlugin;

const NAME: &str = "EXT_mesh_gpu_instancing";

pub(super) fn plugin() -> Box<dyn WriterPlugin> {
    Box::new(MeshGpuInstancing)
}

struct MeshGpuInstancing;

impl WriterPlugin for MeshGpuInstancing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_node(
        &self,
        writer: &mut GltfWriter<'_>,
        _id: NodeId,
        node: &Node,
        def: &mut NodeDef,
    ) -> Result<()> {
        let Some(instances) = &node.instances else {
            return Ok(());
        };
        if def.mesh.is_none() {
            return Ok(());
        }
        let count = instances.count();
        if count == 0 {
            tracing::warn!("instanced node has no instances, extension skipped");
            return Ok(());
        }

        let mut translations = Vec::with_capacity(count * 3);
        let mut rotations = Vec::with_capacity(count * 4);
        let mut scales = Vec::with_capacity(count * 3);
        for matrix in &instances.matrices {
            let (scale, rotation, translation) =
                Mat4::from_cols_array(matrix).to_scale_rotation_translation();
            translations.extend_from_slice(&translation.to_array());
            rotations.extend_from_slice(&rotation.to_array());
            scales.extend_from_slice(&scale.to_array());
        }

        let translation_attr = VertexAttribute::f32(translations, 3);
        let rotation_attr = VertexAttribute::f32(rotations, 4);
        let scale_attr = VertexAttribute::f32(scales, 3);

        let mut attributes = Map::new();
        if let Some(accessor) =
            writer.process_full_accessor(&translation_attr, AccessorUsage::Plain)?
        {
            attributes.insert("TRANSLATION".to_string(), json!(accessor));
        }
        if let Some(accessor) = writer.process_full_accessor(&rotation_attr, AccessorUsage::Plain)?
        {
            attributes.insert("ROTATION".to_string(), json!(accessor));
        }
        if let Some(accessor) = writer.process_full_accessor(&scale_attr, AccessorUsage::Plain)? {
            attributes.insert("SCALE".to_string(), json!(accessor));
        }
        if let Some(colors) = &instances.colors {
            let flat: Vec<f32> = colors.iter().flatten().copied().collect();
            let color_attr = VertexAttribute::f32(flat, 3);
            if let Some(accessor) =
                writer.process_full_accessor(&color_attr, AccessorUsage::Plain)?
            {
                attributes.insert("_COLOR_0".to_string(), json!(accessor));
            }
        }

        def.extensions
            .insert(NAME.to_string(), json!({ "attributes": attributes }));
        writer.extensions_used.insert(NAME.to_string());
        writer.extensions_required.insert(NAME.to_string());
        Ok(())
    }
}
