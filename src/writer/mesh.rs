//! Mesh emission: attribute renaming, normal repair, morph relativization,
//! and material-group slicing.

use std::collections::BTreeMap;

use serde_json::json;

use crate::error::Result;
use crate::gltf::{MeshDef, PrimitiveDef};
use crate::scene::{AttributeData, Geometry, GeometryGroup, MeshId, PrimitiveMode, VertexAttribute};

use super::webgl;
use super::{AccessorUsage, AttrVariant, GltfWriter, MeshCacheKey};

/// Maximum deviation from unit length before a normal stream is repaired.
const NORMAL_EPSILON: f64 = 0.0005;

/// Map a scene attribute name to its glTF semantic. Unknown names are
/// uppercased; anything outside glTF's attribute semantic grammar is
/// prefixed with `_` as a custom attribute.
fn gltf_attribute_name(name: &str) -> String {
    let mapped = match name {
        "uv" => "TEXCOORD_0".to_string(),
        "uv1" => "TEXCOORD_1".to_string(),
        "uv2" => "TEXCOORD_2".to_string(),
        "uv3" => "TEXCOORD_3".to_string(),
        "color" => "COLOR_0".to_string(),
        "skinWeight" => "WEIGHTS_0".to_string(),
        "skinIndex" => "JOINTS_0".to_string(),
        other => other.to_uppercase(),
    };
    if is_valid_semantic(&mapped) {
        mapped
    } else {
        format!("_{mapped}")
    }
}

/// `^(POSITION|NORMAL|TANGENT|TEXCOORD_\d+|COLOR_\d+|JOINTS_\d+|WEIGHTS_\d+)$`
fn is_valid_semantic(name: &str) -> bool {
    if matches!(name, "POSITION" | "NORMAL" | "TANGENT") {
        return true;
    }
    for prefix in ["TEXCOORD_", "COLOR_", "JOINTS_", "WEIGHTS_"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit());
        }
    }
    false
}

/// Whether every element of a normal stream is within tolerance of unit
/// length.
fn has_unit_normals(attribute: &VertexAttribute) -> bool {
    for element in 0..attribute.count() {
        let mut sq = 0.0f64;
        for c in 0..attribute.item_size {
            let v = attribute.get(element, c);
            sq += v * v;
        }
        if (sq.sqrt() - 1.0).abs() > NORMAL_EPSILON {
            return false;
        }
    }
    true
}

/// Float clone of a normal stream with every element renormalized;
/// zero-length normals become `(1, 0, 0)`.
fn normalized_normal_clone(attribute: &VertexAttribute) -> VertexAttribute {
    let item_size = attribute.item_size;
    let mut values = vec![0.0f32; attribute.count() * item_size];
    for element in 0..attribute.count() {
        let mut sq = 0.0f64;
        for c in 0..item_size {
            let v = attribute.get(element, c);
            sq += v * v;
        }
        let length = sq.sqrt();
        if length == 0.0 {
            values[element * item_size] = 1.0;
        } else {
            for c in 0..item_size {
                values[element * item_size + c] = (attribute.get(element, c) / length) as f32;
            }
        }
    }
    VertexAttribute::f32(values, item_size)
}

/// 16-bit unsigned clone of a joint-index stream.
fn widened_joints_clone(attribute: &VertexAttribute) -> VertexAttribute {
    let total = attribute.data.len();
    let mut values = Vec::with_capacity(total);
    for i in 0..total {
        values.push(attribute.data.raw(i).clamp(0.0, 65535.0) as u16);
    }
    VertexAttribute::new(AttributeData::U16(values), attribute.item_size)
}

/// Morph values relative to the base attribute, in the morph stream's own
/// storage.
fn relative_morph_clone(base: &VertexAttribute, morph: &VertexAttribute) -> VertexAttribute {
    let mut clone = morph.clone();
    let count = clone.count().min(base.count());
    let item_size = clone.item_size.min(base.item_size);
    for element in 0..count {
        for c in 0..item_size {
            clone.set(element, c, morph.get(element, c) - base.get(element, c));
        }
    }
    clone
}

fn vertex_count(writer: &GltfWriter<'_>, geometry: &Geometry) -> usize {
    geometry
        .attributes
        .get("position")
        .or_else(|| geometry.attributes.values().next())
        .map_or(0, |&id| writer.scene.attribute(id).count())
}

impl GltfWriter<'_> {
    /// Emit a mesh, or `None` when it has nothing exportable (no valid
    /// attributes, or a multi-material binding without geometry groups).
    pub(crate) fn process_mesh(&mut self, mesh_id: MeshId) -> Result<Option<usize>> {
        let scene = self.scene;
        let mesh = scene.mesh(mesh_id);

        let cache_key = MeshCacheKey {
            geometry: mesh.geometry,
            materials: mesh.materials.clone(),
        };
        if let Some(&cached) = self.mesh_cache.get(&cache_key) {
            return Ok(Some(cached));
        }

        let geometry = scene.geometry(mesh.geometry);

        let mode = match mesh.mode {
            PrimitiveMode::Points => webgl::POINTS,
            PrimitiveMode::Lines => webgl::LINES,
            PrimitiveMode::LineLoop => webgl::LINE_LOOP,
            PrimitiveMode::LineStrip => webgl::LINE_STRIP,
            PrimitiveMode::Triangles => {
                let wireframe = mesh.materials.len() == 1
                    && scene.material(mesh.materials[0]).wireframe;
                if wireframe {
                    webgl::LINES
                } else {
                    webgl::TRIANGLES
                }
            }
        };

        let mut attributes = BTreeMap::new();
        for (name, &attr_id) in &geometry.attributes {
            // Morph streams are handled with their targets below.
            if name.starts_with("morph") {
                continue;
            }
            let semantic = gltf_attribute_name(name);
            let attribute = scene.attribute(attr_id);

            let (variant, substitute) = if semantic == "JOINTS_0"
                && !matches!(
                    attribute.data,
                    AttributeData::U8(_) | AttributeData::U16(_)
                ) {
                tracing::warn!(
                    attribute = name.as_str(),
                    "joint indices converted to 16-bit unsigned storage"
                );
                (AttrVariant::JointsWidened, Some(widened_joints_clone(attribute)))
            } else if semantic == "NORMAL" && !has_unit_normals(attribute) {
                (
                    AttrVariant::NormalizedNormal,
                    Some(normalized_normal_clone(attribute)),
                )
            } else {
                (AttrVariant::Absolute, None)
            };

            let emitted = substitute.as_ref().unwrap_or(attribute);
            if let Some(accessor) =
                self.process_cached_accessor(attr_id, variant, emitted, AccessorUsage::Vertex)?
            {
                attributes.insert(semantic, accessor);
            }
        }
        if attributes.is_empty() {
            return Ok(None);
        }

        // Morph targets: glTF stores deltas, so absolute streams are
        // relativized against their base attribute.
        let mut targets = Vec::new();
        let mut weights = Vec::new();
        let morph_count = geometry.morph_target_count();
        if morph_count > 0 {
            weights = if mesh.weights.len() == morph_count {
                mesh.weights.clone()
            } else {
                vec![0.0; morph_count]
            };

            let mut warned = false;
            for target_index in 0..morph_count {
                let mut target = BTreeMap::new();
                for (name, streams) in &geometry.morph_attributes {
                    let semantic = gltf_attribute_name(name);
                    if semantic != "POSITION" && semantic != "NORMAL" {
                        if !warned {
                            tracing::warn!(
                                "only POSITION and NORMAL morph targets are exported"
                            );
                            warned = true;
                        }
                        continue;
                    }
                    let Some(&morph_id) = streams.get(target_index) else {
                        continue;
                    };
                    let morph = scene.attribute(morph_id);
                    let accessor = if geometry.morph_targets_relative {
                        self.process_cached_accessor(
                            morph_id,
                            AttrVariant::MorphRelative,
                            morph,
                            AccessorUsage::Vertex,
                        )?
                    } else if let Some(&base_id) = geometry.attributes.get(name) {
                        let relative = relative_morph_clone(scene.attribute(base_id), morph);
                        self.process_cached_accessor(
                            morph_id,
                            AttrVariant::MorphRelative,
                            &relative,
                            AccessorUsage::Vertex,
                        )?
                    } else {
                        None
                    };
                    if let Some(accessor) = accessor {
                        target.insert(semantic, accessor);
                    }
                }
                targets.push(target);
            }
        }

        // Multi-material meshes need groups to slice the index stream; a
        // missing index is synthesized as the trivial [0, n) sequence.
        let multi_material = mesh.materials.len() > 1;
        if multi_material && geometry.groups.is_empty() {
            return Ok(None);
        }
        let synthesized_index = if multi_material && geometry.index.is_none() {
            let n = vertex_count(self, geometry) as u32;
            Some(VertexAttribute::new(
                AttributeData::U32((0..n).collect()),
                1,
            ))
        } else {
            None
        };

        let index_attribute = geometry.index.map(|id| scene.attribute(id));
        let total_indices = index_attribute
            .or(synthesized_index.as_ref())
            .map_or_else(|| vertex_count(self, geometry), VertexAttribute::count);

        let groups: Vec<GeometryGroup> = if multi_material {
            geometry.groups.clone()
        } else {
            vec![GeometryGroup {
                start: 0,
                count: total_indices,
                material_index: 0,
            }]
        };

        let mut primitives = Vec::new();
        for group in groups {
            let start = group.start.min(total_indices);
            let count = group.count.min(total_indices - start);

            let mut primitive = PrimitiveDef {
                mode,
                attributes: attributes.clone(),
                targets: targets.clone(),
                ..PrimitiveDef::default()
            };
            if let Some(index) = index_attribute.or(synthesized_index.as_ref()) {
                primitive.indices =
                    self.process_accessor(index, AccessorUsage::Index, start, count)?;
            }
            if let Some(&material_id) = mesh.materials.get(group.material_index) {
                primitive.material = self.process_material(material_id)?;
            }
            primitives.push(primitive);
        }

        let mut def = MeshDef {
            name: (!mesh.name.is_empty()).then(|| mesh.name.clone()),
            primitives,
            weights,
            ..MeshDef::default()
        };
        if !mesh.target_names.is_empty() {
            def.extras = Some(json!({ "targetNames": mesh.target_names }));
        }
        self.serialize_user_data(&mesh.user_data, &mut def.extensions, &mut def.extras);
        self.invoke_write_mesh(mesh, &mut def)?;

        let index = self.json.meshes.len();
        self.json.meshes.push(def);
        self.mesh_cache.insert(cache_key, index);
        Ok(Some(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::AttributeData;

    #[test]
    fn test_attribute_renaming() {
        assert_eq!(gltf_attribute_name("position"), "POSITION");
        assert_eq!(gltf_attribute_name("uv"), "TEXCOORD_0");
        assert_eq!(gltf_attribute_name("uv2"), "TEXCOORD_2");
        assert_eq!(gltf_attribute_name("color"), "COLOR_0");
        assert_eq!(gltf_attribute_name("skinWeight"), "WEIGHTS_0");
        assert_eq!(gltf_attribute_name("skinIndex"), "JOINTS_0");
        assert_eq!(gltf_attribute_name("density"), "_DENSITY");
    }

    #[test]
    fn test_semantic_grammar() {
        assert!(is_valid_semantic("TEXCOORD_0"));
        assert!(is_valid_semantic("COLOR_12"));
        assert!(!is_valid_semantic("TEXCOORD_"));
        assert!(!is_valid_semantic("TEXCOORD_0X"));
        assert!(!is_valid_semantic("VELOCITY"));
    }

    #[test]
    fn test_normal_repair() {
        let skewed = VertexAttribute::f32(vec![0.0, 2.0, 0.0, 0.0, 0.0, 0.0], 3);
        assert!(!has_unit_normals(&skewed));
        let fixed = normalized_normal_clone(&skewed);
        assert!(has_unit_normals(&fixed));
        // Zero-length normals become (1, 0, 0).
        assert_eq!(fixed.get(1, 0), 1.0);
        assert_eq!(fixed.get(1, 1), 0.0);
    }

    #[test]
    fn test_morph_relativization() {
        let base = VertexAttribute::f32(vec![1.0, 2.0, 3.0], 3);
        let morph = VertexAttribute::f32(vec![1.5, 2.0, 2.0], 3);
        let relative = relative_morph_clone(&base, &morph);
        assert_eq!(relative.get(0, 0), 0.5);
        assert_eq!(relative.get(0, 1), 0.0);
        assert_eq!(relative.get(0, 2), -1.0);
    }

    #[test]
    fn test_joint_widening() {
        let joints = VertexAttribute::new(AttributeData::U32(vec![0, 1, 70000, 3]), 4);
        let widened = widened_joints_clone(&joints);
        assert!(matches!(widened.data, AttributeData::U16(_)));
        assert_eq!(widened.data.raw(2), 65535.0);
    }
}
