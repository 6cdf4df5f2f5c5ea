//! `KHR_lights_punctual`: directional, point, and spot light nodes.

use serde_json::{json, Value};

use crate::error::Result;
use crate::gltf::NodeDef;
use crate::scene::{LightKind, Node, NodeId};
use crate::writer::GltfWriter;

use super::WriterPlugin;

const NAME: &str = "KHR_lights_punctual";

pub(super) fn plugin() -> Box<dyn WriterPlugin> {
    Box::new(LightsPunctual)
}

struct LightsPunctual;

impl WriterPlugin for LightsPunctual {
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
        let Some(light_id) = node.light else {
            return Ok(());
        };
        let scene = writer.scene;
        let light = scene.light(light_id);

        if light.decay != 2.0 {
            tracing::warn!(
                light = light.name.as_str(),
                "glTF assumes light decay of 2; intensity may render differently"
            );
        }
        if !matches!(light.kind, LightKind::Point) {
            if let Some(target) = light.target {
                let canonical = node.children.contains(&target)
                    && scene.node(target).transform.to_trs().0 == [0.0, 0.0, -1.0];
                if !canonical {
                    tracing::warn!(
                        light = light.name.as_str(),
                        "light target should be a child node at (0, 0, -1); \
                         direction may be lost"
                    );
                }
            }
        }

        let mut light_def = serde_json::Map::new();
        if !light.name.is_empty() {
            light_def.insert("name".to_string(), json!(light.name));
        }
        light_def.insert("color".to_string(), json!(light.color));
        light_def.insert("intensity".to_string(), json!(light.intensity));
        match light.kind {
            LightKind::Directional => {
                light_def.insert("type".to_string(), json!("directional"));
            }
            LightKind::Point => {
                light_def.insert("type".to_string(), json!("point"));
                if let Some(range) = light.range {
                    light_def.insert("range".to_string(), json!(range));
                }
            }
            LightKind::Spot { angle, penumbra } => {
                light_def.insert("type".to_string(), json!("spot"));
                if let Some(range) = light.range {
                    light_def.insert("range".to_string(), json!(range));
                }
                light_def.insert(
                    "spot".to_string(),
                    json!({
                        "innerConeAngle": angle * (1.0 - penumbra),
                        "outerConeAngle": angle,
                    }),
                );
            }
        }

        // Document-scoped light table, created on first use.
        let doc_entry = writer
            .json
            .extensions
            .entry(NAME.to_string())
            .or_insert_with(|| json!({ "lights": [] }));
        let light_index = match doc_entry
            .get_mut("lights")
            .and_then(Value::as_array_mut)
        {
            Some(lights) => {
                lights.push(Value::Object(light_def));
                lights.len() - 1
            }
            None => return Ok(()),
        };

        def.extensions
            .insert(NAME.to_string(), json!({ "light": light_index }));
        writer.extensions_used.insert(NAME.to_string());
        Ok(())
    }
}
