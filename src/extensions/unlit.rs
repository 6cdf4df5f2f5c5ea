//! `KHR_materials_unlit`: flat-shaded materials.

use serde_json::json;

use crate::error::Result;
use crate::gltf::MaterialDef;
use crate::scene::{Material, MaterialKind};
use crate::writer::GltfWriter;

use super::WriterPlugin;

const NAME: &str = "KHR_materials_unlit";

pub(super) fn plugin() -> Box<dyn WriterPlugin> {
    Box::new(MaterialsUnlit)
}

struct MaterialsUnlit;

impl WriterPlugin for MaterialsUnlit {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_material(
        &self,
        writer: &mut GltfWriter<'_>,
        material: &Material,
        def: &mut MaterialDef,
    ) -> Result<()> {
        if material.kind != MaterialKind::Basic {
            return Ok(());
        }
        def.extensions.insert(NAME.to_string(), json!({}));
        writer.extensions_used.insert(NAME.to_string());

        def.pbr_metallic_roughness.metallic_factor = Some(0.0);
        def.pbr_metallic_roughness.roughness_factor = Some(0.9);
        Ok(())
    }
}
