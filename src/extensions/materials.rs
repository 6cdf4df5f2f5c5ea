//! The `KHR`/`EXT` physical-material extension writers.
//!
//! Each plug-in inspects the material's capability data and emits its
//! extension object only when some parameter differs from the extension's
//! spec default, so default materials stay extension-free.

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::gltf::MaterialDef;
use crate::scene::{Material, MaterialKind, PhysicalProps};
use crate::writer::GltfWriter;

use super::WriterPlugin;

fn physical(material: &Material) -> Option<&PhysicalProps> {
    if material.kind == MaterialKind::Physical {
        material.physical.as_ref()
    } else {
        None
    }
}

fn is_pbr(material: &Material) -> bool {
    matches!(
        material.kind,
        MaterialKind::Standard | MaterialKind::Physical
    )
}

fn finish(
    writer: &mut GltfWriter<'_>,
    def: &mut MaterialDef,
    name: &'static str,
    payload: Map<String, Value>,
) {
    def.extensions.insert(name.to_string(), Value::Object(payload));
    writer.extensions_used.insert(name.to_string());
}

macro_rules! material_plugin {
    ($factory:ident, $type_name:ident, $ext_name:literal, |$writer:ident, $material:ident, $def:ident| $body:block) => {
        pub(super) fn $factory() -> Box<dyn WriterPlugin> {
            Box::new($type_name)
        }

        struct $type_name;

        impl WriterPlugin for $type_name {
            fn name(&self) -> &'static str {
                $ext_name
            }

            fn write_material(
                &self,
                $writer: &mut GltfWriter<'_>,
                $material: &Material,
                $def: &mut MaterialDef,
            ) -> Result<()> {
                $body
                Ok(())
            }
        }
    };
}

material_plugin!(
    transmission,
    MaterialsTransmission,
    "KHR_materials_transmission",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.transmission == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("transmissionFactor".to_string(), json!(props.transmission));
        if let Some(map) = props.transmission_map {
            let info = writer.texture_info(map)?;
            ext.insert("transmissionTexture".to_string(), serde_json::to_value(info)?);
        }
        finish(writer, def, "KHR_materials_transmission", ext);
    }
);

material_plugin!(
    volume,
    MaterialsVolume,
    "KHR_materials_volume",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        // Gated on transmission, not thickness: a purely volumetric material
        // without transmission emits no volume data.
        if props.transmission == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("thicknessFactor".to_string(), json!(props.thickness));
        if let Some(map) = props.thickness_map {
            let info = writer.texture_info(map)?;
            ext.insert("thicknessTexture".to_string(), serde_json::to_value(info)?);
        }
        if props.attenuation_distance.is_finite() {
            ext.insert(
                "attenuationDistance".to_string(),
                json!(props.attenuation_distance),
            );
        }
        if props.attenuation_color != [1.0, 1.0, 1.0] {
            ext.insert(
                "attenuationColor".to_string(),
                json!(props.attenuation_color),
            );
        }
        finish(writer, def, "KHR_materials_volume", ext);
    }
);

material_plugin!(
    ior,
    MaterialsIor,
    "KHR_materials_ior",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.ior == 1.5 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("ior".to_string(), json!(props.ior));
        finish(writer, def, "KHR_materials_ior", ext);
    }
);

material_plugin!(
    specular,
    MaterialsSpecular,
    "KHR_materials_specular",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.specular_intensity == 1.0
            && props.specular_color == [1.0, 1.0, 1.0]
            && props.specular_intensity_map.is_none()
            && props.specular_color_map.is_none()
        {
            return Ok(());
        }
        let mut ext = Map::new();
        if let Some(map) = props.specular_intensity_map {
            let info = writer.texture_info(map)?;
            ext.insert("specularTexture".to_string(), serde_json::to_value(info)?);
        }
        if let Some(map) = props.specular_color_map {
            let info = writer.texture_info(map)?;
            ext.insert(
                "specularColorTexture".to_string(),
                serde_json::to_value(info)?,
            );
        }
        ext.insert(
            "specularFactor".to_string(),
            json!(props.specular_intensity),
        );
        ext.insert(
            "specularColorFactor".to_string(),
            json!(props.specular_color),
        );
        finish(writer, def, "KHR_materials_specular", ext);
    }
);

material_plugin!(
    clearcoat,
    MaterialsClearcoat,
    "KHR_materials_clearcoat",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.clearcoat == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("clearcoatFactor".to_string(), json!(props.clearcoat));
        if let Some(map) = props.clearcoat_map {
            let info = writer.texture_info(map)?;
            ext.insert("clearcoatTexture".to_string(), serde_json::to_value(info)?);
        }
        ext.insert(
            "clearcoatRoughnessFactor".to_string(),
            json!(props.clearcoat_roughness),
        );
        if let Some(map) = props.clearcoat_roughness_map {
            let info = writer.texture_info(map)?;
            ext.insert(
                "clearcoatRoughnessTexture".to_string(),
                serde_json::to_value(info)?,
            );
        }
        if let Some(map) = props.clearcoat_normal_map {
            let mut info = serde_json::to_value(writer.texture_info(map)?)?;
            if props.clearcoat_normal_scale != 1.0 {
                if let Some(object) = info.as_object_mut() {
                    object.insert("scale".to_string(), json!(props.clearcoat_normal_scale));
                }
            }
            ext.insert("clearcoatNormalTexture".to_string(), info);
        }
        finish(writer, def, "KHR_materials_clearcoat", ext);
    }
);

material_plugin!(
    dispersion,
    MaterialsDispersion,
    "KHR_materials_dispersion",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.dispersion == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("dispersion".to_string(), json!(props.dispersion));
        finish(writer, def, "KHR_materials_dispersion", ext);
    }
);

material_plugin!(
    iridescence,
    MaterialsIridescence,
    "KHR_materials_iridescence",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.iridescence == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("iridescenceFactor".to_string(), json!(props.iridescence));
        if let Some(map) = props.iridescence_map {
            let info = writer.texture_info(map)?;
            ext.insert("iridescenceTexture".to_string(), serde_json::to_value(info)?);
        }
        ext.insert("iridescenceIor".to_string(), json!(props.iridescence_ior));
        ext.insert(
            "iridescenceThicknessMinimum".to_string(),
            json!(props.iridescence_thickness_range[0]),
        );
        ext.insert(
            "iridescenceThicknessMaximum".to_string(),
            json!(props.iridescence_thickness_range[1]),
        );
        if let Some(map) = props.iridescence_thickness_map {
            let info = writer.texture_info(map)?;
            ext.insert(
                "iridescenceThicknessTexture".to_string(),
                serde_json::to_value(info)?,
            );
        }
        finish(writer, def, "KHR_materials_iridescence", ext);
    }
);

material_plugin!(
    sheen,
    MaterialsSheen,
    "KHR_materials_sheen",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.sheen == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        if let Some(map) = props.sheen_roughness_map {
            let info = writer.texture_info(map)?;
            ext.insert(
                "sheenRoughnessTexture".to_string(),
                serde_json::to_value(info)?,
            );
        }
        if let Some(map) = props.sheen_color_map {
            let info = writer.texture_info(map)?;
            ext.insert("sheenColorTexture".to_string(), serde_json::to_value(info)?);
        }
        ext.insert(
            "sheenRoughnessFactor".to_string(),
            json!(props.sheen_roughness),
        );
        ext.insert("sheenColorFactor".to_string(), json!(props.sheen_color));
        finish(writer, def, "KHR_materials_sheen", ext);
    }
);

material_plugin!(
    anisotropy,
    MaterialsAnisotropy,
    "KHR_materials_anisotropy",
    |writer, material, def| {
        let Some(props) = physical(material) else {
            return Ok(());
        };
        if props.anisotropy == 0.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("anisotropyStrength".to_string(), json!(props.anisotropy));
        if props.anisotropy_rotation != 0.0 {
            ext.insert(
                "anisotropyRotation".to_string(),
                json!(props.anisotropy_rotation),
            );
        }
        if let Some(map) = props.anisotropy_map {
            let info = writer.texture_info(map)?;
            ext.insert("anisotropyTexture".to_string(), serde_json::to_value(info)?);
        }
        finish(writer, def, "KHR_materials_anisotropy", ext);
    }
);

material_plugin!(
    emissive_strength,
    MaterialsEmissiveStrength,
    "KHR_materials_emissive_strength",
    |writer, material, def| {
        if !is_pbr(material) || material.emissive_intensity == 1.0 {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert(
            "emissiveStrength".to_string(),
            json!(material.emissive_intensity),
        );
        finish(writer, def, "KHR_materials_emissive_strength", ext);
    }
);

material_plugin!(
    bump,
    MaterialsBump,
    "EXT_materials_bump",
    |writer, material, def| {
        if !is_pbr(material) || (material.bump_scale == 1.0 && material.bump_map.is_none()) {
            return Ok(());
        }
        let mut ext = Map::new();
        ext.insert("bumpFactor".to_string(), json!(material.bump_scale));
        if let Some(map) = material.bump_map {
            let info = writer.texture_info(map)?;
            ext.insert("bumpTexture".to_string(), serde_json::to_value(info)?);
        }
        finish(writer, def, "EXT_materials_bump", ext);
    }
);
