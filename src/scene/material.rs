//! Materials: PBR parameters plus physical-extension capability data.

use super::TextureId;

/// Which material model the source material uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialKind {
    /// Metallic-roughness PBR.
    #[default]
    Standard,
    /// PBR with physical extensions (`physical` props apply).
    Physical,
    /// Unlit; exported with `KHR_materials_unlit`.
    Basic,
    /// Custom shader; cannot be exported, skipped with a warning.
    Shader,
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Parameters consumed by the physical-material extension plug-ins.
///
/// Defaults match the extension spec defaults, so a default-constructed
/// value emits nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalProps {
    pub transmission: f32,
    pub transmission_map: Option<TextureId>,
    pub thickness: f32,
    pub thickness_map: Option<TextureId>,
    pub attenuation_distance: f32,
    pub attenuation_color: [f32; 3],
    pub ior: f32,
    pub specular_intensity: f32,
    pub specular_intensity_map: Option<TextureId>,
    pub specular_color: [f32; 3],
    pub specular_color_map: Option<TextureId>,
    pub clearcoat: f32,
    pub clearcoat_map: Option<TextureId>,
    pub clearcoat_roughness: f32,
    pub clearcoat_roughness_map: Option<TextureId>,
    pub clearcoat_normal_map: Option<TextureId>,
    pub clearcoat_normal_scale: f32,
    pub dispersion: f32,
    pub iridescence: f32,
    pub iridescence_map: Option<TextureId>,
    pub iridescence_ior: f32,
    pub iridescence_thickness_range: [f32; 2],
    pub iridescence_thickness_map: Option<TextureId>,
    pub sheen: f32,
    pub sheen_color: [f32; 3],
    pub sheen_color_map: Option<TextureId>,
    pub sheen_roughness: f32,
    pub sheen_roughness_map: Option<TextureId>,
    pub anisotropy: f32,
    pub anisotropy_rotation: f32,
    pub anisotropy_map: Option<TextureId>,
}

impl Default for PhysicalProps {
    fn default() -> Self {
        Self {
            transmission: 0.0,
            transmission_map: None,
            thickness: 0.0,
            thickness_map: None,
            attenuation_distance: f32::INFINITY,
            attenuation_color: [1.0, 1.0, 1.0],
            ior: 1.5,
            specular_intensity: 1.0,
            specular_intensity_map: None,
            specular_color: [1.0, 1.0, 1.0],
            specular_color_map: None,
            clearcoat: 0.0,
            clearcoat_map: None,
            clearcoat_roughness: 0.0,
            clearcoat_roughness_map: None,
            clearcoat_normal_map: None,
            clearcoat_normal_scale: 1.0,
            dispersion: 0.0,
            iridescence: 0.0,
            iridescence_map: None,
            iridescence_ior: 1.3,
            iridescence_thickness_range: [100.0, 400.0],
            iridescence_thickness_map: None,
            sheen: 0.0,
            sheen_color: [0.0, 0.0, 0.0],
            sheen_color_map: None,
            sheen_roughness: 1.0,
            sheen_roughness_map: None,
            anisotropy: 0.0,
            anisotropy_rotation: 0.0,
            anisotropy_map: None,
        }
    }
}

/// A source material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    /// Base color RGB; alpha comes from `opacity`.
    pub color: [f32; 3],
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    /// Emissive multiplier, exported via `KHR_materials_emissive_strength`.
    pub emissive_intensity: f32,
    pub base_color_map: Option<TextureId>,
    pub metalness_map: Option<TextureId>,
    pub roughness_map: Option<TextureId>,
    pub normal_map: Option<TextureId>,
    pub normal_scale: [f32; 2],
    pub bump_map: Option<TextureId>,
    pub bump_scale: f32,
    pub ao_map: Option<TextureId>,
    pub ao_intensity: f32,
    pub emissive_map: Option<TextureId>,
    pub transparent: bool,
    /// Alpha cutoff; greater than zero selects MASK alpha mode.
    pub alpha_test: f32,
    pub side: Side,
    pub wireframe: bool,
    /// Physical-extension parameters; only read for `MaterialKind::Physical`.
    pub physical: Option<PhysicalProps>,
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An unlit material exported with `KHR_materials_unlit`.
    #[must_use]
    pub fn basic(name: impl Into<String>) -> Self {
        Self {
            kind: MaterialKind::Basic,
            ..Self::new(name)
        }
    }

    /// A physical material with the given extension parameters.
    #[must_use]
    pub fn physical(name: impl Into<String>, props: PhysicalProps) -> Self {
        Self {
            kind: MaterialKind::Physical,
            physical: Some(props),
            ..Self::new(name)
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: MaterialKind::Standard,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            base_color_map: None,
            metalness_map: None,
            roughness_map: None,
            normal_map: None,
            normal_scale: [1.0, 1.0],
            bump_map: None,
            bump_scale: 1.0,
            ao_map: None,
            ao_intensity: 1.0,
            emissive_map: None,
            transparent: false,
            alpha_test: 0.0,
            side: Side::Front,
            wireframe: false,
            physical: None,
            user_data: serde_json::Map::new(),
        }
    }
}
