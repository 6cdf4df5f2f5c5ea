//! Material, texture, and sampler emission, including the metal/rough
//! channel composite.

use image::{Rgba, RgbaImage};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::gltf::{
    Extensions, MaterialDef, NormalTextureInfoDef, OcclusionTextureInfoDef, SamplerDef,
    TextureDef, TextureInfoDef,
};
use crate::scene::{
    ColorSpace, MagFilter, MaterialId, MaterialKind, MinFilter, Side, Texture, TextureId, WrapMode,
};
use crate::utils::{equal_array, srgb_to_linear};

use super::image::rasterize;
use super::webgl;
use super::{GltfWriter, OutputMime};

fn mag_filter_constant(filter: MagFilter) -> u32 {
    match filter {
        MagFilter::Nearest => webgl::NEAREST,
        MagFilter::Linear => webgl::LINEAR,
    }
}

fn min_filter_constant(filter: MinFilter) -> u32 {
    match filter {
        MinFilter::Nearest => webgl::NEAREST,
        MinFilter::Linear => webgl::LINEAR,
        MinFilter::NearestMipmapNearest => webgl::NEAREST_MIPMAP_NEAREST,
        MinFilter::LinearMipmapNearest => webgl::LINEAR_MIPMAP_NEAREST,
        MinFilter::NearestMipmapLinear => webgl::NEAREST_MIPMAP_LINEAR,
        MinFilter::LinearMipmapLinear => webgl::LINEAR_MIPMAP_LINEAR,
    }
}

fn wrap_constant(wrap: WrapMode) -> u32 {
    match wrap {
        WrapMode::ClampToEdge => webgl::CLAMP_TO_EDGE,
        WrapMode::MirroredRepeat => webgl::MIRRORED_REPEAT,
        WrapMode::Repeat => webgl::REPEAT,
    }
}

impl GltfWriter<'_> {
    /// Emit a material, or `None` for material kinds glTF cannot express.
    pub(crate) fn process_material(&mut self, id: MaterialId) -> Result<Option<usize>> {
        let scene = self.scene;
        let material = scene.material(id);

        if material.kind == MaterialKind::Shader {
            tracing::warn!(
                material = material.name.as_str(),
                "shader materials cannot be exported, skipping"
            );
            return Ok(None);
        }
        if let Some(&cached) = self.material_cache.get(&id) {
            return Ok(Some(cached));
        }

        let mut def = MaterialDef::default();
        let is_pbr = matches!(
            material.kind,
            MaterialKind::Standard | MaterialKind::Physical
        );

        if is_pbr {
            def.pbr_metallic_roughness.metallic_factor = Some(material.metalness);
            def.pbr_metallic_roughness.roughness_factor = Some(material.roughness);
        } else {
            def.pbr_metallic_roughness.metallic_factor = Some(0.5);
            def.pbr_metallic_roughness.roughness_factor = Some(0.5);
        }

        let base_color = [
            material.color[0],
            material.color[1],
            material.color[2],
            material.opacity,
        ];
        if !equal_array(&base_color, &[1.0, 1.0, 1.0, 1.0]) {
            def.pbr_metallic_roughness.base_color_factor = Some(base_color);
        }
        if let Some(map) = material.base_color_map {
            def.pbr_metallic_roughness.base_color_texture = Some(self.texture_info(map)?);
        }

        if is_pbr {
            match (material.metalness_map, material.roughness_map) {
                (None, None) => {}
                (Some(metal), Some(rough)) if metal == rough => {
                    def.pbr_metallic_roughness.metallic_roughness_texture =
                        Some(self.texture_info(metal)?);
                }
                (metal, rough) => {
                    def.pbr_metallic_roughness.metallic_roughness_texture =
                        Some(self.build_metal_rough_texture(metal, rough)?);
                }
            }
        }

        if material.emissive.iter().any(|&c| c > 0.0) {
            def.emissive_factor = Some(material.emissive);
        }
        if let Some(map) = material.emissive_map {
            def.emissive_texture = Some(self.texture_info(map)?);
        }

        if let Some(map) = material.normal_map {
            let info = self.texture_info(map)?;
            def.normal_texture = Some(NormalTextureInfoDef {
                index: info.index,
                // glTF has a single scale; only the X component survives.
                scale: (material.normal_scale[0] != 1.0).then_some(material.normal_scale[0]),
                tex_coord: info.tex_coord,
                extensions: info.extensions,
            });
        }

        if let Some(map) = material.ao_map {
            let info = self.texture_info(map)?;
            def.occlusion_texture = Some(OcclusionTextureInfoDef {
                index: info.index,
                strength: (material.ao_intensity != 1.0).then_some(material.ao_intensity),
                tex_coord: info.tex_coord,
                extensions: info.extensions,
            });
        }

        if material.transparent {
            def.alpha_mode = Some("BLEND");
        } else if material.alpha_test > 0.0 {
            def.alpha_mode = Some("MASK");
            if material.alpha_test != 0.5 {
                def.alpha_cutoff = Some(material.alpha_test);
            }
        }
        if material.side == Side::Double {
            def.double_sided = Some(true);
        }
        if !material.name.is_empty() {
            def.name = Some(material.name.clone());
        }

        self.serialize_user_data(&material.user_data, &mut def.extensions, &mut def.extras);
        self.invoke_write_material(material, &mut def)?;

        let index = self.json.materials.len();
        self.json.materials.push(def);
        self.material_cache.insert(id, index);
        Ok(Some(index))
    }

    /// Emit a texture, deduplicated by source identity.
    ///
    /// # Errors
    /// Returns an error for unsupported mime types or invalid image sources.
    pub fn process_texture(&mut self, id: TextureId) -> Result<usize> {
        if let Some(&cached) = self.texture_cache.get(&id) {
            return Ok(cached);
        }
        let scene = self.scene;
        let texture = scene.texture(id);

        let mime = OutputMime::from_request(&texture.mime_type)?;
        let sampler = self.process_sampler(texture);
        let source = self.process_image(texture.image, mime, texture.flip_y)?;

        let mut def = TextureDef {
            sampler: Some(sampler),
            source: Some(source),
            name: (!texture.name.is_empty()).then(|| texture.name.clone()),
            extensions: Extensions::new(),
        };
        self.invoke_write_texture(texture, &mut def)?;

        let index = self.json.textures.len();
        self.json.textures.push(def);
        self.texture_cache.insert(id, index);
        Ok(index)
    }

    /// Emit a texture and wrap it in a texture-info, carrying the UV channel
    /// and any `KHR_texture_transform` annotation.
    ///
    /// # Errors
    /// See [`GltfWriter::process_texture`].
    pub fn texture_info(&mut self, id: TextureId) -> Result<TextureInfoDef> {
        let index = self.process_texture(id)?;
        let texture = self.scene.texture(id);
        let mut info = TextureInfoDef {
            index,
            tex_coord: (texture.tex_coord != 0).then_some(texture.tex_coord),
            extensions: Extensions::new(),
        };
        self.apply_texture_transform(&mut info.extensions, texture);
        Ok(info)
    }

    /// Annotate a texture reference with `KHR_texture_transform` when the
    /// UV transform differs from identity. Offsets are written as stored;
    /// no V flip is applied.
    pub fn apply_texture_transform(&mut self, extensions: &mut Extensions, texture: &Texture) {
        let transform = &texture.transform;
        let mut def = serde_json::Map::new();
        if transform.offset != [0.0, 0.0] {
            def.insert("offset".to_string(), json!(transform.offset));
        }
        if transform.rotation != 0.0 {
            def.insert("rotation".to_string(), json!(transform.rotation));
        }
        if transform.repeat != [1.0, 1.0] {
            def.insert("scale".to_string(), json!(transform.repeat));
        }
        if !def.is_empty() {
            extensions.insert("KHR_texture_transform".to_string(), Value::Object(def));
            self.extensions_used
                .insert("KHR_texture_transform".to_string());
        }
    }

    /// Samplers are emitted per texture, without deduplication.
    fn process_sampler(&mut self, texture: &Texture) -> usize {
        self.json.samplers.push(SamplerDef {
            mag_filter: mag_filter_constant(texture.mag_filter),
            min_filter: min_filter_constant(texture.min_filter),
            wrap_s: wrap_constant(texture.wrap_s),
            wrap_t: wrap_constant(texture.wrap_t),
        });
        self.json.samplers.len() - 1
    }

    /// Composite distinct metalness and roughness maps into one texture.
    ///
    /// Per the glTF convention the result stores roughness in G and
    /// metalness in B. The canvas is prefilled with cyan, so an absent map
    /// contributes a saturated channel. sRGB sources are linearized.
    fn build_metal_rough_texture(
        &mut self,
        metalness_map: Option<TextureId>,
        roughness_map: Option<TextureId>,
    ) -> Result<TextureInfoDef> {
        tracing::warn!("merged metalness and roughness maps into a single texture");
        let scene = self.scene;
        let metal_tex = metalness_map.map(|id| scene.texture(id));
        let rough_tex = roughness_map.map(|id| scene.texture(id));
        let reference = metal_tex
            .or(rough_tex)
            .ok_or_else(|| Error::InvalidImageSource {
                reason: "metal/rough composite requested without source maps".to_string(),
            })?;

        if let (Some(metal), Some(rough)) = (metal_tex, rough_tex) {
            if metal.tex_coord != rough.tex_coord || metal.transform != rough.transform {
                tracing::warn!(
                    "metalness and roughness maps use different UV channels; \
                     using the metalness map's"
                );
            }
        }

        let max_size = self.options.max_texture_size;
        let metal_rgba = metal_tex
            .map(|t| rasterize(scene.image(t.image), max_size, false))
            .transpose()?;
        let rough_rgba = rough_tex
            .map(|t| rasterize(scene.image(t.image), max_size, false))
            .transpose()?;

        let width = metal_rgba
            .iter()
            .chain(rough_rgba.iter())
            .map(RgbaImage::width)
            .max()
            .unwrap_or(1)
            .max(1);
        let height = metal_rgba
            .iter()
            .chain(rough_rgba.iter())
            .map(RgbaImage::height)
            .max()
            .unwrap_or(1)
            .max(1);

        let mut composite = RgbaImage::from_pixel(width, height, Rgba([0, 255, 255, 255]));
        if let Some(source) = metal_rgba {
            let linearize = metal_tex.is_some_and(|t| t.color_space == ColorSpace::Srgb);
            blend_channel(&mut composite, &source, 2, linearize);
        }
        if let Some(source) = rough_rgba {
            let linearize = rough_tex.is_some_and(|t| t.color_space == ColorSpace::Srgb);
            blend_channel(&mut composite, &source, 1, linearize);
        }
        if reference.flip_y {
            image::imageops::flip_vertical_in_place(&mut composite);
        }

        let sampler = self.process_sampler(reference);
        let image_index = self.json.images.len();
        self.json.images.push(crate::gltf::ImageDef {
            buffer_view: None,
            mime_type: Some(OutputMime::Png.as_str().to_string()),
            uri: None,
            name: None,
        });
        self.pending_images.push(super::PendingImage {
            index: image_index,
            rgba: composite,
            mime: OutputMime::Png,
        });

        let texture_index = self.json.textures.len();
        self.json.textures.push(TextureDef {
            sampler: Some(sampler),
            source: Some(image_index),
            name: None,
            extensions: Extensions::new(),
        });

        let mut info = TextureInfoDef {
            index: texture_index,
            tex_coord: (reference.tex_coord != 0).then_some(reference.tex_coord),
            extensions: Extensions::new(),
        };
        self.apply_texture_transform(&mut info.extensions, reference);
        Ok(info)
    }
}

/// Copy one channel of `source` into `target`, resampling when dimensions
/// differ.
fn blend_channel(target: &mut RgbaImage, source: &RgbaImage, channel: usize, linearize: bool) {
    let resized;
    let source = if source.dimensions() == target.dimensions() {
        source
    } else {
        resized = image::imageops::resize(
            source,
            target.width(),
            target.height(),
            image::imageops::FilterType::Triangle,
        );
        &resized
    };
    for (dst, src) in target.pixels_mut().zip(source.pixels()) {
        let mut value = f32::from(src.0[channel]) / 255.0;
        if linearize {
            value = srgb_to_linear(value);
        }
        dst.0[channel] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}
