//! Textures, samplers settings, and image sources.

use super::ImageId;

/// Magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

/// Minification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    #[default]
    LinearMipmapLinear,
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

/// Color space of the texel data, used when compositing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Linear,
    Srgb,
}

/// UV transform, annotated via `KHR_texture_transform` when non-default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub offset: [f32; 2],
    pub rotation: f32,
    pub repeat: [f32; 2],
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            repeat: [1.0, 1.0],
        }
    }
}

/// A texture: image reference plus sampling state.
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub image: ImageId,
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    /// Flip the image vertically before encoding.
    pub flip_y: bool,
    /// Requested output mime type. `image/webp` degrades to PNG; anything
    /// other than PNG/JPEG/WebP is a fatal error.
    pub mime_type: String,
    pub color_space: ColorSpace,
    pub transform: UvTransform,
    /// UV channel index (`TEXCOORD_n`).
    pub tex_coord: usize,
}

impl Texture {
    #[must_use]
    pub fn new(name: impl Into<String>, image: ImageId) -> Self {
        Self {
            name: name.into(),
            image,
            mag_filter: MagFilter::default(),
            min_filter: MinFilter::default(),
            wrap_s: WrapMode::default(),
            wrap_t: WrapMode::default(),
            flip_y: false,
            mime_type: "image/png".to_string(),
            color_space: ColorSpace::default(),
            transform: UvTransform::default(),
            tex_coord: 0,
        }
    }
}

/// Pixel payload of an image.
///
/// Compressed GPU formats are decompressed by the caller before export; the
/// writer only rasterizes plain pixel data or pre-decoded images.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Tightly packed pixel rows, `channels` in 1..=4 (non-RGBA data is
    /// expanded with a warning).
    Pixels {
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    },
    /// An already decoded image.
    Decoded(image::DynamicImage),
}

/// A named image source.
#[derive(Debug, Clone)]
pub struct Image {
    pub name: String,
    pub source: ImageSource,
}

impl Image {
    #[must_use]
    pub fn new(name: impl Into<String>, source: ImageSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// A solid-color RGBA image, mostly useful in tests.
    #[must_use]
    pub fn solid(name: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self::new(
            name,
            ImageSource::Pixels {
                data,
                width,
                height,
                channels: 4,
            },
        )
    }
}
