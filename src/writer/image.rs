//! Image rasterization and deferred encoding.
//!
//! Image indices are assigned at discovery; the encode itself is deferred
//! into a pending list and resolved before finalization, so encode order
//! never affects the emitted document.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::RgbaImage;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::gltf::{BufferViewDef, ImageDef};
use crate::scene::{Image, ImageId, ImageSource};

use super::GltfWriter;

const JPEG_QUALITY: u8 = 92;

/// Encode target resolved from the texture's requested mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum OutputMime {
    Png,
    Jpeg,
}

impl OutputMime {
    /// Resolve a requested mime string. WebP degrades to PNG; anything else
    /// outside PNG/JPEG is fatal.
    pub(crate) fn from_request(mime: &str) -> Result<Self> {
        match mime {
            "image/png" => Ok(Self::Png),
            "image/jpeg" => Ok(Self::Jpeg),
            "image/webp" => {
                tracing::warn!("WebP output is not supported, encoding as PNG");
                Ok(Self::Png)
            }
            other => Err(Error::UnsupportedMimeType {
                mime: other.to_string(),
            }),
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// A pre-assigned image slot waiting for its encode.
pub(crate) struct PendingImage {
    /// Index into `json.images`.
    pub index: usize,
    pub rgba: RgbaImage,
    pub mime: OutputMime,
}

/// Rasterize an image source to RGBA, clamped to `max_size` on both axes,
/// optionally flipped vertically.
pub(crate) fn rasterize(image: &Image, max_size: u32, flip_y: bool) -> Result<RgbaImage> {
    let mut rgba = match &image.source {
        ImageSource::Pixels {
            data,
            width,
            height,
            channels,
        } => {
            let (width, height, channels) = (*width, *height, *channels);
            let expected = width as usize * height as usize * channels as usize;
            if width == 0 || height == 0 || !(1..=4).contains(&channels) || data.len() != expected
            {
                return Err(Error::InvalidImageSource {
                    reason: format!(
                        "pixel source {}: {}x{} with {} channels does not match {} bytes",
                        image.name,
                        width,
                        height,
                        channels,
                        data.len()
                    ),
                });
            }
            if channels == 4 {
                RgbaImage::from_raw(width, height, data.clone()).ok_or_else(|| {
                    Error::InvalidImageSource {
                        reason: format!("pixel source {} could not be wrapped", image.name),
                    }
                })?
            } else {
                tracing::warn!(
                    image = image.name.as_str(),
                    channels,
                    "non-RGBA pixel data expanded to RGBA"
                );
                expand_to_rgba(data, width, height, channels)
            }
        }
        ImageSource::Decoded(decoded) => decoded.to_rgba8(),
    };

    if rgba.width() > max_size || rgba.height() > max_size {
        rgba = image::imageops::resize(
            &rgba,
            rgba.width().min(max_size),
            rgba.height().min(max_size),
            image::imageops::FilterType::Triangle,
        );
    }
    if flip_y {
        image::imageops::flip_vertical_in_place(&mut rgba);
    }
    Ok(rgba)
}

fn expand_to_rgba(data: &[u8], width: u32, height: u32, channels: u8) -> RgbaImage {
    let pixels = width as usize * height as usize;
    let mut out = Vec::with_capacity(pixels * 4);
    for i in 0..pixels {
        let at = i * channels as usize;
        match channels {
            1 => out.extend_from_slice(&[data[at], data[at], data[at], 255]),
            2 => out.extend_from_slice(&[data[at], data[at], data[at], data[at + 1]]),
            _ => out.extend_from_slice(&[data[at], data[at + 1], data[at + 2], 255]),
        }
    }
    // Dimensions match by construction.
    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| RgbaImage::new(width, height))
}

/// Encode RGBA pixels to the requested container.
fn encode_image(rgba: &RgbaImage, mime: OutputMime) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match mime {
        OutputMime::Png => {
            let encoder = PngEncoder::new(&mut out);
            rgba.write_with_encoder(encoder)
                .map_err(|e| Error::ImageEncode {
                    message: e.to_string(),
                })?;
        }
        OutputMime::Jpeg => {
            // JPEG carries no alpha.
            let rgb = image::DynamicImage::ImageRgba8(rgba.clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|e| Error::ImageEncode {
                    message: e.to_string(),
                })?;
        }
    }
    Ok(out)
}

impl GltfWriter<'_> {
    /// Reserve an image slot and queue its encode. Deduplicated by
    /// `(source, mime, flip)`.
    pub(crate) fn process_image(
        &mut self,
        id: ImageId,
        mime: super::OutputMime,
        flip_y: bool,
    ) -> Result<usize> {
        if let Some(&cached) = self.image_cache.get(&(id, mime, flip_y)) {
            return Ok(cached);
        }
        let image = self.scene.image(id);
        let rgba = rasterize(image, self.options.max_texture_size, flip_y)?;

        let index = self.json.images.len();
        self.json.images.push(ImageDef {
            buffer_view: None,
            mime_type: Some(mime.as_str().to_string()),
            uri: None,
            name: (!image.name.is_empty()).then(|| image.name.clone()),
        });
        self.pending_images.push(PendingImage { index, rgba, mime });
        self.image_cache.insert((id, mime, flip_y), index);
        Ok(index)
    }

    /// Encode every pending image and patch its pre-assigned slot: a
    /// bufferView in binary mode, a data URI otherwise. Encodes run in
    /// parallel; results are spliced in insertion order.
    pub(crate) fn resolve_pending_images(&mut self) -> Result<()> {
        if self.pending_images.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending_images);
        let encoded: Vec<Result<Vec<u8>>> = pending
            .par_iter()
            .map(|p| encode_image(&p.rgba, p.mime))
            .collect();

        for (pending, bytes) in pending.iter().zip(encoded) {
            let bytes = bytes?;
            if self.options.binary {
                self.pad_buffer(4);
                let byte_offset = self.buffer.len();
                self.buffer.extend_from_slice(&bytes);
                let view = BufferViewDef {
                    buffer: 0,
                    byte_offset,
                    byte_length: bytes.len(),
                    byte_stride: None,
                    target: None,
                };
                let view_index = self.json.buffer_views.len();
                self.json.buffer_views.push(view);
                self.json.images[pending.index].buffer_view = Some(view_index);
            } else {
                use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
                self.json.images[pending.index].uri = Some(format!(
                    "data:{};base64,{}",
                    pending.mime.as_str(),
                    BASE64.encode(&bytes)
                ));
            }
        }
        Ok(())
    }
}
