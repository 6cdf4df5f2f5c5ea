//! Accessor and bufferView emission: typed little-endian packing with
//! alignment, stride padding, and component-wise min/max.

use serde_json::Number;

use crate::error::{Error, Result};
use crate::gltf::{AccessorDef, BufferViewDef};
use crate::scene::{AttributeData, AttributeId, VertexAttribute};
use crate::utils::{padded_length, padding_for};

use super::webgl;
use super::{AttrVariant, GltfWriter};

/// How the emitted bufferView will be consumed. Decides the `target`
/// annotation and whether a `byteStride` is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorUsage {
    /// Vertex attribute data (`ARRAY_BUFFER`, stride-padded).
    Vertex,
    /// The geometry's index stream (`ELEMENT_ARRAY_BUFFER`).
    Index,
    /// Animation sampler or inverse-bind data: no target, tightly packed.
    Plain,
}

fn component_type(data: &AttributeData) -> Result<u32> {
    match data {
        AttributeData::I8(_) => Ok(webgl::BYTE),
        AttributeData::U8(_) => Ok(webgl::UNSIGNED_BYTE),
        AttributeData::I16(_) => Ok(webgl::SHORT),
        AttributeData::U16(_) => Ok(webgl::UNSIGNED_SHORT),
        AttributeData::U32(_) => Ok(webgl::UNSIGNED_INT),
        AttributeData::F32(_) => Ok(webgl::FLOAT),
        AttributeData::I32(_) => Err(Error::UnsupportedComponentStorage {
            type_name: data.type_name(),
        }),
    }
}

fn accessor_type(item_size: usize) -> Result<&'static str> {
    match item_size {
        1 => Ok("SCALAR"),
        2 => Ok("VEC2"),
        3 => Ok("VEC3"),
        4 => Ok("VEC4"),
        9 => Ok("MAT3"),
        16 => Ok("MAT4"),
        _ => Err(Error::UnsupportedItemSize { item_size }),
    }
}

/// Raw f64 into a JSON number, keeping integral values integral so integer
/// accessors get integer bounds.
fn json_number(value: f64) -> Number {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).unwrap_or_else(|| Number::from(0))
    }
}

fn write_component(bytes: &mut [u8], offset: usize, data: &AttributeData, index: usize) {
    match data {
        AttributeData::I8(v) => bytes[offset] = v[index] as u8,
        AttributeData::U8(v) => bytes[offset] = v[index],
        AttributeData::I16(v) => bytes[offset..offset + 2].copy_from_slice(&v[index].to_le_bytes()),
        AttributeData::U16(v) => bytes[offset..offset + 2].copy_from_slice(&v[index].to_le_bytes()),
        AttributeData::I32(v) => bytes[offset..offset + 4].copy_from_slice(&v[index].to_le_bytes()),
        AttributeData::U32(v) => bytes[offset..offset + 4].copy_from_slice(&v[index].to_le_bytes()),
        AttributeData::F32(v) => bytes[offset..offset + 4].copy_from_slice(&v[index].to_le_bytes()),
    }
}

impl GltfWriter<'_> {
    /// Emit an accessor over `[start, start + count)` elements of
    /// `attribute`, packing a fresh bufferView into the binary buffer.
    ///
    /// Returns `None` for an empty range.
    ///
    /// # Errors
    /// Returns an error for storage types or item sizes glTF cannot express.
    pub fn process_accessor(
        &mut self,
        attribute: &VertexAttribute,
        usage: AccessorUsage,
        start: usize,
        count: usize,
    ) -> Result<Option<usize>> {
        if count == 0 {
            return Ok(None);
        }
        let component = component_type(&attribute.data)?;
        let type_name = accessor_type(attribute.item_size)?;

        let mut min = vec![f64::MAX; attribute.item_size];
        let mut max = vec![f64::MIN; attribute.item_size];
        for element in start..start + count {
            for (c, (lo, hi)) in min.iter_mut().zip(max.iter_mut()).enumerate() {
                let value = attribute.data.raw(element * attribute.item_size + c);
                *lo = lo.min(value);
                *hi = hi.max(value);
            }
        }

        let buffer_view = self.process_buffer_view(attribute, start, count, usage);

        let normalized = (attribute.normalized
            && !matches!(attribute.data, AttributeData::F32(_)))
        .then_some(true);

        let def = AccessorDef {
            buffer_view,
            byte_offset: None,
            component_type: component,
            count,
            accessor_type: type_name,
            min: Some(min.into_iter().map(json_number).collect()),
            max: Some(max.into_iter().map(json_number).collect()),
            normalized,
        };
        let index = self.json.accessors.len();
        self.json.accessors.push(def);
        Ok(Some(index))
    }

    /// Emit an accessor over the whole attribute.
    ///
    /// # Errors
    /// See [`GltfWriter::process_accessor`].
    pub fn process_full_accessor(
        &mut self,
        attribute: &VertexAttribute,
        usage: AccessorUsage,
    ) -> Result<Option<usize>> {
        self.process_accessor(attribute, usage, 0, attribute.count())
    }

    /// Emit `attribute` through the per-source accessor cache. `id` and
    /// `variant` identify the source, so repeated references resolve to one
    /// accessor regardless of value equality.
    pub(crate) fn process_cached_accessor(
        &mut self,
        id: AttributeId,
        variant: AttrVariant,
        attribute: &VertexAttribute,
        usage: AccessorUsage,
    ) -> Result<Option<usize>> {
        if let Some(&cached) = self.attribute_cache.get(&(id, variant)) {
            return Ok(Some(cached));
        }
        let index = self.process_full_accessor(attribute, usage)?;
        if let Some(index) = index {
            self.attribute_cache.insert((id, variant), index);
        }
        Ok(index)
    }

    /// Pack the element range into the binary buffer and register a
    /// bufferView for it. Little-endian, element-padded to the byte stride,
    /// total length padded to 4.
    fn process_buffer_view(
        &mut self,
        attribute: &VertexAttribute,
        start: usize,
        count: usize,
        usage: AccessorUsage,
    ) -> usize {
        let item_size = attribute.item_size;
        let component_size = attribute.data.component_size();

        let mut byte_stride = item_size * component_size;
        if usage == AccessorUsage::Vertex {
            byte_stride = padded_length(byte_stride);
        }

        let byte_length = padded_length(count * byte_stride);
        let mut bytes = vec![0u8; byte_length];
        let mut offset = 0;
        for element in start..start + count {
            for c in 0..item_size {
                write_component(
                    &mut bytes,
                    offset,
                    &attribute.data,
                    element * item_size + c,
                );
                offset += component_size;
            }
            if offset % byte_stride != 0 {
                offset += byte_stride - (offset % byte_stride);
            }
        }

        self.pad_buffer(4);
        let byte_offset = self.buffer.len();
        self.buffer.extend_from_slice(&bytes);

        let def = BufferViewDef {
            buffer: 0,
            byte_offset,
            byte_length,
            byte_stride: (usage == AccessorUsage::Vertex).then_some(byte_stride),
            target: match usage {
                AccessorUsage::Vertex => Some(webgl::ARRAY_BUFFER),
                AccessorUsage::Index => Some(webgl::ELEMENT_ARRAY_BUFFER),
                AccessorUsage::Plain => None,
            },
        };
        let index = self.json.buffer_views.len();
        self.json.buffer_views.push(def);
        index
    }

    /// Pad the binary buffer up to `alignment`.
    pub(crate) fn pad_buffer(&mut self, alignment: usize) {
        let padding = padding_for(self.buffer.len(), alignment);
        self.buffer.extend(std::iter::repeat(0u8).take(padding));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_number_integral() {
        assert_eq!(json_number(23.0).to_string(), "23");
        assert_eq!(json_number(-4.0).to_string(), "-4");
        assert_eq!(json_number(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_accessor_type_mapping() {
        assert_eq!(accessor_type(1).unwrap(), "SCALAR");
        assert_eq!(accessor_type(3).unwrap(), "VEC3");
        assert_eq!(accessor_type(16).unwrap(), "MAT4");
        assert!(accessor_type(5).is_err());
    }

    #[test]
    fn test_component_type_rejects_i32() {
        assert!(component_type(&AttributeData::I32(vec![1])).is_err());
        assert_eq!(
            component_type(&AttributeData::F32(vec![1.0])).unwrap(),
            webgl::FLOAT
        );
    }
}
