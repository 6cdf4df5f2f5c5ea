//! Geometry: named vertex-attribute streams, index stream, morph targets.

use std::collections::BTreeMap;

use super::AttributeId;

/// Typed storage backing a vertex attribute.
///
/// `I32` has no glTF component type; the writer rejects it.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AttributeData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes of one component.
    #[must_use]
    pub fn component_size(&self) -> usize {
        match self {
            Self::I8(_) | Self::U8(_) => 1,
            Self::I16(_) | Self::U16(_) => 2,
            Self::I32(_) | Self::U32(_) | Self::F32(_) => 4,
        }
    }

    /// Name of the storage type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::U16(_) => "u16",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::F32(_) => "f32",
        }
    }

    /// Raw component value widened to f64, ignoring normalization.
    #[must_use]
    pub fn raw(&self, index: usize) -> f64 {
        match self {
            Self::I8(v) => f64::from(v[index]),
            Self::U8(v) => f64::from(v[index]),
            Self::I16(v) => f64::from(v[index]),
            Self::U16(v) => f64::from(v[index]),
            Self::I32(v) => f64::from(v[index]),
            Self::U32(v) => f64::from(v[index]),
            Self::F32(v) => f64::from(v[index]),
        }
    }
}

/// A vertex attribute stream: typed component data grouped into elements of
/// `item_size` components.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub data: AttributeData,
    pub item_size: usize,
    /// When set, integer components encode `[0, 1]` (unsigned) or `[-1, 1]`
    /// (signed) fixed-point values.
    pub normalized: bool,
}

impl VertexAttribute {
    #[must_use]
    pub fn new(data: AttributeData, item_size: usize) -> Self {
        Self {
            data,
            item_size,
            normalized: false,
        }
    }

    #[must_use]
    pub fn normalized(data: AttributeData, item_size: usize) -> Self {
        Self {
            data,
            item_size,
            normalized: true,
        }
    }

    /// Shorthand for the common float stream.
    #[must_use]
    pub fn f32(values: Vec<f32>, item_size: usize) -> Self {
        Self::new(AttributeData::F32(values), item_size)
    }

    /// Number of elements (vertices) in the stream.
    #[must_use]
    pub fn count(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.data.len() / self.item_size
        }
    }

    /// Component `component` of element `element`, denormalized to f64.
    #[must_use]
    pub fn get(&self, element: usize, component: usize) -> f64 {
        let raw = self.data.raw(element * self.item_size + component);
        if self.normalized {
            match &self.data {
                AttributeData::I8(_) => (raw / 127.0).max(-1.0),
                AttributeData::U8(_) => raw / 255.0,
                AttributeData::I16(_) => (raw / 32767.0).max(-1.0),
                AttributeData::U16(_) => raw / 65535.0,
                AttributeData::I32(_) => (raw / 2_147_483_647.0).max(-1.0),
                AttributeData::U32(_) => raw / 4_294_967_295.0,
                AttributeData::F32(_) => raw,
            }
        } else {
            raw
        }
    }

    /// Store `value` into component `component` of element `element`,
    /// renormalizing into the storage range when the attribute is normalized.
    pub fn set(&mut self, element: usize, component: usize, value: f64) {
        let index = element * self.item_size + component;
        let v = if self.normalized {
            match &self.data {
                AttributeData::I8(_) => value * 127.0,
                AttributeData::U8(_) => value * 255.0,
                AttributeData::I16(_) => value * 32767.0,
                AttributeData::U16(_) => value * 65535.0,
                AttributeData::I32(_) => value * 2_147_483_647.0,
                AttributeData::U32(_) => value * 4_294_967_295.0,
                AttributeData::F32(_) => value,
            }
        } else {
            value
        };
        match &mut self.data {
            AttributeData::I8(d) => d[index] = v.round().clamp(-128.0, 127.0) as i8,
            AttributeData::U8(d) => d[index] = v.round().clamp(0.0, 255.0) as u8,
            AttributeData::I16(d) => d[index] = v.round().clamp(-32768.0, 32767.0) as i16,
            AttributeData::U16(d) => d[index] = v.round().clamp(0.0, 65535.0) as u16,
            AttributeData::I32(d) => {
                d[index] = v.round().clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            }
            AttributeData::U32(d) => d[index] = v.round().clamp(0.0, 4_294_967_295.0) as u32,
            AttributeData::F32(d) => d[index] = v as f32,
        }
    }
}

/// A draw group binding a sub-range of the geometry to one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    /// First index (or vertex, for non-indexed geometry) of the group.
    pub start: usize,
    /// Number of indices (or vertices) in the group.
    pub count: usize,
    /// Position in the mesh's material list.
    pub material_index: usize,
}

/// A geometry: attribute streams keyed by semantic name, an optional index
/// stream, morph targets, and material groups.
///
/// Attribute names follow the scene-library convention (`position`,
/// `normal`, `uv`, `color`, `skinIndex`, ...); the writer maps them to glTF
/// semantics. Names starting with `morph` are reserved for morph streams and
/// ignored by the main attribute pass.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub name: String,
    pub attributes: BTreeMap<String, AttributeId>,
    pub index: Option<AttributeId>,
    /// Morph target streams per base-attribute name, one entry per target.
    pub morph_attributes: BTreeMap<String, Vec<AttributeId>>,
    /// When set, morph streams already hold deltas against the base
    /// attribute; otherwise the writer relativizes them.
    pub morph_targets_relative: bool,
    pub groups: Vec<GeometryGroup>,
}

impl Geometry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of morph targets, taken from the first morph stream list.
    #[must_use]
    pub fn morph_target_count(&self) -> usize {
        self.morph_attributes
            .values()
            .next()
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_round_trip() {
        let mut attr = VertexAttribute::normalized(AttributeData::U8(vec![0, 128, 255]), 1);
        assert!((attr.get(1, 0) - 128.0 / 255.0).abs() < 1e-9);
        attr.set(0, 0, 1.0);
        assert_eq!(attr.data, AttributeData::U8(vec![255, 128, 255]));
    }

    #[test]
    fn test_count() {
        let attr = VertexAttribute::f32(vec![0.0; 12], 3);
        assert_eq!(attr.count(), 4);
    }
}
