//! Punctual lights, exported via `KHR_lights_punctual`.

use super::NodeId;

/// Light shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    Spot {
        /// Outer cone half-angle in radians.
        angle: f32,
        /// Fraction of the cone over which intensity falls off, in `[0, 1]`.
        penumbra: f32,
    },
}

/// A punctual light source.
#[derive(Debug, Clone)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cutoff distance; `None` means infinite range.
    pub range: Option<f32>,
    /// Physical decay exponent. glTF assumes 2; other values warn.
    pub decay: f32,
    /// Aim target for directional and spot lights. glTF encodes direction in
    /// the node transform, so the target must be a child at `(0, 0, -1)`;
    /// anything else warns that the direction may be lost.
    pub target: Option<NodeId>,
}

impl Light {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: LightKind) -> Self {
        Self {
            name: name.into(),
            kind,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            range: None,
            decay: 2.0,
            target: None,
        }
    }
}
