//! Animation clips and keyframe tracks.

use super::NodeId;

/// Keyframe interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Smooth (non-linear, non-discrete) sampling. The morph track merger
    /// downgrades this to linear with a warning.
    Smooth,
    CubicSpline,
}

/// Which morph influence a `MorphTargetInfluences` track drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MorphSelector {
    /// The whole influence vector; values are already stride-N.
    All,
    /// A single target by position.
    Index(usize),
    /// A single target by name, resolved against the mesh's `target_names`.
    Name(String),
}

/// What object a track animates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackTarget {
    Node(NodeId),
    /// A bone of a skinned mesh, addressed by name; the writer redirects the
    /// channel to the bone's own node.
    Bone { mesh: NodeId, bone: String },
}

/// The animated property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackPath {
    Position,
    Quaternion,
    Scale,
    MorphTargetInfluences(MorphSelector),
    /// Anything else; skipped at export.
    Other(String),
}

impl TrackPath {
    /// The glTF channel target path, when the property maps to one.
    #[must_use]
    pub fn gltf_path(&self) -> Option<&'static str> {
        match self {
            Self::Position => Some("translation"),
            Self::Quaternion => Some("rotation"),
            Self::Scale => Some("scale"),
            Self::MorphTargetInfluences(_) => Some("weights"),
            Self::Other(_) => None,
        }
    }
}

/// A keyframe track: parallel `times` and `values`, `values.len()` a
/// multiple of `times.len()`.
#[derive(Debug, Clone)]
pub struct Track {
    pub target: TrackTarget,
    pub path: TrackPath,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
    pub interpolation: Interpolation,
}

impl Track {
    /// Components per keyframe.
    #[must_use]
    pub fn value_size(&self) -> usize {
        if self.times.is_empty() {
            0
        } else {
            self.values.len() / self.times.len()
        }
    }
}

/// A named collection of tracks baked into one glTF animation.
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }
}
