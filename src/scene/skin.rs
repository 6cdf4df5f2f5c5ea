//! Skins: bone lists and inverse bind matrices.

use super::NodeId;

/// A skin shared by one or more skinned mesh nodes.
///
/// `bone_inverses[i]` is the inverse world matrix of `bones[i]`, column
/// major. The skinned node contributes its own bind matrix at export time.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: String,
    pub bones: Vec<NodeId>,
    pub bone_inverses: Vec<[f32; 16]>,
}

impl Skin {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
