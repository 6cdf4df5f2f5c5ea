//! Animation emission: morph-track merging and sampler/channel assembly.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::gltf::{AnimationDef, AnimationSamplerDef, ChannelDef, ChannelTargetDef};
use crate::scene::{
    AnimationClip, Interpolation, MorphSelector, NodeId, Scene, Track, TrackPath, TrackTarget,
    VertexAttribute,
};

use super::{AccessorUsage, GltfWriter};

/// Keyframes closer than this collapse into one.
const KEYFRAME_TOLERANCE: f32 = 0.001;

/// Sample one component of a track at time `t`, honoring STEP vs linear
/// interpolation and clamping outside the keyframe range.
fn sample_component(
    times: &[f32],
    values: &[f32],
    value_size: usize,
    component: usize,
    interpolation: Interpolation,
    t: f32,
) -> f32 {
    if times.is_empty() {
        return 0.0;
    }
    if t <= times[0] {
        return values[component];
    }
    let last = times.len() - 1;
    if t >= times[last] {
        return values[last * value_size + component];
    }
    let upper = times.partition_point(|&x| x <= t);
    let lower = upper - 1;
    let previous = values[lower * value_size + component];
    if interpolation == Interpolation::Step {
        return previous;
    }
    let next = values[upper * value_size + component];
    let span = times[upper] - times[lower];
    if span <= 0.0 {
        return previous;
    }
    let alpha = (t - times[lower]) / span;
    previous + (next - previous) * alpha
}

/// Return the index of a keyframe equivalent to `t`, inserting one if
/// absent. Inserted keyframes get all components filled by evaluating the
/// track at `t`.
pub(crate) fn insert_keyframe(track: &mut Track, t: f32) -> usize {
    let value_size = track.value_size();
    let index = track.times.partition_point(|&x| x < t);

    if index < track.times.len() && (track.times[index] - t).abs() < KEYFRAME_TOLERANCE {
        return index;
    }
    if index > 0 && (t - track.times[index - 1]).abs() < KEYFRAME_TOLERANCE {
        return index - 1;
    }

    let mut fill = Vec::with_capacity(value_size);
    for component in 0..value_size {
        fill.push(sample_component(
            &track.times,
            &track.values,
            value_size,
            component,
            track.interpolation,
            t,
        ));
    }
    track.times.insert(index, t);
    let at = index * value_size;
    for (offset, value) in fill.into_iter().enumerate() {
        track.values.insert(at + offset, value);
    }
    index
}

/// Coalesce per-index morph influence tracks into one stride-N track per
/// target node. Non-morph and whole-vector tracks pass through untouched.
///
/// # Errors
/// Returns an error for CUBICSPLINE morph sources and unresolvable morph
/// target names.
pub(crate) fn merge_morph_target_tracks(
    scene: &Scene,
    clip: &AnimationClip,
) -> Result<AnimationClip> {
    enum Slot {
        Index(usize),
        Name(String),
    }

    let mut tracks: Vec<Track> = Vec::new();
    let mut merged_by_node: HashMap<NodeId, usize> = HashMap::new();

    for (track_index, track) in clip.tracks.iter().enumerate() {
        let (node_id, slot) = match (&track.target, &track.path) {
            (TrackTarget::Node(id), TrackPath::MorphTargetInfluences(MorphSelector::Index(i))) => {
                (*id, Slot::Index(*i))
            }
            (TrackTarget::Node(id), TrackPath::MorphTargetInfluences(MorphSelector::Name(n))) => {
                (*id, Slot::Name(n.clone()))
            }
            _ => {
                tracks.push(track.clone());
                continue;
            }
        };

        let node = scene.node(node_id);
        let Some(mesh_id) = node.mesh else {
            tracks.push(track.clone());
            continue;
        };
        let mesh = scene.mesh(mesh_id);
        let morph_count = scene.geometry(mesh.geometry).morph_target_count();
        // Per-index tracks are scalar by construction; anything else passes
        // through untouched.
        if morph_count == 0 || track.value_size() != 1 {
            tracks.push(track.clone());
            continue;
        }

        let target_index = match slot {
            Slot::Index(index) => index,
            Slot::Name(name) => mesh
                .target_names
                .iter()
                .position(|candidate| *candidate == name)
                .ok_or(Error::MorphTargetNotFound { name })?,
        };
        if target_index >= morph_count {
            return Err(Error::MorphTargetNotFound {
                name: format!("#{target_index}"),
            });
        }

        if track.interpolation == Interpolation::CubicSpline {
            return Err(Error::CubicSplineMorphTrack { track: track_index });
        }
        let mut source = track.clone();
        if !matches!(source.interpolation, Interpolation::Linear | Interpolation::Step) {
            tracing::warn!(
                track = track_index,
                "morph track interpolation downgraded to linear"
            );
            source.interpolation = Interpolation::Linear;
        }

        if let Some(&merged_index) = merged_by_node.get(&node_id) {
            let merged = &mut tracks[merged_index];
            // Fill this target's slot at every existing keyframe, then
            // overlay the source's own keyframes exactly.
            for j in 0..merged.times.len() {
                let value = sample_component(
                    &source.times,
                    &source.values,
                    1,
                    0,
                    source.interpolation,
                    merged.times[j],
                );
                merged.values[j * morph_count + target_index] = value;
            }
            for j in 0..source.times.len() {
                let at = insert_keyframe(merged, source.times[j]);
                merged.values[at * morph_count + target_index] = source.values[j];
            }
        } else {
            let mut values = vec![0.0f32; source.times.len() * morph_count];
            for (j, &value) in source.values.iter().enumerate() {
                values[j * morph_count + target_index] = value;
            }
            merged_by_node.insert(node_id, tracks.len());
            tracks.push(Track {
                target: TrackTarget::Node(node_id),
                path: TrackPath::MorphTargetInfluences(MorphSelector::All),
                times: source.times,
                values,
                interpolation: source.interpolation,
            });
        }
    }

    Ok(AnimationClip {
        name: clip.name.clone(),
        tracks,
    })
}

/// Resolve a bone track to the bone's node via the skinned mesh's skin.
fn resolve_bone(scene: &Scene, mesh_node: NodeId, bone_name: &str) -> Option<NodeId> {
    let skin_id = scene.node(mesh_node).skin?;
    scene
        .skin(skin_id)
        .bones
        .iter()
        .copied()
        .find(|&bone| scene.node(bone).name == bone_name)
}

impl GltfWriter<'_> {
    /// Emit one animation from a clip. Tracks with no glTF counterpart are
    /// skipped; a clip left without channels is dropped with a warning.
    pub(crate) fn process_animation(&mut self, clip: &AnimationClip) -> Result<Option<usize>> {
        let scene = self.scene;
        let clip = merge_morph_target_tracks(scene, clip)?;

        let mut def = AnimationDef {
            name: Some(if clip.name.is_empty() {
                format!("clip_{}", self.json.animations.len())
            } else {
                clip.name.clone()
            }),
            ..AnimationDef::default()
        };

        for track in &clip.tracks {
            let Some(path) = track.path.gltf_path() else {
                continue;
            };
            let node_id = match &track.target {
                TrackTarget::Node(id) => *id,
                TrackTarget::Bone { mesh, bone } => {
                    match resolve_bone(scene, *mesh, bone) {
                        Some(id) => id,
                        None => {
                            tracing::warn!(bone = bone.as_str(), "bone track target not found");
                            continue;
                        }
                    }
                }
            };
            let Some(&node_index) = self.node_map.get(&node_id) else {
                continue;
            };
            if track.times.is_empty() {
                continue;
            }

            let mut output_item_size = track.value_size();
            if matches!(track.path, TrackPath::MorphTargetInfluences(_)) {
                let morph_count = scene
                    .node(node_id)
                    .mesh
                    .map(|mesh_id| {
                        scene
                            .geometry(scene.mesh(mesh_id).geometry)
                            .morph_target_count()
                    })
                    .unwrap_or(0);
                if morph_count == 0 {
                    tracing::warn!("morph weights track on a mesh without morph targets");
                    continue;
                }
                output_item_size /= morph_count;
            }

            let times = VertexAttribute::f32(track.times.clone(), 1);
            let Some(input) = self.process_full_accessor(&times, AccessorUsage::Plain)? else {
                continue;
            };
            let values = VertexAttribute::f32(track.values.clone(), output_item_size);
            let Some(output) = self.process_full_accessor(&values, AccessorUsage::Plain)? else {
                continue;
            };

            let interpolation = match track.interpolation {
                Interpolation::CubicSpline => "CUBICSPLINE",
                Interpolation::Step => "STEP",
                Interpolation::Linear | Interpolation::Smooth => "LINEAR",
            };

            def.samplers.push(AnimationSamplerDef {
                input,
                output,
                interpolation,
            });
            def.channels.push(ChannelDef {
                sampler: def.samplers.len() - 1,
                target: ChannelTargetDef {
                    node: node_index,
                    path,
                },
            });
        }

        if def.channels.is_empty() {
            tracing::warn!(
                clip = clip.name.as_str(),
                "animation clip has no exportable tracks, dropped"
            );
            return Ok(None);
        }
        self.json.animations.push(def);
        Ok(Some(self.json.animations.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MorphSelector, TrackPath, TrackTarget};

    fn scalar_track(times: Vec<f32>, values: Vec<f32>) -> Track {
        Track {
            target: TrackTarget::Node(crate::scene::NodeId(0)),
            path: TrackPath::MorphTargetInfluences(MorphSelector::Index(0)),
            times,
            values,
            interpolation: Interpolation::Linear,
        }
    }

    #[test]
    fn test_sample_linear() {
        let times = [0.0, 1.0];
        let values = [0.0, 10.0];
        assert_eq!(sample_component(&times, &values, 1, 0, Interpolation::Linear, 0.5), 5.0);
        assert_eq!(sample_component(&times, &values, 1, 0, Interpolation::Linear, -1.0), 0.0);
        assert_eq!(sample_component(&times, &values, 1, 0, Interpolation::Linear, 2.0), 10.0);
    }

    #[test]
    fn test_sample_step() {
        let times = [0.0, 1.0];
        let values = [0.0, 10.0];
        assert_eq!(sample_component(&times, &values, 1, 0, Interpolation::Step, 0.9), 0.0);
    }

    #[test]
    fn test_insert_keyframe_dedupes_within_tolerance() {
        let mut track = scalar_track(vec![0.0, 1.0], vec![0.0, 10.0]);
        assert_eq!(insert_keyframe(&mut track, 1.0005), 1);
        assert_eq!(track.times.len(), 2);
    }

    #[test]
    fn test_insert_keyframe_interpolates() {
        let mut track = scalar_track(vec![0.0, 1.0], vec![0.0, 10.0]);
        let at = insert_keyframe(&mut track, 0.5);
        assert_eq!(at, 1);
        assert_eq!(track.times, vec![0.0, 0.5, 1.0]);
        assert_eq!(track.values, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_insert_keyframe_before_first_and_after_last() {
        let mut track = scalar_track(vec![1.0, 2.0], vec![1.0, 2.0]);
        assert_eq!(insert_keyframe(&mut track, 0.0), 0);
        assert_eq!(insert_keyframe(&mut track, 3.0), 3);
        assert_eq!(track.times, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(track.values, vec![1.0, 1.0, 2.0, 2.0]);
    }

    fn morph_scene() -> (crate::scene::Scene, NodeId) {
        use crate::scene::{Geometry, Material, Mesh, Node, Scene, VertexAttribute};

        let mut scene = Scene::new("s");
        let base = scene.add_attribute(VertexAttribute::f32(vec![0.0, 0.0, 0.0], 3));
        let target_a = scene.add_attribute(VertexAttribute::f32(vec![1.0, 0.0, 0.0], 3));
        let target_b = scene.add_attribute(VertexAttribute::f32(vec![0.0, 1.0, 0.0], 3));
        let mut geometry = Geometry::new("g");
        geometry.attributes.insert("position".to_string(), base);
        geometry
            .morph_attributes
            .insert("position".to_string(), vec![target_a, target_b]);
        let geometry = scene.add_geometry(geometry);
        let material = scene.add_material(Material::new("m"));
        let mesh = scene.add_mesh(Mesh::new("m", geometry, material));
        let node = scene.add_root(Node::with_mesh("m", mesh));
        (scene, node)
    }

    fn morph_track(node: NodeId, target: usize, times: Vec<f32>, values: Vec<f32>) -> Track {
        Track {
            target: TrackTarget::Node(node),
            path: TrackPath::MorphTargetInfluences(MorphSelector::Index(target)),
            times,
            values,
            interpolation: Interpolation::Linear,
        }
    }

    #[test]
    fn test_merged_keyframes_keep_minimum_spacing() {
        let (scene, node) = morph_scene();
        let clip = crate::scene::AnimationClip {
            name: "blend".to_string(),
            tracks: vec![
                morph_track(node, 0, vec![0.0, 0.01, 0.5], vec![0.0, 0.2, 1.0]),
                morph_track(node, 1, vec![0.0004, 0.25, 1.0], vec![0.0, 0.5, 0.75]),
            ],
        };

        let merged = merge_morph_target_tracks(&scene, &clip).unwrap();
        assert_eq!(merged.tracks.len(), 1);
        let track = &merged.tracks[0];
        assert_eq!(track.value_size(), 2);
        for window in track.times.windows(2) {
            assert!(window[1] - window[0] > KEYFRAME_TOLERANCE);
        }
    }

    #[test]
    fn test_merge_rejects_cubic_spline_morph_tracks() {
        let (scene, node) = morph_scene();
        let mut track = morph_track(node, 0, vec![0.0, 1.0], vec![0.0, 1.0]);
        track.interpolation = Interpolation::CubicSpline;
        let clip = crate::scene::AnimationClip {
            name: "bad".to_string(),
            tracks: vec![track],
        };
        assert!(matches!(
            merge_morph_target_tracks(&scene, &clip),
            Err(Error::CubicSplineMorphTrack { track: 0 })
        ));
    }

    #[test]
    fn test_morph_target_name_resolution_fails_loudly() {
        let (scene, node) = morph_scene();
        let clip = crate::scene::AnimationClip {
            name: "named".to_string(),
            tracks: vec![Track {
                target: TrackTarget::Node(node),
                path: TrackPath::MorphTargetInfluences(MorphSelector::Name("smile".to_string())),
                times: vec![0.0],
                values: vec![1.0],
                interpolation: Interpolation::Linear,
            }],
        };
        assert!(matches!(
            merge_morph_target_tracks(&scene, &clip),
            Err(Error::MorphTargetNotFound { .. })
        ));
    }
}
