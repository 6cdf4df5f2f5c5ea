//! End-to-end export scenarios.

mod common;

use serde_json::Value;

use scenegltf::scene::{
    AnimationClip, Geometry, Image, Interpolation, Light, LightKind, Material, MaterialKind, Mesh,
    MeshInstances, MorphSelector, Node, PhysicalProps, Scene, Skin, Texture, Track, TrackPath,
    TrackTarget, VertexAttribute,
};
use scenegltf::{Exporter, Output, WriteOptions};

use common::{decode_buffer, glb_json, quad_scene, read_f32_accessor, textured_basic_material};

fn export_json(scene: &Scene, options: &WriteOptions) -> Value {
    let output = Exporter::new().parse(scene, options).expect("export");
    match output {
        Output::Json(doc) => serde_json::to_value(&doc).expect("serializable"),
        Output::Binary(_) => panic!("expected JSON output"),
    }
}

#[test]
fn empty_scene_produces_minimal_document() {
    let scene = Scene::new("Scene");
    let json = export_json(&scene, &WriteOptions::default());

    assert_eq!(json["asset"]["version"], "2.0");
    assert!(json["asset"]["generator"].is_string());
    assert_eq!(json["scene"], 0);
    assert_eq!(json["scenes"].as_array().unwrap().len(), 1);
    assert_eq!(json["scenes"][0]["name"], "Scene");
    // No buffer and no node arrays are emitted at all.
    assert!(json.get("buffers").is_none());
    assert!(json.get("nodes").is_none());
    assert!(json.get("accessors").is_none());
}

#[test]
fn empty_scene_glb_is_well_formed() {
    let scene = Scene::new("Scene");
    let options = WriteOptions {
        binary: true,
        ..WriteOptions::default()
    };
    let glb = Exporter::new()
        .parse(&scene, &options)
        .expect("export")
        .into_binary()
        .expect("binary output");

    assert_eq!(
        u32::from_le_bytes(glb[0..4].try_into().unwrap()),
        0x4654_6C67
    );
    assert_eq!(u32::from_le_bytes(glb[4..8].try_into().unwrap()), 2);
    assert_eq!(
        u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize,
        glb.len()
    );

    let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
    assert_eq!(json_len % 4, 0);
    assert_eq!(&glb[16..20], b"JSON");

    // Empty BIN chunk: zero length, still present.
    let bin_header = 20 + json_len;
    let bin_len = u32::from_le_bytes(glb[bin_header..bin_header + 4].try_into().unwrap());
    assert_eq!(bin_len, 0);
    assert_eq!(
        u32::from_le_bytes(glb[bin_header + 4..bin_header + 8].try_into().unwrap()),
        0x004E_4942
    );
    assert_eq!(glb.len(), bin_header + 8);
}

#[test]
fn textured_quad_document_shape() {
    let scene = quad_scene(textured_basic_material);
    let json = export_json(&scene, &WriteOptions::default());

    assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(json["meshes"].as_array().unwrap().len(), 1);
    assert_eq!(json["materials"].as_array().unwrap().len(), 1);
    assert_eq!(json["textures"].as_array().unwrap().len(), 1);
    assert_eq!(json["samplers"].as_array().unwrap().len(), 1);
    assert_eq!(json["images"].as_array().unwrap().len(), 1);
    // POSITION + NORMAL + TEXCOORD_0 + indices
    assert_eq!(json["accessors"].as_array().unwrap().len(), 4);
    assert_eq!(json["bufferViews"].as_array().unwrap().len(), 4);
    assert_eq!(json["buffers"].as_array().unwrap().len(), 1);

    let primitive = &json["meshes"][0]["primitives"][0];
    assert_eq!(primitive["mode"], 4);
    for semantic in ["POSITION", "NORMAL", "TEXCOORD_0"] {
        assert!(primitive["attributes"].get(semantic).is_some());
    }
    assert!(primitive["indices"].is_number());

    let material = &json["materials"][0];
    assert!(material["pbrMetallicRoughness"]["baseColorTexture"]["index"].is_number());
    assert!(material["extensions"]["KHR_materials_unlit"].is_object());

    // Basic material fires the unlit plug-in.
    let used: Vec<&str> = json["extensionsUsed"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(used.contains(&"KHR_materials_unlit"));

    // JSON mode embeds the image as a data URI.
    let uri = json["images"][0]["uri"].as_str().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));

    // Sampler constants are WebGL values.
    assert_eq!(json["samplers"][0]["magFilter"], 9729);
    assert_eq!(json["samplers"][0]["wrapS"], 10497);
}

#[test]
fn instanced_mesh_writes_gpu_instancing() {
    let mut scene = Scene::new("Scene");
    let geometry = common::quad_geometry(&mut scene);
    let material = scene.add_material(Material::new("mat"));
    let mesh = scene.add_mesh(Mesh::new("quad", geometry, material));

    let mut matrices = Vec::new();
    for i in 0..3 {
        let translation = glam_translation(i as f32, 0.0, 0.0);
        matrices.push(translation);
    }
    let mut node = Node::with_mesh("instanced", mesh);
    node.instances = Some(MeshInstances {
        matrices,
        colors: None,
    });
    scene.add_root(node);

    let json = export_json(&scene, &WriteOptions::default());

    let attributes = &json["nodes"][0]["extensions"]["EXT_mesh_gpu_instancing"]["attributes"];
    for semantic in ["TRANSLATION", "ROTATION", "SCALE"] {
        let accessor = attributes[semantic].as_u64().expect("accessor index") as usize;
        assert_eq!(json["accessors"][accessor]["count"], 3);
    }

    let required: Vec<&str> = json["extensionsRequired"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(required.contains(&"EXT_mesh_gpu_instancing"));
}

fn glam_translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ]
}

/// One vertex, two absolute morph targets, two per-index tracks with three
/// shared keyframe times.
fn morph_scene() -> (Scene, AnimationClip) {
    let mut scene = Scene::new("Scene");

    let base = scene.add_attribute(VertexAttribute::f32(vec![1.0, 1.0, 1.0], 3));
    let morph_a = scene.add_attribute(VertexAttribute::f32(vec![2.0, 1.0, 1.0], 3));
    let morph_b = scene.add_attribute(VertexAttribute::f32(vec![1.0, 3.0, 1.0], 3));

    let mut geometry = Geometry::new("morphing");
    geometry.attributes.insert("position".to_string(), base);
    geometry
        .morph_attributes
        .insert("position".to_string(), vec![morph_a, morph_b]);
    let geometry = scene.add_geometry(geometry);

    let material = scene.add_material(Material::new("mat"));
    let mut mesh = Mesh::new("morphing", geometry, material);
    mesh.weights = vec![0.0, 0.0];
    let mesh = scene.add_mesh(mesh);
    let node = scene.add_root(Node::with_mesh("morphing", mesh));

    let mut clip = AnimationClip::new("blend");
    for (target, values) in [(0usize, [0.0, 0.3, 1.0]), (1usize, [0.0, 0.5, 0.25])] {
        clip.tracks.push(Track {
            target: TrackTarget::Node(node),
            path: TrackPath::MorphTargetInfluences(MorphSelector::Index(target)),
            times: vec![0.0, 0.5, 1.0],
            values: values.to_vec(),
            interpolation: Interpolation::Linear,
        });
    }
    (scene, clip)
}

#[test]
fn morph_animation_merges_tracks_and_relativizes() {
    let (scene, clip) = morph_scene();
    let options = WriteOptions {
        animations: vec![clip],
        ..WriteOptions::default()
    };
    let json = export_json(&scene, &options);
    let buffer = decode_buffer(&json);

    // One merged weights track: one sampler, one channel.
    let animation = &json["animations"][0];
    assert_eq!(animation["channels"].as_array().unwrap().len(), 1);
    assert_eq!(animation["samplers"].as_array().unwrap().len(), 1);
    assert_eq!(animation["channels"][0]["target"]["path"], "weights");

    // Three keyframes, stride two: SCALAR output of count 6.
    let sampler = &animation["samplers"][0];
    let input = sampler["input"].as_u64().unwrap() as usize;
    let output = sampler["output"].as_u64().unwrap() as usize;
    assert_eq!(json["accessors"][input]["count"], 3);
    assert_eq!(json["accessors"][output]["count"], 6);
    assert_eq!(json["accessors"][output]["type"], "SCALAR");

    let merged = read_f32_accessor(&json, &buffer, output);
    assert_eq!(merged, vec![0.0, 0.0, 0.3, 0.5, 1.0, 0.25]);

    // Mesh weights vector has one entry per target.
    assert_eq!(json["meshes"][0]["weights"].as_array().unwrap().len(), 2);

    // Morph targets are exported relative to the base attribute.
    let targets = json["meshes"][0]["primitives"][0]["targets"]
        .as_array()
        .unwrap();
    assert_eq!(targets.len(), 2);
    let first = targets[0]["POSITION"].as_u64().unwrap() as usize;
    let second = targets[1]["POSITION"].as_u64().unwrap() as usize;
    assert_eq!(read_f32_accessor(&json, &buffer, first), vec![1.0, 0.0, 0.0]);
    assert_eq!(read_f32_accessor(&json, &buffer, second), vec![0.0, 2.0, 0.0]);

    // Animations force decomposed node transforms, so no matrix appears.
    assert!(json["nodes"][0].get("matrix").is_none());
}

#[test]
fn iridescent_material_emits_extension() {
    let mut scene = Scene::new("Scene");
    let geometry = common::quad_geometry(&mut scene);
    let material = scene.add_material(Material::physical(
        "iridescent",
        PhysicalProps {
            iridescence: 0.3,
            iridescence_ior: 1.8,
            iridescence_thickness_range: [100.0, 400.0],
            ..PhysicalProps::default()
        },
    ));
    let mesh = scene.add_mesh(Mesh::new("quad", geometry, material));
    scene.add_root(Node::with_mesh("quad", mesh));

    let json = export_json(&scene, &WriteOptions::default());

    let ext = &json["materials"][0]["extensions"]["KHR_materials_iridescence"];
    assert_eq!(ext["iridescenceFactor"].as_f64().unwrap() as f32, 0.3);
    assert_eq!(ext["iridescenceIor"].as_f64().unwrap() as f32, 1.8);
    assert_eq!(ext["iridescenceThicknessMinimum"], 100.0);
    assert_eq!(ext["iridescenceThicknessMaximum"], 400.0);
    assert!(ext.get("iridescenceTexture").is_none());
    assert!(ext.get("iridescenceThicknessTexture").is_none());

    let used: Vec<&str> = json["extensionsUsed"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(used.contains(&"KHR_materials_iridescence"));
    assert!(json.get("extensionsRequired").is_none());
}

#[test]
fn skinned_mesh_emits_skin_after_traversal() {
    let mut scene = Scene::new("Scene");

    let geometry = common::quad_geometry(&mut scene);
    let material = scene.add_material(Material::new("mat"));
    let mesh = scene.add_mesh(Mesh::new("skinned", geometry, material));

    let root = scene.add_root(Node::new("root"));
    let bone_a = scene.add_child(root, Node::new("bone_a"));
    let bone_b = scene.add_child(root, Node::new("bone_b"));

    let mut skin = Skin::new("skin");
    skin.bones = vec![bone_a, bone_b];
    skin.bone_inverses = vec![identity(), identity()];
    let skin = scene.add_skin(skin);

    let mut skinned = Node::with_mesh("skinned", mesh);
    skinned.skin = Some(skin);
    skinned.bind_matrix = Some(identity());
    scene.add_child(root, skinned);

    let json = export_json(&scene, &WriteOptions::default());

    let skin = &json["skins"][0];
    assert_eq!(skin["joints"].as_array().unwrap().len(), 2);

    let ibm = skin["inverseBindMatrices"].as_u64().unwrap() as usize;
    assert_eq!(json["accessors"][ibm]["count"], 2);
    assert_eq!(json["accessors"][ibm]["type"], "MAT4");

    // The skin index is back-written onto the skinned node.
    let nodes = json["nodes"].as_array().unwrap();
    let skinned_node = nodes
        .iter()
        .find(|n| n["name"] == "skinned")
        .expect("skinned node present");
    assert_eq!(skinned_node["skin"], 0);

    // skeleton points at the first bone's node index.
    let bone_index = nodes.iter().position(|n| n["name"] == "bone_a").unwrap();
    assert_eq!(skin["skeleton"].as_u64().unwrap() as usize, bone_index);
}

#[test]
fn named_camera_takes_type_as_name() {
    let mut scene = Scene::new("Scene");
    let camera = scene.add_camera(scenegltf::scene::Camera::perspective("main", 50.0, 0.1, 100.0));
    let mut node = Node::new("camera");
    node.camera = Some(camera);
    scene.add_root(node);

    let json = export_json(&scene, &WriteOptions::default());
    assert_eq!(json["cameras"][0]["type"], "perspective");
    // The camera's own name is replaced by the type string.
    assert_eq!(json["cameras"][0]["name"], "perspective");
    let yfov = json["cameras"][0]["perspective"]["yfov"].as_f64().unwrap();
    assert!((yfov - 50.0f64.to_radians()).abs() < 1e-6);
}

#[test]
fn punctual_light_node_and_document_extension() {
    let mut scene = Scene::new("Scene");
    let mut light = Light::new("sun", LightKind::Directional);
    light.intensity = 3.0;
    light.color = [1.0, 0.9, 0.8];
    let light = scene.add_light(light);
    let mut node = Node::new("sun");
    node.light = Some(light);
    scene.add_root(node);

    let json = export_json(&scene, &WriteOptions::default());

    assert_eq!(json["nodes"][0]["extensions"]["KHR_lights_punctual"]["light"], 0);
    let light_def = &json["extensions"]["KHR_lights_punctual"]["lights"][0];
    assert_eq!(light_def["type"], "directional");
    assert_eq!(light_def["intensity"], 3.0);
    assert_eq!(light_def["name"], "sun");
}

#[test]
fn invisible_nodes_are_skipped_by_default() {
    let mut scene = Scene::new("Scene");
    let mut hidden = Node::new("hidden");
    hidden.visible = false;
    scene.add_root(hidden);
    scene.add_root(Node::new("shown"));

    let json = export_json(&scene, &WriteOptions::default());
    let nodes = json["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["name"], "shown");

    let keep_all = WriteOptions {
        only_visible: false,
        ..WriteOptions::default()
    };
    let json = export_json(&scene, &keep_all);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
}

#[test]
fn shader_material_is_skipped_with_null_material() {
    let mut scene = Scene::new("Scene");
    let geometry = common::quad_geometry(&mut scene);
    let mut material = Material::new("custom");
    material.kind = MaterialKind::Shader;
    let material = scene.add_material(material);
    let mesh = scene.add_mesh(Mesh::new("quad", geometry, material));
    scene.add_root(Node::with_mesh("quad", mesh));

    let json = export_json(&scene, &WriteOptions::default());
    assert!(json.get("materials").is_none());
    assert!(json["meshes"][0]["primitives"][0].get("material").is_none());
}

#[test]
fn glb_export_writes_file() {
    let scene = quad_scene(textured_basic_material);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quad.glb");

    let exporter = Exporter::new();
    exporter
        .export_glb_file(&scene, &WriteOptions::default(), &path)
        .expect("export to file");

    let bytes = std::fs::read(&path).expect("file written");
    let json = glb_json(&bytes);
    assert_eq!(json["asset"]["version"], "2.0");
    assert_eq!(
        u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize,
        bytes.len()
    );
}

#[test]
fn data_texture_round_trips_through_pixels() {
    let mut scene = Scene::new("Scene");
    let geometry = common::quad_geometry(&mut scene);
    let image = scene.add_image(Image::solid("red", 2, 2, [255, 0, 0, 255]));
    let texture = scene.add_texture(Texture::new("map", image));
    let mut material = Material::new("mat");
    material.base_color_map = Some(texture);
    let material = scene.add_material(material);
    let mesh = scene.add_mesh(Mesh::new("quad", geometry, material));
    scene.add_root(Node::with_mesh("quad", mesh));

    let options = WriteOptions {
        binary: true,
        ..WriteOptions::default()
    };
    let glb = Exporter::new()
        .parse(&scene, &options)
        .expect("export")
        .into_binary()
        .unwrap();
    let json = glb_json(&glb);

    // Binary mode embeds the image through a bufferView.
    assert!(json["images"][0]["bufferView"].is_number());
    assert_eq!(json["images"][0]["mimeType"], "image/png");
    assert!(json["images"][0].get("uri").is_none());
}

fn identity() -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]
}
