//! Shared helpers for integration tests: scene builders and helpers for
//! reading accessors back out of an exported document.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;

use scenegltf::scene::{
    AttributeData, Geometry, GeometryId, Image, Material, MaterialId, Mesh, Node, Scene, Texture,
    VertexAttribute,
};

/// A quad in the XY plane with position, normal, uv, and an index stream.
pub fn quad_geometry(scene: &mut Scene) -> GeometryId {
    let positions = scene.add_attribute(VertexAttribute::f32(
        vec![
            -1.0, -1.0, 0.0, //
            1.0, -1.0, 0.0, //
            1.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0,
        ],
        3,
    ));
    let normals = scene.add_attribute(VertexAttribute::f32(
        vec![
            0.0, 0.0, 1.0, //
            0.0, 0.0, 1.0, //
            0.0, 0.0, 1.0, //
            0.0, 0.0, 1.0,
        ],
        3,
    ));
    let uvs = scene.add_attribute(VertexAttribute::f32(
        vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        2,
    ));
    let index = scene.add_attribute(VertexAttribute::new(
        AttributeData::U16(vec![0, 1, 2, 0, 2, 3]),
        1,
    ));

    let mut geometry = Geometry::new("quad");
    geometry.attributes.insert("position".to_string(), positions);
    geometry.attributes.insert("normal".to_string(), normals);
    geometry.attributes.insert("uv".to_string(), uvs);
    geometry.index = Some(index);
    scene.add_geometry(geometry)
}

/// A basic material with a 1x1 white PNG base-color map.
pub fn textured_basic_material(scene: &mut Scene) -> MaterialId {
    let image = scene.add_image(Image::solid("white", 1, 1, [255, 255, 255, 255]));
    let texture = scene.add_texture(Texture::new("map", image));
    let mut material = Material::basic("basic");
    material.base_color_map = Some(texture);
    scene.add_material(material)
}

/// A single-root scene holding one quad mesh with the given material.
pub fn quad_scene(material: fn(&mut Scene) -> MaterialId) -> Scene {
    let mut scene = Scene::new("Scene");
    let geometry = quad_geometry(&mut scene);
    let material = material(&mut scene);
    let mesh = scene.add_mesh(Mesh::new("quad", geometry, material));
    scene.add_root(Node::with_mesh("quad", mesh));
    scene
}

/// Decode the single buffer out of a JSON-mode document.
pub fn decode_buffer(json: &Value) -> Vec<u8> {
    let uri = json["buffers"][0]["uri"].as_str().expect("buffer uri");
    let payload = uri
        .strip_prefix("data:application/octet-stream;base64,")
        .expect("data uri");
    BASE64.decode(payload).expect("valid base64")
}

/// Read accessor `index` back as f32 components (FLOAT accessors only).
pub fn read_f32_accessor(json: &Value, buffer: &[u8], index: usize) -> Vec<f32> {
    let accessor = &json["accessors"][index];
    assert_eq!(accessor["componentType"].as_u64(), Some(5126));
    let item_size = type_item_size(accessor["type"].as_str().unwrap());
    let count = accessor["count"].as_u64().unwrap() as usize;

    let view = &json["bufferViews"][accessor["bufferView"].as_u64().unwrap() as usize];
    let offset = view["byteOffset"].as_u64().unwrap_or(0) as usize;
    let stride = view["byteStride"]
        .as_u64()
        .map_or(item_size * 4, |s| s as usize);

    let mut out = Vec::with_capacity(count * item_size);
    for element in 0..count {
        for c in 0..item_size {
            let at = offset + element * stride + c * 4;
            out.push(f32::from_le_bytes(buffer[at..at + 4].try_into().unwrap()));
        }
    }
    out
}

pub fn type_item_size(name: &str) -> usize {
    match name {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT3" => 9,
        "MAT4" => 16,
        other => panic!("unexpected accessor type {other}"),
    }
}

/// Parse the JSON chunk out of a GLB container.
pub fn glb_json(glb: &[u8]) -> Value {
    assert!(glb.len() >= 20);
    let json_len = u32::from_le_bytes(glb[12..16].try_into().unwrap()) as usize;
    assert_eq!(&glb[16..20], b"JSON");
    serde_json::from_slice(&glb[20..20 + json_len]).expect("valid JSON chunk")
}
