//! scenegltf - glTF 2.0 scene serializer
//!
//! Consumes an in-memory scene graph (nodes, meshes, materials, textures,
//! lights, skins, animations, cameras) and produces either a JSON glTF
//! document or a self-contained binary GLB container.
//!
//! ```no_run
//! use scenegltf::prelude::*;
//!
//! let mut scene = Scene::new("Scene");
//! let geometry = scene.add_geometry(Geometry::new("tri"));
//! let material = scene.add_material(Material::new("mat"));
//! let mesh = scene.add_mesh(Mesh::new("tri", geometry, material));
//! scene.add_root(Node::with_mesh("tri", mesh));
//!
//! let exporter = Exporter::new();
//! let options = WriteOptions { binary: true, ..WriteOptions::default() };
//! let _glb = exporter.parse(&scene, &options)?;
//! # Ok::<(), scenegltf::Error>(())
//! ```

pub mod error;
pub mod extensions;
pub mod gltf;
pub mod scene;
pub mod utils;
pub mod writer;

// Re-exports for convenience
pub use error::{Error, Result};
pub use writer::{Exporter, GltfWriter, Output, WriteOptions};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::scene::{
        AnimationClip, AttributeData, Camera, Geometry, Image, Light, Material, Mesh, Node, Scene,
        Skin, Texture, Track, VertexAttribute,
    };
    pub use crate::writer::{Exporter, Output, WriteOptions};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
