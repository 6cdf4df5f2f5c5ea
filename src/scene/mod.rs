//! In-memory scene-graph model consumed by the writer.
//!
//! The scene is an arena document: every entity lives in a typed `Vec` on
//! [`Scene`] and is addressed by an index newtype. Cross-references (node
//! children, skin bones, animation targets) are ids, never owned pointers,
//! so back-referencing graphs need no reference counting.

mod animation;
mod camera;
mod geometry;
mod light;
mod material;
mod mesh;
mod node;
mod skin;
mod texture;

pub use animation::{AnimationClip, Interpolation, MorphSelector, Track, TrackPath, TrackTarget};
pub use camera::{Camera, CameraProjection};
pub use geometry::{AttributeData, Geometry, GeometryGroup, VertexAttribute};
pub use light::{Light, LightKind};
pub use material::{Material, MaterialKind, PhysicalProps, Side};
pub use mesh::{Mesh, PrimitiveMode};
pub use node::{MeshInstances, Node, NodeTransform};
pub use skin::Skin;
pub use texture::{
    ColorSpace, Image, ImageSource, MagFilter, MinFilter, Texture, UvTransform, WrapMode,
};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in its arena.
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a [`Node`] in a [`Scene`].
    NodeId
);
arena_id!(
    /// Handle to a [`Geometry`] in a [`Scene`].
    GeometryId
);
arena_id!(
    /// Handle to a [`VertexAttribute`] in a [`Scene`].
    AttributeId
);
arena_id!(
    /// Handle to a [`Mesh`] in a [`Scene`].
    MeshId
);
arena_id!(
    /// Handle to a [`Material`] in a [`Scene`].
    MaterialId
);
arena_id!(
    /// Handle to a [`Texture`] in a [`Scene`].
    TextureId
);
arena_id!(
    /// Handle to an [`Image`] in a [`Scene`].
    ImageId
);
arena_id!(
    /// Handle to a [`Light`] in a [`Scene`].
    LightId
);
arena_id!(
    /// Handle to a [`Camera`] in a [`Scene`].
    CameraId
);
arena_id!(
    /// Handle to a [`Skin`] in a [`Scene`].
    SkinId
);

/// An in-memory scene graph: the input of every export.
#[derive(Debug, Default)]
pub struct Scene {
    /// Scene name, emitted on the glTF scene when non-empty.
    pub name: String,
    /// Open metadata map, serialized into the scene's `extras`.
    pub user_data: serde_json::Map<String, serde_json::Value>,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    attributes: Vec<VertexAttribute>,
    geometries: Vec<Geometry>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    images: Vec<Image>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    skins: Vec<Skin>,
}

impl Scene {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a node without attaching it anywhere. Use [`Scene::add_root`] or
    /// [`Scene::add_child`] to place it in the tree.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a node and register it as a scene root.
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = self.add_node(node);
        self.roots.push(id);
        id
    }

    /// Register an existing node as a scene root.
    pub fn mark_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Add a node as a child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add_node(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_attribute(&mut self, attribute: VertexAttribute) -> AttributeId {
        let id = AttributeId(self.attributes.len());
        self.attributes.push(attribute);
        id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = GeometryId(self.geometries.len());
        self.geometries.push(geometry);
        id
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.meshes.push(mesh);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(texture);
        id
    }

    pub fn add_image(&mut self, image: Image) -> ImageId {
        let id = ImageId(self.images.len());
        self.images.push(image);
        id
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.lights.len());
        self.lights.push(light);
        id
    }

    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        let id = CameraId(self.cameras.len());
        self.cameras.push(camera);
        id
    }

    pub fn add_skin(&mut self, skin: Skin) -> SkinId {
        let id = SkinId(self.skins.len());
        self.skins.push(skin);
        id
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn attribute(&self, id: AttributeId) -> &VertexAttribute {
        &self.attributes[id.0]
    }

    #[must_use]
    pub fn geometry(&self, id: GeometryId) -> &Geometry {
        &self.geometries[id.0]
    }

    #[must_use]
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    #[must_use]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.textures[id.0]
    }

    #[must_use]
    pub fn image(&self, id: ImageId) -> &Image {
        &self.images[id.0]
    }

    #[must_use]
    pub fn light(&self, id: LightId) -> &Light {
        &self.lights[id.0]
    }

    #[must_use]
    pub fn camera(&self, id: CameraId) -> &Camera {
        &self.cameras[id.0]
    }

    #[must_use]
    pub fn skin(&self, id: SkinId) -> &Skin {
        &self.skins[id.0]
    }
}
