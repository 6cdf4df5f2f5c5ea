//! The glTF writer: ordered traversal, caches, and document assembly.
//!
//! [`Exporter`] is the public entry point; it instantiates a fresh
//! [`GltfWriter`] per call so no state outlives a write. The writer walks
//! nodes depth-first in child order, then resolves deferred skins and
//! animations (both need the completed node map), then awaits pending image
//! encodes and finalizes into JSON or GLB.

mod accessor;
mod animation;
mod export;
mod image;
mod material;
mod mesh;
mod skin;

use std::collections::HashMap;

use indexmap::IndexSet;
use serde_json::Value;

use crate::error::Result;
use crate::extensions::{self, PluginFactory, WriterPlugin};
use crate::gltf::{CameraDef, Document, Extensions, NodeDef, OrthographicDef, PerspectiveDef, SceneDef};
use crate::scene::{
    AnimationClip, AttributeId, CameraId, CameraProjection, GeometryId, ImageId, MaterialId, Node,
    NodeId, Scene, TextureId,
};

pub use accessor::AccessorUsage;
pub(crate) use self::image::{OutputMime, PendingImage};

/// WebGL constants used throughout the emitted JSON.
pub(crate) mod webgl {
    pub const POINTS: u32 = 0x0000;
    pub const LINES: u32 = 0x0001;
    pub const LINE_LOOP: u32 = 0x0002;
    pub const LINE_STRIP: u32 = 0x0003;
    pub const TRIANGLES: u32 = 0x0004;

    pub const BYTE: u32 = 5120;
    pub const UNSIGNED_BYTE: u32 = 5121;
    pub const SHORT: u32 = 5122;
    pub const UNSIGNED_SHORT: u32 = 5123;
    pub const UNSIGNED_INT: u32 = 5125;
    pub const FLOAT: u32 = 5126;

    pub const ARRAY_BUFFER: u32 = 34962;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 34963;

    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;

    pub const CLAMP_TO_EDGE: u32 = 33071;
    pub const MIRRORED_REPEAT: u32 = 33648;
    pub const REPEAT: u32 = 10497;
}

/// Per-write configuration.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Emit a GLB container instead of a JSON document.
    pub binary: bool,
    /// Emit translation/rotation/scale instead of a node matrix. Forced on
    /// when animations are present.
    pub trs: bool,
    /// Skip nodes whose visibility flag is off.
    pub only_visible: bool,
    /// Clamp image dimensions on both axes.
    pub max_texture_size: u32,
    /// Animation clips to bake.
    pub animations: Vec<AnimationClip>,
    /// Copy `user_data["gltfExtensions"]` into emitted extension maps.
    pub include_custom_extensions: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            binary: false,
            trs: false,
            only_visible: true,
            max_texture_size: u32::MAX,
            animations: Vec::new(),
            include_custom_extensions: false,
        }
    }
}

/// Result of a write: GLB bytes or a JSON document.
#[derive(Debug)]
pub enum Output {
    Binary(Vec<u8>),
    Json(Box<Document>),
}

impl Output {
    /// The GLB bytes, if this is a binary output.
    #[must_use]
    pub fn into_binary(self) -> Option<Vec<u8>> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }

    /// The document, if this is a JSON output.
    #[must_use]
    pub fn json(&self) -> Option<&Document> {
        match self {
            Self::Binary(_) => None,
            Self::Json(doc) => Some(doc),
        }
    }

    /// The document serialized to a `serde_json::Value`, for inspection.
    /// `None` for binary outputs.
    #[must_use]
    pub fn to_json_value(&self) -> Option<Value> {
        match self {
            Self::Binary(_) => None,
            Self::Json(doc) => serde_json::to_value(doc).ok(),
        }
    }
}

/// Which derived form of a source attribute an accessor was emitted from.
/// Together with the attribute id this keys the accessor cache, so dedup is
/// by source identity rather than value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AttrVariant {
    Absolute,
    MorphRelative,
    NormalizedNormal,
    JointsWidened,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeshCacheKey {
    geometry: GeometryId,
    materials: Vec<MaterialId>,
}

/// The per-write state machine. Created by [`Exporter::parse`], discarded at
/// completion; nothing is shared between writes.
pub struct GltfWriter<'a> {
    /// The scene being exported.
    pub scene: &'a Scene,
    pub(crate) options: WriteOptions,
    plugins: Vec<Box<dyn WriterPlugin>>,
    /// The document under construction. Plug-ins may read and extend it.
    pub json: Document,
    pub(crate) buffer: Vec<u8>,
    pub(crate) node_map: HashMap<NodeId, usize>,
    mesh_cache: HashMap<MeshCacheKey, usize>,
    pub(crate) attribute_cache: HashMap<(AttributeId, AttrVariant), usize>,
    pub(crate) material_cache: HashMap<MaterialId, usize>,
    pub(crate) texture_cache: HashMap<TextureId, usize>,
    pub(crate) image_cache: HashMap<(ImageId, OutputMime, bool), usize>,
    skin_queue: Vec<NodeId>,
    pub(crate) pending_images: Vec<PendingImage>,
    /// Extensions referenced by the document, in first-use order.
    pub extensions_used: IndexSet<String>,
    /// Extensions the document cannot be loaded without.
    pub extensions_required: IndexSet<String>,
}

impl<'a> GltfWriter<'a> {
    pub(crate) fn new(
        scene: &'a Scene,
        mut options: WriteOptions,
        plugins: Vec<Box<dyn WriterPlugin>>,
    ) -> Self {
        // Animations reference node TRS channels; a baked matrix cannot be
        // animated.
        if !options.animations.is_empty() {
            options.trs = true;
        }
        Self {
            scene,
            options,
            plugins,
            json: Document::default(),
            buffer: Vec::new(),
            node_map: HashMap::new(),
            mesh_cache: HashMap::new(),
            attribute_cache: HashMap::new(),
            material_cache: HashMap::new(),
            texture_cache: HashMap::new(),
            image_cache: HashMap::new(),
            skin_queue: Vec::new(),
            pending_images: Vec::new(),
            extensions_used: IndexSet::new(),
            extensions_required: IndexSet::new(),
        }
    }

    pub(crate) fn write(mut self) -> Result<Output> {
        self.invoke_before_parse()?;
        self.process_scene()?;

        // Deferred consumers: both dereference the completed node map.
        let queued: Vec<NodeId> = std::mem::take(&mut self.skin_queue);
        for node_id in queued {
            self.process_skin(node_id)?;
        }
        let clips = std::mem::take(&mut self.options.animations);
        for clip in &clips {
            self.process_animation(clip)?;
        }
        self.options.animations = clips;

        self.invoke_after_parse()?;
        self.finalize()
    }

    fn process_scene(&mut self) -> Result<()> {
        let scene = self.scene;
        let mut def = SceneDef::default();
        if !scene.name.is_empty() {
            def.name = Some(scene.name.clone());
        }

        let mut nodes = Vec::new();
        for &root in scene.roots() {
            if scene.node(root).visible || !self.options.only_visible {
                nodes.push(self.process_node(root)?);
            }
        }
        def.nodes = nodes;

        self.serialize_user_data(&scene.user_data, &mut def.extensions, &mut def.extras);
        self.json.scenes.push(def);
        self.json.scene = Some(self.json.scenes.len() - 1);
        Ok(())
    }

    /// Emit one node and its visible subtree. Children are emitted before
    /// the node itself, so subtree indices precede their parent.
    pub fn process_node(&mut self, id: NodeId) -> Result<usize> {
        let scene = self.scene;
        let node = scene.node(id);
        let mut def = NodeDef::default();

        if !node.name.is_empty() {
            def.name = Some(node.name.clone());
        }

        if self.options.trs {
            let (translation, rotation, scale) = node.transform.to_trs();
            if rotation != [0.0, 0.0, 0.0, 1.0] {
                def.rotation = Some(rotation);
            }
            if translation != [0.0, 0.0, 0.0] {
                def.translation = Some(translation);
            }
            if scale != [1.0, 1.0, 1.0] {
                def.scale = Some(scale);
            }
        } else if !node.transform.is_identity() {
            def.matrix = Some(node.transform.to_matrix());
        }

        if let Some(mesh_id) = node.mesh {
            if let Some(mesh_index) = self.process_mesh(mesh_id)? {
                def.mesh = Some(mesh_index);
            }
        }
        if let Some(camera_id) = node.camera {
            def.camera = Some(self.process_camera(camera_id));
        }
        if node.skin.is_some() {
            self.skin_queue.push(id);
        }

        let mut children = Vec::new();
        for &child in &node.children {
            if scene.node(child).visible || !self.options.only_visible {
                children.push(self.process_node(child)?);
            }
        }
        def.children = children;

        self.serialize_user_data(&node.user_data, &mut def.extensions, &mut def.extras);
        self.invoke_write_node(id, node, &mut def)?;

        let index = self.json.nodes.len();
        self.json.nodes.push(def);
        self.node_map.insert(id, index);
        Ok(index)
    }

    fn process_camera(&mut self, id: CameraId) -> usize {
        let camera = self.scene.camera(id);
        let mut def = match camera.projection {
            CameraProjection::Perspective {
                yfov_degrees,
                aspect,
                znear,
                zfar,
            } => CameraDef {
                camera_type: camera.type_name(),
                perspective: Some(PerspectiveDef {
                    aspect_ratio: aspect,
                    yfov: yfov_degrees.to_radians(),
                    zfar,
                    znear,
                }),
                orthographic: None,
                name: None,
            },
            CameraProjection::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            } => CameraDef {
                camera_type: camera.type_name(),
                perspective: None,
                orthographic: Some(OrthographicDef {
                    xmag,
                    ymag,
                    zfar,
                    znear,
                }),
                name: None,
            },
        };
        // Long-standing quirk kept for output compatibility: a named camera
        // is emitted with its type string as the JSON name.
        if !camera.name.is_empty() {
            def.name = Some(camera.type_name().to_string());
        }
        self.json.cameras.push(def);
        self.json.cameras.len() - 1
    }

    /// Copy `user_data` into `extras`, routing `gltfExtensions` into the
    /// definition's extension map when the option is set.
    pub(crate) fn serialize_user_data(
        &mut self,
        user_data: &serde_json::Map<String, Value>,
        extensions: &mut Extensions,
        extras: &mut Option<Value>,
    ) {
        if user_data.is_empty() {
            return;
        }
        let mut map = user_data.clone();
        if self.options.include_custom_extensions {
            if let Some(Value::Object(custom)) = map.remove("gltfExtensions") {
                for (name, value) in custom {
                    self.extensions_used.insert(name.clone());
                    extensions.insert(name, value);
                }
            }
        }
        if map.is_empty() {
            return;
        }
        match extras {
            Some(Value::Object(existing)) => existing.extend(map),
            _ => *extras = Some(Value::Object(map)),
        }
    }

    // ---- plug-in dispatch ----
    //
    // Hooks receive the writer itself, so the plug-in list is taken out for
    // the duration of a broadcast. A hook that re-enters a broadcast sees an
    // empty list.

    fn with_plugins<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&dyn WriterPlugin, &mut Self) -> Result<()>,
    {
        let plugins = std::mem::take(&mut self.plugins);
        let mut result = Ok(());
        for plugin in &plugins {
            result = f(plugin.as_ref(), self);
            if result.is_err() {
                break;
            }
        }
        self.plugins = plugins;
        result
    }

    fn invoke_before_parse(&mut self) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.before_parse(writer))
    }

    fn invoke_after_parse(&mut self) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.after_parse(writer))
    }

    fn invoke_write_node(&mut self, id: NodeId, node: &Node, def: &mut NodeDef) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.write_node(writer, id, node, def))
    }

    pub(crate) fn invoke_write_mesh(
        &mut self,
        mesh: &crate::scene::Mesh,
        def: &mut crate::gltf::MeshDef,
    ) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.write_mesh(writer, mesh, def))
    }

    pub(crate) fn invoke_write_material(
        &mut self,
        material: &crate::scene::Material,
        def: &mut crate::gltf::MaterialDef,
    ) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.write_material(writer, material, def))
    }

    pub(crate) fn invoke_write_texture(
        &mut self,
        texture: &crate::scene::Texture,
        def: &mut crate::gltf::TextureDef,
    ) -> Result<()> {
        self.with_plugins(|plugin, writer| plugin.write_texture(writer, texture, def))
    }
}

/// The exporter: a plug-in factory registry plus the `parse` entry points.
///
/// Factories are instantiated per write, so plug-ins never carry state
/// across invocations.
pub struct Exporter {
    factories: Vec<PluginFactory>,
}

impl Exporter {
    /// An exporter with the built-in extension plug-ins registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: extensions::builtin_factories(),
        }
    }

    /// An exporter without any plug-ins; extension data is not emitted.
    #[must_use]
    pub fn new_without_extensions() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Register a plug-in factory. Double registration is a no-op.
    pub fn register(&mut self, factory: PluginFactory) {
        if !self.factories.contains(&factory) {
            self.factories.push(factory);
        }
    }

    /// Remove a previously registered factory. Unknown factories are a
    /// no-op.
    pub fn unregister(&mut self, factory: PluginFactory) {
        self.factories.retain(|f| *f != factory);
    }

    /// Serialize `scene` into GLB bytes or a JSON document.
    ///
    /// Either a complete document is returned or an error; partial output is
    /// never produced.
    ///
    /// # Errors
    /// Returns an error on unsupported input (see [`crate::Error`]) or when
    /// image encoding fails.
    pub fn parse(&self, scene: &Scene, options: &WriteOptions) -> Result<Output> {
        let plugins: Vec<Box<dyn WriterPlugin>> =
            self.factories.iter().map(|factory| factory()).collect();
        GltfWriter::new(scene, options.clone(), plugins).write()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
