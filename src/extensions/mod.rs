//! Extension plug-ins.
//!
//! A plug-in implements any subset of the hooks on [`WriterPlugin`]; the
//! writer broadcasts each hook to every plug-in in registration order.
//! Hooks receive the writer itself, so a plug-in can emit accessors and
//! textures and may mutate the definition being written. Plug-ins declare
//! usage through `writer.extensions_used` / `writer.extensions_required`.

mod instancing;
mod lights;
mod materials;
mod unlit;

use crate::error::Result;
use crate::gltf::{MaterialDef, MeshDef, NodeDef, TextureDef};
use crate::scene::{Material, Mesh, Node, NodeId, Texture};
use crate::writer::GltfWriter;

/// Hooks a writer plug-in may implement. All default to no-ops.
pub trait WriterPlugin {
    /// The extension name the plug-in emits.
    fn name(&self) -> &'static str;

    fn before_parse(&self, _writer: &mut GltfWriter<'_>) -> Result<()> {
        Ok(())
    }

    fn write_node(
        &self,
        _writer: &mut GltfWriter<'_>,
        _id: NodeId,
        _node: &Node,
        _def: &mut NodeDef,
    ) -> Result<()> {
        Ok(())
    }

    fn write_mesh(
        &self,
        _writer: &mut GltfWriter<'_>,
        _mesh: &Mesh,
        _def: &mut MeshDef,
    ) -> Result<()> {
        Ok(())
    }

    fn write_material(
        &self,
        _writer: &mut GltfWriter<'_>,
        _material: &Material,
        _def: &mut MaterialDef,
    ) -> Result<()> {
        Ok(())
    }

    fn write_texture(
        &self,
        _writer: &mut GltfWriter<'_>,
        _texture: &Texture,
        _def: &mut TextureDef,
    ) -> Result<()> {
        Ok(())
    }

    fn after_parse(&self, _writer: &mut GltfWriter<'_>) -> Result<()> {
        Ok(())
    }
}

/// Constructor for a plug-in instance; invoked once per write.
pub type PluginFactory = fn() -> Box<dyn WriterPlugin>;

/// The built-in plug-in set, in registration order.
pub(crate) fn builtin_factories() -> Vec<PluginFactory> {
    vec![
        lights::plugin,
        unlit::plugin,
        materials::transmission,
        materials::volume,
        materials::ior,
        materials::specular,
        materials::clearcoat,
        materials::dispersion,
        materials::iridescence,
        materials::sheen,
        materials::anisotropy,
        materials::emissive_strength,
        materials::bump,
        instancing::plugin,
    ]
}
