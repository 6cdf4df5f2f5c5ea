//! Finalization: buffer assembly, extension lists, JSON and GLB emission.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::Result;
use crate::gltf::{BufferDef, Document};
use crate::scene::Scene;
use crate::utils::padding_for;

use super::{Exporter, GltfWriter, Output, WriteOptions};

impl GltfWriter<'_> {
    /// Resolve pending work and emit the configured output form.
    pub(crate) fn finalize(mut self) -> Result<Output> {
        self.resolve_pending_images()?;

        if !self.buffer.is_empty() {
            let uri = if self.options.binary {
                None
            } else {
                Some(format!(
                    "data:application/octet-stream;base64,{}",
                    BASE64.encode(&self.buffer)
                ))
            };
            self.json.buffers = vec![BufferDef {
                byte_length: self.buffer.len(),
                uri,
            }];
        }

        self.json.extensions_used = self.extensions_used.iter().cloned().collect();
        self.json.extensions_required = self.extensions_required.iter().cloned().collect();

        if self.options.binary {
            Ok(Output::Binary(build_glb(&self.json, &self.buffer)?))
        } else {
            Ok(Output::Json(Box::new(self.json)))
        }
    }
}

/// Frame a document and its binary buffer as a GLB container.
///
/// The BIN chunk is always present, zero-length for bufferless scenes.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub(crate) fn build_glb(json: &Document, buffer: &[u8]) -> Result<Vec<u8>> {
    let json_string = serde_json::to_string(json)?;
    let json_bytes = json_string.as_bytes();

    let json_padding = padding_for(json_bytes.len(), 4);
    let json_chunk_len = json_bytes.len() + json_padding;

    let bin_padding = padding_for(buffer.len(), 4);
    let bin_chunk_len = buffer.len() + bin_padding;

    let total_len = 12 + 8 + json_chunk_len + 8 + bin_chunk_len;

    let mut output = Vec::with_capacity(total_len);

    // GLB header
    output.extend_from_slice(b"glTF");
    output.extend_from_slice(&2u32.to_le_bytes());
    output.extend_from_slice(&(total_len as u32).to_le_bytes());

    // JSON chunk, space padded
    output.extend_from_slice(&(json_chunk_len as u32).to_le_bytes());
    output.extend_from_slice(&0x4E4F_534Au32.to_le_bytes()); // "JSON"
    output.extend_from_slice(json_bytes);
    output.extend(std::iter::repeat(b' ').take(json_padding));

    // Binary chunk, zero padded
    output.extend_from_slice(&(bin_chunk_len as u32).to_le_bytes());
    output.extend_from_slice(&0x004E_4942u32.to_le_bytes()); // "BIN\0"
    output.extend_from_slice(buffer);
    output.extend(std::iter::repeat(0u8).take(bin_padding));

    Ok(output)
}

impl Exporter {
    /// Serialize `scene` and write it as a GLB file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn export_glb_file(
        &self,
        scene: &Scene,
        options: &WriteOptions,
        path: &Path,
    ) -> Result<()> {
        let mut options = options.clone();
        options.binary = true;
        if let Output::Binary(bytes) = self.parse(scene, &options)? {
            let mut file = File::create(path)?;
            file.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Serialize `scene` and write it as a `.gltf` JSON file with the
    /// binary buffer embedded as a data URI.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn export_gltf_file(
        &self,
        scene: &Scene,
        options: &WriteOptions,
        path: &Path,
    ) -> Result<()> {
        let mut options = options.clone();
        options.binary = false;
        if let Output::Json(document) = self.parse(scene, &options)? {
            let json = serde_json::to_string_pretty(&document)?;
            let mut file = File::create(path)?;
            file.write_all(json.as_bytes())?;
        }
        Ok(())
    }
}
