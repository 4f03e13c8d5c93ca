//! Pipeline data model
//!
//! Flat, material-partitioned mesh buffers produced by extraction, the
//! per-material configuration state mutated by the caller between import
//! and export, and the texture metadata records that bridge the codec and
//! the document serializer.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::catalog::{ShaderCatalog, ShaderDef};

/// One flat mesh associated with exactly one material.
///
/// Vertex buffers are parallel; `indices` is a triangle list into them.
/// Vertices appear in first-seen order from the source partition's
/// triangle walk, and every vertex is referenced by at least one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Per-vertex RGBA in 0-1 range; `None` when the source had no colors.
    pub colors: Option<Vec<[f32; 4]>>,
    /// Triangle list, stride 3. Every value < vertex count.
    pub indices: Vec<u32>,
    /// Index into the owning [`Model`]'s `material_names`.
    pub material_index: usize,
}

impl Mesh {
    /// Number of vertices in this mesh.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in this mesh.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A normalized model: named, flat, already in a single global space.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    /// Material names, unique, in first-seen order. Every mesh's
    /// `material_index` is a valid position here.
    pub material_names: Vec<String>,
}

/// The two block-compression modes the target container supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 3-component opaque mode (DXT1, 8 bytes per 4x4 block).
    Dxt1,
    /// 4-component alpha-capable mode (DXT5, 16 bytes per 4x4 block).
    Dxt5,
}

impl TextureFormat {
    /// Bytes per 4x4 block in this format.
    #[must_use]
    pub fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt5 => 16,
        }
    }

    /// Four-character code written into the container's pixel format.
    #[must_use]
    pub fn four_cc(self) -> &'static str {
        match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt5 => "DXT5",
        }
    }
}

impl std::fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.four_cc())
    }
}

/// A texture assigned to one sampler slot of one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    /// Path to the source image on disk.
    pub source: PathBuf,
    /// Decoded source width, prior to power-of-two rounding.
    pub width: u32,
    /// Decoded source height, prior to power-of-two rounding.
    pub height: u32,
}

impl TextureSlot {
    /// Sanitized stem of the source image, used as the texture's identity.
    #[must_use]
    pub fn sanitized_name(&self) -> String {
        sanitize_name(
            self.source
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("texture"),
        )
    }
}

/// Metadata handed from the codec to the serializer for one compressed
/// texture. Multiple entries may share `name` when the same source image
/// is reused across materials under different sampler slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    /// Sanitized source name; display identity and file stem.
    pub name: String,
    /// Sampler slot the texture was assigned under.
    pub slot: String,
    /// Output width after power-of-two rounding.
    pub width: u32,
    /// Output height after power-of-two rounding.
    pub height: u32,
    /// Selected compression mode.
    pub format: TextureFormat,
    /// Output container file name (`<name>.dds`).
    pub file_name: String,
}

/// Per-material shader assignment and texture slot state.
///
/// Created with the catalog's default shader when a model is imported;
/// mutated as the user reassigns shaders or textures; discarded when the
/// model is replaced.
#[derive(Debug, Clone)]
pub struct MaterialConfig {
    /// Material name, matching an entry in the model's `material_names`.
    pub name: String,
    /// Catalog filename of the assigned shader.
    pub shader: String,
    /// Sampler slot name -> assigned texture, in shader declaration order.
    pub samplers: IndexMap<String, Option<TextureSlot>>,
}

impl MaterialConfig {
    /// Create a configuration with the catalog's default shader and
    /// empty sampler slots.
    #[must_use]
    pub fn new_default(name: impl Into<String>, catalog: &ShaderCatalog) -> Self {
        let shader = catalog.default_shader();
        Self {
            name: name.into(),
            shader: shader.filename.clone(),
            samplers: empty_samplers(shader),
        }
    }

    /// Reassign the shader, keeping assignments for slots the new shader
    /// also declares and pruning the rest.
    pub fn set_shader(&mut self, def: &ShaderDef) {
        let mut samplers = empty_samplers(def);
        for (slot, assigned) in std::mem::take(&mut self.samplers) {
            if let Some(entry) = samplers.get_mut(&slot) {
                *entry = assigned;
            }
        }
        self.shader = def.filename.clone();
        self.samplers = samplers;
    }

    /// Assign a texture to a sampler slot. Slots not declared by the
    /// current shader are ignored.
    pub fn assign_texture(&mut self, slot: &str, texture: TextureSlot) {
        if let Some(entry) = self.samplers.get_mut(slot) {
            *entry = Some(texture);
        }
    }

    /// Clear a sampler slot.
    pub fn clear_texture(&mut self, slot: &str) {
        if let Some(entry) = self.samplers.get_mut(slot) {
            *entry = None;
        }
    }

    /// Iterate assigned slots in declaration order.
    pub fn assigned_slots(&self) -> impl Iterator<Item = (&str, &TextureSlot)> {
        self.samplers
            .iter()
            .filter_map(|(slot, tex)| tex.as_ref().map(|t| (slot.as_str(), t)))
    }
}

fn empty_samplers(def: &ShaderDef) -> IndexMap<String, Option<TextureSlot>> {
    def.sampler_slots()
        .map(|slot| (slot.to_string(), None))
        .collect()
}

/// Sanitize a name for use as a file stem and document identifier.
///
/// Keeps ASCII alphanumerics, `_` and `-`; everything else becomes `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
