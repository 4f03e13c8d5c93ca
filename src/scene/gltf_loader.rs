//! glTF scene adapter
//!
//! Loads glTF/GLB files and flattens the node hierarchy into the narrow
//! [`SceneNode`](super::SceneNode) surface the extractor consumes. World
//! transforms are accumulated top-down so downstream stages never look at
//! the hierarchy again.

use std::path::Path;

use glam::Mat4;

use super::{Geometry, GeometryGroup, MaterialRef, SceneNode};
use crate::error::{Error, Result};

/// Load a glTF or GLB file into flat scene nodes.
///
/// # Errors
/// Returns [`Error::UnsupportedInputFormat`] if the file cannot be parsed.
pub fn load(path: &Path) -> Result<Vec<SceneNode>> {
    let (document, buffers, _images) =
        gltf::import(path).map_err(|e| Error::UnsupportedInputFormat {
            message: format!("failed to load glTF: {e}"),
        })?;

    flatten(&document, &buffers)
}

/// Load from glTF/GLB bytes already in memory.
///
/// # Errors
/// Returns [`Error::UnsupportedInputFormat`] if the data cannot be parsed.
pub fn load_from_bytes(data: &[u8]) -> Result<Vec<SceneNode>> {
    let (document, buffers, _images) =
        gltf::import_slice(data).map_err(|e| Error::UnsupportedInputFormat {
            message: format!("failed to load glTF: {e}"),
        })?;

    flatten(&document, &buffers)
}

fn flatten(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<Vec<SceneNode>> {
    let mut nodes = Vec::new();

    // Walk the default scene if one is declared, otherwise every scene in
    // document order. Traversal order is stable, which keeps repeated runs
    // byte-identical downstream.
    if let Some(scene) = document.default_scene() {
        for root in scene.nodes() {
            visit_node(&root, Mat4::IDENTITY, buffers, &mut nodes)?;
        }
    } else {
        for scene in document.scenes() {
            for root in scene.nodes() {
                visit_node(&root, Mat4::IDENTITY, buffers, &mut nodes)?;
            }
        }
    }

    Ok(nodes)
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SceneNode>,
) -> Result<()> {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or_else(|| node.name())
            .unwrap_or("node")
            .to_string();

        if let Some(geometry) = load_geometry(&mesh, buffers)? {
            out.push(SceneNode {
                name,
                transform: world,
                geometry,
            });
        }
    }

    for child in node.children() {
        visit_node(&child, world, buffers, out)?;
    }

    Ok(())
}

/// Merge a mesh's triangle primitives into one geometry with one group
/// per primitive, sharing a single set of vertex buffers.
fn load_geometry(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
) -> Result<Option<Geometry>> {
    let mut geometry = Geometry::default();
    let mut all_have_normals = true;
    let mut any_has_uvs = false;
    let mut any_has_colors = false;

    // First pass over primitives to learn attribute availability, so the
    // merged buffers get consistent defaults.
    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        if reader.read_positions().is_none() {
            continue;
        }
        all_have_normals &= reader.read_normals().is_some();
        any_has_uvs |= reader.read_tex_coords(0).is_some();
        any_has_colors |= reader.read_colors(0).is_some();
        primitives.push(primitive);
    }

    if primitives.is_empty() {
        return Ok(None);
    }

    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut colors: Vec<[f32; 4]> = Vec::new();

    for primitive in &primitives {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| Error::UnsupportedInputFormat {
                message: "glTF primitive missing positions".to_string(),
            })?
            .collect();
        let vertex_start = geometry.positions.len() as u32;
        let vertex_count = positions.len() as u32;

        if all_have_normals {
            if let Some(iter) = reader.read_normals() {
                normals.extend(iter);
            }
        }
        if any_has_uvs {
            match reader.read_tex_coords(0) {
                Some(iter) => uvs.extend(iter.into_f32()),
                None => uvs.extend(std::iter::repeat([0.0, 0.0]).take(positions.len())),
            }
        }
        if any_has_colors {
            match reader.read_colors(0) {
                Some(iter) => colors.extend(iter.into_rgba_f32()),
                None => {
                    colors.extend(std::iter::repeat([1.0, 1.0, 1.0, 1.0]).take(positions.len()));
                }
            }
        }

        let indices: Option<Vec<u32>> = reader
            .read_indices()
            .map(|iter| iter.into_u32().map(|i| i + vertex_start).collect());

        let material = primitive.material();
        geometry.groups.push(GeometryGroup {
            material: MaterialRef {
                key: material.index(),
                name: material.name().map(str::to_string),
            },
            indices,
            vertex_start,
            vertex_count,
        });
        geometry.positions.extend(positions);
    }

    geometry.normals = all_have_normals.then_some(normals);
    geometry.uvs = any_has_uvs.then_some(uvs);
    geometry.colors = any_has_colors.then_some(colors);

    Ok(Some(geometry))
}
