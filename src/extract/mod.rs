//! Mesh extraction
//!
//! Normalizes an arbitrary scene graph into a flat, material-partitioned
//! [`Model`]: world transforms baked into the vertex data, missing indices
//! and normals synthesized, triangles partitioned by material, and each
//! partition's vertices deduplicated into first-appearance order.

use std::collections::HashMap;

use glam::{Mat3, Mat4, Vec3};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::{Mesh, Model};
use crate::scene::{MaterialRef, SceneNode};

/// How a source material is identified while registering names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MaterialIdentity {
    Name(String),
    Key(usize),
    Anonymous,
}

impl MaterialIdentity {
    fn of(material: &MaterialRef) -> Self {
        if let Some(name) = &material.name {
            Self::Name(name.clone())
        } else if let Some(key) = material.key {
            Self::Key(key)
        } else {
            Self::Anonymous
        }
    }
}

/// First-seen material name registry shared across the whole scene.
#[derive(Debug, Default)]
struct MaterialRegistry {
    names: Vec<String>,
    by_identity: HashMap<MaterialIdentity, usize>,
}

impl MaterialRegistry {
    /// Register a material (idempotent) and return its index.
    ///
    /// Unnamed materials get a synthetic `Material_<ordinal>` name, with
    /// the ordinal fixed by registration order.
    fn register(&mut self, material: &MaterialRef) -> usize {
        let identity = MaterialIdentity::of(material);
        if let Some(&index) = self.by_identity.get(&identity) {
            return index;
        }

        let index = self.names.len();
        let name = material
            .name
            .clone()
            .unwrap_or_else(|| format!("Material_{index}"));
        self.names.push(name);
        self.by_identity.insert(identity, index);
        index
    }
}

/// Flatten a scene graph into a [`Model`].
///
/// # Errors
/// Returns [`Error::NoGeometryFound`] when the scene has no drawable nodes
/// or every partition resolves to zero triangles, and
/// [`Error::UnsupportedInputFormat`] when a group's indices fall outside
/// the node's vertex buffer.
pub fn extract_model(name: impl Into<String>, nodes: &[SceneNode]) -> Result<Model> {
    let mut registry = MaterialRegistry::default();
    let mut meshes = Vec::new();

    for node in nodes {
        extract_node(node, &mut registry, &mut meshes)?;
    }

    if meshes.is_empty() {
        return Err(Error::NoGeometryFound);
    }

    // A model is expected to carry at least one material name even when
    // the scene declared none; the entry is informational and never
    // referenced by a mesh index.
    if registry.names.is_empty() {
        registry.names.push("default".to_string());
    }

    tracing::debug!(
        meshes = meshes.len(),
        materials = registry.names.len(),
        "extracted model"
    );

    Ok(Model {
        name: name.into(),
        meshes,
        material_names: registry.names,
    })
}

fn extract_node(
    node: &SceneNode,
    registry: &mut MaterialRegistry,
    meshes: &mut Vec<Mesh>,
) -> Result<()> {
    let geometry = &node.geometry;
    if geometry.positions.is_empty() || geometry.groups.is_empty() {
        return Ok(());
    }

    // Bake the world transform so the output lives in one global space.
    let positions: Vec<[f32; 3]> = geometry
        .positions
        .iter()
        .map(|&p| node.transform.transform_point3(Vec3::from(p)).to_array())
        .collect();

    // Resolve each group's index list, synthesizing an identity index for
    // unindexed groups so everything downstream can assume indexed data.
    let group_indices: Vec<Vec<u32>> = geometry
        .groups
        .iter()
        .map(|group| {
            group.indices.clone().unwrap_or_else(|| {
                (group.vertex_start..group.vertex_start + group.vertex_count).collect()
            })
        })
        .collect();

    // Index values come straight from the source file and are used for
    // direct buffer access below, so range-check them first.
    let vertex_count = positions.len() as u32;
    for indices in &group_indices {
        if let Some(&bad) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::UnsupportedInputFormat {
                message: format!(
                    "node '{}': index {bad} out of range for {vertex_count} vertices",
                    node.name
                ),
            });
        }
    }

    let normals = match &geometry.normals {
        Some(source) => bake_normals(node.transform, source),
        None => compute_vertex_normals(&positions, &group_indices),
    };

    // Partition triangles by material, in first-seen material order.
    // Several groups may share one material; their triangles concatenate
    // in group order.
    let mut partitions: IndexMap<usize, Vec<u32>> = IndexMap::new();
    for (group, indices) in geometry.groups.iter().zip(&group_indices) {
        let material_index = registry.register(&group.material);
        let partition = partitions.entry(material_index).or_default();
        partition.extend(indices.iter().copied().take(indices.len() - indices.len() % 3));
    }

    for (material_index, indices) in partitions {
        if indices.is_empty() {
            continue;
        }
        meshes.push(build_partition_mesh(
            material_index,
            &indices,
            &positions,
            &normals,
            geometry.uvs.as_deref(),
            geometry.colors.as_deref(),
        ));
    }

    Ok(())
}

/// Transform normals by the inverse-transpose of the world matrix and
/// renormalize.
fn bake_normals(transform: Mat4, normals: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
    normals
        .iter()
        .map(|&n| {
            (normal_matrix * Vec3::from(n))
                .normalize_or_zero()
                .to_array()
        })
        .collect()
}

/// Per-vertex normals from face windings, area-weighted. Vertices with a
/// degenerate accumulated normal fall back to +Z.
fn compute_vertex_normals(positions: &[[f32; 3]], group_indices: &[Vec<u32>]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for indices in group_indices {
        for tri in indices.chunks_exact(3) {
            let a = Vec3::from(positions[tri[0] as usize]);
            let b = Vec3::from(positions[tri[1] as usize]);
            let c = Vec3::from(positions[tri[2] as usize]);
            // Unnormalized cross product weights by twice the face area.
            let face = (b - a).cross(c - a);
            for &i in tri {
                accum[i as usize] += face;
            }
        }
    }

    accum
        .into_iter()
        .map(|n| {
            if n.length_squared() > f32::EPSILON {
                n.normalize().to_array()
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

/// Deduplicate one partition's vertices and emit its [`Mesh`].
///
/// The triangle index walk assigns each first-seen original vertex the
/// next local index, so the output vertex order is first-appearance order.
fn build_partition_mesh(
    material_index: usize,
    indices: &[u32],
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: Option<&[[f32; 2]]>,
    colors: Option<&[[f32; 4]]>,
) -> Mesh {
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut mesh = Mesh {
        material_index,
        colors: colors.map(|_| Vec::new()),
        ..Mesh::default()
    };

    for &original in indices {
        let next = mesh.positions.len() as u32;
        let local = *remap.entry(original).or_insert_with(|| {
            let i = original as usize;
            mesh.positions.push(positions[i]);
            mesh.normals.push(normals[i]);
            mesh.uvs.push(uvs.map_or([0.0, 0.0], |u| u[i]));
            if let (Some(out), Some(src)) = (mesh.colors.as_mut(), colors) {
                out.push(src[i]);
            }
            next
        });
        mesh.indices.push(local);
    }

    mesh
}
