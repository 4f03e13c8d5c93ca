//! Scene document serialization
//!
//! Renders a normalized [`Model`](crate::model::Model), its material
//! configurations, and the codec's texture entries into the strict XML
//! scene document the external offline compiler consumes. Section order,
//! attribute order, parameter order, and numeric formatting are all part
//! of the contract; none of it is cosmetic.

pub mod format;
mod writer;

use glam::Vec3;

use crate::error::{Error, Result};
use crate::catalog::ShaderCatalog;
use crate::model::{MaterialConfig, Model, TextureEntry};

pub use format::format_f32;

/// Fixed LOD switch distance written into the document header.
pub const LOD_DISTANCE: f32 = 1000.0;

/// Fixed LOD flags written into the document header.
pub const LOD_FLAGS: u32 = 0;

/// Global bounds computed over every vertex of every mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

/// Compute the axis-aligned bounding box and bounding sphere over all
/// mesh vertices. The sphere radius is the maximum distance from the
/// box center to any vertex, taken in a single global pass.
#[must_use]
pub fn compute_bounds(model: &Model) -> Bounds {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);

    for mesh in &model.meshes {
        for &p in &mesh.positions {
            let v = Vec3::from(p);
            min = min.min(v);
            max = max.max(v);
        }
    }

    if min.x > max.x {
        // No vertices at all; degenerate bounds at the origin.
        min = Vec3::ZERO;
        max = Vec3::ZERO;
    }

    let center = (min + max) * 0.5;
    let mut radius: f32 = 0.0;
    for mesh in &model.meshes {
        for &p in &mesh.positions {
            radius = radius.max(center.distance(Vec3::from(p)));
        }
    }

    Bounds {
        min,
        max,
        center,
        radius,
    }
}

/// Serialize the scene document.
///
/// # Errors
/// Returns [`Error::SerializationFailure`]; serialization errors are
/// fatal and abort the export.
pub fn serialize_document(
    model: &Model,
    materials: &[MaterialConfig],
    textures: &[TextureEntry],
    catalog: &ShaderCatalog,
) -> Result<String> {
    writer::serialize(model, materials, textures, catalog).map_err(|e| match e {
        Error::UnknownShader { .. } => e,
        other => Error::SerializationFailure {
            message: other.to_string(),
        },
    })
}
