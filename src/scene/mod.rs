//! Scene-graph boundary
//!
//! The extractor does not consume a loader's full object model. It sees
//! only this narrow surface: drawable nodes with a baked world transform,
//! flat attribute buffers, and per-group material references. The glTF
//! adapter in [`gltf_loader`] maps real input files onto it; tests build
//! instances directly.

pub mod gltf_loader;

use glam::Mat4;

/// Reference to a source material as the loader saw it.
///
/// `key` identifies the material across nodes (loader-assigned); `name`
/// is its explicit name when the source file carried one. Two groups with
/// the same `key` share one material even when unnamed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialRef {
    pub key: Option<usize>,
    pub name: Option<String>,
}

/// One material-homogeneous triangle group within a geometry.
///
/// `indices` is `None` when the source stored unindexed triangles; the
/// extractor then synthesizes an identity index over
/// `vertex_start..vertex_start + vertex_count`.
#[derive(Debug, Clone, Default)]
pub struct GeometryGroup {
    pub material: MaterialRef,
    pub indices: Option<Vec<u32>>,
    pub vertex_start: u32,
    pub vertex_count: u32,
}

/// Flat geometry buffers for one drawable node.
///
/// A geometry with N materials carries N groups over one shared set of
/// vertex buffers. `normals` is `None` when any part of the source lacked
/// them (the extractor recomputes from face windings); `uvs` and `colors`
/// are `None` only when no part of the source had them.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub groups: Vec<GeometryGroup>,
}

/// A drawable node: local geometry plus its accumulated world transform.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Mat4,
    pub geometry: Geometry,
}
