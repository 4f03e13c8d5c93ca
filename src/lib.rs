//! # meshforge
//!
//! A pure-Rust pipeline that converts imported 3D models into
//! target-engine asset bundles: a strict XML scene document plus
//! DXT-compressed DDS textures.
//!
//! ## Pipeline stages
//!
//! - **Scene loading** - glTF/GLB files flattened into a narrow
//!   scene-graph surface ([`scene`])
//! - **Mesh extraction** - transforms baked, triangles partitioned by
//!   material, vertices deduplicated ([`extract`])
//! - **Texture codec** - DXT1/DXT5 block compression into single-mip
//!   DDS containers ([`texture`])
//! - **Document serialization** - the attribute-ordered scene document
//!   the external compiler consumes ([`document`])
//! - **Export orchestration** - sequencing, texture deduplication, and
//!   progress reporting ([`export`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshforge::catalog::ShaderCatalog;
//! use meshforge::export::{self, ExportOptions};
//! use std::path::Path;
//!
//! let catalog = ShaderCatalog::builtin();
//! let bundle = export::convert_model_file(
//!     Path::new("crate.glb"),
//!     &catalog,
//!     &ExportOptions::default(),
//!     None,
//! )?;
//! export::package_to_dir(&bundle, Path::new("out/"))?;
//! # Ok::<(), meshforge::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `meshforge` command-line binary

pub mod error;
pub mod catalog;
pub mod model;
pub mod scene;
pub mod extract;
pub mod texture;
pub mod document;
pub mod export;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::catalog::{ShaderCatalog, ShaderDef};
    pub use crate::model::{
        MaterialConfig, Mesh, Model, TextureEntry, TextureFormat, TextureSlot, sanitize_name,
    };
    pub use crate::extract::extract_model;
    pub use crate::texture::{CompressedTexture, compress_file, nearest_pow2};
    pub use crate::document::serialize_document;
    pub use crate::export::{
        AssetBundle, ExportOptions, ExportPhase, ExportProgress, convert_model_file, export_model,
        package_to_dir,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
