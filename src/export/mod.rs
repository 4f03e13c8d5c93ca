//! Export orchestration
//!
//! Sequences the full conversion: compress every referenced texture
//! (deduplicated by sanitized source name), serialize the scene
//! document, and hand the resulting bundle to packaging. Per-texture
//! decode failures are logged and skipped; serialization failures abort
//! the export with no partial output.

pub mod progress;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::catalog::ShaderCatalog;
use crate::document;
use crate::error::Result;
use crate::model::{MaterialConfig, Model, TextureEntry, TextureFormat, sanitize_name};
use crate::texture::{self, CompressedTexture};

pub use progress::{ExportPhase, ExportProgress, ExportProgressCallback};

/// Options controlling an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Force every texture into one compression mode instead of
    /// selecting by alpha scan.
    pub format_override: Option<TextureFormat>,
}

/// One compressed texture container ready for delivery.
#[derive(Debug, Clone)]
pub struct TextureFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// The finished asset bundle handed to external packaging.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    /// Document file name (`<sanitized model name>.xml`).
    pub document_name: String,
    /// The serialized scene document.
    pub document: String,
    /// Compressed texture containers, one per unique source.
    pub textures: Vec<TextureFile>,
}

/// Run the export pipeline over an immutable snapshot of the model and
/// material state.
///
/// # Errors
/// Returns [`Error::SerializationFailure`](crate::Error::SerializationFailure) if the document cannot be
/// serialized. Texture failures are recoverable: the texture is logged,
/// omitted from the bundle, and its slots serialize as unassigned.
pub fn export_model(
    model: &Model,
    materials: &[MaterialConfig],
    catalog: &ShaderCatalog,
    options: &ExportOptions,
    progress: Option<ExportProgressCallback<'_>>,
) -> Result<AssetBundle> {
    let report = |update: ExportProgress| {
        if let Some(callback) = progress {
            callback(&update);
        }
    };

    // Unique sources by sanitized name, first seen path wins, plus the
    // unique (name, slot) pairs the document references. Both keep
    // first-appearance order across materials.
    let mut sources: IndexMap<String, PathBuf> = IndexMap::new();
    let mut references: Vec<(String, String)> = Vec::new();
    for material in materials {
        for (slot, assigned) in material.assigned_slots() {
            let name = assigned.sanitized_name();
            sources
                .entry(name.clone())
                .or_insert_with(|| assigned.source.clone());
            let pair = (name, slot.to_string());
            if !references.contains(&pair) {
                references.push(pair);
            }
        }
    }

    // Compress each unique source once; failures are non-fatal.
    let total = sources.len();
    let mut compressed: IndexMap<String, CompressedTexture> = IndexMap::new();
    for (i, (name, source)) in sources.iter().enumerate() {
        report(ExportProgress::with_detail(
            ExportPhase::CompressingTextures,
            i + 1,
            total,
            name.clone(),
        ));

        match texture::compress_file(source, options.format_override) {
            Ok(result) => {
                compressed.insert(name.clone(), result);
            }
            Err(e) => {
                tracing::warn!(
                    texture = %name,
                    source = %source.display(),
                    error = %e,
                    "texture compression failed, omitting from bundle"
                );
            }
        }
    }

    let entries: Vec<TextureEntry> = references
        .iter()
        .filter_map(|(name, slot)| {
            compressed.get(name).map(|tex| TextureEntry {
                name: name.clone(),
                slot: slot.clone(),
                width: tex.width,
                height: tex.height,
                format: tex.format,
                file_name: format!("{name}.dds"),
            })
        })
        .collect();

    report(ExportProgress::new(ExportPhase::SerializingDocument, 0, 1));
    let document = document::serialize_document(model, materials, &entries, catalog)?;

    let textures = compressed
        .into_iter()
        .map(|(name, tex)| TextureFile {
            file_name: format!("{name}.dds"),
            data: tex.data,
        })
        .collect();

    report(ExportProgress::new(ExportPhase::Complete, 1, 1));

    Ok(AssetBundle {
        document_name: format!("{}.xml", sanitize_name(&model.name)),
        document,
        textures,
    })
}

/// Full pipeline over a model file: load, extract, default material
/// configurations, export.
///
/// # Errors
/// Propagates [`Error::UnsupportedInputFormat`](crate::Error::UnsupportedInputFormat), [`Error::NoGeometryFound`](crate::Error::NoGeometryFound),
/// and [`Error::SerializationFailure`](crate::Error::SerializationFailure).
pub fn convert_model_file(
    input: &Path,
    catalog: &ShaderCatalog,
    options: &ExportOptions,
    progress: Option<ExportProgressCallback<'_>>,
) -> Result<AssetBundle> {
    let nodes = crate::scene::gltf_loader::load(input)?;
    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let model = crate::extract::extract_model(name, &nodes)?;

    let materials: Vec<MaterialConfig> = model
        .material_names
        .iter()
        .map(|name| MaterialConfig::new_default(name, catalog))
        .collect();

    export_model(&model, &materials, catalog, options, progress)
}

/// Write a bundle's document and texture containers into a directory,
/// which is created if missing. Archiving and delivery sit beyond this
/// boundary.
///
/// # Errors
/// Returns an IO error if any file cannot be written.
pub fn package_to_dir(bundle: &AssetBundle, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(&bundle.document_name), &bundle.document)?;
    for texture in &bundle.textures {
        std::fs::write(dir.join(&texture.file_name), &texture.data)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, TextureSlot};
    use std::sync::Mutex;

    fn test_model() -> Model {
        Model {
            name: "box model".to_string(),
            meshes: vec![Mesh {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                uvs: vec![[0.0, 0.0]; 3],
                colors: None,
                indices: vec![0, 1, 2],
                material_index: 0,
            }],
            material_names: vec!["m".to_string()],
        }
    }

    #[test]
    fn missing_texture_is_skipped_not_fatal() {
        let catalog = ShaderCatalog::builtin();
        let model = test_model();
        let mut config = MaterialConfig::new_default("m", &catalog);
        config.assign_texture(
            "baseMap",
            TextureSlot {
                source: PathBuf::from("/nonexistent/missing.png"),
                width: 8,
                height: 8,
            },
        );

        let bundle =
            export_model(&model, &[config], &catalog, &ExportOptions::default(), None).unwrap();
        assert!(bundle.textures.is_empty());
        // Slot serializes as unassigned.
        assert!(bundle
            .document
            .contains(r#"<textureParam param="baseTexture" name="" file=""/>"#));
    }

    #[test]
    fn shared_source_is_compressed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.png");
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([128, 64, 32, 255]));
        img.save(&path).unwrap();

        let catalog = ShaderCatalog::builtin();
        let model = Model {
            material_names: vec!["a".to_string(), "b".to_string()],
            ..test_model()
        };
        let slot = TextureSlot {
            source: path,
            width: 8,
            height: 8,
        };
        let mut a = MaterialConfig::new_default("a", &catalog);
        a.assign_texture("baseMap", slot.clone());
        let mut b = MaterialConfig::new_default("b", &catalog);
        b.assign_texture("baseMap", slot);

        let bundle =
            export_model(&model, &[a, b], &catalog, &ExportOptions::default(), None).unwrap();
        assert_eq!(bundle.textures.len(), 1);
        assert_eq!(bundle.textures[0].file_name, "shared.dds");
        // Both shaders still reference the single entry.
        assert_eq!(bundle.document.matches("file=\"shared.dds\"").count(), 3);
    }

    #[test]
    fn progress_events_cover_all_phases() {
        let catalog = ShaderCatalog::builtin();
        let model = test_model();
        let materials = vec![MaterialConfig::new_default("m", &catalog)];

        let phases = Mutex::new(Vec::new());
        let callback: ExportProgressCallback<'_> = &|p: &ExportProgress| {
            phases.lock().unwrap().push(p.phase);
        };

        export_model(
            &model,
            &materials,
            &catalog,
            &ExportOptions::default(),
            Some(callback),
        )
        .unwrap();

        let phases = phases.into_inner().unwrap();
        assert_eq!(
            phases,
            vec![ExportPhase::SerializingDocument, ExportPhase::Complete]
        );
    }

    #[test]
    fn bundle_document_name_is_sanitized() {
        let catalog = ShaderCatalog::builtin();
        let model = test_model();
        let materials = vec![MaterialConfig::new_default("m", &catalog)];
        let bundle =
            export_model(&model, &materials, &catalog, &ExportOptions::default(), None).unwrap();
        assert_eq!(bundle.document_name, "box_model.xml");
    }

    #[test]
    fn package_writes_document_and_textures() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = AssetBundle {
            document_name: "m.xml".to_string(),
            document: "<model/>".to_string(),
            textures: vec![TextureFile {
                file_name: "t.dds".to_string(),
                data: vec![1, 2, 3],
            }],
        };

        package_to_dir(&bundle, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("m.xml")).unwrap(),
            "<model/>"
        );
        assert_eq!(std::fs::read(dir.path().join("t.dds")).unwrap(), [1, 2, 3]);
    }
}
