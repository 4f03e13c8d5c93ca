//! CLI command for full model conversion

use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::catalog::ShaderCatalog;
use crate::cli::progress::{self, CUBE, DISK, DOCUMENT, PICTURE};
use crate::export::{self, ExportOptions, ExportPhase, ExportProgress};
use crate::model::{MaterialConfig, TextureFormat};

pub fn execute(
    source: &Path,
    output: &Path,
    shader: Option<&str>,
    format: Option<TextureFormat>,
    quiet: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let catalog = ShaderCatalog::builtin();

    if !quiet {
        progress::print_step(1, 4, CUBE, &format!("Loading {}", source.display()));
    }
    let nodes = crate::scene::gltf_loader::load(source)
        .with_context(|| format!("failed to load {}", source.display()))?;

    let name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let model = crate::extract::extract_model(name, &nodes)?;

    let mut materials: Vec<MaterialConfig> = model
        .material_names
        .iter()
        .map(|name| MaterialConfig::new_default(name, &catalog))
        .collect();

    if let Some(filename) = shader {
        let def = catalog
            .get(filename)
            .with_context(|| format!("unknown shader '{filename}'"))?;
        for material in &mut materials {
            material.set_shader(def);
        }
    }

    if !quiet {
        progress::print_step(2, 4, PICTURE, "Compressing textures");
        progress::print_step(3, 4, DOCUMENT, "Serializing document");
    }

    let options = ExportOptions {
        format_override: format,
    };
    let bar = (!quiet).then(|| progress::texture_bar(0));
    let callback = |p: &ExportProgress| {
        if let Some(bar) = &bar {
            if p.phase == ExportPhase::CompressingTextures {
                bar.set_length(p.total as u64);
                bar.set_position(p.current as u64);
                if let Some(detail) = &p.detail {
                    bar.set_message(format!("Compressing {detail}"));
                }
            }
        }
    };

    let bundle = export::export_model(&model, &materials, &catalog, &options, Some(&callback))?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    if !quiet {
        progress::print_step(4, 4, DISK, &format!("Writing {}", output.display()));
    }
    export::package_to_dir(&bundle, output)?;

    if !quiet {
        println!(
            "  {} + {} texture(s)",
            bundle.document_name,
            bundle.textures.len()
        );
        progress::print_done(started.elapsed());
    }

    Ok(())
}
