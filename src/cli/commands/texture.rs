//! CLI command for single-texture compression

use std::path::Path;

use crate::model::TextureFormat;
use crate::texture;

pub fn execute(
    source: &Path,
    output: Option<&Path>,
    format: Option<TextureFormat>,
) -> anyhow::Result<()> {
    let compressed = texture::compress_file(source, format)?;

    let output = output.map_or_else(|| source.with_extension("dds"), Path::to_path_buf);
    std::fs::write(&output, &compressed.data)?;

    println!(
        "{} -> {} ({}x{}, {})",
        source.display(),
        output.display(),
        compressed.width,
        compressed.height,
        compressed.format
    );

    Ok(())
}
