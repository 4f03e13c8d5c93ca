//! Texture codec
//!
//! Compresses raw images into DXT-compressed DDS containers for the
//! target engine. Sources are decoded to RGBA8, resized to power-of-two
//! dimensions, block-compressed ([`encode`]), and wrapped in a standard
//! single-mip DDS container. Files already in DDS form pass through
//! unchanged.

pub mod encode;

use std::path::Path;

use ddsfile::{D3DFormat, Dds, NewD3dParams};
use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::model::TextureFormat;

/// Largest output dimension per axis.
pub const MAX_DIMENSION: u32 = 4096;

/// Alpha values below this count as non-opaque for format selection.
pub const OPAQUE_ALPHA_THRESHOLD: u8 = 250;

/// A compressed texture ready for packaging: the full container bytes
/// plus the metadata the document serializer references.
#[derive(Debug, Clone)]
pub struct CompressedTexture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Compress a source image file into a DDS container.
///
/// A source that is already a DDS file passes through byte-for-byte,
/// with metadata read from its header.
///
/// # Errors
/// Returns [`Error::ImageDecodeError`] if the source cannot be read or
/// decoded.
pub fn compress_file(path: &Path, format_override: Option<TextureFormat>) -> Result<CompressedTexture> {
    let bytes = std::fs::read(path).map_err(|e| Error::ImageDecodeError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if bytes.starts_with(b"DDS ") {
        let (width, height, format) = read_container_info(&bytes)?;
        tracing::debug!(path = %path.display(), "DDS source passed through");
        return Ok(CompressedTexture {
            data: bytes,
            width,
            height,
            format,
        });
    }

    let image = image::load_from_memory(&bytes).map_err(|e| Error::ImageDecodeError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    compress_image(&image.to_rgba8(), format_override)
}

/// Compress a decoded RGBA image into a DDS container.
pub fn compress_image(
    image: &RgbaImage,
    format_override: Option<TextureFormat>,
) -> Result<CompressedTexture> {
    let width = nearest_pow2(image.width()).min(MAX_DIMENSION);
    let height = nearest_pow2(image.height()).min(MAX_DIMENSION);

    // Select the format from the decoded source pixels. The Lanczos
    // kernel can ring alpha below the opaque threshold at contrast
    // edges, and the choice must not depend on the resample.
    let format = format_override.unwrap_or_else(|| select_format(image));

    let resized;
    let pixels = if (width, height) == image.dimensions() {
        image
    } else {
        resized = image::imageops::resize(image, width, height, FilterType::Lanczos3);
        &resized
    };
    let blocks = encode::compress_blocks(pixels.as_raw(), width, height, format);
    let data = build_container(width, height, format, &blocks)?;

    Ok(CompressedTexture {
        data,
        width,
        height,
        format,
    })
}

/// Pick the compression mode by scanning the alpha channel: any texel
/// below the near-opaque threshold selects the alpha-capable mode.
#[must_use]
pub fn select_format(image: &RgbaImage) -> TextureFormat {
    let has_alpha = image
        .pixels()
        .any(|p| p.0[3] < OPAQUE_ALPHA_THRESHOLD);
    if has_alpha {
        TextureFormat::Dxt5
    } else {
        TextureFormat::Dxt1
    }
}

/// Round to a power of two: up to the next power, unless the value is
/// strictly closer to the lower power and that lower power is at least 4.
#[must_use]
pub fn nearest_pow2(n: u32) -> u32 {
    if n <= 1 {
        return 1;
    }
    let upper = n.next_power_of_two();
    if upper == n {
        return n;
    }
    let lower = upper / 2;
    if lower >= 4 && n - lower < upper - n {
        lower
    } else {
        upper
    }
}

/// Wrap a raw block stream in a single-mip DDS container.
fn build_container(width: u32, height: u32, format: TextureFormat, blocks: &[u8]) -> Result<Vec<u8>> {
    let d3d_format = match format {
        TextureFormat::Dxt1 => D3DFormat::DXT1,
        TextureFormat::Dxt5 => D3DFormat::DXT5,
    };

    let mut dds = Dds::new_d3d(NewD3dParams {
        height,
        width,
        depth: None,
        format: d3d_format,
        mipmap_levels: None,
        caps2: None,
    })
    .map_err(|e| Error::DdsCreateFailed {
        message: e.to_string(),
    })?;

    let data = dds.get_mut_data(0).map_err(|e| Error::DdsWriteFailed {
        message: format!("no DDS data layer: {e}"),
    })?;
    data.copy_from_slice(blocks);

    let mut output = Vec::new();
    dds.write(&mut output).map_err(|e| Error::DdsWriteFailed {
        message: e.to_string(),
    })?;

    Ok(output)
}

/// Read width/height/format back from a DDS container.
///
/// # Errors
/// Returns [`Error::DdsParseFailed`] for unreadable containers or
/// formats outside the two supported compression modes.
pub fn read_container_info(bytes: &[u8]) -> Result<(u32, u32, TextureFormat)> {
    let dds = Dds::read(&mut std::io::Cursor::new(bytes)).map_err(|e| Error::DdsParseFailed {
        message: e.to_string(),
    })?;

    let format = match dds.get_d3d_format() {
        Some(D3DFormat::DXT1) => TextureFormat::Dxt1,
        Some(D3DFormat::DXT5) => TextureFormat::Dxt5,
        other => {
            return Err(Error::DdsParseFailed {
                message: format!("unsupported container format: {other:?}"),
            });
        }
    };

    Ok((dds.get_width(), dds.get_height(), format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32, alpha: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, alpha])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn pow2_policy() {
        assert_eq!(nearest_pow2(258), 256); // closer to 256, lower >= 4
        assert_eq!(nearest_pow2(5), 4); // closer to 4, lower >= 4
        assert_eq!(nearest_pow2(3), 4); // lower is 2 < 4, must round up
        assert_eq!(nearest_pow2(256), 256);
        assert_eq!(nearest_pow2(300), 256);
        assert_eq!(nearest_pow2(400), 512);
        assert_eq!(nearest_pow2(1), 1);
    }

    #[test]
    fn opaque_image_selects_dxt1() {
        assert_eq!(select_format(&checker(8, 8, 255)), TextureFormat::Dxt1);
        // 250 is still within the near-opaque threshold
        assert_eq!(select_format(&checker(8, 8, 250)), TextureFormat::Dxt1);
    }

    #[test]
    fn translucent_pixel_selects_dxt5() {
        let mut img = checker(8, 8, 255);
        img.put_pixel(3, 3, image::Rgba([255, 255, 255, 100]));
        assert_eq!(select_format(&img), TextureFormat::Dxt5);
    }

    #[test]
    fn container_round_trip_metadata() {
        let compressed = compress_image(&checker(16, 16, 255), None).unwrap();
        let (w, h, format) = read_container_info(&compressed.data).unwrap();
        assert_eq!((w, h), (16, 16));
        assert_eq!(format, TextureFormat::Dxt1);
        assert_eq!(format, compressed.format);
    }

    #[test]
    fn non_pow2_source_is_rounded() {
        let compressed = compress_image(&checker(258, 5, 255), None).unwrap();
        assert_eq!((compressed.width, compressed.height), (256, 4));
        let (w, h, _) = read_container_info(&compressed.data).unwrap();
        assert_eq!((w, h), (256, 4));
    }

    #[test]
    fn format_selection_uses_source_pixels_not_resample() {
        // High-contrast fully opaque source at a non-pow2 size forces a
        // Lanczos resize; ringing there must not flip the format.
        let compressed = compress_image(&checker(37, 37, 255), None).unwrap();
        assert_eq!(compressed.format, TextureFormat::Dxt1);
    }

    #[test]
    fn format_override_wins() {
        let compressed =
            compress_image(&checker(8, 8, 255), Some(TextureFormat::Dxt5)).unwrap();
        assert_eq!(compressed.format, TextureFormat::Dxt5);
    }

    #[test]
    fn linear_size_matches_block_count() {
        let compressed = compress_image(&checker(16, 16, 0), None).unwrap();
        // 4x4 blocks of 16 bytes each for DXT5.
        let expected = 4 * 4 * compressed.format.block_size();
        let dds = Dds::read(&mut std::io::Cursor::new(&compressed.data)).unwrap();
        assert_eq!(dds.get_data(0).unwrap().len(), expected);
    }
}
