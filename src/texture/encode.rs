//! DXT block compression
//!
//! Fixed-ratio compression over 4x4 texel tiles: DXT1 (8 bytes, opaque)
//! and DXT5 (16 bytes, interpolated alpha). Tiles are independent, so
//! block rows are compressed in parallel; each row writes to a fixed
//! output offset, keeping the result deterministic.

use rayon::prelude::*;

use crate::model::TextureFormat;

/// Compress an RGBA8 buffer into a raw DXT block stream.
#[must_use]
pub fn compress_blocks(pixels: &[u8], width: u32, height: u32, format: TextureFormat) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();

    let mut output = vec![0u8; blocks_x * blocks_y * block_size];

    output
        .par_chunks_mut(blocks_x * block_size)
        .enumerate()
        .for_each(|(by, row)| {
            for bx in 0..blocks_x {
                let block = extract_block(pixels, width, height, bx * 4, by * 4);
                let out = &mut row[bx * block_size..(bx + 1) * block_size];
                match format {
                    TextureFormat::Dxt1 => {
                        out.copy_from_slice(&encode_dxt1_block(&block));
                    }
                    TextureFormat::Dxt5 => {
                        out[0..8].copy_from_slice(&encode_alpha_block(&block));
                        out[8..16].copy_from_slice(&encode_dxt1_block(&block));
                    }
                }
            }
        });

    output
}

/// Extract a 4x4 block of RGBA texels, clamping out-of-bounds reads to
/// the last valid row/column.
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];

    for py in 0..4 {
        for px in 0..4 {
            let sx = (x + px).min(width - 1);
            let sy = (y + py).min(height - 1);
            let src = (sy * width + sx) * 4;
            block[py * 4 + px].copy_from_slice(&pixels[src..src + 4]);
        }
    }

    block
}

/// Encode a 4x4 block to DXT1 (8 bytes).
fn encode_dxt1_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let (c0, c1) = find_color_endpoints(block);

    // Packed high color must not compare below the low color, or the
    // decoder switches to the 3-color + transparent mode.
    let (c0, c1) = if c0 >= c1 { (c0, c1) } else { (c1, c0) };

    let palette = dxt1_palette(c0, c1);

    // 2-bit indices, texel 0 in the least-significant bits.
    let mut indices: u32 = 0;
    for (i, texel) in block.iter().enumerate() {
        indices |= u32::from(find_closest_color(texel, &palette)) << (i * 2);
    }

    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

/// Channel-wise RGB bounding box over the block, inset by
/// `(max - min) >> 4` per channel toward the center, packed 5:6:5.
/// Returns (packed max, packed min).
fn find_color_endpoints(block: &[[u8; 4]; 16]) -> (u16, u16) {
    let mut min = [255u8; 3];
    let mut max = [0u8; 3];

    for texel in block {
        for c in 0..3 {
            min[c] = min[c].min(texel[c]);
            max[c] = max[c].max(texel[c]);
        }
    }

    for c in 0..3 {
        let inset = (max[c] - min[c]) >> 4;
        min[c] += inset;
        max[c] -= inset;
    }

    (
        rgb_to_565(max[0], max[1], max[2]),
        rgb_to_565(min[0], min[1], min[2]),
    )
}

/// Convert RGB888 to RGB565.
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    (r5 << 11) | (g6 << 5) | b5
}

/// Expand RGB565 back to RGB888 (bit-replicated low bits).
pub fn rgb_from_565(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1F) as u8;
    let g6 = ((c >> 5) & 0x3F) as u8;
    let b5 = (c & 0x1F) as u8;
    [
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
    ]
}

/// Four-color DXT1 palette: the two endpoints plus 2/3-1/3 and 1/3-2/3
/// interpolated midpoints.
fn dxt1_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let a = rgb_from_565(c0);
    let b = rgb_from_565(c1);
    let mix = |x: u8, y: u8| (((2 * u16::from(x)) + u16::from(y)) / 3) as u8;
    [
        a,
        b,
        [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])],
        [mix(b[0], a[0]), mix(b[1], a[1]), mix(b[2], a[2])],
    ]
}

/// Nearest palette entry by squared Euclidean distance in RGB.
fn find_closest_color(texel: &[u8; 4], palette: &[[u8; 3]; 4]) -> u8 {
    let mut best = 0u8;
    let mut best_dist = u32::MAX;

    for (i, color) in palette.iter().enumerate() {
        let dr = i32::from(texel[0]) - i32::from(color[0]);
        let dg = i32::from(texel[1]) - i32::from(color[1]);
        let db = i32::from(texel[2]) - i32::from(color[2]);
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i as u8;
        }
    }

    best
}

/// Encode the DXT5 alpha block (8 bytes): max/min endpoint bytes, then
/// 16 3-bit ramp indices packed into 48 bits, texel 0 lowest.
fn encode_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let mut min = 255u8;
    let mut max = 0u8;
    for texel in block {
        min = min.min(texel[3]);
        max = max.max(texel[3]);
    }

    let ramp = alpha_ramp(max, min);

    let mut indices: u64 = 0;
    if max > min {
        for (i, texel) in block.iter().enumerate() {
            indices |= u64::from(find_closest_alpha(texel[3], &ramp)) << (i * 3);
        }
    }
    // max == min: degenerate ramp, every index stays 0 (endpoint a0).

    let mut output = [0u8; 8];
    output[0] = max;
    output[1] = min;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[0..6]);
    output
}

/// Seven-step interpolated alpha ramp for the a0 > a1 mode.
fn alpha_ramp(a0: u8, a1: u8) -> [u8; 8] {
    let (a0w, a1w) = (u16::from(a0), u16::from(a1));
    [
        a0,
        a1,
        ((6 * a0w + a1w) / 7) as u8,
        ((5 * a0w + 2 * a1w) / 7) as u8,
        ((4 * a0w + 3 * a1w) / 7) as u8,
        ((3 * a0w + 4 * a1w) / 7) as u8,
        ((2 * a0w + 5 * a1w) / 7) as u8,
        ((a0w + 6 * a1w) / 7) as u8,
    ]
}

fn find_closest_alpha(alpha: u8, ramp: &[u8; 8]) -> u8 {
    let mut best = 0u8;
    let mut best_dist = i32::MAX;

    for (i, &step) in ramp.iter().enumerate() {
        let dist = (i32::from(alpha) - i32::from(step)).abs();
        if dist < best_dist {
            best_dist = dist;
            best = i as u8;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_block(rgba: [u8; 4]) -> [[u8; 4]; 16] {
        [rgba; 16]
    }

    #[test]
    fn rgb_565_round_trip_extremes() {
        assert_eq!(rgb_to_565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb_to_565(0, 0, 0), 0x0000);
        assert_eq!(rgb_from_565(0xFFFF), [255, 255, 255]);
        assert_eq!(rgb_from_565(0xF800), [255, 0, 0]);
    }

    #[test]
    fn solid_color_block_has_equal_endpoints() {
        let encoded = encode_dxt1_block(&solid_block([255, 0, 0, 255]));
        let c0 = u16::from_le_bytes([encoded[0], encoded[1]]);
        let c1 = u16::from_le_bytes([encoded[2], encoded[3]]);
        assert_eq!(c0, c1);
        // All texels pick index 0 (the first endpoint).
        assert_eq!(&encoded[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn endpoints_are_ordered_for_four_color_mode() {
        let mut block = solid_block([10, 10, 10, 255]);
        block[5] = [240, 240, 240, 255];
        let encoded = encode_dxt1_block(&block);
        let c0 = u16::from_le_bytes([encoded[0], encoded[1]]);
        let c1 = u16::from_le_bytes([encoded[2], encoded[3]]);
        assert!(c0 >= c1);
    }

    #[test]
    fn endpoint_inset_tightens_the_box() {
        let mut block = solid_block([0, 0, 0, 255]);
        block[0] = [255, 255, 255, 255];
        let encoded = encode_dxt1_block(&block);
        let c0 = u16::from_le_bytes([encoded[0], encoded[1]]);
        // (255 - 0) >> 4 == 15, so the high endpoint drops to 240.
        assert_eq!(rgb_from_565(c0)[0], rgb_from_565(rgb_to_565(240, 240, 240))[0]);
    }

    #[test]
    fn degenerate_alpha_block_keeps_zero_indices() {
        let encoded = encode_alpha_block(&solid_block([0, 0, 0, 128]));
        assert_eq!(encoded[0], 128);
        assert_eq!(encoded[1], 128);
        assert_eq!(&encoded[2..8], &[0u8; 6]);
    }

    #[test]
    fn alpha_indices_span_the_ramp() {
        let mut block = solid_block([0, 0, 0, 0]);
        for (i, texel) in block.iter_mut().enumerate() {
            texel[3] = (i * 17) as u8;
        }
        let encoded = encode_alpha_block(&block);
        assert_eq!(encoded[0], 255);
        assert_eq!(encoded[1], 0);

        // Texel 0 has alpha 0 == a1, which lives at ramp index 1.
        let first_index = encoded[2] & 0b111;
        assert_eq!(first_index, 1);
    }

    #[test]
    fn block_stream_sizes() {
        let pixels = vec![255u8; 8 * 8 * 4];
        assert_eq!(compress_blocks(&pixels, 8, 8, TextureFormat::Dxt1).len(), 4 * 8);
        assert_eq!(compress_blocks(&pixels, 8, 8, TextureFormat::Dxt5).len(), 4 * 16);
        // Edge tiles clamp; a 5x5 image still needs 2x2 blocks.
        let pixels = vec![255u8; 5 * 5 * 4];
        assert_eq!(compress_blocks(&pixels, 5, 5, TextureFormat::Dxt1).len(), 4 * 8);
    }
}
