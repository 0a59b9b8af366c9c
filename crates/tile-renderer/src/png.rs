//! PNG encoding for tile output.
//!
//! A minimal encoder on `flate2` + `crc32fast`: 8-bit RGB (color type 2)
//! or RGBA (color type 6), no interlacing, filter 0 on every row. Mosaic
//! tiles rarely benefit from fancier filtering and this keeps the encoder
//! dependency-free beyond the compressor.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use mosaic_common::{MosaicError, MosaicResult};
use std::io::Write;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// PNG color layout of the input pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColor {
    /// 3 bytes per pixel, color type 2.
    Rgb,
    /// 4 bytes per pixel, color type 6.
    Rgba,
}

impl PngColor {
    fn bytes_per_pixel(&self) -> usize {
        match self {
            PngColor::Rgb => 3,
            PngColor::Rgba => 4,
        }
    }

    fn color_type(&self) -> u8 {
        match self {
            PngColor::Rgb => 2,
            PngColor::Rgba => 6,
        }
    }
}

/// Encode a pixel buffer as a PNG.
pub fn create_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    color: PngColor,
) -> MosaicResult<Vec<u8>> {
    let bpp = color.bytes_per_pixel();
    let expected = (width as usize) * (height as usize) * bpp;
    if pixels.len() != expected {
        return Err(MosaicError::render(format!(
            "PNG buffer is {} bytes, expected {} for {}x{} {:?}",
            pixels.len(),
            expected,
            width,
            height,
            color
        )));
    }

    let mut out = Vec::with_capacity(expected / 4 + 64);
    out.extend_from_slice(&PNG_SIGNATURE);

    // IHDR: dimensions, 8-bit depth, color type, no interlace.
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, color.color_type(), 0, 0, 0]);
    write_chunk(&mut out, b"IHDR", &ihdr);

    // IDAT: zlib stream of rows, each prefixed with filter byte 0.
    let row_bytes = (width as usize) * bpp;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    for row in pixels.chunks_exact(row_bytes) {
        encoder
            .write_all(&[0])
            .and_then(|_| encoder.write_all(row))
            .map_err(|e| MosaicError::render(format!("PNG compression failed: {}", e)))?;
    }
    let idat = encoder
        .finish()
        .map_err(|e| MosaicError::render(format!("PNG compression failed: {}", e)))?;
    write_chunk(&mut out, b"IDAT", &idat);

    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}
