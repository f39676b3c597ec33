//! # Raster Loading and Decoding
//!
//! Prepares logo, signature, and photo bytes for PDF embedding. JPEG images
//! pass through without re-encoding (the PDF spec supports DCTDecode
//! natively). PNG images are decoded to RGB pixels with a separate alpha
//! channel for SMask transparency.
//!
//! Every attachment is capped at 2MB before any decoding happens — embedded
//! rasters live inside single-page business documents, not photo albums.

use std::io::Cursor;

/// Maximum accepted size for a single raster attachment.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF writer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes — embed directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Decode raw raster bytes for embedding.
///
/// Detection goes by magic bytes: PNG is decoded to pixels, JPEG passes
/// through. When neither signature matches, a guessed-format decode is
/// attempted as a fallback before giving up.
pub fn load_raster(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() > MAX_IMAGE_BYTES {
        return Err(format!(
            "image is {} bytes, exceeding the {}MB attachment limit",
            data.len(),
            MAX_IMAGE_BYTES / (1024 * 1024)
        ));
    }
    if data.len() < 4 {
        return Err("image data too short".to_string());
    }

    if is_png(data) {
        decode_png(data)
    } else if is_jpeg(data) {
        decode_jpeg(data)
    } else {
        // Unknown signature — let the decoder guess before rejecting.
        decode_guessed(data)
    }
}

/// Extract the raw bytes of a `data:image/...;base64,...` URI (brand logos
/// arrive this way from the CLI and some tenant configurations). The bytes
/// still go through [`load_raster`] at embed time.
pub fn data_uri_bytes(src: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let comma_pos = src
        .find(',')
        .ok_or_else(|| "invalid data URI: missing comma".to_string())?;
    base64::engine::general_purpose::STANDARD
        .decode(&src[comma_pos + 1..])
        .map_err(|e| format!("base64 decode error: {}", e))
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

/// JPEG: read dimensions and color space without decoding pixels.
/// The raw JPEG bytes are passed through to the PDF (DCTDecode).
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("JPEG format detection error: {}", e))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("failed to read JPEG dimensions: {}", e))?;

    let color_space = detect_jpeg_color_space(data);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space,
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers to find the SOF (Start of Frame) segment and read the
/// component count to determine color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            // SOF segment: length(2) + precision(1) + height(2) + width(2) + num_components(1)
            if i + 9 < data.len() {
                let num_components = data[i + 9];
                return if num_components == 1 {
                    JpegColorSpace::DeviceGray
                } else {
                    JpegColorSpace::DeviceRGB
                };
            }
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("PNG format detection error: {}", e))?;

    let img = reader
        .decode()
        .map_err(|e| format!("failed to decode PNG: {}", e))?;

    Ok(split_rgba(&img.to_rgba8()))
}

/// Fallback path for data with an unrecognized signature.
fn decode_guessed(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection error: {}", e))?;

    let img = reader
        .decode()
        .map_err(|_| "unsupported image format (expected JPEG or PNG)".to_string())?;

    Ok(split_rgba(&img.to_rgba8()))
}

fn split_rgba(rgba: &image::RgbaImage) -> LoadedImage {
    let width = rgba.width();
    let height = rgba.height();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.push(pixel[0]);
        rgb.push(pixel[1]);
        rgb.push(pixel[2]);
        let a = pixel[3];
        alpha.push(a);
        if a != 255 {
            has_transparency = true;
        }
    }

    LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
        width_px: width,
        height_px: height,
    }
}
