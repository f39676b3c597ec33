//! # PDF Writer
//!
//! A from-scratch single-page PDF 1.7 writer. We write the raw bytes
//! ourselves because it gives us full control over the output and keeps the
//! engine self-contained; the subset of the spec a one-page business document
//! needs is manageable.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (catalog, pages, fonts, content, images)
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! The element catalog only ever draws with Helvetica and Helvetica-Bold, so
//! both are registered unconditionally as simple Type1 references — no
//! embedding, no subsetting.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use crate::geometry::{PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::image_embed::{ImagePixelData, JpegColorSpace, LoadedImage};
use miniz_oxide::deflate::compress_to_vec_zlib;

/// Font resource name for Helvetica in content streams.
pub const FONT_REGULAR: &str = "F0";
/// Font resource name for Helvetica-Bold in content streams.
pub const FONT_BOLD: &str = "F1";

struct PdfObject {
    data: Vec<u8>,
}

/// Assemble a complete single-page PDF from a finished content stream and
/// the images it references as `/Im0`, `/Im1`, ... in registration order.
pub fn write_single_page(content_stream: &str, images: &[LoadedImage]) -> Vec<u8> {
    // Object IDs: 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog,
    // 2 = Pages, 3 = Helvetica, 4 = Helvetica-Bold, then images, content, page.
    let mut objects: Vec<PdfObject> = Vec::new();
    objects.push(PdfObject { data: vec![] });
    objects.push(PdfObject {
        data: b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
    });
    objects.push(PdfObject { data: vec![] }); // Pages tree, filled below

    for name in ["Helvetica", "Helvetica-Bold"] {
        objects.push(PdfObject {
            data: format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                name
            )
            .into_bytes(),
        });
    }

    let mut image_obj_ids: Vec<usize> = Vec::new();
    for img in images {
        image_obj_ids.push(write_image_xobject(&mut objects, img));
    }

    let compressed = compress_to_vec_zlib(content_stream.as_bytes(), 6);
    let content_obj_id = objects.len();
    let mut content_data: Vec<u8> = Vec::new();
    let _ = write!(
        content_data,
        "<< /Length {} /Filter /FlateDecode >>\nstream\n",
        compressed.len()
    );
    content_data.extend_from_slice(&compressed);
    content_data.extend_from_slice(b"\nendstream");
    objects.push(PdfObject { data: content_data });

    let page_obj_id = objects.len();
    let font_resources = format!("/{} 3 0 R /{} 4 0 R", FONT_REGULAR, FONT_BOLD);
    let resources = if image_obj_ids.is_empty() {
        format!("/Font << {} >>", font_resources)
    } else {
        let xobjects: String = image_obj_ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("/Im{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");
        format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
    };
    let page_dict = format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
         /Contents {} 0 R /Resources << {} >> >>",
        PAGE_WIDTH_PT, PAGE_HEIGHT_PT, content_obj_id, resources
    );
    objects.push(PdfObject {
        data: page_dict.into_bytes(),
    });

    objects[2].data = format!(
        "<< /Type /Pages /Kids [{} 0 R] /Count 1 >>",
        page_obj_id
    )
    .into_bytes();

    serialize(&objects)
}

/// Write a single image as one or two XObject PDF objects.
/// Returns the main XObject ID.
fn write_image_xobject(objects: &mut Vec<PdfObject>, image: &LoadedImage) -> usize {
    match &image.pixel_data {
        ImagePixelData::Jpeg { data, color_space } => {
            let color_space_str = match color_space {
                JpegColorSpace::DeviceRGB => "/DeviceRGB",
                JpegColorSpace::DeviceGray => "/DeviceGray",
            };

            let obj_id = objects.len();
            let mut obj_data: Vec<u8> = Vec::new();
            let _ = write!(
                obj_data,
                "<< /Type /XObject /Subtype /Image \
                 /Width {} /Height {} \
                 /ColorSpace {} \
                 /BitsPerComponent 8 \
                 /Filter /DCTDecode \
                 /Length {} >>\nstream\n",
                image.width_px, image.height_px, color_space_str, data.len()
            );
            obj_data.extend_from_slice(data);
            obj_data.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data: obj_data });
            obj_id
        }

        ImagePixelData::Decoded { rgb, alpha } => {
            // Write SMask first if an alpha channel exists
            let smask_id = alpha.as_ref().map(|alpha_data| {
                let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                let smask_obj_id = objects.len();
                let mut smask_data: Vec<u8> = Vec::new();
                let _ = write!(
                    smask_data,
                    "<< /Type /XObject /Subtype /Image \
                     /Width {} /Height {} \
                     /ColorSpace /DeviceGray \
                     /BitsPerComponent 8 \
                     /Filter /FlateDecode \
                     /Length {} >>\nstream\n",
                    image.width_px, image.height_px, compressed_alpha.len()
                );
                smask_data.extend_from_slice(&compressed_alpha);
                smask_data.extend_from_slice(b"\nendstream");
                objects.push(PdfObject { data: smask_data });
                smask_obj_id
            });

            let compressed_rgb = compress_to_vec_zlib(rgb, 6);
            let obj_id = objects.len();
            let mut obj_data: Vec<u8> = Vec::new();

            let smask_ref = smask_id
                .map(|id| format!(" /SMask {} 0 R", id))
                .unwrap_or_default();

            let _ = write!(
                obj_data,
                "<< /Type /XObject /Subtype /Image \
                 /Width {} /Height {} \
                 /ColorSpace /DeviceRGB \
                 /BitsPerComponent 8 \
                 /Filter /FlateDecode \
                 /Length {}{} >>\nstream\n",
                image.width_px, image.height_px, compressed_rgb.len(), smask_ref
            );
            obj_data.extend_from_slice(&compressed_rgb);
            obj_data.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data: obj_data });
            obj_id
        }
    }
}

/// Serialize all objects into the final PDF byte stream.
fn serialize(objects: &[PdfObject]) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = vec![0; objects.len()];

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (i, obj) in objects.iter().enumerate().skip(1) {
        offsets[i] = output.len();
        let header = format!("{} 0 obj\n", i);
        output.extend_from_slice(header.as_bytes());
        output.extend_from_slice(&obj.data);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", objects.len());
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        let _ = write!(output, "{:010} 00000 n \n", offset);
    }

    let _ = write!(
        output,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len(),
        xref_offset
    );

    output
}

/// Encode a text string for a `Tj` operator in WinAnsiEncoding, escaping
/// PDF string delimiters and using octal escapes outside printable ASCII.
pub fn encode_text_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in 0x20..=0x7E
/// and 0xA0..=0xFF map directly; the 0x80..=0x9F range holds special
/// mappings for smart quotes, bullets, dashes, etc.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}
