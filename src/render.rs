//! # Template Render Engine
//!
//! Walks a validated layout in array order and draws each element onto a
//! single A4 page, producing the finished PDF bytes. Geometry goes through
//! the coordinate mapper, text goes through the binding resolver, rasters go
//! through the embed cache.
//!
//! Failure policy: validation failures are reported before any drawing
//! begins. Once rendering starts, a bad image or an unresolved binding
//! degrades that one element (skipped or drawn empty, with a warning) —
//! partial output beats blocking an invoice over a corrupt photo.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use serde_json::Value;
use tracing::warn;

use crate::bindings::resolve;
use crate::error::DocpressError;
use crate::font::{measure_string, FontWeight};
use crate::geometry::{mm_to_pt, page_y, Color};
use crate::image_embed::{load_raster, LoadedImage};
use crate::layout::{
    Frame, ImageSource, LayoutElement, SignatureRole, TableColumn, TextAlign,
};
use crate::pdf::{self, encode_text_string, FONT_BOLD, FONT_REGULAR};
use crate::validate::validate;

/// Overflow guard for a single drawn string. Text does not wrap or reflow;
/// anything longer is cut.
const MAX_TEXT_CHARS: usize = 150;

/// Fixed table row height in millimeters (header and data rows alike).
const TABLE_ROW_HEIGHT_MM: f64 = 7.0;

/// Tenant branding available to `image` elements with a `logo` source.
#[derive(Debug, Clone, Default)]
pub struct Brand {
    pub logo: Option<Vec<u8>>,
}

/// Per-render raster attachments. Never persisted by the renderer.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    pub signature_engineer: Option<Vec<u8>>,
    pub signature_customer: Option<Vec<u8>>,
    pub photos: Vec<Vec<u8>>,
}

/// Embeds each distinct image source at most once per render call, so a logo
/// referenced by a header and a watermark becomes one XObject.
struct ImageCache<'a> {
    brand: Option<&'a Brand>,
    attachments: Option<&'a Attachments>,
    images: Vec<LoadedImage>,
    by_source: HashMap<ImageSource, Option<usize>>,
}

impl<'a> ImageCache<'a> {
    fn new(brand: Option<&'a Brand>, attachments: Option<&'a Attachments>) -> Self {
        Self {
            brand,
            attachments,
            images: Vec::new(),
            by_source: HashMap::new(),
        }
    }

    /// Returns the `/ImN` index for a source, embedding on first use.
    /// `None` means the source has no usable bytes; failures are cached so a
    /// corrupt raster is decoded (and warned about) once, not per element.
    fn embed(&mut self, source: ImageSource) -> Option<usize> {
        if let Some(cached) = self.by_source.get(&source) {
            return *cached;
        }

        let bytes = match source {
            ImageSource::Logo => self.brand.and_then(|b| b.logo.as_deref()),
            ImageSource::SignatureEngineer => {
                self.attachments.and_then(|a| a.signature_engineer.as_deref())
            }
            ImageSource::SignatureCustomer => {
                self.attachments.and_then(|a| a.signature_customer.as_deref())
            }
            ImageSource::Photo => self.attachments.and_then(|a| a.photos.first().map(|p| p.as_slice())),
        };

        let idx = bytes.and_then(|data| match load_raster(data) {
            Ok(img) => {
                self.images.push(img);
                Some(self.images.len() - 1)
            }
            Err(e) => {
                warn!(source = ?source, error = %e, "skipping unembeddable image");
                None
            }
        });

        self.by_source.insert(source, idx);
        idx
    }
}

/// Render a layout document against a data context into single-page PDF
/// bytes. Fails fast on validation; degrades per element afterwards.
pub fn render(
    layout: &[LayoutElement],
    context: &Value,
    brand: Option<&Brand>,
    attachments: Option<&Attachments>,
) -> Result<Vec<u8>, DocpressError> {
    validate(layout)?;

    let mut cache = ImageCache::new(brand, attachments);
    let mut stream = String::new();

    for element in layout {
        match element {
            LayoutElement::Text {
                frame,
                binding,
                font_size,
                font_weight,
                color,
                align,
            } => {
                let text = resolve(binding, context);
                draw_text(
                    &mut stream,
                    frame,
                    &text,
                    *font_size,
                    *font_weight,
                    Color::from_hex(color),
                    *align,
                );
            }
            LayoutElement::Line {
                frame,
                line_color,
                line_thickness,
            } => draw_line(&mut stream, frame, Color::from_hex(line_color), *line_thickness),
            LayoutElement::Rect {
                frame,
                fill_color,
                stroke_color,
                line_thickness,
            } => draw_rect(
                &mut stream,
                frame,
                fill_color.as_deref().map(Color::from_hex),
                stroke_color.as_deref().map(Color::from_hex),
                *line_thickness,
            ),
            LayoutElement::Table { frame, columns } => {
                draw_table(&mut stream, frame, columns, context)
            }
            LayoutElement::Image { frame, image_source } => {
                if let Some(idx) = cache.embed(*image_source) {
                    let img = &cache.images[idx];
                    draw_image(&mut stream, frame, idx, img.width_px, img.height_px);
                }
            }
            LayoutElement::Signature { frame, signature_role } => {
                draw_signature(&mut stream, frame, *signature_role, context, &mut cache)
            }
            LayoutElement::Photo { frame } => {
                match cache.embed(ImageSource::Photo) {
                    Some(idx) => {
                        let img = &cache.images[idx];
                        draw_image(&mut stream, frame, idx, img.width_px, img.height_px);
                    }
                    None => draw_photo_placeholder(&mut stream, frame),
                }
            }
        }
    }

    Ok(pdf::write_single_page(&stream, &cache.images))
}

fn font_name(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Normal => FONT_REGULAR,
        FontWeight::Bold => FONT_BOLD,
    }
}

/// Draw a text run vertically centered in its box, horizontally aligned by
/// measured width. Empty text draws nothing at all.
fn draw_text(
    stream: &mut String,
    frame: &Frame,
    text: &str,
    font_size: f64,
    weight: FontWeight,
    color: Color,
    align: TextAlign,
) {
    if text.is_empty() {
        return;
    }
    let text: String = text.chars().take(MAX_TEXT_CHARS).collect();

    let box_x = mm_to_pt(frame.x);
    let box_w = mm_to_pt(frame.w);
    let box_y = page_y(frame.y, frame.h);
    let box_h = mm_to_pt(frame.h);

    let text_w = measure_string(&text, weight, font_size);
    let x = match align {
        TextAlign::Left => box_x,
        TextAlign::Center => box_x + ((box_w - text_w) / 2.0).max(0.0),
        TextAlign::Right => box_x + (box_w - text_w).max(0.0),
    };
    // Baseline sits a bit below the box midline so the glyph body centers.
    let y = box_y + box_h / 2.0 - font_size * 0.35;

    let _ = write!(
        stream,
        "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
        color.r,
        color.g,
        color.b,
        font_name(weight),
        font_size,
        x,
        y,
        encode_text_string(&text)
    );
}

/// Horizontal rule at the vertical midpoint of the element box.
fn draw_line(stream: &mut String, frame: &Frame, color: Color, thickness: f64) {
    let x = mm_to_pt(frame.x);
    let w = mm_to_pt(frame.w);
    let y = page_y(frame.y, frame.h) + mm_to_pt(frame.h) / 2.0;

    let _ = write!(
        stream,
        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
        color.r, color.g, color.b, thickness, x, y, x + w, y
    );
}

fn draw_rect(
    stream: &mut String,
    frame: &Frame,
    fill: Option<Color>,
    stroke: Option<Color>,
    thickness: f64,
) {
    let x = mm_to_pt(frame.x);
    let y = page_y(frame.y, frame.h);
    let w = mm_to_pt(frame.w);
    let h = mm_to_pt(frame.h);

    if let Some(c) = fill {
        let _ = write!(
            stream,
            "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            c.r, c.g, c.b, x, y, w, h
        );
    }
    if let Some(c) = stroke {
        let _ = write!(
            stream,
            "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
            c.r, c.g, c.b, thickness, x, y, w, h
        );
    }
}

/// Bold header row, then as many data rows as the box height holds, fixed
/// row height, top-down. Rows beyond the box are silently dropped — this
/// renderer does not paginate.
fn draw_table(stream: &mut String, frame: &Frame, columns: &[TableColumn], context: &Value) {
    if columns.is_empty() {
        return;
    }

    let rows = context
        .get("items")
        .or_else(|| context.get("lineItems"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let total_rows_fit = (frame.h / TABLE_ROW_HEIGHT_MM).floor() as usize;
    let data_rows_fit = total_rows_fit.saturating_sub(1); // header takes one slot
    let drawn = rows.len().min(data_rows_fit);
    if drawn < rows.len() {
        warn!(
            table = %frame.id,
            dropped = rows.len() - drawn,
            "table rows beyond box height dropped"
        );
    }

    let header_frame = |col_x: f64, col_w: f64, row_idx: usize| Frame {
        id: frame.id.clone(),
        x: col_x,
        y: frame.y + row_idx as f64 * TABLE_ROW_HEIGHT_MM,
        w: col_w,
        h: TABLE_ROW_HEIGHT_MM,
    };

    let mut col_x = frame.x;
    for column in columns {
        draw_text(
            stream,
            &header_frame(col_x, column.width, 0),
            &column.header,
            8.0,
            FontWeight::Bold,
            Color::BLACK,
            TextAlign::Left,
        );
        col_x += column.width;
    }

    for (row_idx, row) in rows.iter().take(drawn).enumerate() {
        let mut col_x = frame.x;
        for column in columns {
            let text = resolve(&column.binding, row);
            draw_text(
                stream,
                &header_frame(col_x, column.width, row_idx + 1),
                &text,
                8.0,
                FontWeight::Normal,
                Color::BLACK,
                TextAlign::Left,
            );
            col_x += column.width;
        }
    }
}

/// Scale an image to fit the element box, preserving aspect ratio,
/// width-constrained first. Returns (width_pt, height_pt).
fn fit_into_box(img_w: u32, img_h: u32, box_w: f64, box_h: f64) -> (f64, f64) {
    if img_w == 0 || img_h == 0 {
        return (0.0, 0.0);
    }
    let mut scale = box_w / img_w as f64;
    if img_h as f64 * scale > box_h {
        scale = box_h / img_h as f64;
    }
    (img_w as f64 * scale, img_h as f64 * scale)
}

fn draw_image(stream: &mut String, frame: &Frame, image_idx: usize, img_w: u32, img_h: u32) {
    let box_w = mm_to_pt(frame.w);
    let box_h = mm_to_pt(frame.h);
    let (w, h) = fit_into_box(img_w, img_h, box_w, box_h);
    if w <= 0.0 || h <= 0.0 {
        return;
    }

    let x = mm_to_pt(frame.x);
    // Anchor at the top of the element box, like every other element.
    let y = page_y(frame.y, frame.h) + (box_h - h);

    let _ = write!(
        stream,
        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
        w, h, x, y, image_idx
    );
}

/// Bordered signature box: role label, signer name, signed date, and the
/// signature raster (when supplied) fitted into the space between them.
fn draw_signature(
    stream: &mut String,
    frame: &Frame,
    role: SignatureRole,
    context: &Value,
    cache: &mut ImageCache,
) {
    draw_rect(stream, frame, None, Some(Color::BLACK), 1.0);

    let (name_key, date_key, source) = match role {
        SignatureRole::Engineer => ("{{engineerName}}", "{{engineerSignedAt}}", ImageSource::SignatureEngineer),
        SignatureRole::Customer => ("{{customerName}}", "{{customerSignedAt}}", ImageSource::SignatureCustomer),
    };

    let inset = Frame {
        id: frame.id.clone(),
        x: frame.x + 2.0,
        y: frame.y + 1.0,
        w: frame.w - 4.0,
        h: 5.0,
    };
    draw_text(stream, &inset, role.label(), 7.0, FontWeight::Bold, Color::BLACK, TextAlign::Left);

    let name = resolve(name_key, context);
    let name_frame = Frame {
        y: frame.y + frame.h - 10.0,
        h: 5.0,
        ..inset.clone()
    };
    draw_text(stream, &name_frame, &name, 9.0, FontWeight::Normal, Color::BLACK, TextAlign::Left);

    let signed_at = resolve(date_key, context);
    let date_frame = Frame {
        y: frame.y + frame.h - 5.5,
        h: 4.0,
        ..inset
    };
    draw_text(stream, &date_frame, &signed_at, 7.0, FontWeight::Normal, Color::BLACK, TextAlign::Left);

    // Signature raster fills the space between label and name rows.
    if let Some(idx) = cache.embed(source) {
        let img = &cache.images[idx];
        let image_frame = Frame {
            id: frame.id.clone(),
            x: frame.x + 2.0,
            y: frame.y + 6.5,
            w: (frame.w - 4.0).max(0.0),
            h: (frame.h - 17.0).max(0.0),
        };
        draw_image(stream, &image_frame, idx, img.width_px, img.height_px);
    }
}

/// Bordered placeholder with a literal label, drawn when no photo
/// attachment is available.
fn draw_photo_placeholder(stream: &mut String, frame: &Frame) {
    draw_rect(stream, frame, None, Some(Color::BLACK), 1.0);
    draw_text(
        stream,
        frame,
        "[Photo]",
        9.0,
        FontWeight::Normal,
        Color::from_hex("#666666"),
        TextAlign::Center,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_element(binding: &str, align: TextAlign) -> LayoutElement {
        LayoutElement::Text {
            frame: Frame { id: "t".into(), x: 10.0, y: 10.0, w: 100.0, h: 8.0 },
            binding: binding.to_string(),
            font_size: 10.0,
            font_weight: FontWeight::Normal,
            color: "#000000".into(),
            align,
        }
    }

    #[test]
    fn test_render_fails_fast_on_invalid_layout() {
        let bad = vec![LayoutElement::Text {
            frame: Frame { id: "t".into(), x: 500.0, y: 0.0, w: 10.0, h: 5.0 },
            binding: "x".into(),
            font_size: 10.0,
            font_weight: FontWeight::Normal,
            color: "#000000".into(),
            align: TextAlign::Left,
        }];
        assert!(render(&bad, &json!({}), None, None).is_err());
    }

    #[test]
    fn test_empty_binding_draws_nothing() {
        let layout = vec![text_element("{{missing}}", TextAlign::Left)];
        let with_empty = render(&layout, &json!({}), None, None).unwrap();
        let blank = render(&[], &json!({}), None, None).unwrap();
        // An unresolved binding produces the same content as no element.
        assert_eq!(with_empty.len(), blank.len());
    }

    #[test]
    fn test_text_truncated_at_overflow_guard() {
        let long = "a".repeat(400);
        let ctx = json!({ "v": long });
        let layout = vec![text_element("{{v}}", TextAlign::Left)];
        let bytes = render(&layout, &ctx, None, None).unwrap();
        assert!(!bytes.is_empty());
        // 400 chars in, but the content stream only carries MAX_TEXT_CHARS.
        // (Indirectly verified: the compressed stream for 150 'a's is far
        // smaller than for 400.)
        let long_layout = vec![text_element("{{v}}", TextAlign::Left)];
        let short_ctx = json!({ "v": "a".repeat(150) });
        let short_bytes = render(&long_layout, &short_ctx, None, None).unwrap();
        assert_eq!(bytes.len(), short_bytes.len());
    }

    #[test]
    fn test_fit_into_box_width_constrained_first() {
        // Wide image: width binds.
        let (w, h) = fit_into_box(200, 100, 100.0, 100.0);
        assert!((w - 100.0).abs() < 1e-9);
        assert!((h - 50.0).abs() < 1e-9);

        // Tall image: height binds after width pass.
        let (w, h) = fit_into_box(100, 400, 100.0, 100.0);
        assert!((h - 100.0).abs() < 1e-9);
        assert!((w - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_image_bytes_degrade_not_abort() {
        let layout = vec![LayoutElement::Image {
            frame: Frame { id: "i".into(), x: 10.0, y: 10.0, w: 40.0, h: 20.0 },
            image_source: ImageSource::Logo,
        }];
        let brand = Brand { logo: Some(vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00]) };
        let bytes = render(&layout, &json!({}), Some(&brand), None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn test_photo_placeholder_when_no_attachment() {
        let layout = vec![LayoutElement::Photo {
            frame: Frame { id: "p".into(), x: 10.0, y: 10.0, w: 60.0, h: 40.0 },
        }];
        let bytes = render(&layout, &json!({}), None, None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        // Placeholder draws text + border, so the page is not empty.
        let blank = render(&[], &json!({}), None, None).unwrap();
        assert!(bytes.len() > blank.len());
    }

    #[test]
    fn test_logo_embedded_once_for_multiple_elements() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();

        let frame = |id: &str| Frame { id: id.into(), x: 10.0, y: 10.0, w: 30.0, h: 15.0 };
        let layout = vec![
            LayoutElement::Image { frame: frame("a"), image_source: ImageSource::Logo },
            LayoutElement::Image { frame: frame("b"), image_source: ImageSource::Logo },
        ];
        let brand = Brand { logo: Some(png) };
        let bytes = render(&layout, &json!({}), Some(&brand), None).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // One XObject definition serves both elements.
        assert_eq!(text.matches("/Subtype /Image").count(), 1);
        assert!(text.contains("/Im0"));
        assert!(!text.contains("/Im1"));
    }

    #[test]
    fn test_table_rows_beyond_box_dropped() {
        let columns = vec![TableColumn {
            header: "Desc".into(),
            binding: "{{desc}}".into(),
            width: 100.0,
        }];
        // 21mm box at 7mm rows: header + 2 data rows fit.
        let table = LayoutElement::Table {
            frame: Frame { id: "t".into(), x: 10.0, y: 10.0, w: 100.0, h: 21.0 },
            columns,
        };
        let ctx = json!({ "items": [
            {"desc": "row-one"}, {"desc": "row-two"}, {"desc": "row-three"}
        ]});
        let bytes = render(&[table], &ctx, None, None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }
}
