//! # Docpress
//!
//! Document generation and export for field-service paperwork: invoices,
//! quotes, certificates, variations, and receipts.
//!
//! Rendering is deliberately constrained: one A4 page, a closed catalog of
//! seven element types, two built-in fonts. Field-service documents are
//! forms, not essays — the constraint is what makes layouts declarative,
//! validatable, and renderable without a layout engine.
//!
//! ## Architecture
//!
//! ```text
//! Layout JSON + Data Context
//!       ↓
//!   [validate]  — structural and bounds checks
//!       ↓
//!   [bindings]  — {{dotted.path}} resolution
//!       ↓
//!   [render]    — element catalog → page content stream
//!       ↓
//!   [pdf]       — serialize to PDF bytes
//!
//! Issued revisions
//!       ↓
//!   [export]    — select, self-heal PDFs, checksum, bundle
//!       ↓
//!   [archive]   — ZIP container
//! ```

pub mod archive;
pub mod bindings;
pub mod defaults;
pub mod error;
pub mod export;
pub mod font;
pub mod geometry;
pub mod image_embed;
pub mod layout;
pub mod pdf;
pub mod render;
pub mod storage;
pub mod validate;

use serde::Deserialize;
use serde_json::Value;

pub use defaults::{default_layout, DocumentType};
pub use error::DocpressError;
pub use export::{export_bundle, ExportBundle, ExportFilters};
pub use layout::{parse_layout, LayoutDocument, LayoutElement};
pub use render::{render, Attachments, Brand};
pub use storage::{BlobStore, DocumentRevision, RevisionStore};

/// A self-contained render request, as accepted by the CLI and the HTTP
/// layer: either an explicit layout or a document type whose built-in
/// layout is used, plus the data context and optional branding.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest {
    #[serde(default)]
    layout: Option<Value>,
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    context: Value,
    /// `data:image/...;base64,...` URI for the tenant logo.
    #[serde(default)]
    brand_logo: Option<String>,
}

/// Render a request described as JSON to PDF bytes.
///
/// This is the primary entry point for callers holding untyped input. An
/// explicit `layout` wins over `documentType`; when both are absent the
/// invoice layout is used.
pub fn render_json(json: &str) -> Result<Vec<u8>, DocpressError> {
    let request: RenderRequest = serde_json::from_str(json)?;

    let layout = match &request.layout {
        Some(value) => parse_layout(value)?,
        None => {
            let doc_type = request
                .document_type
                .as_deref()
                .map(DocumentType::parse)
                .unwrap_or(DocumentType::Invoice);
            default_layout(doc_type)
        }
    };

    let brand = match &request.brand_logo {
        Some(uri) => {
            let bytes = image_embed::data_uri_bytes(uri)
                .map_err(|e| DocpressError::InvalidInput(format!("logo: {}", e)))?;
            Some(Brand { logo: Some(bytes) })
        }
        None => None,
    };

    render::render(&layout, &request.context, brand.as_ref(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_with_explicit_layout() {
        let input = r#"{
            "layout": [
                {"type": "text", "id": "t", "x": 10.0, "y": 10.0, "w": 100.0, "h": 8.0,
                 "binding": "{{name}}"}
            ],
            "context": {"name": "Acme"}
        }"#;
        let bytes = render_json(input).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn test_render_json_falls_back_to_document_type() {
        let input = r#"{"documentType": "receipt", "context": {}}"#;
        assert!(render_json(input).is_ok());
    }

    #[test]
    fn test_render_json_defaults_to_invoice() {
        assert!(render_json(r#"{"context": {}}"#).is_ok());
    }

    #[test]
    fn test_render_json_rejects_bad_layout() {
        let input = r#"{"layout": {"not": "an array"}, "context": {}}"#;
        assert!(matches!(render_json(input), Err(DocpressError::InvalidLayout(_))));
    }

    #[test]
    fn test_render_json_decodes_brand_logo_uri() {
        use base64::Engine;
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([5, 10, 15, 255]));
        let mut png = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();
        let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

        let input = format!(
            r#"{{"documentType": "invoice", "context": {{}}, "brandLogo": "data:image/png;base64,{}"}}"#,
            b64
        );
        let bytes = render_json(&input).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Image"), "logo must embed as an XObject");
    }

    #[test]
    fn test_render_json_rejects_malformed_logo_uri() {
        let input = r#"{"documentType": "invoice", "context": {}, "brandLogo": "no-comma"}"#;
        assert!(matches!(render_json(input), Err(DocpressError::InvalidInput(_))));
    }
}
