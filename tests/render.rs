//! End-to-end render pipeline tests: JSON layout in, PDF bytes out.

use serde_json::json;

use docpress::render::{render, Attachments, Brand};
use docpress::{default_layout, parse_layout, render_json, DocumentType};

fn tiny_png() -> Vec<u8> {
    let mut img = image::RgbaImage::new(4, 2);
    for p in img.pixels_mut() {
        *p = image::Rgba([20, 40, 60, 255]);
    }
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgba8)
        .unwrap();
    buf
}

fn assert_pdf_shape(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-1.7"));
    let text = String::from_utf8_lossy(bytes);
    assert!(text.contains("/MediaBox [0 0 595.28 841.89]"), "page must be A4");
    assert!(text.contains("startxref"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn layout_json_renders_to_single_a4_page() {
    let layout = parse_layout(&json!([
        {"type": "text", "id": "title", "x": 15.0, "y": 15.0, "w": 100.0, "h": 10.0,
         "binding": "Job {{jobNumber}}", "fontSize": 18.0, "fontWeight": "bold"},
        {"type": "line", "id": "rule", "x": 15.0, "y": 28.0, "w": 180.0, "h": 1.0},
        {"type": "rect", "id": "box", "x": 15.0, "y": 35.0, "w": 80.0, "h": 30.0,
         "strokeColor": "#cccccc"},
        {"type": "table", "id": "items", "x": 15.0, "y": 70.0, "w": 180.0, "h": 50.0,
         "columns": [
            {"header": "Item", "binding": "{{name}}", "width": 120.0},
            {"header": "Qty", "binding": "{{qty}}", "width": 60.0}
         ]}
    ]))
    .unwrap();

    let context = json!({
        "jobNumber": "J-1009",
        "items": [{"name": "Valve", "qty": 2}, {"name": "Pipe", "qty": 6}]
    });
    let bytes = render(&layout, &context, None, None).unwrap();
    assert_pdf_shape(&bytes);
}

#[test]
fn brand_logo_and_signatures_embed_as_xobjects() {
    let layout = default_layout(DocumentType::Certificate);
    let context = json!({
        "certificateNumber": "CERT-77",
        "engineerName": "R. Patel",
        "engineerSignedAt": "2026-01-10",
        "customerName": "Acme Ltd",
        "customerSignedAt": "2026-01-10",
    });
    let brand = Brand { logo: Some(tiny_png()) };
    let attachments = Attachments {
        signature_engineer: Some(tiny_png()),
        signature_customer: Some(tiny_png()),
        photos: vec![tiny_png()],
    };

    let bytes = render(&layout, &context, Some(&brand), Some(&attachments)).unwrap();
    assert_pdf_shape(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    // Logo, two signatures, one photo.
    assert_eq!(text.matches("/Subtype /Image").count(), 4);
}

#[test]
fn every_document_type_renders_with_sparse_context() {
    for doc_type in ["invoice", "quote", "certificate", "variation", "receipt"] {
        let layout = default_layout(DocumentType::parse(doc_type));
        let bytes = render(&layout, &json!({"customer": {"name": "A"}}), None, None)
            .unwrap_or_else(|e| panic!("{} failed: {}", doc_type, e));
        assert_pdf_shape(&bytes);
    }
}

#[test]
fn out_of_bounds_layout_rejected_before_rendering() {
    let layout = parse_layout(&json!([
        {"type": "text", "id": "t", "x": 250.0, "y": 10.0, "w": 50.0, "h": 8.0, "binding": "x"}
    ]))
    .unwrap();
    let err = render(&layout, &json!({}), None, None).unwrap_err();
    assert!(err.to_string().contains("Invalid layout"));
}

#[test]
fn element_cap_holds_at_boundary() {
    let element = |i: usize| {
        json!({"type": "text", "id": format!("t{}", i), "x": 10.0, "y": 10.0,
               "w": 50.0, "h": 5.0, "binding": "x"})
    };

    let ok: Vec<_> = (0..100).map(element).collect();
    let layout = parse_layout(&json!(ok)).unwrap();
    assert!(render(&layout, &json!({}), None, None).is_ok());

    let too_many: Vec<_> = (0..101).map(element).collect();
    let layout = parse_layout(&json!(too_many)).unwrap();
    let err = render(&layout, &json!({}), None, None).unwrap_err();
    assert!(err.to_string().contains("100"));
}

#[test]
fn render_json_end_to_end() {
    let input = r#"{
        "documentType": "receipt",
        "context": {
            "receiptNumber": "R-100",
            "paidAt": "2026-08-01",
            "customer": {"name": "J. Smith"},
            "amountPaid": "99.00",
            "paymentMethod": "card"
        }
    }"#;
    let bytes = render_json(input).unwrap();
    assert_pdf_shape(&bytes);
}

#[test]
fn render_output_is_deterministic() {
    let layout = default_layout(DocumentType::Invoice);
    let context = json!({"invoiceNumber": "INV-1", "items": [{"description": "a"}]});
    let first = render(&layout, &context, None, None).unwrap();
    let second = render(&layout, &context, None, None).unwrap();
    assert_eq!(first, second);
}
