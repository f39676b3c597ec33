//! # Default Layout Library
//!
//! Hand-tuned built-in layouts, one per document type, so every tenant has a
//! working template before any customization exists. Each layout satisfies
//! the validator's own constraints — that self-consistency is tested.

use crate::font::FontWeight;
use crate::layout::{
    Frame, ImageSource, LayoutDocument, LayoutElement, SignatureRole, TableColumn, TextAlign,
};

/// The document types the business layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Invoice,
    Quote,
    Certificate,
    Variation,
    Receipt,
}

impl DocumentType {
    /// Parse a type string; unknown values fall back to `Invoice`, the most
    /// generic layout, rather than erroring.
    pub fn parse(s: &str) -> Self {
        match s {
            "quote" => DocumentType::Quote,
            "certificate" => DocumentType::Certificate,
            "variation" => DocumentType::Variation,
            "receipt" => DocumentType::Receipt,
            _ => DocumentType::Invoice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Quote => "quote",
            DocumentType::Certificate => "certificate",
            DocumentType::Variation => "variation",
            DocumentType::Receipt => "receipt",
        }
    }
}

/// The built-in layout for a document type.
pub fn default_layout(doc_type: DocumentType) -> LayoutDocument {
    match doc_type {
        DocumentType::Invoice => invoice_layout(),
        DocumentType::Quote => quote_layout(),
        DocumentType::Certificate => certificate_layout(),
        DocumentType::Variation => variation_layout(),
        DocumentType::Receipt => receipt_layout(),
    }
}

// ─── Element constructors ───────────────────────────────────────────

fn frame(id: &str, x: f64, y: f64, w: f64, h: f64) -> Frame {
    Frame { id: id.to_string(), x, y, w, h }
}

fn styled_text(
    id: &str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    binding: &str,
    size: f64,
    weight: FontWeight,
    align: TextAlign,
) -> LayoutElement {
    LayoutElement::Text {
        frame: frame(id, x, y, w, h),
        binding: binding.to_string(),
        font_size: size,
        font_weight: weight,
        color: "#000000".to_string(),
        align,
    }
}

fn text(id: &str, x: f64, y: f64, w: f64, h: f64, binding: &str, size: f64) -> LayoutElement {
    styled_text(id, x, y, w, h, binding, size, FontWeight::Normal, TextAlign::Left)
}

fn text_bold(id: &str, x: f64, y: f64, w: f64, h: f64, binding: &str, size: f64) -> LayoutElement {
    styled_text(id, x, y, w, h, binding, size, FontWeight::Bold, TextAlign::Left)
}

fn text_right(id: &str, x: f64, y: f64, w: f64, h: f64, binding: &str, size: f64) -> LayoutElement {
    styled_text(id, x, y, w, h, binding, size, FontWeight::Normal, TextAlign::Right)
}

fn rule(id: &str, x: f64, y: f64, w: f64) -> LayoutElement {
    LayoutElement::Line {
        frame: frame(id, x, y, w, 1.0),
        line_color: "#333333".to_string(),
        line_thickness: 0.75,
    }
}

fn logo(id: &str) -> LayoutElement {
    LayoutElement::Image {
        frame: frame(id, 150.0, 12.0, 45.0, 20.0),
        image_source: ImageSource::Logo,
    }
}

fn col(header: &str, binding: &str, width: f64) -> TableColumn {
    TableColumn { header: header.to_string(), binding: binding.to_string(), width }
}

// ─── Built-in layouts ───────────────────────────────────────────────

fn letterhead(title: &str) -> Vec<LayoutElement> {
    vec![
        text_bold("title", 15.0, 15.0, 100.0, 10.0, title, 22.0),
        logo("logo"),
        text("company-name", 15.0, 28.0, 100.0, 5.0, "{{company.name}}", 9.0),
        text("company-address", 15.0, 33.0, 100.0, 5.0, "{{company.address}}", 8.0),
        rule("header-rule", 15.0, 40.0, 180.0),
    ]
}

fn customer_block(y: f64) -> Vec<LayoutElement> {
    vec![
        text_bold("bill-to-label", 15.0, y, 60.0, 5.0, "Bill To:", 8.0),
        text("customer-name", 15.0, y + 5.0, 90.0, 5.0, "{{customer.name}}", 10.0),
        text("customer-address", 15.0, y + 10.0, 90.0, 5.0, "{{customer.address}}", 8.0),
    ]
}

fn totals_block(y: f64) -> Vec<LayoutElement> {
    vec![
        text_right("subtotal-label", 120.0, y, 40.0, 5.0, "Subtotal:", 9.0),
        text_right("subtotal", 160.0, y, 35.0, 5.0, "{{totals.subtotal}}", 9.0),
        text_right("tax-label", 120.0, y + 6.0, 40.0, 5.0, "Tax:", 9.0),
        text_right("tax", 160.0, y + 6.0, 35.0, 5.0, "{{totals.tax}}", 9.0),
        text_right("total-label", 120.0, y + 13.0, 40.0, 6.0, "Total:", 12.0),
        text_right("total", 160.0, y + 13.0, 35.0, 6.0, "{{totals.total}}", 12.0),
    ]
}

fn invoice_layout() -> LayoutDocument {
    let mut elements = letterhead("INVOICE");
    elements.extend([
        text("number", 15.0, 45.0, 90.0, 5.0, "Invoice {{invoiceNumber}}", 10.0),
        text_right("issued", 120.0, 45.0, 75.0, 5.0, "Issued {{issuedAt}}", 9.0),
    ]);
    elements.extend(customer_block(54.0));
    elements.push(LayoutElement::Table {
        frame: frame("items", 15.0, 75.0, 180.0, 105.0),
        columns: vec![
            col("Description", "{{description}}", 90.0),
            col("Qty", "{{quantity}}", 20.0),
            col("Unit", "{{unitPrice}}", 35.0),
            col("Total", "{{lineTotal}}", 35.0),
        ],
    });
    elements.extend(totals_block(185.0));
    elements.extend([
        rule("footer-rule", 15.0, 270.0, 180.0),
        text("terms", 15.0, 274.0, 180.0, 5.0, "{{paymentTerms}}", 8.0),
    ]);
    elements
}

fn quote_layout() -> LayoutDocument {
    let mut elements = letterhead("QUOTE");
    elements.extend([
        text("number", 15.0, 45.0, 90.0, 5.0, "Quote {{quoteNumber}}", 10.0),
        text_right("valid-until", 120.0, 45.0, 75.0, 5.0, "Valid until {{validUntil}}", 9.0),
    ]);
    elements.extend(customer_block(54.0));
    elements.push(LayoutElement::Table {
        frame: frame("items", 15.0, 75.0, 180.0, 105.0),
        columns: vec![
            col("Description", "{{description}}", 110.0),
            col("Qty", "{{quantity}}", 20.0),
            col("Price", "{{lineTotal}}", 50.0),
        ],
    });
    elements.extend(totals_block(185.0));
    elements.push(text(
        "acceptance", 15.0, 250.0, 180.0, 5.0,
        "This quotation is open for acceptance until {{validUntil}}.", 8.0,
    ));
    elements
}

fn certificate_layout() -> LayoutDocument {
    let mut elements = letterhead("CERTIFICATE");
    elements.extend([
        text("number", 15.0, 45.0, 120.0, 5.0, "Certificate {{certificateNumber}}", 10.0),
        text_right("issued", 140.0, 45.0, 55.0, 5.0, "{{issuedAt}}", 9.0),
        text_bold("site-label", 15.0, 54.0, 60.0, 5.0, "Site:", 8.0),
        text("site-address", 15.0, 59.0, 120.0, 5.0, "{{site.address}}", 9.0),
        text_bold("outcome-label", 15.0, 68.0, 40.0, 6.0, "Outcome:", 10.0),
        text_bold("outcome", 55.0, 68.0, 80.0, 6.0, "{{outcome}}", 10.0),
    ]);
    elements.push(LayoutElement::Table {
        frame: frame("observations", 15.0, 80.0, 180.0, 91.0),
        columns: vec![
            col("Item", "{{item}}", 70.0),
            col("Result", "{{result}}", 40.0),
            col("Notes", "{{notes}}", 70.0),
        ],
    });
    elements.push(LayoutElement::Photo {
        frame: frame("site-photo", 15.0, 176.0, 85.0, 55.0),
    });
    elements.extend([
        LayoutElement::Signature {
            frame: frame("engineer-signature", 15.0, 240.0, 85.0, 40.0),
            signature_role: SignatureRole::Engineer,
        },
        LayoutElement::Signature {
            frame: frame("customer-signature", 110.0, 240.0, 85.0, 40.0),
            signature_role: SignatureRole::Customer,
        },
        text("verification", 15.0, 285.0, 180.0, 4.0, "Verify at {{verificationUrl}}", 7.0),
    ]);
    elements
}

fn variation_layout() -> LayoutDocument {
    let mut elements = letterhead("VARIATION");
    elements.extend([
        text("number", 15.0, 45.0, 120.0, 5.0, "Variation {{variationNumber}} to {{jobReference}}", 10.0),
    ]);
    elements.extend(customer_block(54.0));
    elements.extend([
        text_bold("description-label", 15.0, 72.0, 60.0, 5.0, "Variation detail:", 8.0),
        text("description", 15.0, 78.0, 180.0, 6.0, "{{variationDescription}}", 9.0),
    ]);
    elements.push(LayoutElement::Table {
        frame: frame("items", 15.0, 90.0, 180.0, 84.0),
        columns: vec![
            col("Description", "{{description}}", 110.0),
            col("Qty", "{{quantity}}", 20.0),
            col("Amount", "{{lineTotal}}", 50.0),
        ],
    });
    elements.extend(totals_block(180.0));
    elements.push(LayoutElement::Signature {
        frame: frame("customer-approval", 110.0, 230.0, 85.0, 40.0),
        signature_role: SignatureRole::Customer,
    });
    elements
}

fn receipt_layout() -> LayoutDocument {
    let mut elements = letterhead("RECEIPT");
    elements.extend([
        text("number", 15.0, 45.0, 90.0, 5.0, "Receipt {{receiptNumber}}", 10.0),
        text_right("paid-at", 120.0, 45.0, 75.0, 5.0, "Paid {{paidAt}}", 9.0),
        text("received-from", 15.0, 54.0, 120.0, 5.0, "Received from {{customer.name}}", 10.0),
        text("reference", 15.0, 60.0, 120.0, 5.0, "For {{paymentReference}}", 9.0),
        rule("amount-rule", 15.0, 72.0, 180.0),
        text_bold("amount-label", 15.0, 76.0, 60.0, 8.0, "Amount received:", 12.0),
        text_right("amount", 120.0, 76.0, 75.0, 8.0, "{{amountPaid}}", 14.0),
        text("method", 15.0, 88.0, 120.0, 5.0, "Payment method: {{paymentMethod}}", 9.0),
        rule("footer-rule", 15.0, 98.0, 180.0),
        text("thanks", 15.0, 102.0, 120.0, 5.0, "Thank you for your business.", 8.0),
    ]);
    elements
}
