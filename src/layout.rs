//! # Layout Document Model
//!
//! The declarative input to the renderer. A layout is an ordered list of
//! typed elements positioned in millimeters on an A4 page; later elements
//! draw on top of earlier ones. This is the wire shape tenants customize and
//! the Default Layout Library seeds, so it deserializes from plain JSON.
//!
//! Each element kind carries only its own fields — there are no "maybe this
//! field applies" checks at render time. The `type` tag is closed: an unknown
//! tag is a validation failure, not a silently ignored element.

use crate::error::DocpressError;
use crate::font::FontWeight;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered sequence of layout elements making up one page design.
pub type LayoutDocument = Vec<LayoutElement>;

/// Common geometry shared by every element: position and size in millimeters,
/// top-left origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Unique per document; used for diagnostics, never for ordering.
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Horizontal text alignment within an element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Which embedded raster an image element draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Logo,
    SignatureEngineer,
    SignatureCustomer,
    Photo,
}

/// Whose signature a signature element captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureRole {
    Engineer,
    Customer,
}

impl SignatureRole {
    /// The label drawn in the signature box.
    pub fn label(&self) -> &'static str {
        match self {
            SignatureRole::Engineer => "Engineer",
            SignatureRole::Customer => "Customer",
        }
    }
}

/// One column of a table element. `width` is in millimeters; `binding` is
/// resolved against each row object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub header: String,
    pub binding: String,
    pub width: f64,
}

/// A single drawable element. Tagged union over the seven-entry catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutElement {
    Text {
        #[serde(flatten)]
        frame: Frame,
        /// A literal string or a `{{dotted.path}}` template.
        #[serde(default)]
        binding: String,
        #[serde(default = "default_font_size", rename = "fontSize")]
        font_size: f64,
        #[serde(default, rename = "fontWeight")]
        font_weight: FontWeight,
        /// Hex color string; malformed values render black.
        #[serde(default = "default_color")]
        color: String,
        #[serde(default)]
        align: TextAlign,
    },
    Line {
        #[serde(flatten)]
        frame: Frame,
        #[serde(default = "default_color", rename = "lineColor")]
        line_color: String,
        #[serde(default = "default_thickness", rename = "lineThickness")]
        line_thickness: f64,
    },
    Rect {
        #[serde(flatten)]
        frame: Frame,
        #[serde(default, rename = "fillColor")]
        fill_color: Option<String>,
        #[serde(default, rename = "strokeColor")]
        stroke_color: Option<String>,
        #[serde(default = "default_thickness", rename = "lineThickness")]
        line_thickness: f64,
    },
    Table {
        #[serde(flatten)]
        frame: Frame,
        #[serde(default)]
        columns: Vec<TableColumn>,
    },
    Image {
        #[serde(flatten)]
        frame: Frame,
        #[serde(rename = "imageSource")]
        image_source: ImageSource,
    },
    Signature {
        #[serde(flatten)]
        frame: Frame,
        #[serde(rename = "signatureRole")]
        signature_role: SignatureRole,
    },
    Photo {
        #[serde(flatten)]
        frame: Frame,
    },
}

fn default_font_size() -> f64 {
    10.0
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_thickness() -> f64 {
    1.0
}

impl LayoutElement {
    /// The common geometry of this element.
    pub fn frame(&self) -> &Frame {
        match self {
            LayoutElement::Text { frame, .. }
            | LayoutElement::Line { frame, .. }
            | LayoutElement::Rect { frame, .. }
            | LayoutElement::Table { frame, .. }
            | LayoutElement::Image { frame, .. }
            | LayoutElement::Signature { frame, .. }
            | LayoutElement::Photo { frame } => frame,
        }
    }
}

/// Parse a raw JSON value into a layout document.
///
/// Callers holding untyped tenant customizations go through here so that a
/// non-array payload or an element with an unknown `type` tag surfaces as a
/// layout validation error rather than a bare serde message.
pub fn parse_layout(value: &Value) -> Result<LayoutDocument, DocpressError> {
    let items = value
        .as_array()
        .ok_or_else(|| DocpressError::InvalidLayout("layout must be an array of elements".into()))?;

    let mut elements = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let element: LayoutElement = serde_json::from_value(item.clone()).map_err(|e| {
            DocpressError::InvalidLayout(format!("element {}: {}", idx, e))
        })?;
        elements.push(element);
    }
    Ok(elements)
}
