//! # Coordinate & Style Mapper
//!
//! Layout documents speak in millimeters with a top-left origin, because that
//! is how people position things on paper. PDF speaks in points with a
//! bottom-left origin. This module is the only place that conversion lives.

use serde::{Deserialize, Serialize};

/// Points per millimeter (72 / 25.4).
pub const MM_TO_PT: f64 = 2.83465;

/// A4 page width in points.
pub const PAGE_WIDTH_PT: f64 = 595.28;
/// A4 page height in points.
pub const PAGE_HEIGHT_PT: f64 = 841.89;

/// A4 page width in millimeters — the horizontal bound for layout geometry.
pub const PAGE_WIDTH_MM: f64 = 210.0;
/// A4 page height in millimeters — the vertical bound for layout geometry.
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Convert a millimeter value to points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// Convert a top-left-origin Y coordinate plus a height into the
/// bottom-left-origin Y of the box, in points.
pub fn page_y(y_mm: f64, height_mm: f64) -> f64 {
    PAGE_HEIGHT_PT - mm_to_pt(y_mm) - mm_to_pt(height_mm)
}

/// An RGB color with components in `[0, 1]`, matching the operand range of
/// the PDF `rg`/`RG` operators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parse a `#RRGGBB` hex string (leading `#` optional). Malformed input
    /// falls back to black rather than failing the render — a wrong color is
    /// a cosmetic defect, a refused document is a business incident.
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_pt_scale() {
        assert!((mm_to_pt(1.0) - 2.83465).abs() < 1e-9);
        assert!((mm_to_pt(210.0) - 595.2765).abs() < 1e-3);
    }

    #[test]
    fn test_page_y_flips_origin() {
        // A box at the very top of the page ends just below the page top.
        let y = page_y(0.0, 10.0);
        assert!((y - (PAGE_HEIGHT_PT - 28.3465)).abs() < 1e-3);

        // A zero-height box at the bottom edge lands at y = 0 (within the
        // rounding slack of the mm page height vs the pt page height).
        let y = page_y(297.0, 0.0);
        assert!(y.abs() < 0.2);
    }

    #[test]
    fn test_hex_color_parses() {
        let c = Color::from_hex("#FF0000");
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!(c.g.abs() < 1e-9);
        assert!(c.b.abs() < 1e-9);

        let c = Color::from_hex("00FF00");
        assert!((c.g - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_hex_falls_back_to_black() {
        assert_eq!(Color::from_hex("nope"), Color::BLACK);
        assert_eq!(Color::from_hex("#12345"), Color::BLACK);
        assert_eq!(Color::from_hex("#GGGGGG"), Color::BLACK);
        assert_eq!(Color::from_hex(""), Color::BLACK);
    }
}
