//! # Layout Validator
//!
//! Structural and bounds checks applied before any drawing begins. Pure over
//! its input: the same layout always yields the same verdict. Evaluation is
//! in element order and the first failure wins, so error messages point at
//! one concrete element rather than a pile of violations.
//!
//! Bounds are checked here, not at render time — a layout that validates is
//! a layout the renderer will accept without re-checking geometry.

use crate::error::DocpressError;
use crate::geometry::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::layout::{Frame, LayoutElement};

/// Complexity guard: more elements than this is either a runaway generator
/// or a denial-of-service attempt, not a business document.
pub const MAX_ELEMENTS: usize = 100;

/// A table wider than this stops being a table a human can read on A4.
pub const MAX_TABLE_COLUMNS: usize = 20;

/// Validate a layout document. `Ok(())` means the renderer will accept it.
pub fn validate(layout: &[LayoutElement]) -> Result<(), DocpressError> {
    if layout.len() > MAX_ELEMENTS {
        return Err(DocpressError::InvalidLayout(format!(
            "layout has {} elements, exceeding the {} element limit",
            layout.len(),
            MAX_ELEMENTS
        )));
    }

    for element in layout {
        validate_frame(element.frame())?;

        if let LayoutElement::Table { frame, columns } = element {
            if columns.len() > MAX_TABLE_COLUMNS {
                return Err(DocpressError::InvalidLayout(format!(
                    "element '{}': table has {} columns, exceeding the {} column limit",
                    frame.id,
                    columns.len(),
                    MAX_TABLE_COLUMNS
                )));
            }
        }
    }

    Ok(())
}

fn validate_frame(frame: &Frame) -> Result<(), DocpressError> {
    let Frame { id, x, y, w, h } = frame;

    for (name, value) in [("x", x), ("y", y), ("w", w), ("h", h)] {
        if !value.is_finite() {
            return Err(DocpressError::InvalidLayout(format!(
                "element '{}': {} must be a finite number",
                id, name
            )));
        }
    }

    // Position and size are both bounded by the page dimensions. Size is
    // checked against the page ceiling, not against remaining space — an
    // element may overhang the right or bottom edge and simply clip.
    if *x < 0.0 || *x > PAGE_WIDTH_MM || *y < 0.0 || *y > PAGE_HEIGHT_MM {
        return Err(DocpressError::InvalidLayout(format!(
            "element '{}': position ({}, {}) outside A4 bounds 0-{} x 0-{}",
            id, x, y, PAGE_WIDTH_MM, PAGE_HEIGHT_MM
        )));
    }
    if *w < 0.0 || *w > PAGE_WIDTH_MM || *h < 0.0 || *h > PAGE_HEIGHT_MM {
        return Err(DocpressError::InvalidLayout(format!(
            "element '{}': size {}x{} outside A4 bounds 0-{} x 0-{}",
            id, w, h, PAGE_WIDTH_MM, PAGE_HEIGHT_MM
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TableColumn;

    fn text_at(id: &str, x: f64, y: f64, w: f64, h: f64) -> LayoutElement {
        LayoutElement::Text {
            frame: Frame { id: id.to_string(), x, y, w, h },
            binding: "hello".to_string(),
            font_size: 10.0,
            font_weight: Default::default(),
            color: "#000000".to_string(),
            align: Default::default(),
        }
    }

    #[test]
    fn test_valid_layout_passes() {
        let layout = vec![text_at("a", 10.0, 10.0, 100.0, 8.0)];
        assert!(validate(&layout).is_ok());
    }

    #[test]
    fn test_element_cap_boundary() {
        let layout: Vec<_> = (0..100).map(|i| text_at(&format!("e{}", i), 0.0, 0.0, 10.0, 5.0)).collect();
        assert!(validate(&layout).is_ok());

        let layout: Vec<_> = (0..101).map(|i| text_at(&format!("e{}", i), 0.0, 0.0, 10.0, 5.0)).collect();
        let err = validate(&layout).unwrap_err();
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_out_of_bounds_position_rejected() {
        assert!(validate(&[text_at("a", 211.0, 0.0, 10.0, 5.0)]).is_err());
        assert!(validate(&[text_at("a", 0.0, 298.0, 10.0, 5.0)]).is_err());
        assert!(validate(&[text_at("a", -1.0, 0.0, 10.0, 5.0)]).is_err());
        assert!(validate(&[text_at("a", 0.0, -0.5, 10.0, 5.0)]).is_err());
    }

    #[test]
    fn test_out_of_bounds_size_rejected() {
        assert!(validate(&[text_at("a", 0.0, 0.0, 210.5, 5.0)]).is_err());
        assert!(validate(&[text_at("a", 0.0, 0.0, 10.0, 297.5)]).is_err());
    }

    #[test]
    fn test_size_checked_against_page_not_remaining_space() {
        // 200mm wide at x=100 overhangs the right edge, but both values are
        // individually within the page ceiling, so this is valid.
        assert!(validate(&[text_at("a", 100.0, 0.0, 200.0, 5.0)]).is_ok());
    }

    #[test]
    fn test_nan_geometry_rejected() {
        let err = validate(&[text_at("a", f64::NAN, 0.0, 10.0, 5.0)]).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_table_column_cap() {
        let columns: Vec<_> = (0..21)
            .map(|i| TableColumn { header: format!("c{}", i), binding: "{{v}}".into(), width: 8.0 })
            .collect();
        let table = LayoutElement::Table {
            frame: Frame { id: "t".into(), x: 0.0, y: 0.0, w: 190.0, h: 60.0 },
            columns,
        };
        let err = validate(&[table]).unwrap_err();
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn test_validator_is_deterministic() {
        let layout = vec![text_at("a", 300.0, 0.0, 10.0, 5.0)];
        let first = validate(&layout).unwrap_err().to_string();
        let second = validate(&layout).unwrap_err().to_string();
        assert_eq!(first, second);
    }
}
