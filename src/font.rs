//! # Font Metrics
//!
//! The element catalog draws with exactly two fonts: Helvetica and
//! Helvetica-Bold, both standard PDF Type1 fonts that never need embedding.
//! What we do need are their advance widths, so `center`/`right` alignment
//! can measure text instead of guessing. The tables below are the AFM widths
//! for the printable ASCII range in 1/1000 em units.

/// Font weight for text and table elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Helvetica advance widths for chars 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // SP..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, // A..P
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // Q..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, // a..p
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // q..z
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for chars 0x20..=0x7E, in 1/1000 em.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611,
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Advance width of a single character in points. Characters outside the
/// ASCII table use the width of 'o' as a reasonable stand-in — they still
/// render (via WinAnsi where possible), we just measure them approximately.
pub fn char_width(ch: char, weight: FontWeight, font_size: f64) -> f64 {
    let table = match weight {
        FontWeight::Normal => &HELVETICA_WIDTHS,
        FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let cp = ch as u32;
    let units = if (0x20..=0x7E).contains(&cp) {
        table[(cp - 0x20) as usize]
    } else {
        table[(b'o' - 0x20) as usize]
    };
    units as f64 / 1000.0 * font_size
}

/// Measure the width of a string in points.
pub fn measure_string(text: &str, weight: FontWeight, font_size: f64) -> f64 {
    text.chars().map(|ch| char_width(ch, weight, font_size)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width_helvetica() {
        let w = char_width(' ', FontWeight::Normal, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let regular = char_width('A', FontWeight::Normal, 12.0);
        let bold = char_width('A', FontWeight::Bold, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_measure_string_sums_chars() {
        let w = measure_string("Hi", FontWeight::Normal, 10.0);
        let expected = char_width('H', FontWeight::Normal, 10.0)
            + char_width('i', FontWeight::Normal, 10.0);
        assert!((w - expected).abs() < 1e-9);
    }

    #[test]
    fn test_non_ascii_uses_fallback_width() {
        let fallback = char_width('o', FontWeight::Normal, 10.0);
        assert!((char_width('é', FontWeight::Normal, 10.0) - fallback).abs() < 1e-9);
    }

    #[test]
    fn test_empty_string_measures_zero() {
        assert_eq!(measure_string("", FontWeight::Normal, 12.0), 0.0);
    }
}
