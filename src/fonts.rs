//! Builtin font metrics and text measurement.
//!
//! Only the standard PDF base fonts are drawn (Helvetica and Courier in their
//! four variants), so measurement uses their AFM advance widths instead of
//! parsing font files. Widths are in 1/1000 em.

/// Helvetica / Helvetica-Oblique advances for ASCII 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold / Helvetica-BoldOblique advances for ASCII 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Every Courier glyph advances 600/1000 em.
const COURIER_ADVANCE: u16 = 600;

/// The builtin families the renderer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Helvetica,
    Courier,
}

impl Family {
    /// Resolve a style's family name; anything that is not Courier draws
    /// as Helvetica.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("courier") {
            Family::Courier
        } else {
            Family::Helvetica
        }
    }

    /// Ascender height in 1/1000 em.
    pub fn ascender(&self) -> f32 {
        match self {
            Family::Helvetica => 718.0,
            Family::Courier => 629.0,
        }
    }
}

/// Measures text set in the builtin fonts.
#[derive(Debug, Clone, Default)]
pub struct FontManager;

impl FontManager {
    pub fn new() -> Self {
        Self
    }

    /// Advance of one character in 1/1000 em.
    fn advance(family: Family, bold: bool, ch: char) -> u16 {
        if family == Family::Courier {
            return COURIER_ADVANCE;
        }
        let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
        match ch {
            ' '..='~' => table[ch as usize - 0x20],
            '\u{00A0}' => 278,
            '\u{2022}' => 350,
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{00D7}' => 584,
            '\u{2018}' | '\u{2019}' => {
                if bold {
                    278
                } else {
                    222
                }
            }
            '\u{201C}' | '\u{201D}' => {
                if bold {
                    500
                } else {
                    333
                }
            }
            _ => 556,
        }
    }

    /// Measure the width of a string at a given font size, in points.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        _italic: bool,
        family: &str,
    ) -> f32 {
        let family = Family::from_name(family);
        let units: u32 = text
            .chars()
            .map(|c| Self::advance(family, bold, c) as u32)
            .sum();
        units as f32 * font_size / 1000.0
    }

    /// Line height in points for a font size and a CSS-style factor.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in points for the given family.
    pub fn ascender_px(&self, font_size: f32, family: &str) -> f32 {
        Family::from_name(family).ascender() * font_size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_afm_widths() {
        let mgr = FontManager::default();
        // H=722 e=556 l=222 l=222 o=556 → 2278 units
        let w = mgr.measure_text_width("Hello", 10.0, false, false, "Helvetica");
        assert!((w - 22.78).abs() < 0.01, "got {w}");
        let bold = mgr.measure_text_width("Hello", 10.0, true, false, "Helvetica");
        assert!(bold > w);
    }

    #[test]
    fn courier_is_monospaced() {
        let mgr = FontManager::default();
        let a = mgr.measure_text_width("iiii", 8.0, false, false, "Courier");
        let b = mgr.measure_text_width("WWWW", 8.0, false, false, "Courier");
        assert_eq!(a, b);
        assert!((a - 19.2).abs() < 0.001);
    }

    #[test]
    fn unknown_family_measures_as_helvetica() {
        let mgr = FontManager::default();
        assert_eq!(
            mgr.measure_text_width("abc", 9.0, false, false, "Times"),
            mgr.measure_text_width("abc", 9.0, false, false, "Helvetica")
        );
    }
}
