//! Page geometry – page size plus four margins, in PDF points.

use serde::{Deserialize, Serialize};

/// One centimetre in points.
pub const CM: f32 = 72.0 / 2.54;

/// One millimetre in points.
pub const MM: f32 = CM / 10.0;

/// A4 width in points (210 mm).
pub const A4_WIDTH_PT: f32 = 595.28;

/// A4 height in points (297 mm).
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Page size and margins, constant for a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with 40 pt margins all round.
    fn default() -> Self {
        Self::a4().uniform(40.0)
    }
}

impl PageGeometry {
    /// A4 portrait with zero margins.
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH_PT,
            height: A4_HEIGHT_PT,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
        }
    }

    /// Set all four margins to the same value.
    pub fn uniform(self, margin: f32) -> Self {
        self.with_margins(margin, margin, margin, margin)
    }

    /// Set margins in CSS order: top, right, bottom, left.
    pub fn with_margins(mut self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        self.margin_top = top;
        self.margin_right = right;
        self.margin_bottom = bottom;
        self.margin_left = left;
        self
    }

    /// Width available to content between the side margins.
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Height available to content between the top and bottom margins.
    pub fn content_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }

    /// Page-absolute y of the bottom edge of the content frame.
    pub fn frame_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame() {
        let g = PageGeometry::a4().with_margins(2.5 * CM, 2.0 * CM, 2.5 * CM, 2.0 * CM);
        assert!((g.content_width() - (A4_WIDTH_PT - 4.0 * CM)).abs() < 0.01);
        assert!((g.content_height() - (A4_HEIGHT_PT - 5.0 * CM)).abs() < 0.01);
        assert!((g.frame_bottom() - (A4_HEIGHT_PT - 2.5 * CM)).abs() < 0.01);
    }

    #[test]
    fn one_cm_in_points() {
        assert!((CM - 28.3465).abs() < 0.001);
    }
}
