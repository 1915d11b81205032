//! Shared geometry calculations for rendering
//!
//! Constants and math used by the scene rasterizer and the magnifier.
//! All lengths are logical pixels; the rasterizer scales them by the pixel
//! ratio through its transform.

use crate::domain::Point;

/// Arrow geometry constants
pub mod arrow {
    use crate::domain::Point;

    /// Shaft thickness
    pub const THICKNESS: f32 = 2.0;
    /// Distance from the tip to the base of the head
    pub const HEAD_LENGTH: f32 = 10.0;
    /// Full width of the head base
    pub const HEAD_WIDTH: f32 = 10.0;

    /// Triangle of the arrowhead as (tip, left base, right base)
    ///
    /// Returns `None` for a degenerate arrow with coincident endpoints.
    pub fn head_points(start: Point, end: Point) -> Option<(Point, Point, Point)> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f32::EPSILON {
            return None;
        }

        // Unit direction vector (pointing from start to end)
        let nx = dx / length;
        let ny = dy / length;

        let base_x = end.x - nx * HEAD_LENGTH;
        let base_y = end.y - ny * HEAD_LENGTH;
        let half = HEAD_WIDTH / 2.0;

        Some((
            end,
            Point::new(base_x - ny * half, base_y + nx * half),
            Point::new(base_x + ny * half, base_y - nx * half),
        ))
    }
}

/// Rectangle outline constants
pub mod shape {
    pub const THICKNESS: f32 = 2.0;
}

/// Text layout constants
pub mod text {
    /// Glyph cells per em in the bitmap font
    pub const GLYPH_CELLS: f32 = 8.0;
    /// Circled digits draw their numeral at this fraction of the font size
    pub const CIRCLED_DIGIT_SCALE: f32 = 0.55;
    /// Caret width of the text entry overlay
    pub const CARET_WIDTH: f32 = 1.5;
}

/// Selection overlay constants
pub mod overlay {
    /// Selection border color
    pub const BORDER_RGB: [u8; 3] = [0x00, 0xAA, 0xFF];
    pub const BORDER_WIDTH: f32 = 2.0;
    /// Side length of a drawn resize handle
    pub const HANDLE_SIZE: f32 = 8.0;
    /// Alpha of the shade outside the selection
    pub const DIM_ALPHA: u8 = 128;
    /// Dash pattern of the crosshair guide
    pub const CROSSHAIR_DASH: [f32; 2] = [4.0, 4.0];
    pub const CROSSHAIR_WIDTH: f32 = 1.0;
    /// Space between a selected annotation and its outline
    pub const HIGHLIGHT_GAP: f32 = 3.0;
}

/// Magnifier lens constants
pub mod lens {
    /// Gap between the cursor and the lens edge
    pub const OFFSET: f32 = 20.0;
    pub const BORDER_WIDTH: f32 = 2.0;
    /// Half-length of the center crosshair arms
    pub const CROSSHAIR_ARM: f32 = 8.0;
}

/// Place a box of `extent` next to `at`, flipping to the other side on overflow
///
/// The box starts `gap` away from `at`. Returns the near edge coordinate.
#[inline]
pub fn place_beside(at: f32, extent: f32, gap: f32, available: f32) -> f32 {
    let after = at + gap;
    if after + extent > available {
        at - gap - extent
    } else {
        after
    }
}

/// Parse the numeric value of a circled digit (① = 1 … ⑳ = 20)
pub fn circled_number(c: char) -> Option<u32> {
    let offset = (c as u32).checked_sub(0x2460)?;
    (offset < 20).then_some(offset + 1)
}

/// Midpoint of two points
#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}
