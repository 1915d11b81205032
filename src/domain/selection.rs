//! Selection and tool types

use serde::{Deserialize, Serialize};

use super::geometry::{LogicalRect, Point};

/// Global mode for interpreting a pointer-down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Rect,
    Arrow,
    Text,
}

/// Marquee selection as two raw corners
///
/// The corners may be in any order. Read the region through [`Selection::rect`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection {
    pub start: Point,
    pub end: Point,
    /// Set while the marquee is being created
    pub in_progress: bool,
}

impl Selection {
    /// Start a new zero-extent marquee at `p`
    pub fn begin(p: Point) -> Self {
        Self {
            start: p,
            end: p,
            in_progress: true,
        }
    }

    pub fn from_corners(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            in_progress: false,
        }
    }

    /// Normalized region
    pub fn rect(&self) -> LogicalRect {
        LogicalRect::from_points(self.start, self.end)
    }

    /// Move all four corners by the same delta
    pub fn translated(&self, dx: f32, dy: f32) -> Selection {
        Selection {
            start: self.start.offset(dx, dy),
            end: self.end.offset(dx, dy),
            in_progress: self.in_progress,
        }
    }
}

/// Where an exported image goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    /// Copy to clipboard
    #[default]
    Clipboard,
    /// Save to a file chosen by the save dialog
    File,
}
