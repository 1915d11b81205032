//! Annotation types for drawing on screenshots
//!
//! All annotation types store coordinates in logical desktop coordinates.

use serde::{Deserialize, Serialize};

use super::geometry::{LogicalRect, Point};
use crate::config::ShapeColor;

/// Line height multiplier for text annotations
pub const TEXT_LINE_HEIGHT: f32 = 1.2;
/// Width estimate for typed text annotations
pub const DEFAULT_TEXT_WIDTH: f32 = 200.0;
/// Extra slack around thin shapes when hit-testing, in logical pixels
pub const HIT_TOLERANCE: f32 = 5.0;

/// Stable identifier of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

/// Outline rectangle
///
/// `width`/`height` may be negative when drawn towards the top-left.
/// `scale_x`/`scale_y` hold an in-flight resize until it is baked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "unit_scale")]
    pub scale_x: f32,
    #[serde(default = "unit_scale")]
    pub scale_y: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl RectShape {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Normalized on-screen bounds with the pending scale applied
    pub fn bounds(&self) -> LogicalRect {
        LogicalRect::new(
            self.x,
            self.y,
            self.width * self.scale_x,
            self.height * self.scale_y,
        )
    }

    /// Fold the pending scale into width/height and reset it to 1
    pub fn baked(&self) -> RectShape {
        RectShape {
            x: self.x,
            y: self.y,
            width: self.width * self.scale_x,
            height: self.height * self.scale_y,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Straight arrow from the first point pair to the second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowShape {
    /// Flat point list `[x1, y1, x2, y2]`
    pub points: [f32; 4],
}

impl ArrowShape {
    pub fn start(&self) -> Point {
        Point::new(self.points[0], self.points[1])
    }

    pub fn end(&self) -> Point {
        Point::new(self.points[2], self.points[3])
    }
}

/// Single-line text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextShape {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    /// Width estimate used for hit-testing
    pub width: f32,
}

impl TextShape {
    pub fn bounds(&self) -> LogicalRect {
        LogicalRect::new(self.x, self.y, self.width, self.font_size * TEXT_LINE_HEIGHT)
    }
}

/// Geometry of an annotation, one variant per shape kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect(RectShape),
    Arrow(ArrowShape),
    Text(TextShape),
}

/// A drawn object owned by the annotation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub color: ShapeColor,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Annotation {
    pub fn rect(id: AnnotationId, color: ShapeColor, origin: Point) -> Self {
        Self {
            id,
            color,
            shape: Shape::Rect(RectShape::new(origin.x, origin.y, 0.0, 0.0)),
        }
    }

    pub fn arrow(id: AnnotationId, color: ShapeColor, origin: Point) -> Self {
        Self {
            id,
            color,
            shape: Shape::Arrow(ArrowShape {
                points: [origin.x, origin.y, origin.x, origin.y],
            }),
        }
    }

    pub fn text(
        id: AnnotationId,
        color: ShapeColor,
        at: Point,
        text: impl Into<String>,
        font_size: f32,
        width: f32,
    ) -> Self {
        Self {
            id,
            color,
            shape: Shape::Text(TextShape {
                x: at.x,
                y: at.y,
                text: text.into(),
                font_size,
                width,
            }),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.shape, Shape::Text(_))
    }

    /// Normalized bounding box
    pub fn bounds(&self) -> LogicalRect {
        match &self.shape {
            Shape::Rect(r) => r.bounds(),
            Shape::Arrow(a) => LogicalRect::from_points(a.start(), a.end()),
            Shape::Text(t) => t.bounds(),
        }
    }

    /// Check whether `p` grabs this annotation
    pub fn hit_test(&self, p: Point) -> bool {
        match &self.shape {
            Shape::Rect(r) => r.bounds().inflate(HIT_TOLERANCE).contains(p),
            Shape::Arrow(a) => distance_to_segment(p, a.start(), a.end()) <= HIT_TOLERANCE,
            Shape::Text(t) => t.bounds().contains(p),
        }
    }

    /// Copy of this annotation moved by the given delta
    pub fn translated(&self, dx: f32, dy: f32) -> Annotation {
        let shape = match &self.shape {
            Shape::Rect(r) => Shape::Rect(RectShape {
                x: r.x + dx,
                y: r.y + dy,
                ..r.clone()
            }),
            Shape::Arrow(a) => {
                let [x1, y1, x2, y2] = a.points;
                Shape::Arrow(ArrowShape {
                    points: [x1 + dx, y1 + dy, x2 + dx, y2 + dy],
                })
            }
            Shape::Text(t) => Shape::Text(TextShape {
                x: t.x + dx,
                y: t.y + dy,
                ..t.clone()
            }),
        };
        Annotation {
            id: self.id,
            color: self.color,
            shape,
        }
    }

    /// Copy with any pending rect scale folded into its geometry
    pub fn baked(&self) -> Annotation {
        match &self.shape {
            Shape::Rect(r) => Annotation {
                id: self.id,
                color: self.color,
                shape: Shape::Rect(r.baked()),
            },
            _ => self.clone(),
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = b.delta_from(a);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a.offset(dx * t, dy * t);
    let (ex, ey) = p.delta_from(closest);
    (ex * ex + ey * ey).sqrt()
}
