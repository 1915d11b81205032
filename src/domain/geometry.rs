//! Geometric types for selection regions and coordinates
//!
//! Everything here works in logical pixels unless a name says otherwise.
//! Physical pixels only appear at the capture and export boundaries.

use serde::{Deserialize, Serialize};

/// Hit radius around a resize handle, in logical pixels
pub const HANDLE_HIT_RADIUS: f32 = 10.0;

/// A position in logical coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset the point by the given delta
    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Delta from `origin` to this point
    pub fn delta_from(self, origin: Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// Logical size of a surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Normalized rectangle, width and height are never negative
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LogicalRect {
    /// Create a rectangle from origin and extent, normalizing negative extents
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_points(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// Build the normalized rectangle spanned by two arbitrary corners
    pub fn from_points(a: Point, b: Point) -> Self {
        let (min_x, max_x) = if a.x < b.x { (a.x, b.x) } else { (b.x, a.x) };
        let (min_y, max_y) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when either extent is zero
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if the point lies inside, edges included
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Check if the point lies inside, right and bottom edges excluded
    ///
    /// Used for tiled captures so a point on a shared edge belongs to exactly one tile.
    pub fn contains_half_open(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Grow the rectangle by `amount` on every side
    pub fn inflate(&self, amount: f32) -> LogicalRect {
        LogicalRect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> LogicalRect {
        LogicalRect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: LogicalRect) -> Option<LogicalRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(LogicalRect {
                x: left,
                y: top,
                width: right - left,
                height: bottom - top,
            })
        } else {
            None
        }
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: LogicalRect) -> LogicalRect {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        LogicalRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Position of a resize handle on this rectangle
    pub fn handle_point(&self, handle: Handle) -> Point {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        match handle {
            Handle::NW => Point::new(self.x, self.y),
            Handle::N => Point::new(cx, self.y),
            Handle::NE => Point::new(self.right(), self.y),
            Handle::E => Point::new(self.right(), cy),
            Handle::SE => Point::new(self.right(), self.bottom()),
            Handle::S => Point::new(cx, self.bottom()),
            Handle::SW => Point::new(self.x, self.bottom()),
            Handle::W => Point::new(self.x, cy),
        }
    }

    /// Find the first handle whose square hot zone of half-size `radius` contains `p`
    pub fn handle_at(&self, p: Point, radius: f32) -> Option<Handle> {
        Handle::ALL.into_iter().find(|&handle| {
            let h = self.handle_point(handle);
            (p.x - h.x).abs() <= radius && (p.y - h.y).abs() <= radius
        })
    }
}

/// One of the eight resize hotspots of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
}

impl Handle {
    /// Hit-test order
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    /// Whether dragging this handle moves the left edge
    pub fn moves_left(self) -> bool {
        matches!(self, Handle::NW | Handle::W | Handle::SW)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Handle::NE | Handle::E | Handle::SE)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Handle::NW | Handle::N | Handle::NE)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Handle::SW | Handle::S | Handle::SE)
    }

    /// Recompute the corners of `snapshot` with this handle dragged to `p`
    ///
    /// The edges opposite the handle come from the snapshot, never from a live
    /// rectangle, so repeated moves cannot drift. The result is returned as a
    /// (start, end) corner pair and may be unnormalized when the pointer
    /// crosses the fixed edge.
    pub fn resize(self, snapshot: LogicalRect, p: Point) -> (Point, Point) {
        let left = if self.moves_left() { p.x } else { snapshot.x };
        let right = if self.moves_right() {
            p.x
        } else {
            snapshot.right()
        };
        let top = if self.moves_top() { p.y } else { snapshot.y };
        let bottom = if self.moves_bottom() {
            p.y
        } else {
            snapshot.bottom()
        };
        (Point::new(left, top), Point::new(right, bottom))
    }
}

/// Convert a physical length to logical pixels
#[inline]
pub fn to_logical(physical: f32, pixel_ratio: f32) -> f32 {
    physical / pixel_ratio
}

/// Convert a logical length to physical pixels
#[inline]
pub fn to_physical(logical: f32, pixel_ratio: f32) -> f32 {
    logical * pixel_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_ignores_corner_order() {
        let pairs = [
            (Point::new(10.0, 20.0), Point::new(110.0, 70.0)),
            (Point::new(-5.0, 40.0), Point::new(30.0, -12.5)),
            (Point::new(0.0, 0.0), Point::new(0.0, 0.0)),
            (Point::new(300.0, 200.0), Point::new(100.0, 100.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(LogicalRect::from_points(a, b), LogicalRect::from_points(b, a));
            let r = LogicalRect::from_points(a, b);
            assert!(r.width >= 0.0 && r.height >= 0.0);
        }
    }

    #[test]
    fn test_new_normalizes_negative_extent() {
        let r = LogicalRect::new(100.0, 50.0, -40.0, -10.0);
        assert_eq!(r, LogicalRect { x: 60.0, y: 40.0, width: 40.0, height: 10.0 });
    }

    #[test]
    fn test_handle_hit_uses_radius() {
        let r = LogicalRect::new(100.0, 100.0, 200.0, 100.0);
        assert_eq!(r.handle_at(Point::new(95.0, 108.0), HANDLE_HIT_RADIUS), Some(Handle::NW));
        assert_eq!(r.handle_at(Point::new(200.0, 100.0), HANDLE_HIT_RADIUS), Some(Handle::N));
        assert_eq!(r.handle_at(Point::new(309.0, 150.0), HANDLE_HIT_RADIUS), Some(Handle::E));
        assert_eq!(r.handle_at(Point::new(200.0, 205.0), HANDLE_HIT_RADIUS), Some(Handle::S));
        assert_eq!(r.handle_at(Point::new(150.0, 150.0), HANDLE_HIT_RADIUS), None);
        assert_eq!(r.handle_at(Point::new(89.0, 100.0), HANDLE_HIT_RADIUS), None);
    }

    #[test]
    fn test_resize_keeps_untouched_edges_for_every_handle() {
        let snapshot = LogicalRect::new(100.0, 100.0, 200.0, 100.0);
        // Pointer stays on the handle's side of the fixed edges so orientation holds
        let targets = [
            (Handle::NW, Point::new(80.0, 70.0)),
            (Handle::N, Point::new(250.0, 60.0)),
            (Handle::NE, Point::new(340.0, 90.0)),
            (Handle::E, Point::new(360.0, 10.0)),
            (Handle::SE, Point::new(320.0, 260.0)),
            (Handle::S, Point::new(5.0, 240.0)),
            (Handle::SW, Point::new(50.0, 230.0)),
            (Handle::W, Point::new(40.0, 500.0)),
        ];

        for (handle, p) in targets {
            let (start, end) = handle.resize(snapshot, p);
            let r = LogicalRect::from_points(start, end);

            let corners = [
                (Handle::NW, false, false),
                (Handle::NE, true, false),
                (Handle::SE, true, true),
                (Handle::SW, false, true),
            ];
            for (corner, on_right, on_bottom) in corners {
                let x_moved = if on_right { handle.moves_right() } else { handle.moves_left() };
                let y_moved = if on_bottom { handle.moves_bottom() } else { handle.moves_top() };
                if !x_moved && !y_moved {
                    assert_eq!(
                        r.handle_point(corner),
                        snapshot.handle_point(corner),
                        "{handle:?} moved {corner:?}"
                    );
                }
            }

            if !handle.moves_left() {
                assert_eq!(r.x, snapshot.x, "{handle:?}");
            }
            if !handle.moves_right() {
                assert_eq!(r.right(), snapshot.right(), "{handle:?}");
            }
            if !handle.moves_top() {
                assert_eq!(r.y, snapshot.y, "{handle:?}");
            }
            if !handle.moves_bottom() {
                assert_eq!(r.bottom(), snapshot.bottom(), "{handle:?}");
            }
        }
    }

    #[test]
    fn test_resize_past_fixed_edge_goes_unnormalized() {
        let snapshot = LogicalRect::new(100.0, 100.0, 200.0, 100.0);
        let (start, end) = Handle::E.resize(snapshot, Point::new(40.0, 0.0));
        assert_eq!(start, Point::new(100.0, 100.0));
        assert_eq!(end, Point::new(40.0, 200.0));
        let r = LogicalRect::from_points(start, end);
        assert_eq!(r, LogicalRect::new(40.0, 100.0, 60.0, 100.0));
    }

    #[test]
    fn test_intersect_and_union() {
        let a = LogicalRect::new(0.0, 0.0, 100.0, 100.0);
        let b = LogicalRect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.intersect(b), Some(LogicalRect::new(50.0, 50.0, 50.0, 50.0)));
        assert_eq!(a.union(b), LogicalRect::new(0.0, 0.0, 150.0, 150.0));
        assert_eq!(a.intersect(LogicalRect::new(100.0, 0.0, 10.0, 10.0)), None);
    }

    #[test]
    fn test_scale_conversion() {
        assert_eq!(to_logical(1920.0, 2.0), 960.0);
        assert_eq!(to_physical(200.0, 2.0), 400.0);
    }
}
