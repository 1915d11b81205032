//! Magnifier lens for precise selection

use tiny_skia::{Color, FillRule, Mask, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::geometry::{lens, place_beside};
use crate::capture::image::Capture;
use crate::config::MagnifierSettings;
use crate::domain::{Point, Size, to_physical};

/// A positioned lens and the capture pixel it magnifies
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lens {
    /// Lens center in window-logical coordinates
    pub center: Point,
    pub radius: f32,
    /// Index into the capture list
    pub capture: usize,
    /// Magnified position in the capture image, in image pixels
    pub source: Point,
    /// Logical size of one source pixel inside the lens
    pub cell: f32,
}

/// Position the lens for a cursor at `cursor` (window-logical)
///
/// The cursor is mapped to desktop space through the window origin, then
/// into the capture under it. Returns `None` when the magnifier is off or
/// the cursor is over no decoded capture.
pub fn locate(
    cursor: Point,
    window_origin: Point,
    captures: &[Capture],
    pixel_ratio: f32,
    settings: MagnifierSettings,
    viewport: Size,
) -> Option<Lens> {
    if !settings.enabled {
        return None;
    }
    let desktop = cursor.offset(window_origin.x, window_origin.y);
    let (index, capture) = captures
        .iter()
        .enumerate()
        .find(|(_, c)| c.logical_rect(pixel_ratio).contains_half_open(desktop))?;
    let image = capture.image.as_ref()?;

    // physical desktop offset inside the capture, then image pixels
    let px = to_physical(desktop.x, pixel_ratio) - capture.x as f32;
    let py = to_physical(desktop.y, pixel_ratio) - capture.y as f32;
    let sx = image.width() as f32 / capture.width.max(1) as f32;
    let sy = image.height() as f32 / capture.height.max(1) as f32;

    let radius = settings.radius;
    let diameter = radius * 2.0;
    let center = Point::new(
        place_beside(cursor.x, diameter, lens::OFFSET, viewport.width) + radius,
        place_beside(cursor.y, diameter, lens::OFFSET, viewport.height) + radius,
    );

    Some(Lens {
        center,
        radius,
        capture: index,
        source: Point::new(px * sx, py * sy),
        cell: settings.zoom / pixel_ratio,
    })
}

/// Draw the lens; `transform` maps window-logical coordinates to the pixmap
pub fn draw_lens(pixmap: &mut Pixmap, lens_view: &Lens, captures: &[Capture], transform: Transform) {
    let Some(image) = captures.get(lens_view.capture).and_then(|c| c.image.as_ref()) else {
        return;
    };
    let Lens {
        center,
        radius,
        source,
        cell,
        ..
    } = *lens_view;
    let Some(circle) = PathBuilder::from_circle(center.x, center.y, radius) else {
        return;
    };

    let Some(mut clip) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    clip.fill_path(&circle, FillRule::Winding, true, transform);

    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 230);
    pixmap.fill_path(&circle, &paint, FillRule::Winding, transform, None);

    // Sample pixel-by-pixel around the source position
    let span = (radius / cell).ceil() as i32 + 1;
    let (cx, cy) = (source.x.floor() as i32, source.y.floor() as i32);
    let (frac_x, frac_y) = (source.x - cx as f32, source.y - cy as f32);
    for dy in -span..=span {
        for dx in -span..=span {
            let (src_x, src_y) = (cx + dx, cy + dy);
            if src_x < 0 || src_y < 0 || src_x >= image.width() as i32 || src_y >= image.height() as i32 {
                continue;
            }
            let [r, g, b, a] = image.get_pixel(src_x as u32, src_y as u32).0;
            let x = center.x + (dx as f32 - frac_x) * cell;
            let y = center.y + (dy as f32 - frac_y) * cell;
            if let Some(rect) = Rect::from_xywh(x, y, cell, cell) {
                paint.set_color_rgba8(r, g, b, a);
                pixmap.fill_rect(rect, &paint, transform, Some(&clip));
            }
        }
    }

    // Crosshair in center
    let arm = lens::CROSSHAIR_ARM;
    let mut pb = PathBuilder::new();
    pb.move_to(center.x - arm, center.y);
    pb.line_to(center.x + arm, center.y);
    pb.move_to(center.x, center.y - arm);
    pb.line_to(center.x, center.y + arm);
    if let Some(path) = pb.finish() {
        paint.set_color(Color::from_rgba8(255, 255, 255, 204));
        let stroke = Stroke {
            width: 1.0,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }

    // Border on top of everything
    paint.set_color(Color::WHITE);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: lens::BORDER_WIDTH,
        ..Default::default()
    };
    pixmap.stroke_path(&circle, &paint, &stroke, transform, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn settings() -> MagnifierSettings {
        MagnifierSettings {
            enabled: true,
            radius: 60.0,
            zoom: 4.0,
        }
    }

    fn capture(x: i32, width: u32, height: u32) -> Capture {
        Capture {
            x,
            y: 0,
            width,
            height,
            image: Some(RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255]))),
        }
    }

    #[test]
    fn test_disabled_magnifier_has_no_lens() {
        let captures = [capture(0, 100, 100)];
        let mut off = settings();
        off.enabled = false;
        assert!(locate(Point::new(5.0, 5.0), Point::default(), &captures, 1.0, off, Size::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_source_uses_physical_offset_in_owning_capture() {
        let captures = [capture(0, 3840, 2160), capture(3840, 3840, 2160)];
        let lens = locate(
            Point::new(2000.0, 100.0),
            Point::default(),
            &captures,
            2.0,
            settings(),
            Size::new(3840.0, 1080.0),
        )
        .unwrap();
        assert_eq!(lens.capture, 1);
        assert_eq!(lens.source, Point::new(160.0, 200.0));
        assert_eq!(lens.cell, 2.0);
    }

    #[test]
    fn test_window_origin_shifts_lookup() {
        let captures = [capture(0, 200, 100), capture(200, 200, 100)];
        let lens = locate(
            Point::new(10.0, 10.0),
            Point::new(200.0, 0.0),
            &captures,
            1.0,
            settings(),
            Size::new(200.0, 100.0),
        )
        .unwrap();
        assert_eq!(lens.capture, 1);
        assert_eq!(lens.source, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_lens_flips_near_viewport_edge() {
        let captures = [capture(0, 1000, 800)];
        let viewport = Size::new(1000.0, 800.0);
        let near = locate(Point::new(100.0, 100.0), Point::default(), &captures, 1.0, settings(), viewport).unwrap();
        assert_eq!(near.center, Point::new(180.0, 180.0));

        let edge = locate(Point::new(950.0, 780.0), Point::default(), &captures, 1.0, settings(), viewport).unwrap();
        assert_eq!(edge.center, Point::new(870.0, 700.0));
    }

    #[test]
    fn test_cursor_outside_captures() {
        let captures = [capture(0, 100, 100)];
        assert!(locate(Point::new(150.0, 5.0), Point::default(), &captures, 1.0, settings(), Size::new(300.0, 100.0)).is_none());
    }

    #[test]
    fn test_draw_lens_paints_center_pixel_color() {
        let captures = [capture(0, 400, 400)];
        let lens = locate(Point::new(50.0, 50.0), Point::default(), &captures, 1.0, settings(), Size::new(400.0, 400.0)).unwrap();
        let mut pixmap = Pixmap::new(400, 400).unwrap();
        draw_lens(&mut pixmap, &lens, &captures, Transform::identity());

        // a point inside the lens, off the crosshair arms
        let probe = pixmap
            .pixel((lens.center.x + 20.0) as u32, (lens.center.y + 20.0) as u32)
            .unwrap();
        assert_eq!((probe.red(), probe.green(), probe.blue()), (0, 0, 255));
    }
}
