//! Scene rasterization using tiny-skia
//!
//! One renderer serves both the on-screen preview and export. Everything is
//! laid out in window-logical coordinates and mapped to output pixels by a
//! single transform, so export resolution follows the pixel ratio.

use std::sync::Arc;

use anyhow::Context;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::RgbaImage;
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, LineCap, LineJoin, Mask, Paint, Path, PathBuilder,
    Pixmap, PixmapPaint, Rect, Stroke, StrokeDash, Transform,
};

use super::geometry::{self, arrow, overlay, shape, text};
use super::magnifier::{self, Lens};
use crate::capture::image::Capture;
use crate::config::{FONT_SIZES, PALETTE, STAMPS, ShapeColor};
use crate::domain::{Annotation, Handle, LogicalRect, Point, Shape, Size, TEXT_LINE_HEIGHT};

/// Text entry box drawn over the canvas while typing
#[derive(Clone, Debug, PartialEq)]
pub struct TextEditOverlay {
    pub anchor: Point,
    pub text: String,
    pub color: ShapeColor,
    pub font_size: f32,
}

/// Contextual toolbar: palette, stamps and font size
#[derive(Clone, Debug, PartialEq)]
pub struct ToolbarOverlay {
    pub origin: Point,
    pub size: Size,
    pub color: ShapeColor,
    pub font_size: f32,
    pub stamp: Option<String>,
}

/// Highlight around the annotation targeted by Delete
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectedOverlay {
    pub bounds: LogicalRect,
    /// Rectangles can be resized from their handles
    pub resizable: bool,
}

/// Interactive decorations that never reach an exported image
#[derive(Clone, Debug, Default)]
pub struct Overlays {
    pub visible: bool,
    /// Marquee still being created; handles are hidden
    pub selecting: bool,
    /// Cursor guide lines with a coordinate label
    pub crosshair: Option<Point>,
    pub lens: Option<Lens>,
    pub text_edit: Option<TextEditOverlay>,
    pub toolbar: Option<ToolbarOverlay>,
    pub selected: Option<SelectedOverlay>,
}

/// Everything needed to draw one frame
#[derive(Clone, Debug)]
pub struct Scene {
    pub captures: Arc<Vec<Capture>>,
    pub pixel_ratio: f32,
    /// Logical desktop position of the window's top-left corner
    pub window_origin: Point,
    pub viewport: Size,
    pub annotations: Arc<Vec<Annotation>>,
    /// Annotations are clipped to this region
    pub selection: LogicalRect,
    pub overlays: Overlays,
}

/// Something that can rasterize a region of the canvas
pub trait Surface {
    fn set_overlays_visible(&mut self, visible: bool);
    fn overlays_visible(&self) -> bool;
    /// Render `region` (window-logical) at `pixel_ratio` output pixels per logical pixel
    fn rasterize(&self, region: LogicalRect, pixel_ratio: f32) -> anyhow::Result<RgbaImage>;
}

/// Software surface backed by tiny-skia
#[derive(Clone, Debug)]
pub struct SkiaSurface {
    scene: Scene,
    overlays_visible: bool,
}

impl SkiaSurface {
    pub fn new(scene: Scene) -> Self {
        let overlays_visible = scene.overlays.visible;
        Self {
            scene,
            overlays_visible,
        }
    }

    /// Render the whole viewport as the user sees it
    pub fn preview(&self) -> anyhow::Result<RgbaImage> {
        let view = LogicalRect::new(0.0, 0.0, self.scene.viewport.width, self.scene.viewport.height);
        self.rasterize(view, self.scene.pixel_ratio)
    }
}

impl Surface for SkiaSurface {
    fn set_overlays_visible(&mut self, visible: bool) {
        self.overlays_visible = visible;
    }

    fn overlays_visible(&self) -> bool {
        self.overlays_visible
    }

    fn rasterize(&self, region: LogicalRect, pixel_ratio: f32) -> anyhow::Result<RgbaImage> {
        let width = (region.width * pixel_ratio).round() as u32;
        let height = (region.height * pixel_ratio).round() as u32;
        let mut pixmap = Pixmap::new(width, height)
            .with_context(|| format!("invalid raster size {width}x{height}"))?;
        let transform = Transform::from_row(
            pixel_ratio,
            0.0,
            0.0,
            pixel_ratio,
            -region.x * pixel_ratio,
            -region.y * pixel_ratio,
        );

        pixmap.fill(Color::BLACK);
        draw_captures(&mut pixmap, &self.scene, transform);
        draw_annotations(&mut pixmap, &self.scene.annotations, self.scene.selection, transform);
        if self.overlays_visible {
            draw_overlays(&mut pixmap, &self.scene, transform);
        }
        Ok(to_rgba_image(&pixmap))
    }
}

/// Convert RgbaImage to a premultiplied Pixmap
fn pixmap_from_rgba(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let data = img
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            [mul(r), mul(g), mul(b), a]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn solid(color: ShapeColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn rect_path(r: LogicalRect) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(r.x, r.y);
    pb.line_to(r.right(), r.y);
    pb.line_to(r.right(), r.bottom());
    pb.line_to(r.x, r.bottom());
    pb.close();
    pb.finish()
}

// ============================================================================
// Captures
// ============================================================================

fn draw_captures(pixmap: &mut Pixmap, scene: &Scene, transform: Transform) {
    let origin = scene.window_origin;
    for capture in scene.captures.iter() {
        let Some(image) = &capture.image else {
            continue;
        };
        let Some(src) = pixmap_from_rgba(image) else {
            continue;
        };
        let bounds = capture
            .logical_rect(scene.pixel_ratio)
            .translate(-origin.x, -origin.y);
        let t = transform
            .pre_translate(bounds.x, bounds.y)
            .pre_scale(bounds.width / image.width() as f32, bounds.height / image.height() as f32);

        // Pixel-exact when the capture maps 1:1 onto the output
        let quality = if (t.sx - 1.0).abs() < 1e-4 && (t.sy - 1.0).abs() < 1e-4 {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let paint = PixmapPaint {
            quality,
            ..Default::default()
        };
        pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, t, None);
    }
}

// ============================================================================
// Annotations
// ============================================================================

/// Draw annotations in list order, clipped to `clip`
pub fn draw_annotations(
    pixmap: &mut Pixmap,
    annotations: &[Annotation],
    clip: LogicalRect,
    transform: Transform,
) {
    if annotations.is_empty() || clip.is_empty() {
        return;
    }
    let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    let Some(clip_path) = rect_path(clip) else {
        return;
    };
    mask.fill_path(&clip_path, FillRule::Winding, false, transform);

    for annotation in annotations {
        match &annotation.shape {
            Shape::Rect(r) => {
                let Some(path) = rect_path(r.bounds()) else {
                    continue;
                };
                let stroke = Stroke {
                    width: shape::THICKNESS,
                    line_join: LineJoin::Miter,
                    ..Default::default()
                };
                pixmap.stroke_path(&path, &solid(annotation.color), &stroke, transform, Some(&mask));
            }
            Shape::Arrow(a) => draw_arrow(pixmap, a.start(), a.end(), annotation.color, transform, &mask),
            Shape::Text(t) => {
                let paint = solid(annotation.color);
                draw_text(pixmap, &t.text, Point::new(t.x, t.y), t.font_size, &paint, transform, Some(&mask));
            }
        }
    }
}

fn draw_arrow(
    pixmap: &mut Pixmap,
    start: Point,
    end: Point,
    color: ShapeColor,
    transform: Transform,
    mask: &Mask,
) {
    let paint = solid(color);
    let head = arrow::head_points(start, end);

    // Stop the shaft at the head base so the round cap stays hidden
    let shaft_end = head.map_or(end, |(_, l, r)| geometry::midpoint(l, r));
    let mut pb = PathBuilder::new();
    pb.move_to(start.x, start.y);
    pb.line_to(shaft_end.x, shaft_end.y);
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: arrow::THICKNESS,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, transform, Some(mask));
    }

    if let Some((tip, left, right)) = head {
        let mut pb = PathBuilder::new();
        pb.move_to(tip.x, tip.y);
        pb.line_to(left.x, left.y);
        pb.line_to(right.x, right.y);
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, Some(mask));
        }
    }
}

/// Draw single-line text with its line box top-left at `at`
///
/// Each character advances by one em. Circled digits are drawn as a ring
/// around their numeral since the bitmap font has no glyphs for them.
fn draw_text(
    pixmap: &mut Pixmap,
    content: &str,
    at: Point,
    font_size: f32,
    paint: &Paint,
    transform: Transform,
    mask: Option<&Mask>,
) {
    let top = at.y + font_size * (TEXT_LINE_HEIGHT - 1.0) / 2.0;
    let mut pen_x = at.x;
    for c in content.chars() {
        match geometry::circled_number(c) {
            Some(n) => draw_circled_number(pixmap, n, Point::new(pen_x, top), font_size, paint, transform, mask),
            None => {
                if let Some(path) = glyph_path(c, Point::new(pen_x, top), font_size) {
                    pixmap.fill_path(&path, paint, FillRule::Winding, transform, mask);
                }
            }
        }
        pen_x += font_size;
    }
}

fn glyph_path(c: char, at: Point, font_size: f32) -> Option<Path> {
    let glyph = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?'))?;
    let cell = font_size / text::GLYPH_CELLS;
    let mut pb = PathBuilder::new();
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..8 {
            if bits & (1 << col) == 0 {
                continue;
            }
            if let Some(rect) = Rect::from_xywh(at.x + col as f32 * cell, at.y + row as f32 * cell, cell, cell) {
                pb.push_rect(rect);
            }
        }
    }
    pb.finish()
}

fn draw_circled_number(
    pixmap: &mut Pixmap,
    n: u32,
    at: Point,
    font_size: f32,
    paint: &Paint,
    transform: Transform,
    mask: Option<&Mask>,
) {
    let ring = (font_size / 16.0).max(1.0);
    let radius = font_size / 2.0 - ring / 2.0;
    let (cx, cy) = (at.x + font_size / 2.0, at.y + font_size / 2.0);
    if let Some(circle) = PathBuilder::from_circle(cx, cy, radius) {
        let stroke = Stroke {
            width: ring,
            ..Default::default()
        };
        pixmap.stroke_path(&circle, paint, &stroke, transform, mask);
    }

    let digits = n.to_string();
    let small = font_size * text::CIRCLED_DIGIT_SCALE;
    let mut x = cx - small * digits.len() as f32 / 2.0;
    let y = cy - small / 2.0;
    for d in digits.chars() {
        if let Some(path) = glyph_path(d, Point::new(x, y), small) {
            pixmap.fill_path(&path, paint, FillRule::Winding, transform, mask);
        }
        x += small;
    }
}

// ============================================================================
// Overlays
// ============================================================================

/// Regions outside the selection that get shaded
pub fn dim_rects(view: LogicalRect, selection: LogicalRect) -> Vec<LogicalRect> {
    if selection.is_empty() {
        return vec![view];
    }
    let s = selection;
    [
        LogicalRect::new(view.x, view.y, view.width, s.y - view.y),
        LogicalRect::new(view.x, s.bottom(), view.width, view.bottom() - s.bottom()),
        LogicalRect::new(view.x, s.y, s.x - view.x, s.height),
        LogicalRect::new(s.right(), s.y, view.right() - s.right(), s.height),
    ]
    .into_iter()
    .filter_map(|r| r.intersect(view))
    .collect()
}

fn draw_overlays(pixmap: &mut Pixmap, scene: &Scene, transform: Transform) {
    let overlays = &scene.overlays;
    let selection = scene.selection;
    let view = LogicalRect::new(0.0, 0.0, scene.viewport.width, scene.viewport.height);
    let [br, bg, bb] = overlay::BORDER_RGB;
    let border = solid(ShapeColor::rgb(br, bg, bb));

    let mut shade = Paint::default();
    shade.set_color_rgba8(0, 0, 0, overlay::DIM_ALPHA);
    for r in dim_rects(view, selection) {
        if let Some(rect) = Rect::from_xywh(r.x, r.y, r.width, r.height) {
            pixmap.fill_rect(rect, &shade, transform, None);
        }
    }

    if !selection.is_empty() {
        if let Some(path) = rect_path(selection) {
            let stroke = Stroke {
                width: overlay::BORDER_WIDTH,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &border, &stroke, transform, None);
        }
        if !overlays.selecting {
            draw_handles(pixmap, selection, &border, transform);
        }
    }

    if let Some(selected) = overlays.selected {
        draw_selected(pixmap, selected, &border, transform);
    }

    if let Some(edit) = &overlays.text_edit {
        draw_text_edit(pixmap, edit, &border, transform);
    }
    if let Some(toolbar) = &overlays.toolbar {
        draw_toolbar(pixmap, toolbar, transform);
    }
    if let Some(cursor) = overlays.crosshair {
        draw_crosshair(pixmap, cursor, view, transform);
    }
    if let Some(lens) = &overlays.lens {
        magnifier::draw_lens(pixmap, lens, &scene.captures, transform);
    }
}

fn draw_handles(pixmap: &mut Pixmap, around: LogicalRect, border: &Paint, transform: Transform) {
    let white = solid(ShapeColor::rgb(255, 255, 255));
    let half = overlay::HANDLE_SIZE / 2.0;
    for handle in Handle::ALL {
        let p = around.handle_point(handle);
        let r = LogicalRect::new(p.x - half, p.y - half, overlay::HANDLE_SIZE, overlay::HANDLE_SIZE);
        if let Some(path) = rect_path(r) {
            pixmap.fill_path(&path, &white, FillRule::Winding, transform, None);
            pixmap.stroke_path(&path, border, &Stroke::default(), transform, None);
        }
    }
}

/// Dashed outline around the selected annotation, with handles when resizable
fn draw_selected(pixmap: &mut Pixmap, selected: SelectedOverlay, border: &Paint, transform: Transform) {
    let outline = selected.bounds.inflate(overlay::HIGHLIGHT_GAP);
    if let Some(path) = rect_path(outline) {
        let stroke = Stroke {
            width: overlay::CROSSHAIR_WIDTH,
            dash: StrokeDash::new(overlay::CROSSHAIR_DASH.to_vec(), 0.0),
            ..Default::default()
        };
        pixmap.stroke_path(&path, border, &stroke, transform, None);
    }
    if selected.resizable {
        draw_handles(pixmap, selected.bounds, border, transform);
    }
}

fn draw_text_edit(pixmap: &mut Pixmap, edit: &TextEditOverlay, border: &Paint, transform: Transform) {
    const PADDING: f32 = 4.0;
    const MIN_WIDTH: f32 = 300.0;

    let line = edit.font_size * TEXT_LINE_HEIGHT;
    let advance = edit.font_size * edit.text.chars().count() as f32;
    let frame = LogicalRect::new(
        edit.anchor.x - PADDING,
        edit.anchor.y - PADDING,
        (advance + PADDING * 2.0).max(MIN_WIDTH),
        line + PADDING * 2.0,
    );
    if let Some(path) = rect_path(frame) {
        let mut backdrop = Paint::default();
        backdrop.set_color_rgba8(255, 255, 255, 77);
        pixmap.fill_path(&path, &backdrop, FillRule::Winding, transform, None);
        let stroke = Stroke {
            width: 2.0,
            dash: StrokeDash::new(overlay::CROSSHAIR_DASH.to_vec(), 0.0),
            ..Default::default()
        };
        pixmap.stroke_path(&path, border, &stroke, transform, None);
    }

    let paint = solid(edit.color);
    draw_text(pixmap, &edit.text, edit.anchor, edit.font_size, &paint, transform, None);

    // Caret after the last glyph
    let caret_x = edit.anchor.x + advance;
    if let Some(rect) = Rect::from_xywh(caret_x, edit.anchor.y, text::CARET_WIDTH, line) {
        pixmap.fill_rect(rect, &paint, transform, None);
    }
}

/// Three rows: palette swatches, stamps, font size scale
fn draw_toolbar(pixmap: &mut Pixmap, toolbar: &ToolbarOverlay, transform: Transform) {
    const PAD: f32 = 12.0;
    const CELL: f32 = 32.0;
    const ROW: f32 = 42.0;

    let o = toolbar.origin;
    let panel = LogicalRect::new(o.x, o.y, toolbar.size.width, toolbar.size.height);
    if let Some(path) = rect_path(panel) {
        let mut bg = Paint::default();
        bg.set_color_rgba8(32, 32, 32, 230);
        pixmap.fill_path(&path, &bg, FillRule::Winding, transform, None);
    }
    let white = solid(ShapeColor::rgb(255, 255, 255));
    let outline = Stroke {
        width: 2.0,
        ..Default::default()
    };

    for (i, color) in PALETTE.iter().filter_map(|hex| ShapeColor::from_hex(hex)).enumerate() {
        let swatch = LogicalRect::new(o.x + PAD + i as f32 * (CELL + 8.0), o.y + PAD, CELL, CELL);
        let Some(path) = rect_path(swatch) else {
            continue;
        };
        pixmap.fill_path(&path, &solid(color), FillRule::Winding, transform, None);
        if color == toolbar.color {
            if let Some(ring) = rect_path(swatch.inflate(3.0)) {
                pixmap.stroke_path(&ring, &white, &outline, transform, None);
            }
        }
    }

    let stamp_y = o.y + PAD + ROW;
    for (i, stamp) in STAMPS.iter().enumerate() {
        let cell = LogicalRect::new(o.x + PAD + i as f32 * (CELL + 8.0), stamp_y, CELL, CELL);
        draw_text(pixmap, stamp, Point::new(cell.x + 4.0, cell.y + 2.0), CELL - 8.0, &white, transform, None);
        if toolbar.stamp.as_deref() == Some(*stamp) {
            if let Some(ring) = rect_path(cell) {
                pixmap.stroke_path(&ring, &white, &outline, transform, None);
            }
        }
    }

    // One tick per offered size, the active one tall
    let scale_y = stamp_y + ROW;
    let step = (toolbar.size.width - PAD * 2.0 - 60.0) / FONT_SIZES.len() as f32;
    let mut ticks = PathBuilder::new();
    for (i, size) in FONT_SIZES.iter().enumerate() {
        let x = o.x + PAD + i as f32 * step;
        let height = if (size - toolbar.font_size).abs() < f32::EPSILON { 20.0 } else { 8.0 };
        ticks.move_to(x, scale_y + 20.0 - height);
        ticks.line_to(x, scale_y + 20.0);
    }
    if let Some(path) = ticks.finish() {
        pixmap.stroke_path(&path, &white, &outline, transform, None);
    }
    let label = format!("{}", toolbar.font_size.round());
    draw_text(pixmap, &label, Point::new(panel.right() - PAD - 48.0, scale_y + 4.0), 16.0, &white, transform, None);
}

fn draw_crosshair(pixmap: &mut Pixmap, cursor: Point, view: LogicalRect, transform: Transform) {
    let mut pb = PathBuilder::new();
    pb.move_to(view.x, cursor.y);
    pb.line_to(view.right(), cursor.y);
    pb.move_to(cursor.x, view.y);
    pb.line_to(cursor.x, view.bottom());
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: overlay::CROSSHAIR_WIDTH,
            dash: StrokeDash::new(overlay::CROSSHAIR_DASH.to_vec(), 0.0),
            ..Default::default()
        };
        pixmap.stroke_path(&path, &solid(ShapeColor::default()), &stroke, transform, None);
    }

    let label = format!("({}, {})", cursor.x.round(), cursor.y.round());
    let mut paint = Paint::default();
    paint.set_color(Color::WHITE);
    draw_text(pixmap, &label, cursor.offset(10.0, 10.0), 12.0, &paint, transform, None);
}
