//! Export pipeline
//!
//! Rasterizes exactly the selected region at full pixel ratio with every
//! interactive overlay hidden, then hands the image to a sink.

pub mod sink;

use image::RgbaImage;

use crate::domain::LogicalRect;
use crate::render::image::{SkiaSurface, Surface};
use crate::session::messages::ExportRequest;
use sink::ImageSink;

/// Outcome of a delivery that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Done,
    /// The user backed out, e.g. closed the save dialog
    Cancelled,
}

/// Hides overlays on a surface for as long as it lives
///
/// The previous visibility is restored on drop, so it also comes back when
/// rasterization fails or panics.
pub struct HiddenOverlays<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    restore: bool,
}

impl<'a, S: Surface + ?Sized> HiddenOverlays<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        let restore = surface.overlays_visible();
        surface.set_overlays_visible(false);
        Self { surface, restore }
    }

    pub fn rasterize(&self, region: LogicalRect, pixel_ratio: f32) -> anyhow::Result<RgbaImage> {
        self.surface.rasterize(region, pixel_ratio)
    }
}

impl<S: Surface + ?Sized> Drop for HiddenOverlays<'_, S> {
    fn drop(&mut self) {
        self.surface.set_overlays_visible(self.restore);
    }
}

/// Render the selected region without overlays
///
/// Returns `None` for an empty region.
pub fn rasterize_region<S: Surface + ?Sized>(
    surface: &mut S,
    region: LogicalRect,
    pixel_ratio: f32,
) -> anyhow::Result<Option<RgbaImage>> {
    if region.is_empty() {
        log::debug!("Nothing to export for empty region");
        return Ok(None);
    }
    let hidden = HiddenOverlays::new(surface);
    let image = hidden.rasterize(region, pixel_ratio)?;
    Ok(Some(image))
}

/// Rasterize `region` and pass the result to `sink`
pub fn run<S: Surface + ?Sized>(
    surface: &mut S,
    region: LogicalRect,
    pixel_ratio: f32,
    sink: &dyn ImageSink,
) -> anyhow::Result<Delivery> {
    match rasterize_region(surface, region, pixel_ratio)? {
        Some(image) => sink.deliver(&image),
        None => Ok(Delivery::Cancelled),
    }
}

/// Execute a request produced by the session
pub fn execute(request: ExportRequest, sink: &dyn ImageSink) -> anyhow::Result<Delivery> {
    let mut surface = SkiaSurface::new(request.scene);
    run(&mut surface, request.region, request.pixel_ratio, sink)
}
