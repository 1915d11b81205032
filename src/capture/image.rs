//! Captured monitor images

use std::fmt;

use image::RgbaImage;

use crate::domain::{LogicalRect, to_logical};

/// Pixel payload of a raw capture
pub enum Pixels {
    /// Compressed image bytes (PNG, etc.)
    Encoded(Vec<u8>),
    Decoded(RgbaImage),
}

/// One monitor image as delivered by a capture source
///
/// Geometry is in physical pixels in desktop space.
pub struct RawCapture {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
}

/// A decoded monitor image ready for display
///
/// `image` is `None` when decoding failed; the monitor then renders as blank
/// while its geometry still takes part in layout.
#[derive(Clone)]
pub struct Capture {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub image: Option<RgbaImage>,
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("decoded", &self.image.is_some())
            .finish()
    }
}

impl Capture {
    /// Decode a raw capture; a decode failure keeps the geometry
    pub fn decode(raw: RawCapture) -> Capture {
        let image = match raw.pixels {
            Pixels::Decoded(rgba) => Some(rgba),
            Pixels::Encoded(bytes) => match image::load_from_memory(&bytes) {
                Ok(decoded) => Some(decoded.to_rgba8()),
                Err(err) => {
                    log::warn!(
                        "Failed to decode capture at ({}, {}): {err}",
                        raw.x,
                        raw.y
                    );
                    None
                }
            },
        };
        if let Some(rgba) = &image {
            log::debug!("Capture decoded: {}x{} pixels", rgba.width(), rgba.height());
        }
        Capture {
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            image,
        }
    }

    /// Bounds in physical desktop pixels
    pub fn physical_rect(&self) -> LogicalRect {
        LogicalRect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Bounds in logical desktop coordinates
    pub fn logical_rect(&self, pixel_ratio: f32) -> LogicalRect {
        let r = self.physical_rect();
        LogicalRect::new(
            to_logical(r.x, pixel_ratio),
            to_logical(r.y, pixel_ratio),
            to_logical(r.width, pixel_ratio),
            to_logical(r.height, pixel_ratio),
        )
    }
}

/// Decode all captures concurrently on the blocking pool
///
/// Order is preserved. A capture whose decode task panicked is dropped.
pub async fn decode_all(raws: Vec<RawCapture>) -> Vec<Capture> {
    let tasks = raws
        .into_iter()
        .map(|raw| tokio::task::spawn_blocking(move || Capture::decode(raw)));
    futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(capture) => Some(capture),
            Err(err) => {
                log::error!("Capture decode task failed: {err}");
                None
            }
        })
        .collect()
}

/// Smallest logical rectangle covering every capture
pub fn desktop_bounds(captures: &[Capture], pixel_ratio: f32) -> Option<LogicalRect> {
    captures
        .iter()
        .map(|c| c.logical_rect(pixel_ratio))
        .reduce(|acc, r| acc.union(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_bytes() {
        let capture = Capture::decode(RawCapture {
            x: 0,
            y: 0,
            width: 4,
            height: 3,
            pixels: Pixels::Encoded(png_bytes(4, 3)),
        });
        let img = capture.image.unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_failure_keeps_geometry() {
        let capture = Capture::decode(RawCapture {
            x: 1920,
            y: 0,
            width: 100,
            height: 50,
            pixels: Pixels::Encoded(b"not an image".to_vec()),
        });
        assert!(capture.image.is_none());
        assert_eq!(capture.physical_rect(), LogicalRect::new(1920.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_logical_rect_divides_by_ratio() {
        let capture = Capture {
            x: 3840,
            y: 0,
            width: 3840,
            height: 2160,
            image: None,
        };
        assert_eq!(capture.logical_rect(2.0), LogicalRect::new(1920.0, 0.0, 1920.0, 1080.0));
    }

    #[test]
    fn test_desktop_bounds_unions_monitors() {
        let captures = vec![
            Capture { x: 0, y: 0, width: 200, height: 100, image: None },
            Capture { x: 200, y: -50, width: 100, height: 100, image: None },
        ];
        assert_eq!(
            desktop_bounds(&captures, 1.0),
            Some(LogicalRect::new(0.0, -50.0, 300.0, 150.0))
        );
        assert_eq!(desktop_bounds(&[], 1.0), None);
    }

    #[tokio::test]
    async fn test_decode_all_preserves_order() {
        let raws = vec![
            RawCapture { x: 0, y: 0, width: 2, height: 2, pixels: Pixels::Encoded(png_bytes(2, 2)) },
            RawCapture { x: 2, y: 0, width: 3, height: 2, pixels: Pixels::Encoded(png_bytes(3, 2)) },
        ];
        let captures = decode_all(raws).await;
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].x, 0);
        assert_eq!(captures[1].image.as_ref().map(|i| i.width()), Some(3));
    }
}
