//! Capture sources
//!
//! A source produces one raw image per monitor. Sources are blocking and
//! are driven from the blocking pool by the host.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use super::image::{Pixels, RawCapture};

pub trait CaptureSource: Send + Sync + 'static {
    fn capture(&self) -> anyhow::Result<Vec<RawCapture>>;
}

/// An image file standing in for a monitor, placed at a physical offset
///
/// Parsed from `PATH` or `PATH@X,Y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSpec {
    pub path: PathBuf,
    pub x: i32,
    pub y: i32,
}

impl FromStr for CaptureSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((path, offset)) = s.rsplit_once('@') else {
            return Ok(Self {
                path: PathBuf::from(s),
                x: 0,
                y: 0,
            });
        };
        let (x, y) = offset
            .split_once(',')
            .with_context(|| format!("expected X,Y after '@' in {s:?}"))?;
        Ok(Self {
            path: PathBuf::from(path),
            x: x.trim().parse().with_context(|| format!("invalid x offset in {s:?}"))?,
            y: y.trim().parse().with_context(|| format!("invalid y offset in {s:?}"))?,
        })
    }
}

/// Reads monitor images from files
///
/// Files are handed over still encoded so decoding happens in parallel.
#[derive(Clone, Debug)]
pub struct FileCaptureSource {
    specs: Vec<CaptureSpec>,
}

impl FileCaptureSource {
    pub fn new(specs: Vec<CaptureSpec>) -> Self {
        Self { specs }
    }
}

impl CaptureSource for FileCaptureSource {
    fn capture(&self) -> anyhow::Result<Vec<RawCapture>> {
        if self.specs.is_empty() {
            anyhow::bail!("no capture images configured");
        }
        self.specs
            .iter()
            .map(|spec| {
                let bytes = std::fs::read(&spec.path)
                    .with_context(|| format!("reading capture {}", spec.path.display()))?;
                let (width, height) = encoded_dimensions(&bytes).unwrap_or_else(|err| {
                    log::warn!("Unknown dimensions for {}: {err}", spec.path.display());
                    (0, 0)
                });
                Ok(RawCapture {
                    x: spec.x,
                    y: spec.y,
                    width,
                    height,
                    pixels: Pixels::Encoded(bytes),
                })
            })
            .collect()
    }
}

/// Read dimensions from an image header without decoding pixels
fn encoded_dimensions(bytes: &[u8]) -> anyhow::Result<(u32, u32)> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// Captures every attached monitor
#[cfg(feature = "xcap")]
#[derive(Clone, Copy, Debug, Default)]
pub struct MonitorCaptureSource;

#[cfg(feature = "xcap")]
impl CaptureSource for MonitorCaptureSource {
    fn capture(&self) -> anyhow::Result<Vec<RawCapture>> {
        let monitors = xcap::Monitor::all().context("enumerating monitors")?;
        monitors
            .into_iter()
            .map(|monitor| {
                let image = monitor.capture_image().context("capturing monitor")?;
                log::debug!(
                    "Captured monitor {}: {}x{}",
                    monitor.name().unwrap_or_default(),
                    image.width(),
                    image.height()
                );
                Ok(RawCapture {
                    x: monitor.x()?,
                    y: monitor.y()?,
                    width: image.width(),
                    height: image.height(),
                    pixels: Pixels::Decoded(image),
                })
            })
            .collect()
    }
}
