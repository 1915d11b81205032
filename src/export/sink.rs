//! Destinations for exported images

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use image::RgbaImage;

use super::Delivery;

/// Receives a finished image
pub trait ImageSink: Send + Sync {
    fn deliver(&self, image: &RgbaImage) -> anyhow::Result<Delivery>;
}

/// Chooses where a saved image goes; `None` means the user cancelled
pub trait SaveDialog: Send + Sync {
    fn choose(&self) -> Option<PathBuf>;
}

/// System clipboard via arboard
///
/// The clipboard handle is kept alive so the image stays available on
/// platforms where the owner must outlive the copy.
#[derive(Default)]
pub struct ClipboardSink {
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

impl ImageSink for ClipboardSink {
    fn deliver(&self, image: &RgbaImage) -> anyhow::Result<Delivery> {
        let mut slot = self
            .clipboard
            .lock()
            .map_err(|_| anyhow::anyhow!("clipboard lock poisoned"))?;
        if slot.is_none() {
            *slot = Some(arboard::Clipboard::new().context("opening clipboard")?);
        }
        let Some(clipboard) = slot.as_mut() else {
            anyhow::bail!("clipboard unavailable");
        };
        clipboard
            .set_image(arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Borrowed(image.as_raw()),
            })
            .context("copying image to clipboard")?;
        log::info!("Copied {}x{} image to clipboard", image.width(), image.height());
        Ok(Delivery::Done)
    }
}

/// PNG file at a path picked by a save dialog
pub struct FileSink {
    dialog: Box<dyn SaveDialog>,
}

impl FileSink {
    pub fn new(dialog: impl SaveDialog + 'static) -> Self {
        Self {
            dialog: Box::new(dialog),
        }
    }
}

impl ImageSink for FileSink {
    fn deliver(&self, image: &RgbaImage) -> anyhow::Result<Delivery> {
        let Some(path) = self.dialog.choose() else {
            log::info!("Save cancelled");
            return Ok(Delivery::Cancelled);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_png(io::BufWriter::new(file), image)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Saved image to {}", path.display());
        Ok(Delivery::Done)
    }
}

/// Always saves to the same path
#[derive(Clone, Debug)]
pub struct FixedSavePath(pub PathBuf);

impl SaveDialog for FixedSavePath {
    fn choose(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Timestamped file in the Pictures folder
#[derive(Clone, Copy, Debug, Default)]
pub struct PicturesSavePath;

impl SaveDialog for PicturesSavePath {
    fn choose(&self) -> Option<PathBuf> {
        default_save_path()
    }
}

/// `~/Pictures/Screenshot_%Y-%m-%d_%H-%M-%S.png`
pub fn default_save_path() -> Option<PathBuf> {
    let mut path =
        dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))?;
    let name = chrono::Local::now()
        .format("Screenshot_%Y-%m-%d_%H-%M-%S.png")
        .to_string();
    path.push(name);
    Some(path)
}

/// Encode `image` as RGBA PNG into `w`
///
/// Finishing writes the trailer and flushes `w`, so a failed write always
/// surfaces here.
pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()
}
