mod annotations;
mod capture;
mod config;
mod core;
mod domain;
mod export;
mod render;
mod screenshot;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, BufReader};

use crate::capture::source::{CaptureSource, CaptureSpec, FileCaptureSource};
use crate::config::Settings;
use crate::core::app::{App, Sinks};
use crate::domain::Size;
use crate::export::sink::{ClipboardSink, FileSink, FixedSavePath, PicturesSavePath};
use crate::screenshot::Session;
use crate::session::messages::Msg;

#[derive(Parser)]
#[command(name = "snapmark")]
#[command(about = "Select a region of the desktop, annotate it and copy or save it")]
#[command(version)]
struct Cli {
    /// Monitor image as PATH or PATH@X,Y (physical desktop offset); repeatable
    #[arg(long = "capture", value_name = "PATH[@X,Y]")]
    captures: Vec<CaptureSpec>,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
    scale: f32,

    /// Logical window size as WxH; defaults to the captured desktop
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Size>,

    /// JSON-lines input script; reads stdin when omitted
    #[arg(long)]
    events: Option<PathBuf>,

    /// Where "save to file" writes; defaults to a timestamped file in Pictures
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Write the final frame, overlays included, to this PNG
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Copy the selection to the clipboard after the script
    #[arg(long)]
    copy: bool,

    /// Save the selection to a file after the script
    #[arg(long)]
    save: bool,

    /// Print the committed annotations as JSON when done
    #[arg(long)]
    dump_annotations: bool,

    /// Persist the final color, font size and magnifier settings
    #[arg(long)]
    save_settings: bool,
}

fn parse_viewport(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| "Viewport must be WxH".to_string())?;
    let width: f32 = w.trim().parse().map_err(|_| "Invalid width".to_string())?;
    let height: f32 = h.trim().parse().map_err(|_| "Invalid height".to_string())?;
    if width <= 0.0 || height <= 0.0 {
        return Err("Viewport must not be empty".to_string());
    }
    Ok(Size::new(width, height))
}

fn parse_scale(s: &str) -> Result<f32, String> {
    let scale: f32 = s.trim().parse().map_err(|_| "Invalid scale".to_string())?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err("Scale must be a positive number".to_string());
    }
    Ok(scale)
}

fn capture_source(specs: Vec<CaptureSpec>) -> anyhow::Result<Arc<dyn CaptureSource>> {
    if !specs.is_empty() {
        return Ok(Arc::new(FileCaptureSource::new(specs)));
    }
    #[cfg(feature = "xcap")]
    {
        Ok(Arc::new(crate::capture::source::MonitorCaptureSource))
    }
    #[cfg(not(feature = "xcap"))]
    {
        anyhow::bail!("no --capture images given and monitor capture is not enabled")
    }
}

async fn open_events(path: Option<PathBuf>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match path {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

/// Settings reflecting the session's current tool defaults
fn current_settings(session: &Session) -> Settings {
    Settings {
        default_color: Some(session.tools.color.to_hex()),
        default_font_size: Some(session.tools.font_size),
        magnifier_enabled: Some(session.ui.magnifier.enabled),
        magnifier_size: Some(session.ui.magnifier.radius),
        magnifier_zoom: Some(session.ui.magnifier.zoom),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let session = Session::new(&settings, cli.scale, cli.viewport.unwrap_or_default());

    let file: Arc<dyn crate::export::sink::ImageSink> = match cli.save_path {
        Some(path) => Arc::new(FileSink::new(FixedSavePath(path))),
        None => Arc::new(FileSink::new(PicturesSavePath)),
    };
    let sinks = Sinks {
        clipboard: Arc::new(ClipboardSink::default()),
        file,
    };

    let mut app = App::new(session, capture_source(cli.captures)?, sinks);
    app.run(open_events(cli.events).await?).await?;
    if cli.copy {
        app.dispatch(Msg::copy_to_clipboard());
    }
    if cli.save {
        app.dispatch(Msg::save_to_file());
    }
    app.settle().await;

    if let Some(path) = &cli.preview {
        let frame = app.preview().context("rendering preview")?;
        let out = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        crate::export::sink::write_png(std::io::BufWriter::new(out), &frame)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote preview to {}", path.display());
    }

    if cli.dump_annotations {
        let json = serde_json::to_string_pretty(app.session.annotations.store.list())?;
        println!("{json}");
    }

    if cli.save_settings {
        let settings = current_settings(&app.session);
        match &cli.config {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
    }

    Ok(())
}
