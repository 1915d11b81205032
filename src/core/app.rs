use std::sync::Arc;

use anyhow::Context;
use image::RgbaImage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::capture::image::{Capture, decode_all, desktop_bounds};
use crate::capture::source::CaptureSource;
use crate::domain::{ExportTarget, Point, Size};
use crate::export::{self, sink::ImageSink};
use crate::render::image::SkiaSurface;
use crate::screenshot::{self, Session};
use crate::session::messages::{CaptureMsg, Effect, ExportRequest, Msg};

/// Destinations for the two export targets
#[derive(Clone)]
pub struct Sinks {
    pub clipboard: Arc<dyn ImageSink>,
    pub file: Arc<dyn ImageSink>,
}

impl Sinks {
    fn for_target(&self, target: ExportTarget) -> Arc<dyn ImageSink> {
        match target {
            ExportTarget::Clipboard => Arc::clone(&self.clipboard),
            ExportTarget::File => Arc::clone(&self.file),
        }
    }
}

/// Show/hide state of the host surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub visible: bool,
    pub focused: bool,
}

impl HeadlessWindow {
    pub fn show(&mut self) {
        log::info!("Showing capture window");
        self.visible = true;
        self.focused = true;
    }

    pub fn hide(&mut self) {
        log::info!("Hiding capture window");
        self.visible = false;
        self.focused = false;
    }
}

/// Input listeners registered for the lifetime of a session
///
/// Dropping the guard deregisters them.
pub struct EventListeners {
    reader: JoinHandle<()>,
}

impl EventListeners {
    /// Read script lines from `input` and forward parsed messages to `tx`
    pub fn register<R>(input: R, tx: mpsc::UnboundedSender<anyhow::Result<Msg>>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        log::debug!("Registering input listeners");
        let reader = tokio::spawn(async move {
            let mut lines = input.lines();
            let mut line_no = 0;
            loop {
                line_no += 1;
                let parsed = match lines.next_line().await {
                    Ok(Some(line)) => parse_script_line(line_no, &line),
                    Ok(None) => break,
                    Err(err) => Err(anyhow::Error::new(err).context(format!("reading line {line_no}"))),
                };
                let failed = parsed.is_err();
                match parsed.transpose() {
                    Some(item) => {
                        if tx.send(item).is_err() || failed {
                            break;
                        }
                    }
                    None => continue,
                }
            }
        });
        Self { reader }
    }
}

impl Drop for EventListeners {
    fn drop(&mut self) {
        log::debug!("Deregistering input listeners");
        self.reader.abort();
    }
}

/// Parse one line of a JSON-lines input script
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_script_line(line_no: usize, line: &str) -> anyhow::Result<Option<Msg>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let msg = serde_json::from_str(line)
        .with_context(|| format!("invalid message on line {line_no}: {line}"))?;
    Ok(Some(msg))
}

/// Host driving one capture session
pub struct App {
    pub session: Session,
    pub window: HeadlessWindow,
    source: Arc<dyn CaptureSource>,
    sinks: Sinks,
    /// Size the window to the captured desktop on every capture
    fit_to_desktop: bool,
    tasks: JoinSet<Msg>,
}

impl App {
    pub fn new(session: Session, source: Arc<dyn CaptureSource>, sinks: Sinks) -> Self {
        let fit_to_desktop = session.surface.viewport == Size::default();
        Self {
            session,
            window: HeadlessWindow::default(),
            source,
            sinks,
            fit_to_desktop,
            tasks: JoinSet::new(),
        }
    }

    /// Feed one message through the session and start the requested work
    pub fn dispatch(&mut self, msg: Msg) {
        if let Msg::Capture(CaptureMsg::Finished(captures)) = &msg {
            if self.fit_to_desktop {
                self.fit_window(captures);
            }
        }
        let session = std::mem::take(&mut self.session);
        let (session, effects) = screenshot::update(session, msg);
        self.session = session;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Wait for all outstanding capture and export work, dispatching the results
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(msg) => self.dispatch(msg),
                Err(err) => log::error!("Background task failed: {err}"),
            }
        }
    }

    /// Capture, then replay every scripted message
    ///
    /// Each message is settled before the next is read, so replays are
    /// deterministic.
    pub async fn run<R>(&mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        self.dispatch(Msg::start_capture());
        self.settle().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _listeners = EventListeners::register(input, tx);
        while let Some(item) = rx.recv().await {
            self.dispatch(item?);
            self.settle().await;
        }
        Ok(())
    }

    /// Frame as currently shown, overlays included
    pub fn preview(&self) -> anyhow::Result<RgbaImage> {
        SkiaSurface::new(self.session.preview_scene()).preview()
    }

    fn fit_window(&mut self, captures: &[Capture]) {
        let Some(bounds) = desktop_bounds(captures, self.session.surface.pixel_ratio) else {
            return;
        };
        log::debug!("Placing window over desktop {bounds:?}");
        self.session.surface.window_origin = Point::new(bounds.x, bounds.y);
        self.session.surface.viewport = Size::new(bounds.width, bounds.height);
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Capture => {
                log::info!("Requesting screen capture");
                let source = Arc::clone(&self.source);
                self.tasks.spawn(acquire(source));
            }
            Effect::Export(request) => {
                log::info!(
                    "Exporting {:?} at {}x to {:?}",
                    request.region,
                    request.pixel_ratio,
                    request.target
                );
                let sink = self.sinks.for_target(request.target);
                self.tasks.spawn(deliver(request, sink));
            }
            Effect::ShowWindow => self.window.show(),
            Effect::HideWindow => self.window.hide(),
        }
    }
}

async fn acquire(source: Arc<dyn CaptureSource>) -> Msg {
    match tokio::task::spawn_blocking(move || source.capture()).await {
        Ok(Ok(raws)) => Msg::capture_finished(decode_all(raws).await),
        Ok(Err(err)) => Msg::capture_failed(format!("{err:#}")),
        Err(err) => Msg::capture_failed(err.to_string()),
    }
}

async fn deliver(request: ExportRequest, sink: Arc<dyn ImageSink>) -> Msg {
    let target = request.target;
    let result = match tokio::task::spawn_blocking(move || export::execute(request, sink.as_ref())).await
    {
        Ok(result) => result.map_err(|err| format!("{err:#}")),
        Err(err) => Err(err.to_string()),
    };
    Msg::export_finished(target, result)
}
