//! Interactive capture session
//!
//! `Session` holds everything the user manipulates between two captures.
//! `update()` is the single entry point: it consumes one message, mutates
//! the session, and returns the effects the host has to perform. Messages
//! are processed strictly one at a time.

pub mod handlers;

use std::sync::Arc;

use crate::annotations::handlers as annotation;
use crate::config::Settings;
use crate::domain::{Annotation, ExportTarget, LogicalRect, Point, Shape, Size, Tool};
use crate::export::Delivery;
use crate::render::image::{Overlays, Scene, SelectedOverlay, TextEditOverlay, ToolbarOverlay};
use crate::render::magnifier::{self, Lens};
use crate::session::messages::{
    CaptureMsg, DrawMsg, Effect, ExportMsg, ExportRequest, Msg, PointerMsg, TextMsg, ToolMsg,
};
use crate::session::shortcuts;
use crate::session::state::{
    AnnotationGesture, AnnotationState, InteractionMode, SelectionMode, SelectionState, SurfaceState, ToolState,
    UiState,
};
use handlers::selection;

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub surface: SurfaceState,
    pub selection: SelectionState,
    pub annotations: AnnotationState,
    pub tools: ToolState,
    pub ui: UiState,
}

impl Session {
    /// Fresh session with startup defaults taken from `settings`
    pub fn new(settings: &Settings, pixel_ratio: f32, viewport: Size) -> Self {
        let mut session = Session::default();
        session.surface.pixel_ratio = pixel_ratio;
        session.surface.viewport = viewport;
        if let Some(color) = settings.color() {
            session.tools.color = color;
        }
        if let Some(size) = settings.font_size() {
            session.tools.font_size = size;
        }
        settings.apply_magnifier(&mut session.ui.magnifier);
        session
    }

    /// What the pointer is currently doing
    pub fn interaction_mode(&self) -> InteractionMode {
        match self.selection.mode {
            SelectionMode::Creating => return InteractionMode::CreatingSelection,
            SelectionMode::Moving { .. } => return InteractionMode::MovingSelection,
            SelectionMode::Resizing { handle, .. } => {
                return InteractionMode::ResizingSelection(handle);
            }
            SelectionMode::Idle => {}
        }
        if self.annotations.text_edit.is_some() {
            return InteractionMode::EditingText;
        }
        match self.annotations.gesture {
            AnnotationGesture::Idle => InteractionMode::Idle,
            AnnotationGesture::Drawing => InteractionMode::DrawingShape,
            _ => InteractionMode::EditingShape,
        }
    }

    /// Normalized selected region
    pub fn selection_rect(&self) -> LogicalRect {
        self.selection.selection.rect()
    }

    /// Toolbar placement, if it should be shown
    pub fn toolbar(&self) -> Option<Point> {
        let toolbar = &self.ui.toolbar;
        if toolbar.visible && self.selection_rect().width > 0.0 {
            toolbar.position
        } else {
            None
        }
    }

    pub fn lens(&self) -> Option<Lens> {
        let cursor = self.ui.cursor?;
        magnifier::locate(
            cursor,
            self.surface.window_origin,
            &self.surface.captures,
            self.surface.pixel_ratio,
            self.ui.magnifier,
            self.surface.viewport,
        )
    }

    /// Frame as the user sees it: live gestures, draft and overlays included
    pub fn preview_scene(&self) -> Scene {
        let text_edit = self.annotations.text_edit.as_ref().map(|edit| TextEditOverlay {
            anchor: edit.anchor(),
            text: edit.buffer.clone(),
            color: self.tools.color,
            font_size: self.tools.font_size,
        });
        let toolbar = self.toolbar().map(|origin| ToolbarOverlay {
            origin,
            size: selection::TOOLBAR_SIZE,
            color: self.tools.color,
            font_size: self.tools.font_size,
            stamp: self.tools.pending_stamp.clone(),
        });
        let selected = self.annotations.selected().map(|a| SelectedOverlay {
            bounds: a.bounds(),
            resizable: matches!(a.shape, Shape::Rect(_)),
        });
        let overlays = Overlays {
            visible: true,
            selecting: self.selection.selection.in_progress,
            crosshair: self.ui.cursor.filter(|_| toolbar.is_none()),
            lens: self.lens(),
            text_edit,
            toolbar,
            selected,
        };
        self.scene(Arc::new(self.annotations.rendered()), overlays)
    }

    /// Committed content only, for export
    pub fn export_scene(&self) -> Scene {
        self.scene(self.annotations.store.snapshot(), Overlays::default())
    }

    fn scene(&self, annotations: Arc<Vec<Annotation>>, overlays: Overlays) -> Scene {
        Scene {
            captures: Arc::clone(&self.surface.captures),
            pixel_ratio: self.surface.pixel_ratio,
            window_origin: self.surface.window_origin,
            viewport: self.surface.viewport,
            annotations,
            selection: self.selection_rect(),
            overlays,
        }
    }

    /// Return every interaction to idle and drop the session's content
    fn reset(&mut self) {
        selection::clear(&mut self.selection);
        self.annotations.clear_all();
        self.tools.tool = Tool::Select;
        self.tools.pending_stamp = None;
        self.ui.toolbar = Default::default();
        self.ui.notice = None;
    }

    /// Collapse transient state, keeping committed annotations
    fn collapse(&mut self) {
        selection::clear(&mut self.selection);
        self.annotations.cancel_transient();
        self.annotations.store.selected = None;
        self.ui.toolbar = Default::default();
    }

    fn place_toolbar(&mut self, release: Point) {
        self.ui.toolbar.position = Some(selection::toolbar_position(release, self.surface.viewport));
        self.ui.toolbar.visible = true;
    }
}

/// Process one message
pub fn update(mut session: Session, msg: Msg) -> (Session, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::Pointer(pointer) => handle_pointer(&mut session, pointer),
        Msg::Key(press) => {
            if let Some(msg) = shortcuts::handle_key_event(&session, press) {
                return update(session, msg);
            }
        }
        Msg::Tool(tool) => handle_tool(&mut session, tool),
        Msg::Text(text) => match text {
            TextMsg::Changed(buffer) => annotation::text_changed(&mut session.annotations, buffer),
            TextMsg::Submit => annotation::submit_text(&mut session.annotations, &session.tools),
            TextMsg::Cancel => annotation::cancel_text(&mut session.annotations),
        },
        Msg::Draw(DrawMsg::Undo) => annotation::undo(&mut session.annotations),
        Msg::Draw(DrawMsg::DeleteSelected) => annotation::delete_selected(&mut session.annotations),
        Msg::Capture(capture) => handle_capture(&mut session, capture, &mut effects),
        Msg::Export(export) => handle_export(&mut session, export, &mut effects),
        Msg::Cancel => {
            session.collapse();
            session.ui.window_visible = false;
            effects.push(Effect::HideWindow);
        }
        Msg::Close => {
            session.ui.window_visible = false;
            effects.push(Effect::HideWindow);
        }
    }
    (session, effects)
}

// ============================================================================
// Pointer
// ============================================================================

fn handle_pointer(session: &mut Session, pointer: PointerMsg) {
    // Toolbar drags follow the pointer anywhere on the surface
    if let Some((dx, dy)) = session.ui.toolbar.drag_offset {
        match pointer {
            PointerMsg::Move(p) => {
                session.ui.cursor = Some(p);
                session.ui.toolbar.position = Some(Point::new(p.x - dx, p.y - dy));
            }
            PointerMsg::Up(p) => {
                session.ui.toolbar.position = Some(Point::new(p.x - dx, p.y - dy));
                session.ui.toolbar.drag_offset = None;
            }
            PointerMsg::Down(_) => {}
        }
        return;
    }

    if let PointerMsg::Move(p) = pointer {
        session.ui.cursor = Some(p);
    }
    if !session.surface.ready {
        log::debug!("Ignoring pointer input while capture is outstanding");
        return;
    }
    log::trace!("{pointer:?} in {:?}", session.interaction_mode());

    match pointer {
        PointerMsg::Down(p) => pointer_down(session, p),
        PointerMsg::Move(p) => {
            if session.selection.is_active() {
                selection::pointer_move(&mut session.selection, p);
            } else if session.annotations.gesture.is_active() {
                annotation::pointer_move(&mut session.annotations, p);
            }
        }
        PointerMsg::Up(p) => {
            if session.selection.is_active() {
                if selection::pointer_up(&mut session.selection, p) {
                    session.place_toolbar(p);
                }
            } else if session.annotations.gesture.is_active() {
                annotation::pointer_up(&mut session.annotations, p);
            }
        }
    }
}

fn pointer_down(session: &mut Session, p: Point) {
    // An open edit is committed by clicking elsewhere; the click ends there
    if session.annotations.text_edit.is_some() {
        annotation::submit_text(&mut session.annotations, &session.tools);
        return;
    }

    match session.tools.tool {
        Tool::Select => {
            let clip = session.selection_rect();
            if annotation::grab(&mut session.annotations, p, clip) {
                return;
            }
            selection::pointer_down(&mut session.selection, p);
            if session.selection.mode == SelectionMode::Creating {
                session.ui.toolbar.visible = false;
            }
        }
        _ => annotation::begin(&mut session.annotations, &session.tools, p),
    }
}

// ============================================================================
// Tools
// ============================================================================

fn handle_tool(session: &mut Session, msg: ToolMsg) {
    match msg {
        ToolMsg::Set(tool) => {
            session.tools.tool = tool;
            session.tools.pending_stamp = None;
        }
        ToolMsg::ChooseStamp(stamp) => {
            session.tools.tool = Tool::Text;
            session.tools.pending_stamp = Some(stamp);
        }
        ToolMsg::SetColor(color) => session.tools.color = color,
        ToolMsg::SetFontSize(size) => {
            if size > 0.0 {
                session.tools.font_size = size;
            } else {
                log::warn!("Ignoring font size {size}");
            }
        }
        ToolMsg::ToggleMagnifier => {
            session.ui.magnifier.enabled = !session.ui.magnifier.enabled;
        }
        ToolMsg::DragToolbar(p) => {
            if let Some(origin) = session.toolbar() {
                session.ui.toolbar.drag_offset = Some(p.delta_from(origin));
            }
        }
    }
}

// ============================================================================
// Capture and export
// ============================================================================

fn handle_capture(session: &mut Session, msg: CaptureMsg, effects: &mut Vec<Effect>) {
    match msg {
        CaptureMsg::Start => {
            session.reset();
            session.surface.ready = false;
            effects.push(Effect::Capture);
        }
        CaptureMsg::Finished(captures) => {
            log::info!("Capture ready with {} monitor(s)", captures.len());
            session.reset();
            session.surface.captures = captures;
            session.surface.ready = true;
            session.ui.window_visible = true;
            effects.push(Effect::ShowWindow);
        }
        CaptureMsg::Failed(reason) => {
            log::error!("Failed to capture screen: {reason}");
            session.reset();
            session.surface.ready = false;
        }
    }
}

fn handle_export(session: &mut Session, msg: ExportMsg, effects: &mut Vec<Effect>) {
    match msg {
        ExportMsg::Request(target) => {
            let region = session.selection_rect();
            if region.is_empty() {
                log::debug!("Export requested without a selection");
                return;
            }
            effects.push(Effect::Export(ExportRequest {
                target,
                region,
                pixel_ratio: session.surface.pixel_ratio,
                scene: session.export_scene(),
            }));
        }
        ExportMsg::Finished(target, Ok(Delivery::Done)) => {
            session.ui.notice = None;
            session.ui.window_visible = false;
            effects.push(Effect::HideWindow);
            log::debug!("Export to {target:?} finished");
        }
        ExportMsg::Finished(_, Ok(Delivery::Cancelled)) => {}
        ExportMsg::Finished(target, Err(err)) => {
            let action = match target {
                ExportTarget::Clipboard => "copy to clipboard",
                ExportTarget::File => "save image",
            };
            log::error!("Failed to {action}: {err}");
            session.ui.notice = Some(format!("Failed to {action}: {err}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::domain::Handle;
    use crate::session::messages::{Key, KeyPress};
    use crate::session::state::TextEdit;

    fn ready(viewport: Size, pixel_ratio: f32) -> Session {
        let mut session = Session::new(&Settings::default(), pixel_ratio, viewport);
        session.surface.ready = true;
        session
    }

    fn run(session: Session, msgs: Vec<Msg>) -> (Session, Vec<Effect>) {
        let mut all = Vec::new();
        let session = msgs.into_iter().fold(session, |s, msg| {
            let (s, effects) = update(s, msg);
            all.extend(effects);
            s
        });
        (session, all)
    }

    fn drag(from: (f32, f32), to: (f32, f32)) -> Vec<Msg> {
        vec![
            Msg::pointer_down(from.0, from.1),
            Msg::pointer_move(to.0, to.1),
            Msg::pointer_up(to.0, to.1),
        ]
    }

    #[test]
    fn test_hidpi_selection_exports_physical_size() {
        let (session, _) = run(ready(Size::new(1920.0, 1080.0), 2.0), drag((100.0, 100.0), (300.0, 200.0)));
        assert_eq!(session.selection_rect(), LogicalRect::new(100.0, 100.0, 200.0, 100.0));
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
        assert!(session.toolbar().is_some());

        let (_, effects) = update(session, Msg::copy_to_clipboard());
        let [Effect::Export(request)] = effects.as_slice() else {
            panic!("expected one export effect, got {effects:?}");
        };
        assert_eq!(request.region, LogicalRect::new(100.0, 100.0, 200.0, 100.0));
        assert_eq!(request.pixel_ratio, 2.0);
        assert_eq!(request.target, ExportTarget::Clipboard);
        assert!(!request.scene.overlays.visible);
    }

    #[test]
    fn test_text_tool_flow() {
        let msgs = vec![Msg::set_tool(Tool::Text), Msg::pointer_down(50.0, 50.0)];
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.interaction_mode(), InteractionMode::EditingText);
        assert_eq!(session.annotations.text_edit, Some(TextEdit::at(Point::new(50.0, 50.0), "")));

        let (session, _) = run(session, vec![Msg::text_changed("hello"), Msg::key(KeyPress::plain(Key::Enter))]);
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
        let list = session.annotations.store.list();
        assert_eq!(list.len(), 1);
        let Shape::Text(text) = &list[0].shape else {
            panic!("expected text");
        };
        assert_eq!((text.x, text.y, text.text.as_str()), (50.0, 50.0, "hello"));
        assert_eq!(text.font_size, 16.0);
        assert_eq!(list[0].color, ShapeColor::default());
    }

    #[test]
    fn test_arrow_then_undo() {
        let mut msgs = vec![Msg::set_tool(Tool::Arrow)];
        msgs.extend(drag((10.0, 10.0), (50.0, 40.0)));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        let Shape::Arrow(arrow) = &session.annotations.store.list()[0].shape else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.points, [10.0, 10.0, 50.0, 40.0]);

        let (session, _) = update(session, Msg::key(KeyPress::ctrl(Key::Char('z'))));
        assert!(session.annotations.store.is_empty());
    }

    #[test]
    fn test_pointer_ignored_until_ready() {
        let mut session = Session::new(&Settings::default(), 1.0, Size::new(800.0, 600.0));
        assert!(!session.surface.ready);
        (session, _) = run(session, drag((10.0, 10.0), (100.0, 100.0)));
        assert_eq!(session.selection_rect(), LogicalRect::default());
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
        // the cursor is still tracked
        assert_eq!(session.ui.cursor, Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_capture_cycle_resets_state() {
        let mut msgs = vec![Msg::set_tool(Tool::Rect)];
        msgs.extend(drag((10.0, 10.0), (60.0, 60.0)));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.annotations.store.len(), 1);

        let (session, effects) = update(session, Msg::start_capture());
        assert!(matches!(effects.as_slice(), [Effect::Capture]));
        assert!(!session.surface.ready);
        assert!(session.annotations.store.is_empty());
        assert_eq!(session.tools.tool, Tool::Select);

        let (session, effects) = update(session, Msg::capture_finished(Vec::new()));
        assert!(matches!(effects.as_slice(), [Effect::ShowWindow]));
        assert!(session.surface.ready);
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_capture_failure_leaves_surface_idle_and_not_ready() {
        let session = ready(Size::new(800.0, 600.0), 1.0);
        let (session, _) = run(session, vec![Msg::pointer_down(5.0, 5.0), Msg::capture_failed("denied")]);
        assert!(!session.surface.ready);
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);

        let (session, effects) = update(session, Msg::start_capture());
        assert!(matches!(effects.as_slice(), [Effect::Capture]));
        assert!(!session.surface.ready);
    }

    #[test]
    fn test_export_failure_keeps_selection_for_retry() {
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), drag((10.0, 10.0), (110.0, 60.0)));
        let (session, effects) = update(
            session,
            Msg::export_finished(ExportTarget::Clipboard, Err("clipboard busy".into())),
        );
        assert!(effects.is_empty());
        assert_eq!(session.ui.notice.as_deref(), Some("Failed to copy to clipboard: clipboard busy"));
        assert_eq!(session.selection_rect(), LogicalRect::new(10.0, 10.0, 100.0, 50.0));
        assert!(session.ui.window_visible);

        let (session, effects) = update(session, Msg::export_finished(ExportTarget::File, Ok(Delivery::Done)));
        assert!(matches!(effects.as_slice(), [Effect::HideWindow]));
        assert_eq!(session.ui.notice, None);
        assert!(!session.ui.window_visible);
    }

    #[test]
    fn test_cancelled_save_keeps_window() {
        let (session, effects) = update(
            ready(Size::new(800.0, 600.0), 1.0),
            Msg::export_finished(ExportTarget::File, Ok(Delivery::Cancelled)),
        );
        assert!(effects.is_empty());
        assert!(session.ui.window_visible);
    }

    #[test]
    fn test_export_without_selection_is_noop() {
        let (_, effects) = update(ready(Size::new(800.0, 600.0), 1.0), Msg::save_to_file());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_escape_collapses_and_hides() {
        let mut msgs = drag((10.0, 10.0), (110.0, 60.0));
        msgs.push(Msg::set_tool(Tool::Text));
        msgs.push(Msg::pointer_down(20.0, 20.0));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.interaction_mode(), InteractionMode::EditingText);

        let (session, effects) = update(session, Msg::key(KeyPress::plain(Key::Escape)));
        assert!(matches!(effects.as_slice(), [Effect::HideWindow]));
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
        assert!(session.annotations.text_edit.is_none());
        assert_eq!(session.selection_rect(), LogicalRect::default());
        assert!(session.toolbar().is_none());
    }

    #[test]
    fn test_click_outside_text_edit_commits_only() {
        let msgs = vec![
            Msg::set_tool(Tool::Text),
            Msg::pointer_down(10.0, 10.0),
            Msg::text_changed("one"),
            Msg::pointer_down(200.0, 200.0),
        ];
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.annotations.store.len(), 1);
        assert!(session.annotations.text_edit.is_none());
    }

    #[test]
    fn test_annotation_drag_beats_selection() {
        let mut msgs = drag((0.0, 0.0), (400.0, 400.0));
        msgs.push(Msg::set_tool(Tool::Rect));
        msgs.extend(drag((100.0, 100.0), (200.0, 200.0)));
        msgs.push(Msg::set_tool(Tool::Select));
        msgs.push(Msg::pointer_down(150.0, 100.0));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.interaction_mode(), InteractionMode::EditingShape);

        let (session, _) = run(session, vec![Msg::pointer_move(160.0, 110.0), Msg::pointer_up(160.0, 110.0)]);
        assert_eq!(session.annotations.store.list()[0].bounds(), LogicalRect::new(110.0, 110.0, 100.0, 100.0));
        assert_eq!(session.selection_rect(), LogicalRect::new(0.0, 0.0, 400.0, 400.0));

        let (session, _) = update(session, Msg::key(KeyPress::plain(Key::Delete)));
        assert!(session.annotations.store.is_empty());
    }

    #[test]
    fn test_press_on_clipped_annotation_starts_new_selection() {
        let mut msgs = drag((0.0, 0.0), (300.0, 300.0));
        msgs.push(Msg::set_tool(Tool::Rect));
        msgs.extend(drag((100.0, 100.0), (200.0, 200.0)));
        msgs.push(Msg::set_tool(Tool::Select));
        msgs.extend(drag((400.0, 400.0), (600.0, 500.0)));
        msgs.push(Msg::pointer_down(150.0, 100.0));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.interaction_mode(), InteractionMode::CreatingSelection);
        assert_eq!(session.annotations.store.selected, None);

        // nothing is grabbed without a selection either
        let (session, _) = run(session, vec![Msg::key(KeyPress::plain(Key::Escape)), Msg::pointer_down(150.0, 100.0)]);
        assert_eq!(session.interaction_mode(), InteractionMode::CreatingSelection);
    }

    #[test]
    fn test_selection_resize_via_handle() {
        let mut msgs = drag((100.0, 100.0), (300.0, 200.0));
        msgs.push(Msg::pointer_down(100.0, 150.0));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.interaction_mode(), InteractionMode::ResizingSelection(Handle::W));

        let (session, _) = run(session, vec![Msg::pointer_move(50.0, 0.0), Msg::pointer_up(50.0, 0.0)]);
        assert_eq!(session.selection_rect(), LogicalRect::new(50.0, 100.0, 250.0, 100.0));
    }

    #[test]
    fn test_toolbar_drag_follows_pointer_everywhere() {
        let (session, _) = run(ready(Size::new(1920.0, 1080.0), 1.0), drag((100.0, 100.0), (300.0, 200.0)));
        let origin = session.toolbar().unwrap();
        assert_eq!(origin, Point::new(320.0, 220.0));

        let msgs = vec![
            Msg::drag_toolbar(330.0, 230.0),
            Msg::pointer_move(1000.0, 900.0),
            Msg::pointer_up(1010.0, 910.0),
        ];
        let (session, _) = run(session, msgs);
        assert_eq!(session.toolbar(), Some(Point::new(1000.0, 900.0)));
        assert_eq!(session.ui.toolbar.drag_offset, None);
        // the selection did not react to the drag
        assert_eq!(session.selection_rect(), LogicalRect::new(100.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn test_stamp_persists_until_tool_changes() {
        let msgs = vec![
            Msg::choose_stamp("②"),
            Msg::pointer_down(10.0, 10.0),
            Msg::pointer_up(10.0, 10.0),
            Msg::pointer_down(60.0, 10.0),
            Msg::pointer_up(60.0, 10.0),
            Msg::set_tool(Tool::Text),
            Msg::pointer_down(90.0, 10.0),
        ];
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.annotations.store.len(), 2);
        assert_eq!(session.tools.pending_stamp, None);
        assert_eq!(session.interaction_mode(), InteractionMode::EditingText);
    }

    #[test]
    fn test_settings_seed_defaults() {
        let settings = Settings {
            default_color: Some("#0000FF".into()),
            default_font_size: Some(24.0),
            magnifier_enabled: Some(true),
            magnifier_size: Some(80.0),
            magnifier_zoom: None,
        };
        let session = Session::new(&settings, 1.0, Size::new(100.0, 100.0));
        assert_eq!(session.tools.color, ShapeColor::rgb(0, 0, 255));
        assert_eq!(session.tools.font_size, 24.0);
        assert!(session.ui.magnifier.enabled);
        assert_eq!(session.ui.magnifier.radius, 80.0);
        assert_eq!(session.ui.magnifier.zoom, 4.0);
    }

    #[test]
    fn test_tool_settings_messages() {
        let msgs = vec![
            Msg::set_color(ShapeColor::rgb(0, 255, 0)),
            Msg::set_font_size(32.0),
            Msg::set_font_size(-1.0),
            Msg::toggle_magnifier(),
        ];
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert_eq!(session.tools.color, ShapeColor::rgb(0, 255, 0));
        assert_eq!(session.tools.font_size, 32.0);
        assert!(session.ui.magnifier.enabled);
    }

    #[test]
    fn test_text_cancel_adds_nothing() {
        let msgs = vec![
            Msg::set_tool(Tool::Text),
            Msg::pointer_down(10.0, 10.0),
            Msg::text_changed("draft"),
            Msg::text_cancel(),
        ];
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        assert!(session.annotations.store.is_empty());
        assert_eq!(session.interaction_mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_preview_outlines_selected_annotation() {
        let mut msgs = drag((0.0, 0.0), (400.0, 400.0));
        msgs.push(Msg::set_tool(Tool::Rect));
        msgs.extend(drag((100.0, 100.0), (200.0, 150.0)));
        msgs.push(Msg::set_tool(Tool::Select));
        msgs.push(Msg::pointer_down(150.0, 100.0));
        let (session, _) = run(ready(Size::new(800.0, 600.0), 1.0), msgs);
        let selected = session.preview_scene().overlays.selected.unwrap();
        assert_eq!(selected.bounds, LogicalRect::new(100.0, 100.0, 100.0, 50.0));
        assert!(selected.resizable);
        assert!(session.export_scene().overlays.selected.is_none());

        // the outline follows the drag before it is committed
        let (session, _) = update(session, Msg::pointer_move(160.0, 110.0));
        let selected = session.preview_scene().overlays.selected.unwrap();
        assert_eq!(selected.bounds, LogicalRect::new(110.0, 110.0, 100.0, 50.0));
    }

    #[test]
    fn test_preview_hides_crosshair_while_toolbar_shown() {
        let session = ready(Size::new(800.0, 600.0), 1.0);
        let (session, _) = update(session, Msg::pointer_move(5.0, 5.0));
        assert_eq!(session.preview_scene().overlays.crosshair, Some(Point::new(5.0, 5.0)));

        let (session, _) = run(session, drag((10.0, 10.0), (110.0, 60.0)));
        let overlays = session.preview_scene().overlays;
        assert!(overlays.crosshair.is_none());
        assert_eq!(overlays.toolbar.map(|t| t.origin), session.toolbar());
    }
}
