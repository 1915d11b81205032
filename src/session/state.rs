use std::sync::Arc;

use crate::annotations::store::AnnotationStore;
use crate::capture::image::Capture;
use crate::config::{DEFAULT_FONT_SIZE, MagnifierSettings, ShapeColor};
use crate::domain::{Annotation, Handle, LogicalRect, Point, Selection, Size, Tool};

/// What the pointer is currently doing, at most one at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    CreatingSelection,
    MovingSelection,
    ResizingSelection(Handle),
    DrawingShape,
    /// Dragging or resizing an existing annotation
    EditingShape,
    EditingText,
}

/// Phase of the marquee state machine
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SelectionMode {
    #[default]
    Idle,
    Creating,
    Moving {
        origin: Point,
        snapshot: Selection,
    },
    Resizing {
        handle: Handle,
        snapshot: LogicalRect,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionState {
    pub selection: Selection,
    pub mode: SelectionMode,
}

impl SelectionState {
    pub fn is_active(&self) -> bool {
        self.mode != SelectionMode::Idle
    }
}

/// Transient text authoring session
#[derive(Clone, Debug, PartialEq)]
pub struct TextEdit {
    pub x: f32,
    pub y: f32,
    pub buffer: String,
}

impl TextEdit {
    pub fn at(p: Point, buffer: impl Into<String>) -> Self {
        Self {
            x: p.x,
            y: p.y,
            buffer: buffer.into(),
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Direct manipulation of annotations
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AnnotationGesture {
    #[default]
    Idle,
    /// A new shape lives in the store's draft slot
    Drawing,
    Dragging {
        origin: Point,
        original: Annotation,
        live: Annotation,
    },
    Resizing {
        handle: Handle,
        snapshot: LogicalRect,
        original: Annotation,
        live: Annotation,
    },
}

impl AnnotationGesture {
    pub fn is_active(&self) -> bool {
        !matches!(self, AnnotationGesture::Idle)
    }

    /// The manipulated copy standing in for the stored annotation
    pub fn live(&self) -> Option<&Annotation> {
        match self {
            AnnotationGesture::Dragging { live, .. } | AnnotationGesture::Resizing { live, .. } => {
                Some(live)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationState {
    pub store: AnnotationStore,
    pub gesture: AnnotationGesture,
    pub text_edit: Option<TextEdit>,
}

impl AnnotationState {
    /// Drop annotations and every transient reference
    pub fn clear_all(&mut self) {
        self.store.clear();
        self.gesture = AnnotationGesture::Idle;
        self.text_edit = None;
    }

    /// Abandon the current gesture and edit session, keeping committed annotations
    pub fn cancel_transient(&mut self) {
        self.store.draft = None;
        self.store.editing = None;
        self.gesture = AnnotationGesture::Idle;
        self.text_edit = None;
    }

    /// The selected annotation as currently shown, live gesture copy included
    pub fn selected(&self) -> Option<&Annotation> {
        let id = self.store.selected?;
        match self.gesture.live() {
            Some(live) if live.id == id => Some(live),
            _ => self.store.get(id),
        }
    }

    /// Annotations as they should appear on screen right now
    ///
    /// The manipulated copy replaces its stored entry, the draft is drawn on
    /// top, and a text annotation with an open edit session is hidden.
    pub fn rendered(&self) -> Vec<Annotation> {
        let live = self.gesture.live();
        let mut out: Vec<Annotation> = self
            .store
            .list()
            .iter()
            .filter(|a| self.store.editing != Some(a.id))
            .map(|a| match live {
                Some(l) if l.id == a.id => l.clone(),
                _ => a.clone(),
            })
            .collect();
        if let Some(draft) = &self.store.draft {
            out.push(draft.clone());
        }
        out
    }
}

/// Active tool and drawing defaults
#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    pub tool: Tool,
    pub color: ShapeColor,
    pub font_size: f32,
    /// Stamp placed on every text-tool click until the tool changes
    pub pending_stamp: Option<String>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            color: ShapeColor::default(),
            font_size: DEFAULT_FONT_SIZE,
            pending_stamp: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolbarState {
    pub position: Option<Point>,
    pub visible: bool,
    /// Grab offset while the toolbar is being dragged
    pub drag_offset: Option<(f32, f32)>,
}

#[derive(Clone, Debug)]
pub struct UiState {
    pub toolbar: ToolbarState,
    pub cursor: Option<Point>,
    pub magnifier: MagnifierSettings,
    /// User-visible message, e.g. a failed export
    pub notice: Option<String>,
    pub window_visible: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            toolbar: ToolbarState::default(),
            cursor: None,
            magnifier: MagnifierSettings::default(),
            notice: None,
            window_visible: true,
        }
    }
}

/// Captured desktop and the surface it is shown on
#[derive(Clone, Debug)]
pub struct SurfaceState {
    /// False while a capture is outstanding; pointer input is ignored
    pub ready: bool,
    pub captures: Arc<Vec<Capture>>,
    pub pixel_ratio: f32,
    /// Logical size of the host window
    pub viewport: Size,
    /// Logical screen position of the host window
    pub window_origin: Point,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            ready: false,
            captures: Arc::new(Vec::new()),
            pixel_ratio: 1.0,
            viewport: Size::default(),
            window_origin: Point::default(),
        }
    }
}
