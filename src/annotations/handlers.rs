//! Annotation gesture handlers
//!
//! Pointer input for the drawing tools and for direct manipulation of
//! existing annotations with the select tool.

use crate::domain::{
    Annotation, DEFAULT_TEXT_WIDTH, HANDLE_HIT_RADIUS, HIT_TOLERANCE, LogicalRect, Point, RectShape,
    Shape, Tool,
};
use crate::session::state::{AnnotationGesture, AnnotationState, TextEdit, ToolState};

// ============================================================================
// Select tool
// ============================================================================

/// Try to grab an existing annotation under `p`
///
/// Only the part of the canvas inside `clip` (the selection) shows
/// annotations, so a press outside it never grabs one. A resize handle of the
/// selected rectangle wins over plain hits. Returns false when nothing was
/// grabbed and the click should reach the selection.
pub fn grab(state: &mut AnnotationState, p: Point, clip: LogicalRect) -> bool {
    if clip.is_empty() || !clip.contains(p) {
        state.store.selected = None;
        return false;
    }
    if let Some(selected) = state.store.selected.and_then(|id| state.store.get(id)) {
        if let Shape::Rect(rect) = &selected.shape {
            let snapshot = rect.bounds();
            if let Some(handle) = snapshot.handle_at(p, HANDLE_HIT_RADIUS) {
                let original = selected.clone();
                log::debug!("Resizing annotation {:?} from {handle:?}", original.id);
                state.gesture = AnnotationGesture::Resizing {
                    handle,
                    snapshot,
                    live: original.clone(),
                    original,
                };
                return true;
            }
        }
    }

    match state.store.hit_test(p, clip).cloned() {
        Some(hit) => {
            state.store.selected = Some(hit.id);
            state.gesture = AnnotationGesture::Dragging {
                origin: p,
                live: hit.clone(),
                original: hit,
            };
            true
        }
        None => {
            state.store.selected = None;
            false
        }
    }
}

// ============================================================================
// Drawing tools
// ============================================================================

/// Pointer-down with a drawing tool
pub fn begin(state: &mut AnnotationState, tools: &ToolState, p: Point) {
    match tools.tool {
        Tool::Rect => {
            let id = state.store.allocate_id();
            state.store.draft = Some(Annotation::rect(id, tools.color, p));
            state.gesture = AnnotationGesture::Drawing;
        }
        Tool::Arrow => {
            let id = state.store.allocate_id();
            state.store.draft = Some(Annotation::arrow(id, tools.color, p));
            state.gesture = AnnotationGesture::Drawing;
        }
        Tool::Text => match &tools.pending_stamp {
            Some(stamp) => {
                let id = state.store.allocate_id();
                let width = tools.font_size * stamp.chars().count() as f32;
                state
                    .store
                    .append(Annotation::text(id, tools.color, p, stamp.as_str(), tools.font_size, width));
            }
            None => {
                state.store.editing = None;
                state.text_edit = Some(TextEdit::at(p, ""));
            }
        },
        Tool::Select => {}
    }
}

// ============================================================================
// Shared pointer tracking
// ============================================================================

pub fn pointer_move(state: &mut AnnotationState, p: Point) {
    match &mut state.gesture {
        AnnotationGesture::Idle => {}
        AnnotationGesture::Drawing => {
            if let Some(draft) = state.store.draft.as_mut() {
                match &mut draft.shape {
                    Shape::Rect(rect) => {
                        rect.width = p.x - rect.x;
                        rect.height = p.y - rect.y;
                    }
                    Shape::Arrow(arrow) => {
                        arrow.points[2] = p.x;
                        arrow.points[3] = p.y;
                    }
                    Shape::Text(_) => {}
                }
            }
        }
        AnnotationGesture::Dragging {
            origin,
            original,
            live,
        } => {
            let (dx, dy) = p.delta_from(*origin);
            *live = original.translated(dx, dy);
        }
        AnnotationGesture::Resizing {
            handle,
            snapshot,
            live,
            ..
        } => {
            let (start, end) = handle.resize(*snapshot, p);
            if let Shape::Rect(rect) = &mut live.shape {
                *rect = scaled_rect(*snapshot, start, end);
            }
        }
    }
}

/// Express a resized rectangle as the snapshot plus a pending scale
fn scaled_rect(snapshot: LogicalRect, start: Point, end: Point) -> RectShape {
    let (width, height) = end.delta_from(start);
    let mut rect = RectShape::new(start.x, start.y, snapshot.width, snapshot.height);
    if snapshot.width > 0.0 {
        rect.scale_x = width / snapshot.width;
    } else {
        rect.width = width;
    }
    if snapshot.height > 0.0 {
        rect.scale_y = height / snapshot.height;
    } else {
        rect.height = height;
    }
    rect
}

pub fn pointer_up(state: &mut AnnotationState, p: Point) {
    pointer_move(state, p);
    match std::mem::take(&mut state.gesture) {
        AnnotationGesture::Idle => {}
        AnnotationGesture::Drawing => {
            if let Some(draft) = state.store.draft.take() {
                state.store.append(draft);
            }
        }
        AnnotationGesture::Dragging {
            origin,
            original,
            live,
        } => {
            let (dx, dy) = p.delta_from(origin);
            // a press that barely moved on text is a click to edit it
            if original.is_text() && dx.hypot(dy) <= HIT_TOLERANCE {
                open_edit(state, &original);
            } else if p != origin && !state.store.replace(live) {
                log::debug!("Dropped drag of removed annotation {:?}", original.id);
            }
        }
        AnnotationGesture::Resizing { live, .. } => {
            state.store.replace(live.baked());
        }
    }
}

// ============================================================================
// Text editing
// ============================================================================

/// Open an edit session prefilled with an existing text annotation
fn open_edit(state: &mut AnnotationState, annotation: &Annotation) {
    if let Shape::Text(text) = &annotation.shape {
        state.store.editing = Some(annotation.id);
        state.text_edit = Some(TextEdit::at(Point::new(text.x, text.y), text.text.clone()));
    }
}

pub fn text_changed(state: &mut AnnotationState, buffer: String) {
    if let Some(edit) = state.text_edit.as_mut() {
        edit.buffer = buffer;
    }
}

/// Commit the open edit session
///
/// Empty input adds nothing and leaves an edited annotation unchanged.
pub fn submit_text(state: &mut AnnotationState, tools: &ToolState) {
    let Some(edit) = state.text_edit.take() else {
        return;
    };
    let editing = state.store.editing.take();
    let text = edit.buffer.trim();
    if text.is_empty() {
        return;
    }

    match editing.and_then(|id| state.store.get(id)).cloned() {
        Some(mut existing) => {
            if let Shape::Text(shape) = &mut existing.shape {
                shape.text = text.to_string();
            }
            state.store.replace(existing);
        }
        None => {
            let id = state.store.allocate_id();
            state.store.append(Annotation::text(
                id,
                tools.color,
                edit.anchor(),
                text,
                tools.font_size,
                DEFAULT_TEXT_WIDTH,
            ));
        }
    }
}

pub fn cancel_text(state: &mut AnnotationState) {
    state.text_edit = None;
    state.store.editing = None;
}

// ============================================================================
// List edits
// ============================================================================

pub fn undo(state: &mut AnnotationState) {
    let editing = state.store.editing;
    if let Some(popped) = state.store.undo() {
        log::debug!("Undo removed annotation {:?}", popped.id);
        if editing == Some(popped.id) {
            state.text_edit = None;
        }
    }
}

pub fn delete_selected(state: &mut AnnotationState) {
    let Some(id) = state.store.selected else {
        return;
    };
    let editing = state.store.editing;
    if state.store.remove(id).is_some() && editing == Some(id) {
        state.text_edit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::domain::AnnotationId;

    fn tools(tool: Tool) -> ToolState {
        ToolState {
            tool,
            ..ToolState::default()
        }
    }

    const CANVAS: LogicalRect = LogicalRect {
        x: 0.0,
        y: 0.0,
        width: 800.0,
        height: 600.0,
    };

    fn draw(state: &mut AnnotationState, tool: Tool, from: Point, to: Point) {
        begin(state, &tools(tool), from);
        pointer_move(state, to);
        pointer_up(state, to);
    }

    #[test]
    fn test_arrow_gesture_commits_points() {
        let mut state = AnnotationState::default();
        draw(&mut state, Tool::Arrow, Point::new(10.0, 10.0), Point::new(50.0, 40.0));

        assert_eq!(state.store.len(), 1);
        let Shape::Arrow(arrow) = &state.store.list()[0].shape else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.points, [10.0, 10.0, 50.0, 40.0]);
        assert!(state.store.draft.is_none());
        assert!(!state.gesture.is_active());
    }

    #[test]
    fn test_rect_drawn_backwards_keeps_signed_extent() {
        let mut state = AnnotationState::default();
        draw(&mut state, Tool::Rect, Point::new(100.0, 100.0), Point::new(60.0, 80.0));

        let a = &state.store.list()[0];
        let Shape::Rect(rect) = &a.shape else {
            panic!("expected rect");
        };
        assert_eq!((rect.width, rect.height), (-40.0, -20.0));
        assert_eq!(a.bounds(), LogicalRect::new(60.0, 80.0, 40.0, 20.0));
    }

    #[test]
    fn test_zero_area_shape_still_commits() {
        let mut state = AnnotationState::default();
        let p = Point::new(5.0, 5.0);
        begin(&mut state, &tools(Tool::Rect), p);
        pointer_up(&mut state, p);
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_text_click_opens_edit_and_submit_trims() {
        let mut state = AnnotationState::default();
        let t = tools(Tool::Text);
        begin(&mut state, &t, Point::new(50.0, 50.0));
        assert_eq!(state.text_edit, Some(TextEdit::at(Point::new(50.0, 50.0), "")));

        text_changed(&mut state, "  hello ".into());
        submit_text(&mut state, &t);

        assert!(state.text_edit.is_none());
        let Shape::Text(text) = &state.store.list()[0].shape else {
            panic!("expected text");
        };
        assert_eq!(text.text, "hello");
        assert_eq!((text.x, text.y), (50.0, 50.0));
        assert_eq!(text.font_size, 16.0);
        assert_eq!(text.width, DEFAULT_TEXT_WIDTH);
    }

    #[test]
    fn test_whitespace_submit_adds_nothing() {
        let mut state = AnnotationState::default();
        let t = tools(Tool::Text);
        begin(&mut state, &t, Point::new(1.0, 1.0));
        text_changed(&mut state, " \t ".into());
        submit_text(&mut state, &t);
        assert!(state.store.is_empty());
        assert!(state.text_edit.is_none());
    }

    #[test]
    fn test_stamp_placement_repeats_without_edit() {
        let mut state = AnnotationState::default();
        let mut t = tools(Tool::Text);
        t.pending_stamp = Some("①".into());
        t.font_size = 20.0;

        begin(&mut state, &t, Point::new(10.0, 10.0));
        begin(&mut state, &t, Point::new(40.0, 10.0));

        assert!(state.text_edit.is_none());
        assert_eq!(state.store.len(), 2);
        let Shape::Text(text) = &state.store.list()[1].shape else {
            panic!("expected text");
        };
        assert_eq!(text.text, "①");
        assert_eq!(text.width, 20.0);
    }

    #[test]
    fn test_drag_moves_annotation_on_release() {
        let mut state = AnnotationState::default();
        draw(&mut state, Tool::Arrow, Point::new(0.0, 0.0), Point::new(100.0, 0.0));

        assert!(grab(&mut state, Point::new(50.0, 2.0), CANVAS));
        pointer_move(&mut state, Point::new(60.0, 12.0));
        // stored entry untouched until release
        assert_eq!(state.store.list()[0].bounds().x, 0.0);
        pointer_up(&mut state, Point::new(60.0, 12.0));

        let Shape::Arrow(arrow) = &state.store.list()[0].shape else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.points, [10.0, 10.0, 110.0, 10.0]);
        assert_eq!(state.store.selected, Some(state.store.list()[0].id));
    }

    #[test]
    fn test_grab_misses_clear_selected() {
        let mut state = AnnotationState::default();
        state.store.selected = Some(AnnotationId(4));
        assert!(!grab(&mut state, Point::new(500.0, 500.0), CANVAS));
        assert_eq!(state.store.selected, None);
    }

    #[test]
    fn test_resize_selected_rect_bakes_scale() {
        let mut state = AnnotationState::default();
        draw(&mut state, Tool::Rect, Point::new(100.0, 100.0), Point::new(200.0, 150.0));
        let id = state.store.list()[0].id;
        state.store.selected = Some(id);

        assert!(grab(&mut state, Point::new(200.0, 150.0), CANVAS));
        pointer_move(&mut state, Point::new(300.0, 200.0));
        let live = state.gesture.live().cloned().unwrap();
        let Shape::Rect(rect) = &live.shape else {
            panic!("expected rect");
        };
        assert_eq!((rect.scale_x, rect.scale_y), (2.0, 2.0));

        pointer_up(&mut state, Point::new(300.0, 200.0));
        let Shape::Rect(rect) = &state.store.get(id).unwrap().shape else {
            panic!("expected rect");
        };
        assert_eq!(*rect, RectShape::new(100.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn test_clicking_text_reopens_edit() {
        let mut state = AnnotationState::default();
        let id = state.store.allocate_id();
        state.store.append(Annotation::text(
            id,
            ShapeColor::default(),
            Point::new(10.0, 10.0),
            "old",
            16.0,
            200.0,
        ));

        let p = Point::new(20.0, 15.0);
        assert!(grab(&mut state, p, CANVAS));
        pointer_up(&mut state, p);
        assert_eq!(state.store.editing, Some(id));
        assert_eq!(state.text_edit.as_ref().map(|e| e.buffer.as_str()), Some("old"));

        text_changed(&mut state, "new".into());
        submit_text(&mut state, &tools(Tool::Select));
        assert_eq!(state.store.len(), 1);
        let Shape::Text(text) = &state.store.get(id).unwrap().shape else {
            panic!("expected text");
        };
        assert_eq!(text.text, "new");
        assert_eq!(state.store.editing, None);
    }

    #[test]
    fn test_jittery_click_on_text_still_reopens_edit() {
        let mut state = AnnotationState::default();
        let id = state.store.allocate_id();
        let original =
            Annotation::text(id, ShapeColor::default(), Point::new(10.0, 10.0), "old", 16.0, 200.0);
        state.store.append(original.clone());

        assert!(grab(&mut state, Point::new(20.0, 15.0), CANVAS));
        pointer_move(&mut state, Point::new(22.0, 16.0));
        pointer_up(&mut state, Point::new(22.0, 16.0));
        assert_eq!(state.store.editing, Some(id));
        // the jitter did not move it
        assert_eq!(state.store.list(), &[original]);
    }

    #[test]
    fn test_text_drag_beyond_tolerance_moves_it() {
        let mut state = AnnotationState::default();
        let id = state.store.allocate_id();
        state.store.append(Annotation::text(
            id,
            ShapeColor::default(),
            Point::new(10.0, 10.0),
            "old",
            16.0,
            200.0,
        ));

        assert!(grab(&mut state, Point::new(20.0, 15.0), CANVAS));
        pointer_up(&mut state, Point::new(60.0, 15.0));
        assert_eq!(state.store.editing, None);
        assert_eq!(state.store.get(id).unwrap().bounds().x, 50.0);
    }

    #[test]
    fn test_empty_edit_leaves_annotation_unchanged() {
        let mut state = AnnotationState::default();
        let id = state.store.allocate_id();
        let original =
            Annotation::text(id, ShapeColor::default(), Point::new(0.0, 0.0), "keep", 16.0, 200.0);
        state.store.append(original.clone());
        state.store.editing = Some(id);
        state.text_edit = Some(TextEdit::at(Point::new(0.0, 0.0), ""));

        submit_text(&mut state, &tools(Tool::Text));
        assert_eq!(state.store.list(), &[original]);
    }

    #[test]
    fn test_delete_selected_closes_its_edit() {
        let mut state = AnnotationState::default();
        let id = state.store.allocate_id();
        state.store.append(Annotation::text(
            id,
            ShapeColor::default(),
            Point::new(0.0, 0.0),
            "x",
            16.0,
            200.0,
        ));
        state.store.selected = Some(id);
        state.store.editing = Some(id);
        state.text_edit = Some(TextEdit::at(Point::new(0.0, 0.0), "x"));

        delete_selected(&mut state);
        assert!(state.store.is_empty());
        assert!(state.text_edit.is_none());
        assert_eq!(state.store.selected, None);
    }
}
