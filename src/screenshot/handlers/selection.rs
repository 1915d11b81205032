//! Marquee selection state machine
//!
//! Pointer-down picks the mode: a resize handle of the current region, the
//! inside of the region (move), or anything else (start a new marquee).
//! Moves apply to the snapshot taken at pointer-down, and pointer-up always
//! returns to idle.

use crate::domain::{HANDLE_HIT_RADIUS, Point, Selection, Size};
use crate::session::state::{SelectionMode, SelectionState};

/// Toolbar footprint used for placement
pub const TOOLBAR_SIZE: Size = Size::new(500.0, 150.0);
/// Gap between the release point and the toolbar
pub const TOOLBAR_PADDING: f32 = 20.0;

pub fn pointer_down(state: &mut SelectionState, p: Point) {
    let rect = state.selection.rect();
    let has_region = rect.width > 0.0 && rect.height > 0.0;

    if has_region {
        if let Some(handle) = rect.handle_at(p, HANDLE_HIT_RADIUS) {
            log::debug!("Resizing selection from {handle:?}");
            state.mode = SelectionMode::Resizing {
                handle,
                snapshot: rect,
            };
            return;
        }
        if rect.contains(p) {
            state.mode = SelectionMode::Moving {
                origin: p,
                snapshot: state.selection,
            };
            return;
        }
    }

    state.selection = Selection::begin(p);
    state.mode = SelectionMode::Creating;
}

pub fn pointer_move(state: &mut SelectionState, p: Point) {
    match state.mode {
        SelectionMode::Idle => {}
        SelectionMode::Creating => state.selection.end = p,
        SelectionMode::Moving { origin, snapshot } => {
            let (dx, dy) = p.delta_from(origin);
            state.selection = snapshot.translated(dx, dy);
        }
        SelectionMode::Resizing { handle, snapshot } => {
            let (start, end) = handle.resize(snapshot, p);
            state.selection = Selection::from_corners(start, end);
        }
    }
}

/// Finish the active interaction
///
/// Returns true when an interaction actually ended, so the caller can place
/// the toolbar.
pub fn pointer_up(state: &mut SelectionState, p: Point) -> bool {
    if state.mode == SelectionMode::Idle {
        return false;
    }
    pointer_move(state, p);
    state.selection.in_progress = false;
    state.mode = SelectionMode::Idle;
    true
}

/// Drop the region and any interaction
pub fn clear(state: &mut SelectionState) {
    *state = SelectionState::default();
}

/// Place the toolbar near `release`, on the side with more free space
///
/// The result is clamped so the toolbar stays inside the viewport whenever
/// the viewport is large enough to hold it.
pub fn toolbar_position(release: Point, viewport: Size) -> Point {
    let x = place_axis(release.x, viewport.width, TOOLBAR_SIZE.width);
    let y = place_axis(release.y, viewport.height, TOOLBAR_SIZE.height);
    Point::new(x, y)
}

fn place_axis(at: f32, available: f32, extent: f32) -> f32 {
    let after = available - at;
    let preferred = if after >= at {
        at + TOOLBAR_PADDING
    } else {
        at - TOOLBAR_PADDING - extent
    };
    preferred.clamp(0.0, (available - extent).max(0.0))
}
