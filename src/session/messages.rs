//! Message types for the capture session
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - Effect enum for work the host performs on behalf of the session
//!
//! Messages that come from the user can be deserialized, so an input script
//! is just a stream of `Msg` values. Completion messages carry host data and
//! are only ever produced by the host itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capture::image::Capture;
use crate::config::ShapeColor;
use crate::domain::{ExportTarget, LogicalRect, Point, Tool};
use crate::export::Delivery;
use crate::render::image::Scene;

// ============================================================================
// Input Types
// ============================================================================

/// Pointer events in window-logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerMsg {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    Char(char),
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    /// Command key on macOS, Super elsewhere
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    /// Ctrl or Cmd held
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

// ============================================================================
// Sub-message Types
// ============================================================================

/// Toolbar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMsg {
    /// Switch tool, dropping any pending stamp
    Set(Tool),
    /// Switch to the text tool and place this glyph on every click
    ChooseStamp(String),
    SetColor(ShapeColor),
    SetFontSize(f32),
    ToggleMagnifier,
    /// Start dragging the toolbar from this pointer position
    DragToolbar(Point),
}

/// Text entry messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMsg {
    /// Replace the edit buffer
    Changed(String),
    Submit,
    Cancel,
}

/// Annotation list edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMsg {
    /// Remove the most recently added annotation
    Undo,
    /// Remove the selected annotation
    DeleteSelected,
}

/// Capture workflow messages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMsg {
    /// Reset the session and grab a new desktop image
    Start,
    /// Captured images are decoded and ready
    #[serde(skip)]
    Finished(Arc<Vec<Capture>>),
    /// Capture could not be acquired
    Failed(String),
}

/// Export workflow messages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMsg {
    /// Export the selected region
    Request(ExportTarget),
    /// Export pipeline finished
    #[serde(skip)]
    Finished(ExportTarget, Result<Delivery, String>),
}

// ============================================================================
// Main Message Enum
// ============================================================================

/// Messages for capture session interactions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    Pointer(PointerMsg),
    Key(KeyPress),
    Tool(ToolMsg),
    Text(TextMsg),
    Draw(DrawMsg),
    Capture(CaptureMsg),
    Export(ExportMsg),
    /// Collapse every transient state and hide the window
    Cancel,
    /// Hide the window, keeping the session as is
    Close,
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl Msg {
    pub fn text_submit() -> Self {
        Self::Text(TextMsg::Submit)
    }

    pub fn undo() -> Self {
        Self::Draw(DrawMsg::Undo)
    }
    pub fn delete_selected() -> Self {
        Self::Draw(DrawMsg::DeleteSelected)
    }

    pub fn start_capture() -> Self {
        Self::Capture(CaptureMsg::Start)
    }
    pub fn capture_finished(captures: Vec<Capture>) -> Self {
        Self::Capture(CaptureMsg::Finished(Arc::new(captures)))
    }
    pub fn capture_failed(reason: impl Into<String>) -> Self {
        Self::Capture(CaptureMsg::Failed(reason.into()))
    }

    pub fn copy_to_clipboard() -> Self {
        Self::Export(ExportMsg::Request(ExportTarget::Clipboard))
    }
    pub fn save_to_file() -> Self {
        Self::Export(ExportMsg::Request(ExportTarget::File))
    }
    pub fn export_finished(target: ExportTarget, result: Result<Delivery, String>) -> Self {
        Self::Export(ExportMsg::Finished(target, result))
    }

    pub fn cancel() -> Self {
        Self::Cancel
    }
}

/// Input messages normally arrive from scripts; tests build them directly
#[cfg(test)]
impl Msg {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::Pointer(PointerMsg::Down(Point::new(x, y)))
    }
    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::Pointer(PointerMsg::Move(Point::new(x, y)))
    }
    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::Pointer(PointerMsg::Up(Point::new(x, y)))
    }
    pub fn key(press: KeyPress) -> Self {
        Self::Key(press)
    }

    pub fn set_tool(tool: Tool) -> Self {
        Self::Tool(ToolMsg::Set(tool))
    }
    pub fn choose_stamp(stamp: impl Into<String>) -> Self {
        Self::Tool(ToolMsg::ChooseStamp(stamp.into()))
    }
    pub fn set_color(color: ShapeColor) -> Self {
        Self::Tool(ToolMsg::SetColor(color))
    }
    pub fn set_font_size(size: f32) -> Self {
        Self::Tool(ToolMsg::SetFontSize(size))
    }
    pub fn toggle_magnifier() -> Self {
        Self::Tool(ToolMsg::ToggleMagnifier)
    }
    pub fn drag_toolbar(x: f32, y: f32) -> Self {
        Self::Tool(ToolMsg::DragToolbar(Point::new(x, y)))
    }
    pub fn text_changed(text: impl Into<String>) -> Self {
        Self::Text(TextMsg::Changed(text.into()))
    }
    pub fn text_cancel() -> Self {
        Self::Text(TextMsg::Cancel)
    }
}

// ============================================================================
// Effects
// ============================================================================

/// Everything the export pipeline needs, detached from the live session
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub target: ExportTarget,
    /// Selected region in logical coordinates
    pub region: LogicalRect,
    pub pixel_ratio: f32,
    pub scene: Scene,
}

/// Work requested from the host
#[derive(Debug, Clone)]
pub enum Effect {
    /// Acquire a new capture and reply with a capture message
    Capture,
    /// Rasterize and deliver, then reply with `ExportMsg::Finished`
    Export(ExportRequest),
    /// Show and focus the host window
    ShowWindow,
    HideWindow,
}
