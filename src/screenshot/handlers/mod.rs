//! Pointer handlers for the capture session
//!
//! The main `update()` in the parent module dispatches here.
//!
//! Handler locations:
//! - Annotation gestures: crate::annotations::handlers
//! - Marquee selection: selection.rs

pub mod selection;
