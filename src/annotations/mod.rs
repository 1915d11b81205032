//! Annotation list and gesture handlers
//!
//! This module provides:
//! - The ordered annotation store with undo and selection references
//! - Pointer handlers for the drawing tools and direct manipulation

pub mod handlers;
pub mod store;
