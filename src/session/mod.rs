//! Capture session types
//!
//! This module contains:
//! - Session state pieces shared by the handlers
//! - Message and effect types
//! - Keyboard shortcut mapping

pub mod messages;
pub mod shortcuts;
pub mod state;
