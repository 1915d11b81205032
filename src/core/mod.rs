//! Core application module
//!
//! Hosts a capture session: runs the effects the session asks for on the
//! tokio runtime and feeds their results back as messages.

pub mod app;
