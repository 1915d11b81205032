//! Desktop capture
//!
//! This module consolidates:
//! - Capture sources producing raw per-monitor images (source.rs)
//! - Decoded capture type and parallel decoding (image.rs)

pub mod image;
pub mod source;
