//! Canvas rendering module
//!
//! This module contains:
//! - Geometry constants and math shared by every drawing routine
//! - Scene rasterization using tiny-skia (preview and export)
//! - The magnifier lens

pub mod geometry;
pub mod image;
pub mod magnifier;
