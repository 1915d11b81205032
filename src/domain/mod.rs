//! Pure domain types with minimal dependencies
//!
//! Types here carry no rendering or host dependencies so every layer can
//! share them.

pub mod annotation;
pub mod geometry;
pub mod selection;

pub use annotation::*;
pub use geometry::*;
pub use selection::*;
