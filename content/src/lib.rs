//! Offline content generation: texture-font atlases and sprite-sheet frame
//! manifests.

pub mod atlas;
pub mod error;
pub mod file;
pub mod geom;
pub mod manifest;
pub mod render;

pub use error::{Error, ManifestError, Result};
