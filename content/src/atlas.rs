pub mod glyph_atlas;
pub mod grid_scan;

pub use glyph_atlas::{AtlasBuildConfig, GlyphAtlas};
pub use grid_scan::{scan, FrameRegion, ScanConfig};
