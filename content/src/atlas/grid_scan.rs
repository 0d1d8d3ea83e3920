use std::path::Path;
use log::{debug, info};
use crate::{
    error::Result,
    file::{Load, Save},
    geom::rect::Rect,
    manifest::SpriteSheetManifest,
    render::{Bitmap, Color},
};

/// A sprite frame found on a grid-colored sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameRegion {
    pub rect: Rect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Compared for exact equality, alpha included.
    pub grid_color: Color,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { grid_color: Color::MAGENTA }
    }
}

/// Recovers the frames of a sheet whose sprites are solid axis-aligned blocks
/// separated by `grid_color`.
///
/// Pixels are visited top to bottom, left to right. The first unclaimed
/// non-grid pixel seeds a frame whose right edge is the end of the horizontal
/// run from the seed and whose bottom edge is the end of the vertical run down
/// that last column. Anything that is not a solid rectangle comes out
/// undersized; this is only meant for grid-drawn sheets.
pub fn scan(image: &Bitmap, config: ScanConfig) -> Vec<FrameRegion> {
    let grid = config.grid_color;
    let (width, height) = image.dim();
    let is_frame = |x: i32, y: i32| image[(x, y)] != grid;

    let mut regions: Vec<FrameRegion> = Vec::new();
    // Column spans [left, right) of the regions that cover the current row,
    // sorted by left edge.
    let mut claimed: Vec<(i32, i32)> = Vec::new();
    for y in 0..height {
        claimed.clear();
        claimed.extend(
            regions
                .iter()
                .filter(|r| r.rect.top() <= y && y < r.rect.bottom())
                .map(|r| (r.rect.left(), r.rect.right())),
        );
        claimed.sort_unstable();

        let mut next_claim = 0;
        let mut x = 0;
        while x < width {
            while next_claim < claimed.len() && claimed[next_claim].1 <= x {
                next_claim += 1;
            }
            if let Some(&(left, right)) = claimed.get(next_claim) {
                if left <= x {
                    x = right;
                    continue;
                }
            }
            if !is_frame(x, y) {
                x += 1;
                continue;
            }

            let mut x2 = x;
            while x2 + 1 < width && is_frame(x2 + 1, y) {
                x2 += 1;
            }
            let mut y2 = y;
            while y2 + 1 < height && is_frame(x2, y2 + 1) {
                y2 += 1;
            }

            let rect = Rect::new(x, y, x2 - x + 1, y2 - y + 1);
            debug!("frame {} at {:?}", regions.len(), rect);
            regions.push(FrameRegion { rect });
            x = x2 + 1;
        }
    }

    regions
}

/// Scans the sheet at `image_path` and writes its manifest to `output`.
pub fn write_sprite_sheet(image_path: &Path, config: ScanConfig, output: &Path) -> Result<SpriteSheetManifest> {
    let image = Bitmap::load(image_path)?;
    let frames = scan(&image, config);
    info!(
        "found {} frames in {} ({}x{})",
        frames.len(), image_path.display(), image.width(), image.height(),
    );

    let manifest = SpriteSheetManifest {
        texture: image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned(),
        color_key: config.grid_color,
        frames,
    };
    manifest.save(output)?;

    Ok(manifest)
}
