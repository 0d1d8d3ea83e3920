use std::path::{Path, PathBuf};
use log::{debug, info};
use serde::Deserialize;
use crate::{
    error::{Error, Result},
    file::Save,
    geom::rect::Rect,
    manifest::{AtlasManifestEntry, TextureFontManifest},
    render::{draw_glyph, text::Rasterizer, Bitmap, Color, GlyphBitmap},
};

const SPACE: char = ' ';
/// Largest accepted gap between glyphs, in pixels.
pub const MAX_PADDING: i32 = 1024;

/// Everything needed to turn a font into a texture atlas.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasBuildConfig {
    pub font_family: String,
    pub font_size: f32,
    pub antialias: bool,
    pub min_char: u32,
    /// Exclusive.
    pub max_char: u32,
    pub background_color: Color,
    pub columns_per_row: usize,
    pub padding: i32,
    pub character_spacing: i32,
    /// Defaults to the computed line height.
    pub line_spacing: Option<i32>,
}

impl Default for AtlasBuildConfig {
    fn default() -> Self {
        Self {
            font_family: String::new(),
            font_size: 16.0,
            antialias: true,
            min_char: 0x20,
            max_char: 0x7F,
            background_color: Color::TRANSPARENT,
            columns_per_row: 16,
            padding: 4,
            character_spacing: 0,
            line_spacing: None,
        }
    }
}

impl AtlasBuildConfig {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Config(msg));

        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return fail(format!("font size must be positive, got {}", self.font_size));
        }
        if self.min_char < 0x20 {
            return fail(format!("min char {:#x} is a control character", self.min_char));
        }
        if self.max_char > 0x11_0000 {
            return fail(format!("max char {:#x} is past the last code point", self.max_char));
        }
        if self.min_char >= self.max_char {
            return fail(format!(
                "character range [{:#x}, {:#x}) is empty",
                self.min_char, self.max_char,
            ));
        }
        if self.columns_per_row == 0 {
            return fail("columns per row must be at least 1".to_owned());
        }
        if !(0..=MAX_PADDING).contains(&self.padding) {
            return fail(format!(
                "padding must be between 0 and {}, got {}",
                MAX_PADDING, self.padding,
            ));
        }
        Ok(())
    }

    /// Characters of `[min_char, max_char)` in ascending order. Surrogate code
    /// points are not characters and are skipped.
    pub fn characters(&self) -> impl Iterator<Item = char> {
        (self.min_char..self.max_char).filter_map(char::from_u32)
    }
}

/// A packed glyph atlas and the rectangle of every character inside it.
#[derive(Debug)]
pub struct GlyphAtlas {
    pub image: Bitmap,
    pub entries: Vec<AtlasManifestEntry>,
    pub line_height: i32,
}

impl GlyphAtlas {
    pub fn build(config: &AtlasBuildConfig, rasterizer: &impl Rasterizer) -> Result<Self> {
        config.validate()?;
        let columns = config.columns_per_row;
        let padding = config.padding;

        let mut glyphs: Vec<GlyphBitmap> = Vec::new();
        let mut line_height = 0;
        let mut atlas_width = 0;
        let mut row_width = 0;
        for (i, c) in config.characters().enumerate() {
            if i > 0 && i % columns == 0 {
                row_width = 0;
            }

            let (width, height) = rasterizer.measure(c);
            let mut glyph = rasterizer.rasterize(c, width, height, config.antialias);

            if c != SPACE {
                // Blank glyphs have no ink columns and keep their measured width.
                if let Some((left, right)) = glyph.ink_columns() {
                    if left > 0 || right < glyph.width() - 1 {
                        glyph.crop_columns(left, right);
                    }
                }
                line_height = line_height.max(glyph.height());
            }
            debug!("rasterized {:?}: {}x{}", c, glyph.width(), glyph.height());

            row_width = grow(row_width, &[glyph.width(), padding])?;
            atlas_width = atlas_width.max(row_width);
            glyphs.push(glyph);
        }

        let (top, bottom) = shared_band(&glyphs).unwrap_or((0, line_height));
        for glyph in glyphs.iter_mut() {
            glyph.crop_rows(top, bottom);
        }
        let line_height = bottom - top;

        let rows = glyphs.len().div_ceil(columns);
        let atlas_height = i32::try_from(rows)
            .ok()
            .and_then(|rows| line_height.checked_add(padding)?.checked_mul(rows))
            .ok_or_else(too_large)?;

        let mut image = Bitmap::with_dimensions(atlas_width, atlas_height)
            .filled(config.background_color);
        let mut entries = Vec::with_capacity(glyphs.len());
        let (mut x, mut y) = (0, 0);
        for (i, glyph) in glyphs.iter().enumerate() {
            if i > 0 && i % columns == 0 {
                x = 0;
                y += line_height + padding;
            }
            let rect = Rect::new(x, y, glyph.width(), line_height);
            debug_assert!(image.bounds().contains_rect(rect), "{:?} outside the atlas", rect);
            draw_glyph(&mut image, glyph, (x, y), Color::WHITE);
            entries.push(AtlasManifestEntry {
                character: glyph.character,
                rect,
            });
            x += glyph.width() + padding;
        }

        info!(
            "packed {} glyphs into a {}x{} atlas, line height {}",
            entries.len(), atlas_width, atlas_height, line_height,
        );

        Ok(Self {
            image,
            entries,
            line_height,
        })
    }

    pub fn manifest(&self, config: &AtlasBuildConfig, font_name: &str, texture: &str) -> TextureFontManifest {
        TextureFontManifest {
            texture: texture.to_owned(),
            background_color: config.background_color,
            font_name: font_name.to_owned(),
            font_size: config.font_size,
            character_spacing: config.character_spacing,
            line_spacing: config.line_spacing.unwrap_or(self.line_height),
            characters: self.entries.clone(),
        }
    }

    /// Writes `<output>.png` and `<output>.xml`. The image is written first so
    /// the manifest never refers to a texture that failed to save.
    pub fn save(
        &self,
        config: &AtlasBuildConfig,
        font_name: &str,
        output: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        let image_path = output.with_extension("png");
        let manifest_path = output.with_extension("xml");
        let texture = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        self.image.save(&image_path)?;
        self.manifest(config, font_name, texture).save(&manifest_path)?;
        info!("wrote {} and {}", image_path.display(), manifest_path.display());

        Ok((image_path, manifest_path))
    }
}

fn too_large() -> Error {
    Error::Config("atlas dimensions overflow".to_owned())
}

fn grow(total: i32, parts: &[i32]) -> Result<i32> {
    parts
        .iter()
        .try_fold(total, |acc, &part| acc.checked_add(part))
        .ok_or_else(too_large)
}

/// Rows `[top, bottom)` covering the ink of every non-space glyph.
fn shared_band(glyphs: &[GlyphBitmap]) -> Option<(i32, i32)> {
    glyphs
        .iter()
        .filter(|g| g.character != SPACE)
        .filter_map(GlyphBitmap::ink_rows)
        .fold(None, |band, (top, bottom)| match band {
            None => Some((top, bottom + 1)),
            Some((t, b)) => Some((t.min(top), b.max(bottom + 1))),
        })
}
