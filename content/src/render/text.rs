use std::path::{Path, PathBuf};
use log::{debug, warn};
use rusttype::{point, Font, GlyphId, PositionedGlyph, Scale};
use crate::error::{Error, Result};

/// Coverage of a single rasterized character, one alpha byte per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub character: char,
    width: i32,
    height: i32,
    alpha: Vec<u8>,
}

impl GlyphBitmap {
    pub fn blank(character: char, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            character,
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    /// Out-of-bounds reads are transparent.
    pub fn alpha(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha[(y * self.width + x) as usize]
    }

    pub fn set_alpha(&mut self, x: i32, y: i32, a: u8) {
        assert!(
            x >= 0 && y >= 0 && x < self.width && y < self.height,
            "glyph '{}' index out of bounds. (width, height) = {:?}, (x, y) = {:?}",
            self.character, (self.width, self.height), (x, y),
        );
        self.alpha[(y * self.width + x) as usize] = a;
    }

    fn column_has_ink(&self, x: i32) -> bool {
        (0..self.height).any(|y| self.alpha(x, y) != 0)
    }

    fn row_has_ink(&self, y: i32) -> bool {
        (0..self.width).any(|x| self.alpha(x, y) != 0)
    }

    /// Leftmost and rightmost columns (inclusive) holding any coverage.
    pub fn ink_columns(&self) -> Option<(i32, i32)> {
        let left = (0..self.width).find(|&x| self.column_has_ink(x))?;
        let right = (0..self.width).rev().find(|&x| self.column_has_ink(x))?;
        Some((left, right))
    }

    /// Topmost and bottommost rows (inclusive) holding any coverage.
    pub fn ink_rows(&self) -> Option<(i32, i32)> {
        let top = (0..self.height).find(|&y| self.row_has_ink(y))?;
        let bottom = (0..self.height).rev().find(|&y| self.row_has_ink(y))?;
        Some((top, bottom))
    }

    /// Keeps columns `[left, right]`.
    pub fn crop_columns(&mut self, left: i32, right: i32) {
        assert!(0 <= left && left <= right && right < self.width);
        let width = right - left + 1;
        let mut alpha = Vec::with_capacity((width * self.height) as usize);
        for y in 0..self.height {
            let row = (y * self.width) as usize;
            alpha.extend_from_slice(&self.alpha[row + left as usize..=row + right as usize]);
        }
        self.alpha = alpha;
        self.width = width;
    }

    /// Keeps rows `[top, bottom)`, clamped to the glyph height.
    pub fn crop_rows(&mut self, top: i32, bottom: i32) {
        let top = top.clamp(0, self.height);
        let bottom = bottom.clamp(top, self.height);
        let start = (top * self.width) as usize;
        let end = (bottom * self.width) as usize;
        self.alpha = self.alpha[start..end].to_vec();
        self.height = bottom - top;
    }
}

/// Something that can turn a character into a coverage bitmap.
pub trait Rasterizer {
    /// Size in pixels of the single-character string.
    fn measure(&self, c: char) -> (i32, i32);

    /// Draws `c` into a transparent `width` x `height` glyph. Without
    /// `antialias` every pixel is either fully on or fully off.
    fn rasterize(&self, c: char, width: i32, height: i32, antialias: bool) -> GlyphBitmap;
}

/// TrueType/OpenType rasterizer backed by `rusttype`.
///
/// Every glyph is drawn into the same vertical frame so baselines line up
/// across the atlas. The frame is the line box grown to cover the ink of
/// every glyph in the font, so nothing that reaches above the ascent or
/// below the descent is cut off.
pub struct FontRasterizer {
    font: Font<'static>,
    name: String,
    scale: Scale,
    ascent: f32,
    /// Top of the frame relative to the top of the line box, zero or negative.
    frame_top: i32,
    frame_height: i32,
}

impl FontRasterizer {
    /// Resolves `family` to a font file and loads it at `size` pixels.
    pub fn load(family: &str, size: f32) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::Config(format!("font size must be positive, got {}", size)));
        }
        let path = resolve_font(family)
            .ok_or_else(|| Error::Config(format!("font '{}' not found", family)))?;
        debug!("loading font '{}' from {}", family, path.display());

        let data = crate::file::read_entire_file(&path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| {
            Error::Config(format!("'{}' is not a TrueType/OpenType font", path.display()))
        })?;

        let scale = Scale::uniform(size);
        let v_metrics = font.v_metrics(scale);
        let line_height = (v_metrics.ascent - v_metrics.descent).ceil() as i32;
        let (frame_top, frame_bottom) = (0..font.glyph_count())
            .filter_map(|id| {
                font.glyph(GlyphId(id as u16))
                    .scaled(scale)
                    .positioned(point(0.0, v_metrics.ascent))
                    .pixel_bounding_box()
            })
            .fold((0, line_height), |(top, bottom), bbox| {
                (top.min(bbox.min.y), bottom.max(bbox.max.y))
            });
        debug!(
            "line height {}, glyph frame rows {}..{}",
            line_height, frame_top, frame_bottom,
        );

        let name = if Path::new(family).is_file() {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(family)
                .to_owned()
        } else {
            family.to_owned()
        };

        Ok(Self {
            font,
            name,
            scale,
            ascent: v_metrics.ascent,
            frame_top,
            frame_height: frame_bottom - frame_top,
        })
    }

    /// Family name to record in manifests.
    pub fn name(&self) -> &str {
        &self.name
    }

    // The origin of a line of text is at the baseline, so shift the glyph
    // down by the ascent to put the top of the line box at row 0.
    fn positioned(&self, c: char) -> PositionedGlyph<'static> {
        self.font
            .glyph(c)
            .scaled(self.scale)
            .positioned(point(0.0, self.ascent))
    }
}

/// Columns `[left, right)` covering both the advance and the ink of `glyph`.
fn horizontal_extent(glyph: &PositionedGlyph) -> (i32, i32) {
    let advance = (glyph.unpositioned().h_metrics().advance_width.ceil() as i32).max(0);
    match glyph.pixel_bounding_box() {
        Some(bbox) => (bbox.min.x.min(0), bbox.max.x.max(advance)),
        None => (0, advance),
    }
}

impl Rasterizer for FontRasterizer {
    fn measure(&self, c: char) -> (i32, i32) {
        let glyph = self.positioned(c);
        if glyph.id().0 == 0 && c != '\0' {
            warn!("font '{}' has no glyph for {:?}, drawing the fallback glyph", self.name, c);
        }
        let (left, right) = horizontal_extent(&glyph);

        (right - left, self.frame_height)
    }

    fn rasterize(&self, c: char, width: i32, height: i32, antialias: bool) -> GlyphBitmap {
        let mut bmp = GlyphBitmap::blank(c, width, height);
        let positioned = self.positioned(c);
        let (left, _) = horizontal_extent(&positioned);

        if let Some(bbox) = positioned.pixel_bounding_box() {
            let (w, h) = (bmp.width(), bmp.height());
            let (dx, dy) = (bbox.min.x - left, bbox.min.y - self.frame_top);
            positioned.draw(|x, y, mut v| {
                utils::clamp(&mut v, 0.0, 1.0);
                let x = x as i32 + dx;
                let y = y as i32 + dy;
                // only clips when the caller asked for less than measure()
                if x >= 0 && x < w && y >= 0 && y < h {
                    bmp.set_alpha(x, y, coverage_to_alpha(v, antialias));
                }
            });
        }

        bmp
    }
}

fn coverage_to_alpha(v: f32, antialias: bool) -> u8 {
    if antialias {
        (v * 255.0).round() as u8
    } else if v > 0.5 {
        255
    } else {
        0
    }
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(windir) = std::env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs.push(PathBuf::from("/usr/share/fonts"));
    dirs.push(PathBuf::from("/Library/Fonts"));
    dirs
}

fn resolve_font(family: &str) -> Option<PathBuf> {
    if family.is_empty() {
        return None;
    }
    let direct = Path::new(family);
    if direct.is_file() {
        return Some(direct.to_owned());
    }
    let file_names: Vec<String> = ["ttf", "otf"]
        .iter()
        .map(|ext| format!("{}.{}", family, ext))
        .collect();
    font_dirs()
        .iter()
        .find_map(|dir| find_font_file(dir, &file_names))
}

/// Depth-first search of `dir` for a file named like one of `file_names`,
/// ignoring case. Files directly in a directory win over its subdirectories.
fn find_font_file(dir: &Path, file_names: &[String]) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        // symlinked directories are not followed
        match entry.file_type() {
            Ok(t) if t.is_dir() => subdirs.push(path),
            Ok(_) => {
                let matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| file_names.iter().any(|f| f.eq_ignore_ascii_case(n)));
                if matches && path.is_file() {
                    return Some(path);
                }
            }
            Err(_) => {}
        }
    }
    subdirs.sort();
    subdirs.iter().find_map(|d| find_font_file(d, file_names))
}
