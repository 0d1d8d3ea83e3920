use std::{
    ops::{Index, IndexMut},
    path::Path,
};
use crate::{
    error::{Error, Result},
    file::{read_entire_file, Load, Save},
    geom::rect::Rect,
    render::Color,
};

/// Row-major, top-down pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<Color>,
    width: i32,
    height: i32,
}

impl Index<(i32, i32)> for Bitmap {
    type Output = Color;
    fn index(&self, (x, y): (i32, i32)) -> &Self::Output {
        &self.data[self.offset_of(x, y)]
    }
}

impl IndexMut<(i32, i32)> for Bitmap {
    fn index_mut(&mut self, (x, y): (i32, i32)) -> &mut Color {
        let offset = self.offset_of(x, y);
        &mut self.data[offset]
    }
}

impl Bitmap {
    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }
    pub fn dim(&self) -> (i32, i32) { (self.width, self.height) }
    pub fn bounds(&self) -> Rect { Rect::new(0, 0, self.width, self.height) }

    pub fn with_dimensions(width: i32, height: i32) -> Self {
        assert!(width >= 0 && height >= 0, "negative bitmap dimensions {}x{}", width, height);

        Self {
            data: vec![Color::TRANSPARENT; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn from_pixels(width: i32, height: i32, data: Vec<Color>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "pixel count does not match {}x{}", width, height,
        );
        Self { data, width, height }
    }

    pub fn filled(mut self, color: Color) -> Self {
        for p in self.data.iter_mut() {
            *p = color;
        }
        self
    }

    /// Mutable rows of the part of `rect` that lies inside the bitmap.
    pub fn clamped_rows_mut(&mut self, rect: Rect) -> impl Iterator<Item = &mut [Color]> {
        let mut x0 = rect.left();
        let mut y0 = rect.top();
        let mut x1 = rect.right();
        let mut y1 = rect.bottom();
        utils::clamp(&mut x0, 0, self.width);
        utils::clamp(&mut y0, 0, self.height);
        utils::clamp(&mut x1, x0, self.width);
        utils::clamp(&mut y1, y0, self.height);

        let stride = self.width.max(1) as usize;
        let (x0, x1) = (x0 as usize, x1 as usize);
        self.data
            .chunks_mut(stride)
            .skip(y0 as usize)
            .take((y1 - y0) as usize)
            .map(move |row| &mut row[x0..x1])
    }

    fn offset_of(&self, x: i32, y: i32) -> usize {
        assert!(
            x >= 0 && y >= 0 && x < self.width && y < self.height,
            "Bitmap index out of bounds. (width, height) = {:?}, (x, y) = {:?}",
            self.dim(), (x, y),
        );
        y as usize * self.width as usize + x as usize
    }

    fn from_png(filepath: &Path, bytes: &[u8]) -> Result<Self> {
        let png = lodepng::decode32(bytes).map_err(|source| Error::Image {
            path: filepath.to_owned(),
            source,
        })?;
        let data = png.buffer.into_iter().map(Color::from).collect();

        Ok(Self::from_pixels(png.width as i32, png.height as i32, data))
    }

    /// Uncompressed 24 or 32 bit BMP, bottom-up or top-down.
    fn from_bmp(filepath: &Path, file: &[u8]) -> Result<Self> {
        let unsupported = |reason: &str| Error::UnsupportedImage {
            path: filepath.to_owned(),
            reason: reason.to_owned(),
        };
        let u16_at = |at: usize| file.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]));
        let u32_at = |at: usize| {
            file.get(at..at + 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        };

        const BM: u16 = ('B' as u16) | ('M' as u16) << 8;
        if u16_at(0) != Some(BM) {
            return Err(unsupported("missing BM signature"));
        }
        let header = (|| {
            Some((
                u32_at(10)? as usize, // bfOffBits
                u32_at(18)? as i32,   // biWidth
                u32_at(22)? as i32,   // biHeight
                u16_at(28)?,          // biBitCount
                u32_at(30)?,          // biCompression
            ))
        })();
        let (pixel_offset, width, height, bit_count, compression) =
            header.ok_or_else(|| unsupported("truncated header"))?;

        const BI_RGB: u32 = 0;
        const BI_BITFIELDS: u32 = 3;
        if width <= 0 || height == 0 {
            return Err(unsupported("empty image"));
        }
        let bytes_per_pixel = match (bit_count, compression) {
            (24, BI_RGB) => 3,
            (32, BI_RGB) | (32, BI_BITFIELDS) => 4,
            _ => return Err(unsupported("only uncompressed 24/32 bit BMP is supported")),
        };
        //NOTE: negative height means that bitmap is top-down
        let top_down = height < 0;
        let height = height.abs();
        let stride = (width as usize * bytes_per_pixel + 3) & !3;

        let mut bmp = Self::with_dimensions(width, height);
        for y in 0..height {
            let src_y = if top_down { y } else { height - 1 - y };
            let row_start = pixel_offset + src_y as usize * stride;
            let row = file
                .get(row_start..row_start + width as usize * bytes_per_pixel)
                .ok_or_else(|| unsupported("pixel data is truncated"))?;
            for (x, px) in row.chunks_exact(bytes_per_pixel).enumerate() {
                let a = if bytes_per_pixel == 4 { px[3] } else { 0xFF };
                bmp[(x as i32, y)] = Color::rgba(px[2], px[1], px[0], a);
            }
        }

        Ok(bmp)
    }
}

fn extension_of(filepath: &Path) -> String {
    filepath
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

impl Load for Bitmap {
    fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let filepath = filepath.as_ref();
        let file = read_entire_file(filepath)?;

        match extension_of(filepath).as_str() {
            "png" => Self::from_png(filepath, &file),
            "bmp" => Self::from_bmp(filepath, &file),
            other => Err(Error::UnsupportedImage {
                path: filepath.to_owned(),
                reason: format!("unknown image extension '{}'", other),
            }),
        }
    }
}

impl Save for Bitmap {
    fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
        let filepath = filepath.as_ref();
        if extension_of(filepath) != "png" {
            return Err(Error::UnsupportedImage {
                path: filepath.to_owned(),
                reason: "images are only written as PNG".to_owned(),
            });
        }
        let pixels: Vec<rgb::RGBA8> = self.data.iter().map(|&c| c.into()).collect();
        lodepng::encode32_file(filepath, &pixels, self.width as usize, self.height as usize)
            .map_err(|source| Error::Image {
                path: filepath.to_owned(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clamped_rows_mut_clips_to_bounds() {
        let mut bmp = Bitmap::with_dimensions(4, 3);
        for row in bmp.clamped_rows_mut(Rect::new(-2, 1, 4, 10)) {
            for px in row {
                *px = Color::WHITE;
            }
        }
        assert_eq!(bmp[(0, 0)], Color::TRANSPARENT);
        assert_eq!(bmp[(0, 1)], Color::WHITE);
        assert_eq!(bmp[(1, 2)], Color::WHITE);
        assert_eq!(bmp[(2, 1)], Color::TRANSPARENT);
    }

    #[test]
    fn png_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.png");

        let mut bmp = Bitmap::with_dimensions(3, 2).filled(Color::MAGENTA);
        bmp[(1, 1)] = Color::rgba(10, 20, 30, 40);
        bmp.save(&path).unwrap();

        let loaded = Bitmap::load(&path).unwrap();
        assert_eq!(loaded, bmp);
    }

    #[test]
    fn bmp_bottom_up_24_bit() {
        // 2x2, rows padded to 8 bytes, stored bottom row first
        let mut file = vec![0u8; 54];
        file[0] = b'B';
        file[1] = b'M';
        file[10..14].copy_from_slice(&54u32.to_le_bytes());
        file[14..18].copy_from_slice(&40u32.to_le_bytes());
        file[18..22].copy_from_slice(&2i32.to_le_bytes());
        file[22..26].copy_from_slice(&2i32.to_le_bytes());
        file[26..28].copy_from_slice(&1u16.to_le_bytes());
        file[28..30].copy_from_slice(&24u16.to_le_bytes());
        // bottom row: blue, green
        file.extend_from_slice(&[255, 0, 0, 0, 255, 0, 0, 0]);
        // top row: red, white
        file.extend_from_slice(&[0, 0, 255, 255, 255, 255, 0, 0]);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.bmp");
        std::fs::write(&path, &file).unwrap();

        let bmp = Bitmap::load(&path).unwrap();
        assert_eq!(bmp.dim(), (2, 2));
        assert_eq!(bmp[(0, 0)], Color::rgba(255, 0, 0, 255));
        assert_eq!(bmp[(1, 0)], Color::WHITE);
        assert_eq!(bmp[(0, 1)], Color::rgba(0, 0, 255, 255));
        assert_eq!(bmp[(1, 1)], Color::rgba(0, 255, 0, 255));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.png");
        let err = Bitmap::load(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("nope.png"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.gif");
        std::fs::write(&path, b"GIF89a").unwrap();
        assert!(matches!(Bitmap::load(&path), Err(Error::UnsupportedImage { .. })));
        assert!(matches!(
            Bitmap::with_dimensions(1, 1).save(dir.path().join("out.jpg")),
            Err(Error::UnsupportedImage { .. })
        ));
    }
}
