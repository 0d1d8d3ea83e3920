pub mod bitmap;
pub mod color;
pub mod text;

pub use bitmap::Bitmap;
pub use color::Color;
pub use text::GlyphBitmap;

use crate::geom::rect::Rect;

/// Draws `color` through the glyph's alpha coverage with its top-left corner
/// at `p`, blending over what is already in `dst_bmp`. Parts that fall
/// outside `dst_bmp` are clipped.
pub fn draw_glyph(dst_bmp: &mut Bitmap, glyph: &GlyphBitmap, p: (i32, i32), color: Color) {
    let src0 = (
        if p.0 < 0 { -p.0 } else { 0 },
        if p.1 < 0 { -p.1 } else { 0 },
    );
    let dst_rect = Rect::new(p.0, p.1, glyph.width(), glyph.height());

    for (row_index, dst_row) in dst_bmp.clamped_rows_mut(dst_rect).enumerate() {
        let src_y = src0.1 + row_index as i32;
        for (col_index, dst) in dst_row.iter_mut().enumerate() {
            let coverage = glyph.alpha(src0.0 + col_index as i32, src_y);
            *dst = color.over(*dst, coverage);
        }
    }
}
