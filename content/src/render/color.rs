use std::fmt;

/// 32-bit color packed as `0xAARRGGBB`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    data: u32,
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.data
    }
}

impl From<rgb::RGBA8> for Color {
    fn from(px: rgb::RGBA8) -> Self {
        Self::rgba(px.r, px.g, px.b, px.a)
    }
}

impl From<Color> for rgb::RGBA8 {
    fn from(color: Color) -> Self {
        rgb::RGBA8::new(color.r(), color.g(), color.b(), color.a())
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({})", self.to_hex_string())
    }
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let data = (a as u32) << 24
            | (r as u32) << 16
            | (g as u32) << 8
            | b as u32;

        Self { data }
    }

    pub fn r(self) -> u8 { ((self.data & Self::R_MASK) >> 16) as u8 }
    pub fn g(self) -> u8 { ((self.data & Self::G_MASK) >> 8) as u8 }
    pub fn b(self) -> u8 { (self.data & Self::B_MASK) as u8 }
    pub fn a(self) -> u8 { ((self.data & Self::A_MASK) >> 24) as u8 }

    /// Formats the color as eight uppercase hex digits in R, G, B, A order.
    pub fn to_hex_string(self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.r(), self.g(), self.b(), self.a())
    }

    /// Strict parse of an `RRGGBBAA` string. Returns `None` for anything that
    /// is not exactly eight hex digits.
    pub fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(s, 16).ok()?;
        let [r, g, b, a] = value.to_be_bytes();

        Some(Self::rgba(r, g, b, a))
    }

    /// Lenient parse: anything `parse_hex` rejects becomes opaque black.
    pub fn from_hex_string(s: &str) -> Self {
        Self::parse_hex(s).unwrap_or(Self::BLACK)
    }

    /// Non-premultiplied source-over: `self` drawn on top of `dst` with its
    /// alpha scaled by `coverage`.
    pub fn over(self, dst: Color, coverage: u8) -> Color {
        let sa = self.a() as u32 * coverage as u32 / 255;
        if sa == 0 {
            return dst;
        }
        let da = dst.a() as u32 * (255 - sa) / 255;
        let out_a = sa + da;
        let mix = |s: u8, d: u8| ((s as u32 * sa + d as u32 * da + out_a / 2) / out_a) as u8;

        Color::rgba(
            mix(self.r(), dst.r()),
            mix(self.g(), dst.g()),
            mix(self.b(), dst.b()),
            out_a as u8,
        )
    }

    pub const A_MASK: u32 = 0xFF00_0000;
    pub const R_MASK: u32 = 0x00FF_0000;
    pub const G_MASK: u32 = 0x0000_FF00;
    pub const B_MASK: u32 = 0x0000_00FF;

    pub const TRANSPARENT: Self = Self { data: 0 };
    pub const BLACK: Self = Self { data: Self::A_MASK };
    pub const WHITE: Self = Self {
        data: Self::A_MASK | Self::R_MASK | Self::G_MASK | Self::B_MASK,
    };
    pub const MAGENTA: Self = Self {
        data: Self::A_MASK | Self::R_MASK | Self::B_MASK,
    };
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: serde::Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        Color::parse_hex(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("'{}' is not an RRGGBBAA hex color", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_follow_argb_packing() {
        let c = Color::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(u32::from(c), 0x7812_3456);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn hex_string_is_rgba_uppercase() {
        assert_eq!(Color::MAGENTA.to_hex_string(), "FF00FFFF");
        assert_eq!(Color::rgba(0xab, 0xcd, 0xef, 0x01).to_hex_string(), "ABCDEF01");
    }

    #[test]
    fn hex_round_trip() {
        let samples = [
            Color::TRANSPARENT,
            Color::BLACK,
            Color::WHITE,
            Color::MAGENTA,
            Color::rgba(0x64, 0x95, 0xED, 0xFF),
            Color::rgba(1, 2, 3, 4),
            Color::rgba(255, 0, 127, 128),
        ];
        for c in samples {
            assert_eq!(Color::from_hex_string(&c.to_hex_string()), c);
        }
        for v in (0..=u32::MAX).step_by(0x0101_0101 / 3) {
            let [r, g, b, a] = v.to_le_bytes();
            let c = Color::rgba(r, g, b, a);
            assert_eq!(Color::from_hex_string(&c.to_hex_string()), c);
        }
    }

    #[test]
    fn zero_hex_is_transparent_black() {
        let c = Color::from_hex_string("00000000");
        assert_eq!(c, Color::TRANSPARENT);
        assert_eq!(c.a(), 0);
    }

    #[test]
    fn invalid_hex_falls_back_to_opaque_black() {
        assert_eq!(Color::from_hex_string("ZZZZZZZZ"), Color::BLACK);
        assert_eq!(Color::from_hex_string("FFF"), Color::BLACK);
        assert_eq!(Color::from_hex_string("+FFFFFFF"), Color::BLACK);
        assert_eq!(Color::parse_hex("ZZZZZZZZ"), None);
        assert_eq!(Color::parse_hex("ff00ffff"), Some(Color::MAGENTA));
    }

    #[test]
    fn over_transparent_keeps_source_color() {
        let c = Color::WHITE.over(Color::TRANSPARENT, 128);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (255, 255, 255, 128));
    }

    #[test]
    fn over_opaque_stays_opaque() {
        let c = Color::WHITE.over(Color::BLACK, 255);
        assert_eq!(c, Color::WHITE);
        let half = Color::WHITE.over(Color::BLACK, 128);
        assert_eq!(half.a(), 255);
        assert_eq!(half.r(), 128);
        assert_eq!(Color::WHITE.over(Color::BLACK, 0), Color::BLACK);
    }
}
