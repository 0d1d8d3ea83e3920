//! XML side files describing where things live inside an atlas image.
//!
//! ```xml
//! <TextureFont Texture="font.png" BackgroundColor="00000000" FontName="Arial"
//!              FontSize="16" CharacterSpacing="0" LineSpacing="18">
//!   <Character Value="A" X="0" Y="0" Width="10" Height="18" />
//! </TextureFont>
//!
//! <SpriteSheet Texture="hero.png" ColorKey="FF00FFFF">
//!   <Frame X="5" Y="5" Width="4" Height="4" />
//! </SpriteSheet>
//! ```

use std::{path::Path, str::FromStr};
use roxmltree::Node;
use crate::{
    atlas::grid_scan::FrameRegion,
    error::{Error, ManifestError, Result},
    file::{read_entire_string, write_entire_file, Load, Save},
    geom::rect::Rect,
    render::Color,
};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasManifestEntry {
    pub character: char,
    pub rect: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureFontManifest {
    pub texture: String,
    pub background_color: Color,
    pub font_name: String,
    pub font_size: f32,
    pub character_spacing: i32,
    pub line_spacing: i32,
    pub characters: Vec<AtlasManifestEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteSheetManifest {
    pub texture: String,
    pub color_key: Color,
    pub frames: Vec<FrameRegion>,
}

impl TextureFontManifest {
    pub const ROOT: &'static str = "TextureFont";
    const CHARACTER: &'static str = "Character";

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!(
            "<{} Texture=\"{}\" BackgroundColor=\"{}\" FontName=\"{}\" FontSize=\"{}\" CharacterSpacing=\"{}\" LineSpacing=\"{}\">\n",
            Self::ROOT,
            escape(&self.texture),
            self.background_color.to_hex_string(),
            escape(&self.font_name),
            self.font_size,
            self.character_spacing,
            self.line_spacing,
        ));
        for entry in &self.characters {
            let mut buf = [0; 4];
            xml.push_str(&format!(
                "  <{} Value=\"{}\" {} />\n",
                Self::CHARACTER,
                escape(entry.character.encode_utf8(&mut buf)),
                rect_attributes(entry.rect),
            ));
        }
        xml.push_str(&format!("</{}>\n", Self::ROOT));
        xml
    }

    pub fn from_xml(text: &str) -> std::result::Result<Self, ManifestError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = expect_root(&doc, Self::ROOT)?;

        let background = required(root, Self::ROOT, "BackgroundColor")?;
        let background_color = Color::parse_hex(background).ok_or_else(|| {
            ManifestError::InvalidColor {
                attribute: "BackgroundColor",
                value: background.to_owned(),
            }
        })?;

        let characters = root
            .children()
            .filter(|n| n.has_tag_name(Self::CHARACTER))
            .map(|node| -> std::result::Result<AtlasManifestEntry, ManifestError> {
                let value = required(node, Self::CHARACTER, "Value")?;
                let mut chars = value.chars();
                let character = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(ManifestError::InvalidCharacter(value.to_owned())),
                };
                Ok(AtlasManifestEntry {
                    character,
                    rect: read_rect(node, Self::CHARACTER)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            texture: required(root, Self::ROOT, "Texture")?.to_owned(),
            background_color,
            font_name: required(root, Self::ROOT, "FontName")?.to_owned(),
            font_size: number(root, Self::ROOT, "FontSize")?,
            character_spacing: number(root, Self::ROOT, "CharacterSpacing")?,
            line_spacing: number(root, Self::ROOT, "LineSpacing")?,
            characters,
        })
    }
}

impl SpriteSheetManifest {
    pub const ROOT: &'static str = "SpriteSheet";
    const FRAME: &'static str = "Frame";

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!(
            "<{} Texture=\"{}\" ColorKey=\"{}\">\n",
            Self::ROOT,
            escape(&self.texture),
            self.color_key.to_hex_string(),
        ));
        for frame in &self.frames {
            xml.push_str(&format!("  <{} {} />\n", Self::FRAME, rect_attributes(frame.rect)));
        }
        xml.push_str(&format!("</{}>\n", Self::ROOT));
        xml
    }

    pub fn from_xml(text: &str) -> std::result::Result<Self, ManifestError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = expect_root(&doc, Self::ROOT)?;

        let key = required(root, Self::ROOT, "ColorKey")?;
        let color_key = Color::parse_hex(key).ok_or_else(|| ManifestError::InvalidColor {
            attribute: "ColorKey",
            value: key.to_owned(),
        })?;
        let frames = root
            .children()
            .filter(|n| n.has_tag_name(Self::FRAME))
            .map(|node| read_rect(node, Self::FRAME).map(|rect| FrameRegion { rect }))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            texture: required(root, Self::ROOT, "Texture")?.to_owned(),
            color_key,
            frames,
        })
    }
}

macro_rules! xml_file_impls {
    ($($manifest:ty),+) => {$(
        impl Load for $manifest {
            fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
                let filepath = filepath.as_ref();
                let text = read_entire_string(filepath)?;
                Self::from_xml(&text).map_err(|source| Error::Manifest {
                    path: filepath.to_owned(),
                    source,
                })
            }
        }

        impl Save for $manifest {
            fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
                write_entire_file(filepath, self.to_xml().as_bytes())
            }
        }
    )+};
}

xml_file_impls!(TextureFontManifest, SpriteSheetManifest);

fn rect_attributes(rect: Rect) -> String {
    format!(
        "X=\"{}\" Y=\"{}\" Width=\"{}\" Height=\"{}\"",
        rect.x, rect.y, rect.width, rect.height,
    )
}

fn read_rect(node: Node, element: &'static str) -> std::result::Result<Rect, ManifestError> {
    Ok(Rect::new(
        number(node, element, "X")?,
        number(node, element, "Y")?,
        number(node, element, "Width")?,
        number(node, element, "Height")?,
    ))
}

fn expect_root<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    expected: &'static str,
) -> std::result::Result<Node<'a, 'input>, ManifestError> {
    let root = doc.root_element();
    if root.has_tag_name(expected) {
        Ok(root)
    } else {
        Err(ManifestError::UnexpectedRoot {
            expected,
            found: root.tag_name().name().to_owned(),
        })
    }
}

fn required<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> std::result::Result<&'a str, ManifestError> {
    node.attribute(attribute)
        .ok_or(ManifestError::MissingAttribute { element, attribute })
}

fn number<T: FromStr>(
    node: Node,
    element: &'static str,
    attribute: &'static str,
) -> std::result::Result<T, ManifestError> {
    let value = required(node, element, attribute)?;
    value.trim().parse().map_err(|_| ManifestError::InvalidNumber {
        attribute,
        value: value.to_owned(),
    })
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // literal whitespace in attributes is normalized away by readers
            '\t' | '\n' | '\r' => out.push_str(&format!("&#{};", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn font_manifest() -> TextureFontManifest {
        TextureFontManifest {
            texture: "arial_16.png".to_owned(),
            background_color: Color::rgba(0x10, 0x20, 0x30, 0x00),
            font_name: "Arial".to_owned(),
            font_size: 16.0,
            character_spacing: 1,
            line_spacing: 18,
            characters: vec![
                AtlasManifestEntry { character: ' ', rect: Rect::new(0, 0, 5, 18) },
                AtlasManifestEntry { character: '"', rect: Rect::new(9, 0, 4, 18) },
                AtlasManifestEntry { character: '&', rect: Rect::new(17, 0, 9, 18) },
                AtlasManifestEntry { character: '<', rect: Rect::new(30, 0, 8, 18) },
                AtlasManifestEntry { character: 'é', rect: Rect::new(0, 22, 7, 18) },
            ],
        }
    }

    #[test]
    fn texture_font_xml_layout() {
        let xml = font_manifest().to_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(
            "<TextureFont Texture=\"arial_16.png\" BackgroundColor=\"10203000\" FontName=\"Arial\" \
             FontSize=\"16\" CharacterSpacing=\"1\" LineSpacing=\"18\">"
        ));
        assert!(xml.contains("<Character Value=\"&amp;\" X=\"17\" Y=\"0\" Width=\"9\" Height=\"18\" />"));
        assert!(xml.contains("<Character Value=\" \" X=\"0\""));
    }

    #[test]
    fn texture_font_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arial_16.xml");
        let manifest = font_manifest();
        manifest.save(&path).unwrap();
        assert_eq!(TextureFontManifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn sprite_sheet_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hero.xml");
        let manifest = SpriteSheetManifest {
            texture: "hero & friends.png".to_owned(),
            color_key: Color::MAGENTA,
            frames: vec![
                FrameRegion { rect: Rect::new(5, 5, 4, 4) },
                FrameRegion { rect: Rect::new(12, 1, 3, 9) },
            ],
        };
        manifest.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("ColorKey=\"FF00FFFF\""));
        assert!(text.contains("<Frame X=\"5\" Y=\"5\" Width=\"4\" Height=\"4\" />"));
        assert_eq!(SpriteSheetManifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn whitespace_characters_survive() {
        let mut manifest = font_manifest();
        manifest.characters = vec![
            AtlasManifestEntry { character: '\t', rect: Rect::new(0, 0, 1, 1) },
            AtlasManifestEntry { character: '\'', rect: Rect::new(1, 0, 1, 1) },
        ];
        let parsed = TextureFontManifest::from_xml(&manifest.to_xml()).unwrap();
        assert_eq!(parsed.characters, manifest.characters);
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            TextureFontManifest::from_xml("<TextureFont"),
            Err(ManifestError::Xml(_))
        ));
        assert!(matches!(
            TextureFontManifest::from_xml("<SpriteSheet Texture=\"a.png\" ColorKey=\"FF00FFFF\"/>"),
            Err(ManifestError::UnexpectedRoot { expected: "TextureFont", .. })
        ));
        assert!(matches!(
            SpriteSheetManifest::from_xml("<SpriteSheet Texture=\"a.png\"/>"),
            Err(ManifestError::MissingAttribute { attribute: "ColorKey", .. })
        ));
        assert!(matches!(
            SpriteSheetManifest::from_xml(
                "<SpriteSheet Texture=\"a.png\" ColorKey=\"FF00FFFF\"><Frame X=\"1\" Y=\"one\" Width=\"1\" Height=\"1\"/></SpriteSheet>"
            ),
            Err(ManifestError::InvalidNumber { attribute: "Y", .. })
        ));
        assert!(matches!(
            SpriteSheetManifest::from_xml("<SpriteSheet Texture=\"a.png\" ColorKey=\"magenta\"/>"),
            Err(ManifestError::InvalidColor { attribute: "ColorKey", .. })
        ));
        let two_chars = "<TextureFont Texture=\"f.png\" BackgroundColor=\"00000000\" FontName=\"F\" \
             FontSize=\"8\" CharacterSpacing=\"0\" LineSpacing=\"8\">\
             <Character Value=\"ab\" X=\"0\" Y=\"0\" Width=\"1\" Height=\"1\"/></TextureFont>";
        assert!(matches!(
            TextureFontManifest::from_xml(two_chars),
            Err(ManifestError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn load_names_the_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xml");
        std::fs::write(&path, "<SpriteSheet>").unwrap();
        let err = SpriteSheetManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
        assert!(err.to_string().contains("broken.xml"));
    }
}
