//! Fonts for text placed in output PDFs.
//!
//! Two cases:
//! - **Built-in** Type1 base fonts (Times-Roman, Helvetica): no font
//!   program is embedded, text is written as literal strings in
//!   StandardEncoding. Sufficient for Latin-script targets.
//! - **Embedded** TrueType fonts loaded from disk for non-Latin targets:
//!   a composite Type0/CIDFontType2 structure with Identity-H encoding,
//!   glyph widths built from the characters actually being rendered, and
//!   text written as hex glyph-ID strings.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use lopdf::{Document, Object, ObjectId, Stream};
use ttf_parser::Face;

use crate::error::{Error, Result};

/// Resource name under which output fonts are registered on every page.
pub const FONT_RESOURCE: &str = "FBabel";

/// The base font used whenever no external font is needed or available.
pub const FALLBACK_BASE_FONT: &str = "Times-Roman";

/// A font usable by the output renderers.
pub enum PageFont {
    /// A PDF base font referenced by name
    BuiltIn(&'static str),
    /// A TrueType font loaded from disk, embedded into the output
    Embedded(EmbeddedFont),
}

impl PageFont {
    pub fn fallback() -> Self {
        Self::BuiltIn(FALLBACK_BASE_FONT)
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Add this font to a document, returning the font object id to
    /// reference from page resources. `sample` must contain every character
    /// that will be rendered with the font (used to build glyph widths).
    pub fn add_to_document(&self, doc: &mut Document, sample: &str) -> ObjectId {
        match self {
            Self::BuiltIn(base) => doc.add_object(lopdf::Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(base.as_bytes().to_vec())),
            ])),
            Self::Embedded(font) => font.embed(doc, sample),
        }
    }

    /// Produce the operand of a `Tj` operator for one line of text:
    /// a literal string for built-in fonts, a hex glyph string for
    /// embedded fonts.
    pub fn text_operand(&self, line: &str) -> String {
        match self {
            Self::BuiltIn(_) => format!("({})", escape_pdf_literal(line)),
            Self::Embedded(font) => format!("<{}>", font.text_to_hex_glyphs(line)),
        }
    }
}

/// Escape a line for a PDF literal string in StandardEncoding.
///
/// Backslash and parentheses are escaped; Latin-1 characters above ASCII
/// become octal escapes; anything outside Latin-1 cannot be represented by
/// a non-embedded font and degrades to '?'.
fn escape_pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) <= 0xFF => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// A TrueType font loaded from disk for embedding in output PDFs.
pub struct EmbeddedFont {
    data: &'static [u8],
    face: Face<'static>,
}

impl EmbeddedFont {
    /// Load and parse a TrueType font file.
    ///
    /// The font data is leaked: at most one font is loaded per run and it
    /// is needed until the output is saved.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::FontLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let data: &'static [u8] = Vec::leak(bytes);
        let face = Face::parse(data, 0).map_err(|e| {
            Error::FontLoad(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Self { data, face })
    }

    /// Get the glyph ID for a character, falling back to .notdef (0).
    pub fn glyph_id(&self, c: char) -> u16 {
        self.face.glyph_index(c).map_or(0, |g| g.0)
    }

    fn glyph_width(&self, glyph_id: u16) -> u16 {
        self.face
            .glyph_hor_advance(ttf_parser::GlyphId(glyph_id))
            .unwrap_or(0)
    }

    /// Scale a font-unit width to PDF's 1000-unit text space.
    fn scale_width(&self, width: u16) -> i64 {
        let units_per_em = i64::from(self.face.units_per_em());
        (i64::from(width) * 1000) / units_per_em
    }

    /// Convert text to a hex string of glyph IDs for PDF content streams.
    /// Returns the hex string without angle brackets.
    pub fn text_to_hex_glyphs(&self, text: &str) -> String {
        text.chars().fold(String::new(), |mut acc, c| {
            let _ = write!(acc, "{:04X}", self.glyph_id(c));
            acc
        })
    }

    /// Embed the full Type0 font structure into a document.
    ///
    /// Returns the Type0 font object id. The widths array covers exactly
    /// the glyphs needed for `sample`, so short documents stay small.
    pub fn embed(&self, doc: &mut Document, sample: &str) -> ObjectId {
        let font_file_id = self.create_font_file(doc);
        let font_descriptor_id = self.create_font_descriptor(doc, font_file_id);
        let cid_font_id = self.create_cid_font(doc, font_descriptor_id, sample);
        let to_unicode_id = create_to_unicode_cmap(doc);
        create_type0_font(doc, cid_font_id, to_unicode_id)
    }

    /// Create the FontFile2 stream containing the raw TrueType data.
    #[allow(clippy::cast_possible_wrap)] // Font size always fits in i64
    fn create_font_file(&self, doc: &mut Document) -> ObjectId {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Length1", Object::Integer(self.data.len() as i64));

        let stream = Stream::new(dict, self.data.to_vec()).with_compression(true);
        doc.add_object(Object::Stream(stream))
    }

    fn create_font_descriptor(&self, doc: &mut Document, font_file_id: ObjectId) -> ObjectId {
        let bbox = self.face.global_bounding_box();

        let dict = lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(b"BabelEmbedded".to_vec())),
            ("Flags", Object::Integer(32)), // Nonsymbolic
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(i64::from(bbox.x_min)),
                    Object::Integer(i64::from(bbox.y_min)),
                    Object::Integer(i64::from(bbox.x_max)),
                    Object::Integer(i64::from(bbox.y_max)),
                ]),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(i64::from(self.face.ascender()))),
            ("Descent", Object::Integer(i64::from(self.face.descender()))),
            (
                "CapHeight",
                Object::Integer(i64::from(
                    self.face
                        .capital_height()
                        .unwrap_or_else(|| self.face.ascender()),
                )),
            ),
            ("StemV", Object::Integer(80)),
            ("FontFile2", Object::Reference(font_file_id)),
        ]);

        doc.add_object(Object::Dictionary(dict))
    }

    fn create_cid_font(
        &self,
        doc: &mut Document,
        font_descriptor_id: ObjectId,
        sample: &str,
    ) -> ObjectId {
        let widths_array = self.build_widths_array(sample);
        let default_width = self.scale_width(self.glyph_width(self.glyph_id(' ')));

        let dict = lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", Object::Name(b"BabelEmbedded".to_vec())),
            (
                "CIDSystemInfo",
                Object::Dictionary(lopdf::Dictionary::from_iter([
                    (
                        "Registry",
                        Object::String(b"Adobe".to_vec(), lopdf::StringFormat::Literal),
                    ),
                    (
                        "Ordering",
                        Object::String(b"Identity".to_vec(), lopdf::StringFormat::Literal),
                    ),
                    ("Supplement", Object::Integer(0)),
                ])),
            ),
            ("FontDescriptor", Object::Reference(font_descriptor_id)),
            ("DW", Object::Integer(default_width)),
            ("W", Object::Array(widths_array)),
            ("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
        ]);

        doc.add_object(Object::Dictionary(dict))
    }

    /// Build the W (widths) array for the glyphs `sample` uses.
    /// Format: `gid [w1 w2 ...]` runs for consecutive glyph IDs.
    fn build_widths_array(&self, sample: &str) -> Vec<Object> {
        let mut gid_widths: BTreeMap<u16, i64> = BTreeMap::new();

        // Space is always included; renderers insert it when wrapping.
        for c in sample.chars().chain(std::iter::once(' ')) {
            let gid = self.glyph_id(c);
            if gid != 0 {
                gid_widths.insert(gid, self.scale_width(self.glyph_width(gid)));
            }
        }

        let mut result = Vec::new();
        let mut iter = gid_widths.iter().peekable();

        while let Some((&first_gid, &first_width)) = iter.next() {
            let mut widths = vec![Object::Integer(first_width)];
            let mut expected_next = first_gid + 1;

            while let Some(&(&gid, &width)) = iter.peek() {
                if gid == expected_next {
                    widths.push(Object::Integer(width));
                    expected_next += 1;
                    iter.next();
                } else {
                    break;
                }
            }

            result.push(Object::Integer(i64::from(first_gid)));
            result.push(Object::Array(widths));
        }

        result
    }
}

/// A ToUnicode CMap mapping glyph IDs identically to Unicode, for
/// copy/paste support.
fn create_to_unicode_cmap(doc: &mut Document) -> ObjectId {
    let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
  /Registry (Adobe)
  /Ordering (UCS)
  /Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0000> <FFFF> <0000>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    let stream = Stream::new(lopdf::Dictionary::new(), cmap.to_vec());
    doc.add_object(Object::Stream(stream))
}

fn create_type0_font(doc: &mut Document, cid_font_id: ObjectId, to_unicode_id: ObjectId) -> ObjectId {
    let dict = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type0".to_vec())),
        ("BaseFont", Object::Name(b"BabelEmbedded".to_vec())),
        ("Encoding", Object::Name(b"Identity-H".to_vec())),
        (
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        ),
        ("ToUnicode", Object::Reference(to_unicode_id)),
    ]);

    doc.add_object(Object::Dictionary(dict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_ascii() {
        assert_eq!(escape_pdf_literal("Hello"), "Hello");
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_pdf_literal("a(b)c\\d"), "a\\(b\\)c\\\\d");
    }

    #[test]
    fn test_escape_latin1_as_octal() {
        assert_eq!(escape_pdf_literal("é"), "\\351");
    }

    #[test]
    fn test_escape_non_latin_degrades() {
        assert_eq!(escape_pdf_literal("日"), "?");
    }

    #[test]
    fn test_builtin_text_operand() {
        let font = PageFont::fallback();
        assert_eq!(font.text_operand("Hi (there)"), "(Hi \\(there\\))");
    }
}
