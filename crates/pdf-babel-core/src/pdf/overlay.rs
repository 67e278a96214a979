//! Page composition for the layout-preservation pipeline.
//!
//! # Coordinate System
//!
//! PDF uses a bottom-left origin with Y increasing upward, while MuPDF
//! (used for extraction) uses a top-left origin with Y increasing downward.
//! Block positions convert as `pdf_y = page_height - mupdf_y`.
//!
//! # Composition Strategy
//!
//! Each output page is built fresh: the rasterized original page is drawn
//! as a full-page background image, then each translated block is drawn at
//! its original rectangle. Text is word-wrapped to the rectangle's width
//! but never fitted vertically; translations longer than the original
//! overflow the box.

use std::fmt::Write as _;

use lopdf::{Object, Stream};

use crate::config::LayoutConfig;
use crate::error::Result;

use super::builder::OutputDoc;
use super::font::{FONT_RESOURCE, PageFont};
use super::render::PageBackground;
use super::text::BoundingBox;

/// Line height as a multiple of font size.
const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Average character width as a fraction of font size, for wrapping.
const CHAR_WIDTH_FACTOR: f32 = 0.55;

/// Resource name for the background image on each page.
const BACKGROUND_RESOURCE: &str = "Ibg";

/// A text block with its (possibly fallen-back) translation, placed at the
/// original rectangle.
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub bbox: BoundingBox,
    pub text: String,
}

/// One fully prepared output page.
pub struct ComposedPage {
    /// Page width in points (same as the original page)
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Rasterization of the original page
    pub background: PageBackground,
    /// Translated blocks to draw over the background
    pub blocks: Vec<PlacedBlock>,
}

/// Builds the layout-preserving output document.
pub struct LayoutComposer<'a> {
    pub config: &'a LayoutConfig,
    pub font: &'a PageFont,
}

impl<'a> LayoutComposer<'a> {
    pub const fn new(config: &'a LayoutConfig, font: &'a PageFont) -> Self {
        Self { config, font }
    }

    /// Compose all pages into a single PDF.
    pub fn compose(&self, pages: &[ComposedPage]) -> Result<Vec<u8>> {
        let mut out = OutputDoc::new();

        // The font's width table covers every character we will draw.
        let sample: String = pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .map(|b| b.text.as_str())
            .collect();
        let font_id = self.font.add_to_document(&mut out.doc, &sample);

        for page in pages {
            let image_id = add_background_image(&mut out.doc, &page.background);

            let mut content = String::new();
            // Background image stretched to the full page
            let _ = writeln!(
                content,
                "q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ",
                page.width, page.height, BACKGROUND_RESOURCE
            );

            // Block text on top, in black
            content.push_str("0 0 0 rg\n");
            for block in &page.blocks {
                self.write_block(&mut content, block, page.height);
            }

            let resources = lopdf::Dictionary::from_iter([
                (
                    "XObject",
                    Object::Dictionary(lopdf::Dictionary::from_iter([(
                        BACKGROUND_RESOURCE,
                        Object::Reference(image_id),
                    )])),
                ),
                (
                    "Font",
                    Object::Dictionary(lopdf::Dictionary::from_iter([(
                        FONT_RESOURCE,
                        Object::Reference(font_id),
                    )])),
                ),
            ]);

            out.add_page(page.width, page.height, content, resources);
        }

        out.finish()
    }

    /// Draw one block at its original rectangle.
    fn write_block(&self, content: &mut String, block: &PlacedBlock, page_height: f32) {
        let font_size = self.config.block_font_size;
        let line_height = font_size * LINE_HEIGHT_FACTOR;

        let char_width = font_size * CHAR_WIDTH_FACTOR;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_chars = (block.bbox.width() / char_width).floor().max(1.0) as usize;
        let lines = word_wrap(&block.text, max_chars);

        // First baseline sits one font size below the block's top edge
        let text_x = block.bbox.x0;
        let text_start_y = page_height - block.bbox.y0 - font_size;

        for (j, line) in lines.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = text_start_y - (j as f32 * line_height);

            content.push_str("BT\n");
            let _ = writeln!(content, "/{FONT_RESOURCE} {font_size} Tf");
            let _ = writeln!(content, "{text_x} {y} Td");
            let _ = writeln!(content, "{} Tj", self.font.text_operand(line));
            content.push_str("ET\n");
        }
    }
}

/// Embed a JPEG background as an image XObject.
#[allow(clippy::cast_possible_wrap)] // Pixel dimensions fit in i64
fn add_background_image(doc: &mut lopdf::Document, background: &PageBackground) -> lopdf::ObjectId {
    let dict = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(background.width_px))),
        ("Height", Object::Integer(i64::from(background.height_px))),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        // JPEG data is already compressed
        ("Filter", Object::Name(b"DCTDecode".to_vec())),
    ]);

    let stream = Stream::new(dict, background.jpeg.clone()).with_compression(false);
    doc.add_object(Object::Stream(stream))
}

/// Word wrap text to fit within max_chars per line.
fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= max_chars {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_word_wrap_basic() {
        let lines = word_wrap("Hello world this is a test", 10);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Hello");
        assert_eq!(lines[1], "world this");
        assert_eq!(lines[2], "is a test");
    }

    #[test]
    fn test_word_wrap_empty() {
        let lines = word_wrap("", 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "");
    }

    #[test]
    fn test_word_wrap_long_word_overflows() {
        // A single word longer than the limit stays on one line
        let lines = word_wrap("antidisestablishmentarianism", 10);
        assert_eq!(lines.len(), 1);
    }

    fn one_pixel_background() -> PageBackground {
        // Minimal valid JPEG is overkill here; composition only stores the
        // bytes, so any payload works for structure tests.
        PageBackground {
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width_px: 1,
            height_px: 1,
        }
    }

    #[test]
    fn test_compose_produces_loadable_pdf() {
        let config = LayoutConfig::default();
        let font = PageFont::fallback();
        let composer = LayoutComposer::new(&config, &font);

        let pages = vec![
            ComposedPage {
                width: 612.0,
                height: 792.0,
                background: one_pixel_background(),
                blocks: vec![PlacedBlock {
                    bbox: BoundingBox::new(50.0, 50.0, 300.0, 80.0),
                    text: "First block".to_string(),
                }],
            },
            ComposedPage {
                width: 612.0,
                height: 792.0,
                background: one_pixel_background(),
                blocks: vec![],
            },
        ];

        let bytes = composer.compose(&pages).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_block_text_appears_in_content() {
        let config = LayoutConfig::default();
        let font = PageFont::fallback();
        let composer = LayoutComposer::new(&config, &font);

        let pages = vec![ComposedPage {
            width: 612.0,
            height: 792.0,
            background: one_pixel_background(),
            blocks: vec![PlacedBlock {
                bbox: BoundingBox::new(10.0, 10.0, 500.0, 40.0),
                text: "FindMeInTheStream".to_string(),
            }],
        }];

        let bytes = composer.compose(&pages).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages_map = doc.get_pages();
        let page_id = pages_map[&1];
        let content = doc.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("FindMeInTheStream"));
    }
}
