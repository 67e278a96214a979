use mupdf::TextPageOptions;

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::error::{Error, Result};

/// A text block extracted from a PDF page with its bounding box.
///
/// Blocks are produced in reading order and are immutable once extracted;
/// the layout pipeline replaces the text while keeping the rectangle.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// The text content
    pub text: String,
    /// Bounding box in MuPDF (top-left origin) coordinates
    pub bbox: BoundingBox,
}

/// Bounding box: (x0, y0, x1, y1), top-left origin, y grows downward
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Create from mupdf Quad (4 points defining a quadrilateral)
    pub const fn from_quad(quad: &mupdf::Quad) -> Self {
        let x0 = quad.ul.x.min(quad.ur.x).min(quad.ll.x).min(quad.lr.x);
        let y0 = quad.ul.y.min(quad.ur.y).min(quad.ll.y).min(quad.lr.y);
        let x1 = quad.ul.x.max(quad.ur.x).max(quad.ll.x).max(quad.lr.x);
        let y1 = quad.ul.y.max(quad.ur.y).max(quad.ll.y).max(quad.lr.y);
        Self { x0, y0, x1, y1 }
    }

    fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Text extraction from PDF pages
pub struct TextExtractor<'a> {
    /// The PDF document to extract text from
    pub doc: &'a PdfDocument,
}

impl<'a> TextExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self { doc }
    }

    /// Lazily extract plain text page by page, in page order.
    ///
    /// Each item is the text of one page; pages are only loaded as the
    /// iterator advances.
    pub fn page_texts(&self) -> impl Iterator<Item = Result<String>> + '_ {
        (0..self.doc.page_count()).map(|page_num| self.page_text(page_num))
    }

    /// Extract the whole document's text for the flow pipeline.
    ///
    /// Pages are separated by a blank line so paragraph breaks survive the
    /// round trip through the translation service, roughly.
    pub fn document_text(&self) -> Result<String> {
        let mut text = String::new();
        for page_text in self.page_texts() {
            text.push_str(&page_text?);
            text.push_str("\n\n");
        }
        Ok(text)
    }

    /// Get plain text from a single page
    pub fn page_text(&self, page_num: usize) -> Result<String> {
        let text_page = self.load_text_page(page_num)?;

        let mut all_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        all_text.push(c);
                    }
                }
                all_text.push('\n');
            }
        }

        Ok(all_text)
    }

    /// Extract text blocks with bounding boxes from a page, in reading order.
    ///
    /// Each mupdf block roughly corresponds to a paragraph. Lines within a
    /// block are joined with a space; a trailing hyphen at a line break is
    /// removed so the word is whole before translation.
    pub fn page_blocks(&self, page_num: usize) -> Result<Vec<TextBlock>> {
        let text_page = self.load_text_page(page_num)?;

        let mut blocks = Vec::new();

        for block in text_page.blocks() {
            let mut block_text = String::new();
            let mut block_bbox: Option<BoundingBox> = None;

            for line in block.lines() {
                let mut line_text = String::new();

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        line_text.push(c);
                    }

                    let char_bbox = BoundingBox::from_quad(&text_char.quad());
                    block_bbox = Some(block_bbox.map_or(char_bbox, |b| b.union(char_bbox)));
                }

                let line_trimmed = line_text.trim();
                if line_trimmed.is_empty() {
                    continue;
                }

                if block_text.ends_with('-') {
                    // Dehyphenate across the line break
                    block_text.pop();
                } else if !block_text.is_empty() {
                    block_text.push(' ');
                }
                block_text.push_str(line_trimmed);
            }

            let text = block_text.trim().to_string();
            if text.is_empty() {
                continue;
            }

            if let Some(bbox) = block_bbox {
                blocks.push(TextBlock { text, bbox });
            }
        }

        Ok(blocks)
    }

    fn load_text_page(&self, page_num: usize) -> Result<mupdf::TextPage> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_num,
                reason: format!("Failed to load page: {e}"),
            })?;

        page.to_text_page(TextPageOptions::empty())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_num,
                reason: format!("Failed to get text page: {e}"),
            })
    }
}
