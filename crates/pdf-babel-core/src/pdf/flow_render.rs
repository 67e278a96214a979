//! Paginated flow rendering for the flow-reconstruction pipeline.
//!
//! The translated document text arrives as one string with embedded line
//! breaks. Lines are emitted top to bottom at a fixed line height; a new
//! page starts whenever the cursor would enter the bottom margin. Lines are
//! never word-wrapped; a line longer than the page width overflows the
//! right margin untreated.

use std::fmt::Write as _;

use crate::config::FlowConfig;
use crate::error::Result;

use super::builder::OutputDoc;
use super::font::{FONT_RESOURCE, PageFont};

/// Renders translated text into a fresh paginated PDF.
pub struct FlowRenderer<'a> {
    pub config: &'a FlowConfig,
    pub font: &'a PageFont,
}

/// A line positioned on a page: (baseline y in PDF coordinates, text).
type PageLines<'t> = Vec<(f32, &'t str)>;

impl<'a> FlowRenderer<'a> {
    pub const fn new(config: &'a FlowConfig, font: &'a PageFont) -> Self {
        Self { config, font }
    }

    /// Assign each input line a page and baseline position.
    ///
    /// Blank lines occupy vertical space but emit no text operator.
    fn paginate<'t>(&self, text: &'t str) -> Vec<PageLines<'t>> {
        let cfg = self.config;
        let top = cfg.page_height - cfg.margin;

        let mut pages: Vec<PageLines<'t>> = Vec::new();
        let mut current: PageLines<'t> = Vec::new();
        let mut cursor = top;

        for line in text.lines() {
            if cursor < cfg.margin + cfg.line_height {
                pages.push(std::mem::take(&mut current));
                cursor = top;
            }
            if !line.trim().is_empty() {
                current.push((cursor, line));
            }
            cursor -= cfg.line_height;
        }
        pages.push(current);

        pages
    }

    /// Render the text into PDF bytes.
    pub fn render(&self, text: &str) -> Result<Vec<u8>> {
        let cfg = self.config;
        let mut out = OutputDoc::new();
        let font_id = self.font.add_to_document(&mut out.doc, text);

        for page_lines in self.paginate(text) {
            let mut content = String::from("q\n0 0 0 rg\n");
            for &(y, line) in &page_lines {
                content.push_str("BT\n");
                let _ = writeln!(content, "/{} {} Tf", FONT_RESOURCE, cfg.font_size);
                let _ = writeln!(content, "{} {} Td", cfg.margin, y);
                let _ = writeln!(content, "{} Tj", self.font.text_operand(line));
                content.push_str("ET\n");
            }
            content.push_str("Q\n");

            let resources = lopdf::Dictionary::from_iter([(
                "Font",
                lopdf::Object::Dictionary(lopdf::Dictionary::from_iter([(
                    FONT_RESOURCE,
                    lopdf::Object::Reference(font_id),
                )])),
            )]);

            out.add_page(cfg.page_width, cfg.page_height, content, resources);
        }

        out.finish()
    }
}
