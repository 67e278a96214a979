//! Layout-preservation pipeline.
//!
//! Each source page is rasterized to a JPEG background, its text blocks are
//! translated individually, and the translations are stamped on top of the
//! background at the original block rectangles.
//!
//! Block translation is best effort: a block whose translation fails keeps
//! its source text so the rest of the page (and document) still completes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::fonts::resolve_font;
use crate::job::{EventSink, JobEvent, Phase};
use crate::pdf::{
    ComposedPage, LayoutComposer, PageRenderer, PdfDocument, PlacedBlock, TextExtractor,
};
use crate::translator::Translator;

/// The layout-preservation pipeline (rasterize → translate blocks → overlay).
pub struct LayoutPipeline {
    translator: Arc<dyn Translator>,
    config: AppConfig,
}

impl LayoutPipeline {
    pub fn new(translator: Arc<dyn Translator>, config: AppConfig) -> Self {
        Self { translator, config }
    }

    /// Run the pipeline and return the output PDF bytes.
    pub async fn run(&self, doc: &PdfDocument, events: &EventSink) -> Result<Vec<u8>> {
        let source = &self.config.source_lang;
        let target = &self.config.target_lang;
        let total = doc.page_count();

        events.send(JobEvent::Phase(Phase::Translating));
        info!(
            "Translating {} pages in place from '{}' to '{}'",
            total, source, target
        );

        let extractor = TextExtractor::new(doc);
        let renderer = PageRenderer::with_dpi(doc, self.config.layout.render_dpi);

        let mut pages = Vec::with_capacity(total);
        for page_num in 0..total {
            let (width, height) = doc.page_size(page_num)?;
            let background =
                renderer.render_page_background(page_num, self.config.layout.jpeg_quality)?;

            let mut blocks = Vec::new();
            for block in extractor.page_blocks(page_num)? {
                let text = match self
                    .translator
                    .translate(&block.text, source, target)
                    .await
                {
                    Ok(translated) => translated,
                    Err(e) => {
                        warn!(
                            "Block translation failed on page {} ({}); keeping source text",
                            page_num + 1,
                            e
                        );
                        block.text.clone()
                    }
                };
                blocks.push(PlacedBlock {
                    bbox: block.bbox,
                    text,
                });
            }

            debug!("Page {}: {} blocks", page_num + 1, blocks.len());
            pages.push(ComposedPage {
                width,
                height,
                background,
                blocks,
            });
            events.send(JobEvent::PageComposed {
                done: page_num + 1,
                total,
            });
        }

        events.send(JobEvent::Phase(Phase::Rendering));
        let resolved = resolve_font(target, &self.config.fonts.search_paths);
        if resolved.fallback_warning {
            events.send(JobEvent::FontFallback {
                target: target.clone(),
            });
        }

        let composer = LayoutComposer::new(&self.config.layout, &resolved.font);
        composer.compose(&pages)
    }
}
