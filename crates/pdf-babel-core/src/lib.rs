//! PDF Babel Core Library
//!
//! This library provides the core functionality for translating PDF documents:
//! - PDF text extraction, rasterization and rendering
//! - Translation via the Google web translation endpoint
//! - Flow reconstruction: reflow the full translated text into a fresh PDF
//! - Layout preservation: overlay translated blocks on rasterized pages

pub mod chunk;
pub mod config;
pub mod error;
pub mod flow;
pub mod fonts;
pub mod job;
pub mod layout;
pub mod pdf;
pub mod translator;
pub mod util;

pub use chunk::split_into_chunks;
pub use config::{
    AppConfig, FlowConfig, FontConfig, Lang, LayoutConfig, TranslatorConfig,
    DETECTION_FALLBACK_LANG,
};
pub use error::{Error, Result};
pub use flow::FlowPipeline;
pub use fonts::{resolve_font, ResolvedFont};
pub use job::{spawn_flow_job, spawn_layout_job, EventSink, JobEvent, Phase};
pub use layout::LayoutPipeline;
pub use pdf::{BoundingBox, PdfDocument, TextBlock, TextExtractor};
pub use translator::{create_translator, GoogleWebTranslator, Translator};

use std::sync::Arc;

/// High-level entry point combining translator, configuration and pipelines.
pub struct PdfBabel {
    translator: Arc<dyn Translator>,
    config: AppConfig,
}

impl PdfBabel {
    /// Create a translator from the configuration and wire it up.
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator = create_translator(&config.translator)?;
        Ok(Self { translator, config })
    }

    /// Create with a custom translator backend.
    pub fn with_translator(translator: Arc<dyn Translator>, config: AppConfig) -> Self {
        Self { translator, config }
    }

    /// Translate the whole document as reflowed text (flow reconstruction).
    pub async fn translate_flow(&self, doc: &PdfDocument, events: &EventSink) -> Result<Vec<u8>> {
        self.flow_pipeline().run(doc, events).await
    }

    /// Translate the document page by page in place (layout preservation).
    pub async fn translate_layout(&self, doc: &PdfDocument, events: &EventSink) -> Result<Vec<u8>> {
        self.layout_pipeline().run(doc, events).await
    }

    /// Build a flow pipeline for background execution via [`spawn_flow_job`].
    pub fn flow_pipeline(&self) -> FlowPipeline {
        FlowPipeline::new(Arc::clone(&self.translator), self.config.clone())
    }

    /// Build a layout pipeline for background execution via [`spawn_layout_job`].
    pub fn layout_pipeline(&self) -> LayoutPipeline {
        LayoutPipeline::new(Arc::clone(&self.translator), self.config.clone())
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source_lang.as_str(), "auto");
        assert_eq!(config.target_lang.as_str(), "en");
    }
}
