//! Flow-reconstruction pipeline.
//!
//! Extract the whole document's text, detect the source language if asked,
//! translate in fixed-size chunks with retry, and render the reassembled
//! translation into a fresh paginated PDF.
//!
//! Chunk failure is fatal: once a chunk has exhausted its attempts the run
//! aborts and later chunks are never sent. This is the opposite of the
//! layout pipeline's per-block fallback, and the asymmetry is intentional.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::chunk::split_into_chunks;
use crate::config::{AppConfig, DETECTION_FALLBACK_LANG, Lang};
use crate::error::{Error, Result};
use crate::fonts::resolve_font;
use crate::job::{EventSink, JobEvent, Phase};
use crate::pdf::{FlowRenderer, PdfDocument, TextExtractor};
use crate::translator::Translator;

/// The flow-reconstruction pipeline (extract → detect → translate → render).
pub struct FlowPipeline {
    translator: Arc<dyn Translator>,
    config: AppConfig,
}

impl FlowPipeline {
    pub fn new(translator: Arc<dyn Translator>, config: AppConfig) -> Self {
        Self { translator, config }
    }

    /// Run the pipeline and return the output PDF bytes.
    pub async fn run(&self, doc: &PdfDocument, events: &EventSink) -> Result<Vec<u8>> {
        events.send(JobEvent::Phase(Phase::Extracting));
        let extractor = TextExtractor::new(doc);
        let text = extractor.document_text()?;

        let source = self.resolve_source_lang(&text, events).await;
        let target = &self.config.target_lang;

        events.send(JobEvent::Phase(Phase::Translating));
        let chunks = split_into_chunks(&text, self.config.translator.chunk_size);
        info!(
            "Translating {} chunks ({} chars) from '{}' to '{}'",
            chunks.len(),
            text.chars().count(),
            source,
            target
        );
        let translated = self
            .translate_chunks(&chunks, &source, target, events)
            .await?;
        let translated_text = translated.concat();

        events.send(JobEvent::Phase(Phase::Rendering));
        let resolved = resolve_font(target, &self.config.fonts.search_paths);
        if resolved.fallback_warning {
            events.send(JobEvent::FontFallback {
                target: target.clone(),
            });
        }

        let renderer = FlowRenderer::new(&self.config.flow, &resolved.font);
        renderer.render(&translated_text)
    }

    /// Determine the source language: take it from configuration unless it
    /// is "auto", in which case detect it from a bounded text sample.
    /// Detection is advisory: any failure falls back to the default.
    async fn resolve_source_lang(&self, text: &str, events: &EventSink) -> Lang {
        let source = if self.config.source_lang.is_auto() {
            events.send(JobEvent::Phase(Phase::Detecting));
            let sample: String = text
                .chars()
                .take(self.config.translator.detect_sample_chars)
                .collect();

            match self.translator.detect(&sample).await {
                Ok(lang) => {
                    info!("Detected source language '{}'", lang);
                    lang
                }
                Err(e) => {
                    warn!(
                        "Language detection failed ({e}); assuming '{DETECTION_FALLBACK_LANG}'"
                    );
                    Lang::new(DETECTION_FALLBACK_LANG)
                }
            }
        } else {
            self.config.source_lang.clone()
        };

        events.send(JobEvent::SourceResolved(source.clone()));
        source
    }

    /// Translate chunks strictly in order, one at a time.
    ///
    /// Each chunk gets up to `max_attempts` tries with a fixed backoff
    /// between tries; success is followed by a fixed pause before the next
    /// chunk to stay under the service's rate limit. The first chunk to
    /// exhaust its attempts aborts the whole run.
    pub async fn translate_chunks(
        &self,
        chunks: &[String],
        source: &Lang,
        target: &Lang,
        events: &EventSink,
    ) -> Result<Vec<String>> {
        let cfg = &self.config.translator;
        let backoff = Duration::from_secs(cfg.retry_backoff_secs);
        let pause = Duration::from_secs(cfg.chunk_delay_secs);

        let mut translated = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let mut result = None;
            let mut last_error = None;

            for attempt in 1..=cfg.max_attempts {
                if attempt > 1 {
                    tokio::time::sleep(backoff).await;
                }

                match self.translator.translate(chunk, source, target).await {
                    Ok(text) => {
                        result = Some(text);
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "Chunk {} failed (attempt {}/{}): {}",
                            i + 1,
                            attempt,
                            cfg.max_attempts,
                            e
                        );
                        last_error = Some(e);
                    }
                }
            }

            let Some(text) = result else {
                return Err(Error::ChunkTranslation {
                    chunk: i + 1,
                    attempts: cfg.max_attempts,
                    reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
                });
            };

            translated.push(text);
            events.send(JobEvent::ChunkTranslated {
                done: i + 1,
                total: chunks.len(),
            });

            // Courtesy pause between chunks
            tokio::time::sleep(pause).await;
        }

        Ok(translated)
    }
}
