use crate::config::Lang;
use crate::error::Result;
use async_trait::async_trait;

/// Information about a translator backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Whether this translator supports detection of the source language
    pub supports_detection: bool,
}

/// Trait for translation backends.
///
/// Backends perform exactly one attempt per call; retry and pacing policy
/// belongs to the pipelines, which differ on it (the flow pipeline retries
/// and aborts, the layout pipeline falls back per block).
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get information about this translator
    fn info(&self) -> TranslatorInfo;

    /// Get the translator name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate text from source language to target language
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;

    /// Detect the language of a text sample
    async fn detect(&self, sample: &str) -> Result<Lang>;
}
