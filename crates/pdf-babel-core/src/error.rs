use thiserror::Error;

/// Unified error type for pdf-babel-core
///
/// Covers every fatal failure mode of the two pipelines:
/// - PDF operations (opening, extraction, rendering, composition, saving)
/// - Translation operations (requests, responses, exhausted retries)
/// - Font loading
/// - Configuration and I/O
///
/// Recoverable failures (language detection, per-block translation, missing
/// fonts) are handled where they occur and never surface as this type.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to extract text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    PdfTextExtraction { page: usize, reason: String },

    /// Failed to rasterize a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: usize, reason: String },

    /// Failed to compose an output PDF page
    #[error("failed to compose output PDF: {0}")]
    PdfCompose(String),

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation service request failed
    #[error("translation request failed: {0}")]
    TranslationRequest(String),

    /// Unparseable response from the translation service
    #[error("invalid translation response: {0}")]
    TranslationInvalidResponse(String),

    /// A chunk exhausted all retry attempts; the run is aborted
    #[error("translation of chunk {chunk} failed after {attempts} attempts: {reason}")]
    ChunkTranslation {
        /// 1-based chunk number, matching the progress logs
        chunk: usize,
        attempts: u32,
        reason: String,
    },

    // ==========================================================================
    // Font Errors
    // ==========================================================================
    /// Failed to read or parse a font file
    #[error("failed to load font: {0}")]
    FontLoad(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
