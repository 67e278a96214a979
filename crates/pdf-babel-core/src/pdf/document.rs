use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};
use super::page_index::PageIndex;

/// Thread-safe handle to an input PDF document.
///
/// mupdf document handles are not `Send`, so this type keeps only the raw
/// bytes and opens a fresh handle per operation. Cloning is O(1).
pub struct PdfDocument {
    bytes: Arc<Vec<u8>>,
    page_count: usize,
}

impl PdfDocument {
    /// Open a PDF from bytes.
    ///
    /// A corrupt or unreadable document fails here, before any pipeline
    /// work starts; there is no per-page recovery later.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!(
                "Failed to read file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_bytes(bytes)
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get raw PDF bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get a page's dimensions in PDF points (width, height).
    pub fn page_size(&self, page_num: usize) -> Result<(f32, f32)> {
        let page_index = PageIndex::try_from_page_num(page_num, self.page_count)?;

        let doc = self.open_document()?;
        let page = doc.load_page(page_index.into()).map_err(|e| Error::PdfRender {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        let bounds = page.bounds().map_err(|e| Error::PdfRender {
            page: page_num,
            reason: format!("Failed to get bounds: {e}"),
        })?;

        Ok((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    /// Open the document for operations (creates a temporary handle)
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))
    }
}

impl Clone for PdfDocument {
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
