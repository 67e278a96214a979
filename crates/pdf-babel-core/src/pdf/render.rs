use image::RgbImage;
use mupdf::{Colorspace, Matrix};

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::error::{Error, Result};

/// A rasterized page background, JPEG-encoded for embedding as an
/// image XObject.
#[derive(Debug, Clone)]
pub struct PageBackground {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Rasterizes PDF pages for use as layout-pipeline backgrounds.
pub struct PageRenderer<'a> {
    /// The PDF document to render
    pub doc: &'a PdfDocument,
    /// Scale factor relative to the page's point size
    pub scale: f32,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer rasterizing at the given resolution.
    /// PDF points are 1/72 inch, so scale = dpi / 72.
    pub fn with_dpi(doc: &'a PdfDocument, dpi: f32) -> Self {
        Self {
            doc,
            scale: dpi / 72.0,
        }
    }

    /// Render a page to an RGB image buffer
    pub fn render_page(&self, page_num: usize) -> Result<RgbImage> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc.load_page(page_index.into()).map_err(|e| Error::PdfRender {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        let matrix = Matrix::new_scale(self.scale, self.scale);

        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to render: {e}"),
            })?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        // mupdf may hand back RGB, RGBA, or grayscale depending on the page
        let n = pixmap.n() as usize;
        let mut rgb_pixels = Vec::with_capacity((img_width * img_height * 3) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => rgb_pixels.extend_from_slice(chunk),
                4 => rgb_pixels.extend_from_slice(&chunk[..3]),
                1 => {
                    rgb_pixels.push(chunk[0]);
                    rgb_pixels.push(chunk[0]);
                    rgb_pixels.push(chunk[0]);
                }
                _ => {
                    return Err(Error::PdfRender {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        RgbImage::from_raw(img_width, img_height, rgb_pixels).ok_or_else(|| Error::PdfRender {
            page: page_num,
            reason: "Failed to create image buffer".to_string(),
        })
    }

    /// Render a page to a JPEG-compressed background image
    pub fn render_page_background(&self, page_num: usize, quality: u8) -> Result<PageBackground> {
        let img = self.render_page(page_num)?;

        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
        img.write_with_encoder(encoder)
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to encode JPEG: {e}"),
            })?;

        Ok(PageBackground {
            jpeg,
            width_px: img.width(),
            height_px: img.height(),
        })
    }
}
