//! Incremental construction of fresh output PDFs with lopdf.
//!
//! Both output renderers write pages into a new document: the page tree id
//! is reserved up front so page dictionaries can reference their parent,
//! and the tree and catalog are materialized when the document is finished.

use lopdf::{Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

pub(crate) struct OutputDoc {
    pub doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl OutputDoc {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    /// Append a page with the given dimensions (in points), content stream,
    /// and resources.
    pub fn add_page(
        &mut self,
        width: f32,
        height: f32,
        content: String,
        resources: lopdf::Dictionary,
    ) {
        let content_id = self
            .doc
            .add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));

        let page_id = self.doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
        ]));

        self.page_ids.push(page_id);
    }

    /// Write the page tree and catalog, then serialize the document.
    #[allow(clippy::cast_possible_wrap)] // Page counts fit in i64
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let pages_dict = lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to serialize PDF: {e}")))?;

        Ok(output)
    }
}
