//! Page index newtype for safe conversion between usize and i32.
//!
//! mupdf addresses pages with i32 while the rest of the crate uses usize;
//! this wrapper centralizes the checked conversion.

use std::fmt;

use crate::error::Error;

/// A page index that can be safely handed to mupdf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    #[must_use]
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Try to create a PageIndex from a usize page number.
    ///
    /// Returns an error if the page number exceeds the document's page count
    /// or is too large to fit in an i32.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
