mod builder;
mod document;
pub mod font;
mod page_index;
mod render;
mod text;

pub mod flow_render;
pub mod overlay;

pub use document::PdfDocument;
pub use flow_render::FlowRenderer;
pub use font::PageFont;
pub use overlay::{ComposedPage, LayoutComposer, PlacedBlock};
pub use page_index::PageIndex;
pub use render::{PageBackground, PageRenderer};
pub use text::{BoundingBox, TextBlock, TextExtractor};
