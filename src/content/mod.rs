//! Content module - post documents, structured text and reading time

mod post;
pub mod reading;
mod richtext;

pub use post::{Banner, Document, PostData, Section};
pub use reading::estimate_read_time;
pub use richtext::{Block, HtmlSerializer, RichText, RichTextRenderer, Span};
