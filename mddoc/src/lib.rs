pub mod document;
pub mod parser;

pub use document::{CodeNode, Document, Node};
pub use parser::parse_document;
