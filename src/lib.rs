//! arborxml - Streaming XML parsing with an arena DOM
//!
//! Layers:
//! - Decoding: BOM detection, UTF-8/UTF-16 input (StreamDecoder)
//! - Syntax: pull parser yielding markup events (SyntaxParser)
//! - Tree: arena-backed Document built from the event stream
//! - Output: stable serialization that round-trips through the parser
//!
//! ```
//! let doc = arborxml::parse(b"<greeting kind=\"warm\">hello</greeting>")?;
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.attribute(root, "kind"), Some("warm"));
//! assert_eq!(doc.text_content(root), "hello");
//! # Ok::<(), arborxml::ParseError>(())
//! ```

pub mod core;
pub mod dom;

pub use crate::core::encoding::{Encoding, StreamDecoder};
pub use crate::core::entities::{escape_text, TextBuffer};
pub use crate::core::names::is_name_char;
pub use crate::core::parser::{
    ParseError, ParseErrorKind, ParseState, SyntaxEvent, SyntaxParser, DEFAULT_PLANE_SIZE,
};
pub use crate::dom::{save, save_document, Children, Document, Node, NodeData, NodeId, NodeKind};

/// Parse a complete XML document from raw bytes.
pub fn parse(input: &[u8]) -> Result<Document, ParseError> {
    Document::parse(input)
}
