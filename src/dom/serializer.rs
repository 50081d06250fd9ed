//! XML Serialization - Writing documents back out
//!
//! Produces a stable textual form: attributes in ascending name order,
//! childless elements as `<name />`, CDATA content verbatim, and the
//! `xml` declaration in one canonical spelling regardless of what was
//! parsed. Output from [`save_document`] feeds back through the parser
//! unchanged.

use std::io;

use super::document::Document;
use super::node::{NodeData, NodeId};
use crate::core::entities::escape_text;

/// Serialize one node (and its subtree) into `out`.
fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeData::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in attributes {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(&escape_text(value));
                out.push('"');
            }
            if node.has_children() {
                out.push('>');
                for child in doc.children(id) {
                    write_node(doc, child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            } else {
                out.push_str(" />");
            }
        }
        NodeData::Instruction { target, data } => {
            if target.eq_ignore_ascii_case("xml") {
                out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
            } else {
                out.push_str("<?");
                out.push_str(target);
                for token in data {
                    out.push(' ');
                    out.push_str(token);
                }
                out.push_str("?>");
            }
        }
        NodeData::Text(content) => {
            out.push_str(&escape_text(content));
        }
        NodeData::CharData(content) => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
    }
}

/// Write one node's XML followed by a newline.
pub fn save<W: io::Write>(doc: &Document, id: NodeId, out: &mut W) -> io::Result<()> {
    let mut buffer = String::new();
    write_node(doc, id, &mut buffer);
    buffer.push('\n');
    out.write_all(buffer.as_bytes())
}

/// Write every top-level node of the document, one per line.
pub fn save_document<W: io::Write>(doc: &Document, out: &mut W) -> io::Result<()> {
    let mut buffer = String::new();
    for child in doc.children(doc.container()) {
        write_node(doc, child, &mut buffer);
        buffer.push('\n');
    }
    out.write_all(buffer.as_bytes())
}

impl Document {
    /// XML for one node and its subtree, without a trailing newline.
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_node(self, id, &mut out);
        out
    }

    /// XML for the whole document, one top-level node per line.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.container()) {
            write_node(self, child, &mut out);
            out.push('\n');
        }
        out
    }
}
