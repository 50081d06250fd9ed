//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. A node
//! is a block of tree links plus its payload; payloads are an enum, so
//! kind dispatch is a match instead of a vtable.

use std::collections::BTreeMap;

/// Compact node identifier (index into the arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Arena container holding the top-level nodes
    Document,
    /// Element node
    Element,
    /// Processing instruction
    Instruction,
    /// Decoded text content
    Text,
    /// CDATA section content, kept verbatim
    CharData,
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The container at arena slot 0
    Document,
    /// Element: tag name plus attributes in ascending name order
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
    },
    /// Processing instruction: target plus whitespace-delimited data tokens
    Instruction { target: String, data: Vec<String> },
    /// Decoded text content
    Text(String),
    /// CDATA section content
    CharData(String),
}

impl NodeData {
    /// Element payload with no attributes yet
    pub fn element(name: impl Into<String>) -> Self {
        NodeData::Element {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Instruction payload with no data tokens yet
    pub fn instruction(target: impl Into<String>) -> Self {
        NodeData::Instruction {
            target: target.into(),
            data: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeData::Text(content.into())
    }

    pub fn char_data(content: impl Into<String>) -> Self {
        NodeData::CharData(content.into())
    }

    /// Kind tag for this payload
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Instruction { .. } => NodeKind::Instruction,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CharData(_) => NodeKind::CharData,
        }
    }
}

/// A node in the arena: tree links plus payload
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None for the container and detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Node payload
    pub data: NodeData,
}

impl Node {
    /// Create a detached node around a payload
    pub fn new(data: NodeData) -> Self {
        Node {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    /// Check if this is a processing instruction
    #[inline]
    pub fn is_instruction(&self) -> bool {
        matches!(self.data, NodeData::Instruction { .. })
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Check if this is a CDATA node
    #[inline]
    pub fn is_char_data(&self) -> bool {
        matches!(self.data, NodeData::CharData(_))
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Element tag name or instruction target
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            NodeData::Instruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Text or CDATA content
    pub fn content(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(content) | NodeData::CharData(content) => Some(content),
            _ => None,
        }
    }
}
