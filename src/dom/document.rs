//! XML Document - Arena-based DOM representation
//!
//! Every node of a document lives in one Vec; NodeIds are indices into it.
//! Slot 0 is the container that holds the top-level nodes (processing
//! instructions and the root element). Tree surgery rewires link fields;
//! slots are never reclaimed while the document lives.

use super::node::{Node, NodeData, NodeId, NodeKind};
use crate::core::parser::{ParseError, ParseErrorKind, SyntaxEvent, SyntaxParser};

/// Instruction targets kept in the tree; any other instruction is parsed
/// but dropped along with its data.
const RETAINED_TARGETS: [&str; 3] = ["xml", "acrobat", "originalXFAVersion"];

/// Characters allowed in top-level text between markup.
#[inline]
fn is_ignorable_root_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t' | '\0')
}

/// Name part after any namespace prefix.
fn local_part(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Iterator over the children of one node, in document order.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.get(id).and_then(|node| node.next_sibling);
        Some(id)
    }
}

/// An XML document: node arena plus the container at slot 0.
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    /// Empty document holding only the container.
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The container node id (always arena slot 0).
    #[inline]
    pub fn container(&self) -> NodeId {
        0
    }

    /// Number of arena slots, container included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Parse a complete document from raw bytes.
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        Document::from_parser(SyntaxParser::from_bytes(input))
    }

    /// Drive a syntax parser to completion and build the tree.
    ///
    /// Fails on the first syntax error, on non-whitespace text outside the
    /// root element, on a close tag naming the wrong element, and on input
    /// that ends with elements still open (unless it ended inside a CDATA
    /// section, whose collected content is kept).
    pub fn from_parser(mut parser: SyntaxParser<'_>) -> Result<Self, ParseError> {
        let mut doc = Document::new();
        let container = doc.container();
        let mut parent = container;
        // Some(Some(id)): inside a retained instruction;
        // Some(None): inside a dropped one, swallowing its events
        let mut instruction: Option<Option<NodeId>> = None;
        let mut pending_attr: Option<String> = None;

        loop {
            match parser.next_event()? {
                SyntaxEvent::ElementOpen
                | SyntaxEvent::ElementBreak
                | SyntaxEvent::InstructionOpen => {}
                SyntaxEvent::TagName(name) => {
                    let element = doc.create_node(NodeData::element(name));
                    doc.append_child(parent, element);
                    parent = element;
                }
                SyntaxEvent::ElementClose(name) => {
                    if parent == container {
                        return Err(ParseError::new(
                            ParseErrorKind::StructuralViolation,
                            parser.position(),
                        ));
                    }
                    // An empty close name (`/>`, `</>`) matches whatever
                    // element is open
                    if !name.is_empty() && doc.element_name(parent) != Some(name.as_str()) {
                        return Err(ParseError::new(
                            ParseErrorKind::MismatchedClose,
                            parser.position(),
                        ));
                    }
                    parent = doc.parent(parent).unwrap_or(container);
                }
                SyntaxEvent::TargetName(target) => {
                    if RETAINED_TARGETS.contains(&target.as_str()) {
                        let node = doc.create_node(NodeData::instruction(target));
                        doc.append_child(parent, node);
                        instruction = Some(Some(node));
                    } else {
                        instruction = Some(None);
                    }
                }
                SyntaxEvent::TargetData(token) => {
                    if let Some(Some(node)) = instruction {
                        doc.append_instruction_data(node, token);
                    }
                }
                SyntaxEvent::InstructionClose => {
                    instruction = None;
                }
                SyntaxEvent::AttrName(name) => {
                    // Instructions keep data tokens only, never attributes
                    if instruction.is_none() {
                        pending_attr = Some(name);
                    }
                }
                SyntaxEvent::AttrValue(value) => {
                    if instruction.is_none() {
                        if let Some(name) = pending_attr.take() {
                            doc.set_attribute(parent, name, value);
                        }
                    }
                }
                SyntaxEvent::Text(text) => {
                    if parent == container {
                        if !text.chars().all(is_ignorable_root_char) {
                            return Err(ParseError::new(
                                ParseErrorKind::StructuralViolation,
                                parser.position(),
                            ));
                        }
                        // Whitespace between top-level nodes is dropped
                    } else {
                        let node = doc.create_node(NodeData::text(text));
                        doc.append_child(parent, node);
                    }
                }
                SyntaxEvent::CData(content) => {
                    let node = doc.create_node(NodeData::char_data(content));
                    doc.append_child(parent, node);
                }
                SyntaxEvent::EndOfInput => {
                    if parent != container && !parser.eof_in_cdata() {
                        return Err(ParseError::new(
                            ParseErrorKind::UnterminatedConstruct,
                            parser.position(),
                        ));
                    }
                    return Ok(doc);
                }
            }
        }
    }

    /// Get a node by id.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Get a node mutably by id.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    /// Allocate a detached node, returning its id.
    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(data));
        id
    }

    /// Unlink `id` from its parent and siblings, leaving it detached.
    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id as usize];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => self.nodes[prev as usize].next_sibling = next,
            None => self.nodes[parent as usize].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next as usize].prev_sibling = prev,
            None => self.nodes[parent as usize].last_child = prev,
        }
        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Link an already-detached `child` as `parent`'s last child.
    fn attach_last(&mut self, parent: NodeId, child: NodeId) {
        match self.nodes[parent as usize].last_child {
            Some(last) => {
                self.nodes[last as usize].next_sibling = Some(child);
                self.nodes[child as usize].prev_sibling = Some(last);
            }
            None => {
                self.nodes[parent as usize].first_child = Some(child);
            }
        }
        self.nodes[parent as usize].last_child = Some(child);
        self.nodes[child as usize].parent = Some(parent);
    }

    fn can_attach(&self, parent: NodeId, child: NodeId) -> bool {
        parent != child
            && self.get(parent).is_some()
            && self
                .get(child)
                .is_some_and(|node| node.kind() != NodeKind::Document)
    }

    /// Append `child` as the last child of `parent`, relinking it away
    /// from any current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_attach(parent, child) {
            return;
        }
        self.detach(child);
        self.attach_last(parent, child);
    }

    /// Insert `child` so it lands at `index` among `parent`'s children.
    /// The index is clamped to the current child count; an attached child
    /// is relinked first.
    pub fn insert_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.can_attach(parent, child) {
            return;
        }
        self.detach(child);

        let mut at = self.nodes[parent as usize].first_child;
        let mut i = 0;
        while let Some(existing) = at {
            if i == index {
                break;
            }
            at = self.nodes[existing as usize].next_sibling;
            i += 1;
        }
        let Some(before) = at else {
            self.attach_last(parent, child);
            return;
        };

        let prev = self.nodes[before as usize].prev_sibling;
        self.nodes[child as usize].prev_sibling = prev;
        self.nodes[child as usize].next_sibling = Some(before);
        self.nodes[before as usize].prev_sibling = Some(child);
        match prev {
            Some(prev) => self.nodes[prev as usize].next_sibling = Some(child),
            None => self.nodes[parent as usize].first_child = Some(child),
        }
        self.nodes[child as usize].parent = Some(parent);
    }

    /// Detach `child` if it is currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(child).is_some_and(|node| node.parent == Some(parent)) {
            self.detach(child);
        }
    }

    /// Detach all children of `parent`. The nodes stay in the arena.
    pub fn clear_children(&mut self, parent: NodeId) {
        while let Some(child) = self.first_child(parent) {
            self.detach(child);
        }
    }

    /// Shallow clone of a node, returning the detached copy's id.
    ///
    /// An element copy keeps the name and attributes, and the content of
    /// all direct Text and CDATA children collapses into at most one Text
    /// child. Other kinds are plain copies. The container cannot be
    /// cloned.
    pub fn clone_node(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.get(id)?.data.clone();
        match data {
            NodeData::Document => None,
            NodeData::Element { name, attributes } => {
                let merged = self.text_content(id);
                let clone = self.create_node(NodeData::Element { name, attributes });
                if !merged.is_empty() {
                    let text = self.create_node(NodeData::Text(merged));
                    self.append_child(clone, text);
                }
                Some(clone)
            }
            other => Some(self.create_node(other)),
        }
    }

    /// Deep clone of a node and everything under it.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.get(id)?.data.clone();
        if matches!(data, NodeData::Document) {
            return None;
        }
        let clone = self.create_node(data);
        let mut child = self.first_child(id);
        while let Some(child_id) = child {
            if let Some(child_clone) = self.clone_subtree(child_id) {
                self.append_child(clone, child_clone);
            }
            child = self.next_sibling(child_id);
        }
        Some(clone)
    }

    /// Move every node of `other` into this arena.
    ///
    /// Returns the new id of `other`'s container, which is also the offset
    /// to add to any of `other`'s old ids to get its id here. `other` is
    /// consumed; its subtrees arrive with links intact and can be attached
    /// anywhere.
    pub fn merge_arena(&mut self, other: Document) -> NodeId {
        let offset = self.nodes.len() as NodeId;
        let rebase = |link: Option<NodeId>| link.map(|id| id + offset);
        for mut node in other.nodes {
            node.parent = rebase(node.parent);
            node.first_child = rebase(node.first_child);
            node.last_child = rebase(node.last_child);
            node.prev_sibling = rebase(node.prev_sibling);
            node.next_sibling = rebase(node.next_sibling);
            self.nodes.push(node);
        }
        offset
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling
    }

    /// Topmost ancestor of `id` (the container for attached nodes, the
    /// node itself when detached).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// First element child of the container.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.container())
            .find(|id| self.nodes[*id as usize].is_element())
    }

    /// First element child with exactly this tag name.
    pub fn first_child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nth_child_named(parent, name, 0)
    }

    /// Zero-indexed nth element child with exactly this tag name.
    pub fn nth_child_named(&self, parent: NodeId, name: &str, index: usize) -> Option<NodeId> {
        let mut remaining = index;
        for child in self.children(parent) {
            if let NodeData::Element { name: tag, .. } = &self.nodes[child as usize].data {
                if tag == name {
                    if remaining == 0 {
                        return Some(child);
                    }
                    remaining -= 1;
                }
            }
        }
        None
    }

    pub fn count_children(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index)
    }

    /// Concatenated content of the direct Text and CDATA children.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            if let NodeData::Text(content) | NodeData::CharData(content) =
                &self.nodes[child as usize].data
            {
                out.push_str(content);
            }
        }
        out
    }

    fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attribute value on an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute on an element; replaces any existing value.
    /// Ignored for other node kinds.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            if let NodeData::Element { attributes, .. } = &mut node.data {
                attributes.insert(name.into(), value.into());
            }
        }
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.get_mut(id)?.data {
            NodeData::Element { attributes, .. } => attributes.remove(name),
            _ => None,
        }
    }

    /// Attributes in ascending name order (empty for non-elements).
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        let map = match self.get(id).map(|node| &node.data) {
            Some(NodeData::Element { attributes, .. }) => Some(attributes),
            _ => None,
        };
        map.into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Append one data token to an instruction. Ignored for other kinds.
    pub fn append_instruction_data(&mut self, id: NodeId, token: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            if let NodeData::Instruction { data, .. } = &mut node.data {
                data.push(token.into());
            }
        }
    }

    /// Data tokens of an instruction (empty for other kinds).
    pub fn instruction_data(&self, id: NodeId) -> &[String] {
        match self.get(id).map(|node| &node.data) {
            Some(NodeData::Instruction { data, .. }) => data,
            _ => &[],
        }
    }

    /// Tag name local part (after any namespace prefix). Elements only.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element_name(id).map(local_part)
    }

    /// Namespace prefix of the tag name, if it has one. Elements only.
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.element_name(id)?
            .split_once(':')
            .map(|(prefix, _)| prefix)
    }

    /// Resolve the element's namespace URI from its own or the nearest
    /// ancestor's `xmlns` / `xmlns:prefix` attribute. The walk stops at
    /// the first non-element ancestor.
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.element_name(id)?;
        let attr_name = match self.prefix(id) {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if !node.is_element() {
                break;
            }
            if let Some(value) = self.attribute(node_id, &attr_name) {
                return Some(value);
            }
            current = node.parent;
        }
        None
    }

    /// Look a node up by a `/`-separated path of element names, starting
    /// from `from`.
    ///
    /// An empty segment jumps to the topmost ancestor, `..` to the parent
    /// and `.` stays put; any other segment descends into the first
    /// element child whose qualified (or, with `qualified` false, local)
    /// name matches and under which the rest of the path resolves, trying
    /// later matching siblings when it does not.
    pub fn node_by_path(&self, from: NodeId, path: &str, qualified: bool) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        let (segment, rest) = match path.split_once('/') {
            Some((segment, rest)) => (segment, if rest.is_empty() { None } else { Some(rest) }),
            None => (path, None),
        };

        let found = if segment.is_empty() {
            Some(self.root_of(from))
        } else if segment == ".." {
            self.parent(from)
        } else if segment == "." {
            Some(from)
        } else {
            for child in self.children(from) {
                if let NodeData::Element { name, .. } = &self.nodes[child as usize].data {
                    let tag = if qualified { name.as_str() } else { local_part(name) };
                    if tag == segment {
                        let hit = match rest {
                            None => Some(child),
                            Some(rest) => self.node_by_path(child, rest, qualified),
                        };
                        if hit.is_some() {
                            return hit;
                        }
                    }
                }
            }
            None
        };

        match (found, rest) {
            (Some(found), Some(rest)) => self.node_by_path(found, rest, qualified),
            (found, _) => found,
        }
    }
}
