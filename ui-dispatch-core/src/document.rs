//! Arena-backed UI tree that interactions are resolved against
//!
//! The dispatch core never owns the host's view of the page; it works on this
//! small document model instead. Nodes are addressed by [`NodeId`], a plain
//! index that is only meaningful for the document that produced it.
//!
//! # Example
//!
//! ```
//! use ui_dispatch_core::document::{Document, ElementSpec};
//!
//! let mut doc = Document::new();
//! let banner = doc
//!     .insert(
//!         doc.root(),
//!         ElementSpec::new("div")
//!             .id("banner-1")
//!             .child(
//!                 ElementSpec::new("button")
//!                     .attr("data-action", "dismiss-by-id")
//!                     .attr("data-target-id", "banner-1")
//!                     .text("Close"),
//!             ),
//!     )
//!     .unwrap();
//!
//! assert_eq!(doc.element_by_id("banner-1"), Some(banner));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Runtime state bits that are not expressed as attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Removed from view (e.g. a dismissed banner)
        const HIDDEN = 1 << 0;
        /// Not interactive
        const DISABLED = 1 << 1;
    }
}

/// Element or text payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text(String),
}

/// A single node of the UI tree
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    flags: NodeFlags,
}

impl Node {
    fn element(tag: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::Element { tag: tag.into() },
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            flags: NodeFlags::empty(),
        }
    }

    fn text(content: impl Into<String>, parent: NodeId) -> Self {
        Self {
            kind: NodeKind::Text(content.into()),
            parent: Some(parent),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            flags: NodeFlags::empty(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Tag name, or `None` for text nodes
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `id` attribute
    pub fn element_id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// The `role` attribute
    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    /// Whether the whitespace-separated `class` attribute contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN)
    }

    /// Disabled through flags, a `disabled` attribute or `aria-disabled="true"`
    pub fn is_disabled(&self) -> bool {
        self.flags.contains(NodeFlags::DISABLED)
            || self.has_attr("disabled")
            || self.attr("aria-disabled") == Some("true")
    }

    /// Short selector-like description used in traces, e.g. `button#go.card`
    pub fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Text(_) => "#text".to_string(),
            NodeKind::Element { tag } => {
                let mut out = tag.clone();
                if let Some(id) = self.element_id() {
                    out.push('#');
                    out.push_str(id);
                }
                if let Some(classes) = self.attr("class") {
                    for class in classes.split_whitespace() {
                        out.push('.');
                        out.push_str(class);
                    }
                }
                out
            }
        }
    }
}

/// Declarative description of an element subtree
///
/// Deserializable so that whole pages can be described in JSON:
///
/// ```json
/// { "tag": "button", "attributes": { "data-action": "page-reload" }, "text": "Reload" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append a class to the `class` attribute
    pub fn class(mut self, class: &str) -> Self {
        let classes = self.attributes.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    pub fn role(self, role: impl Into<String>) -> Self {
        self.attr("role", role)
    }

    /// Set the leading text child
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// The UI tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    ids: HashMap<String, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only a `body` root element
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::element("body", None)],
            ids: HashMap::new(),
        }
    }

    /// Build a document whose root children are described by `specs`
    pub fn from_specs(specs: impl IntoIterator<Item = ElementSpec>) -> Result<Self, DocumentError> {
        let mut doc = Self::new();
        let root = doc.root();
        for spec in specs {
            doc.insert(root, spec)?;
        }
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(DocumentError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Iterate `id` and then each of its ancestors up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).map(|_| id),
        }
    }

    /// Insert an element subtree under `parent`, returning the new element's id
    pub fn insert(&mut self, parent: NodeId, spec: ElementSpec) -> Result<NodeId, DocumentError> {
        let parent_node = self.node(parent).ok_or(DocumentError::UnknownNode(parent))?;
        if parent_node.is_text() {
            return Err(DocumentError::TextNodeChildren(parent));
        }

        let id = self.push(Node::element(spec.tag, Some(parent)));
        self.node_mut(parent)?.children.push(id);

        for (name, value) in spec.attributes {
            self.set_attribute(id, name, value)?;
        }
        if let Some(text) = spec.text {
            self.append_text(id, text)?;
        }
        for child in spec.children {
            self.insert(id, child)?;
        }
        Ok(id)
    }

    pub fn append_text(
        &mut self,
        parent: NodeId,
        content: impl Into<String>,
    ) -> Result<NodeId, DocumentError> {
        if self.node_mut(parent)?.is_text() {
            return Err(DocumentError::TextNodeChildren(parent));
        }
        let id = self.push(Node::text(content, parent));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let name = name.into();
        let value = value.into();
        let node = self.node_mut(id)?;
        if node.is_text() {
            return Err(DocumentError::TextNodeAttributes(id));
        }

        let previous = node.attributes.insert(name.clone(), value.clone());
        if name == "id" {
            if let Some(old) = previous {
                if self.ids.get(&old) == Some(&id) {
                    self.ids.remove(&old);
                }
            }
            self.ids.insert(value, id);
        }
        Ok(())
    }

    pub fn remove_attribute(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> Result<Option<String>, DocumentError> {
        let node = self.node_mut(id)?;
        if node.is_text() {
            return Err(DocumentError::TextNodeAttributes(id));
        }
        let removed = node.attributes.remove(name);
        if name == "id" {
            if let Some(old) = &removed {
                if self.ids.get(old) == Some(&id) {
                    self.ids.remove(old);
                }
            }
        }
        Ok(removed)
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Hide a node. Returns `false` if it was already hidden.
    pub fn hide(&mut self, id: NodeId) -> Result<bool, DocumentError> {
        let node = self.node_mut(id)?;
        let changed = !node.flags.contains(NodeFlags::HIDDEN);
        node.flags.insert(NodeFlags::HIDDEN);
        Ok(changed)
    }

    pub fn show(&mut self, id: NodeId) -> Result<bool, DocumentError> {
        let node = self.node_mut(id)?;
        let changed = node.flags.contains(NodeFlags::HIDDEN);
        node.flags.remove(NodeFlags::HIDDEN);
        Ok(changed)
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<(), DocumentError> {
        self.node_mut(id)?.flags.set(NodeFlags::DISABLED, disabled);
        Ok(())
    }
}

/// Iterator returned by [`Document::ancestors`]
#[derive(Debug)]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// A document shared between the dispatch path and async collaborator work
///
/// The lock is held only for short synchronous sections, never while a
/// collaborator runs.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Wrap a document for sharing
pub fn share(doc: Document) -> SharedDocument {
    Arc::new(Mutex::new(doc))
}

/// Lock a shared document, recovering the guard if a previous holder panicked
pub fn lock(doc: &SharedDocument) -> MutexGuard<'_, Document> {
    doc.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
