//! Action resolution from an interaction's origin node
//!
//! Resolution is a single upward walk from the origin:
//!
//! 1. A text-node origin is replaced by its parent element.
//! 2. The nearest ancestor-or-self carrying a non-empty marker attribute wins.
//! 3. Failing that, the nearest ancestor-or-self matching one of the
//!    [`StructuralPattern`]s is treated as a card that lost its marker during
//!    re-rendering, and resolves to the repair action (`show-details`).
//! 4. Otherwise there is no action, which is a normal outcome.
//!
//! [`Resolver::resolve`] never mutates the document. Writing the repaired
//! marker back is a separate, idempotent [`Resolver::normalize`] step.

use serde::{Deserialize, Serialize};

use crate::document::{Document, Node, NodeId};
use crate::error::DocumentError;
use crate::request::{ActionRequest, Params};

/// Attribute holding the action name
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-action";

/// Action attached to repaired cards
pub const REPAIR_ACTION: &str = "show-details";

const PARAM_PREFIX: &str = "data-";

/// Shape of an element that is actionable even when its marker is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralPattern {
    pub role: String,
    pub class: String,
}

impl StructuralPattern {
    pub fn new(role: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            class: class.into(),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        !node.is_text() && node.role() == Some(self.role.as_str()) && node.has_class(&self.class)
    }
}

/// The fixed card shapes the repair heuristic recognises
pub fn default_patterns() -> Vec<StructuralPattern> {
    vec![
        StructuralPattern::new("button", "module-card"),
        StructuralPattern::new("button", "activity-card"),
        StructuralPattern::new("article", "joke-card"),
    ]
}

/// Outcome of resolving an origin node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// A node carrying the marker was found
    Marked { node: NodeId, action: String },
    /// A card without a marker matched a structural pattern
    Repaired { node: NodeId, action: String },
    /// The resolved node is disabled
    Disabled { node: NodeId },
    /// Nothing actionable
    None,
}

impl Resolution {
    /// The resolved node, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Resolution::Marked { node, .. }
            | Resolution::Repaired { node, .. }
            | Resolution::Disabled { node } => Some(*node),
            Resolution::None => None,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Resolution::Marked { action, .. } | Resolution::Repaired { action, .. } => {
                Some(action)
            }
            Resolution::Disabled { .. } | Resolution::None => None,
        }
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, Resolution::Repaired { .. })
    }
}

/// Finds the action an interaction refers to
#[derive(Debug, Clone)]
pub struct Resolver {
    marker: String,
    patterns: Vec<StructuralPattern>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            marker: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            patterns: default_patterns(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<StructuralPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn patterns(&self) -> &[StructuralPattern] {
        &self.patterns
    }

    /// Element the walk starts from: text origins are replaced by their parent
    pub fn normalize_origin(&self, doc: &Document, origin: NodeId) -> Option<NodeId> {
        let node = doc.node(origin)?;
        if node.is_text() {
            node.parent()
        } else {
            Some(origin)
        }
    }

    fn marker_value<'a>(&self, node: &'a Node) -> Option<&'a str> {
        node.attr(&self.marker)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Resolve `origin` without touching the document
    pub fn resolve(&self, doc: &Document, origin: NodeId) -> Resolution {
        let Some(start) = self.normalize_origin(doc, origin) else {
            return Resolution::None;
        };

        let marked = doc.ancestors(start).find_map(|id| {
            let node = doc.node(id)?;
            self.marker_value(node).map(|action| (id, node, action))
        });
        if let Some((node_id, node, action)) = marked {
            if node.is_disabled() {
                return Resolution::Disabled { node: node_id };
            }
            return Resolution::Marked {
                node: node_id,
                action: action.to_string(),
            };
        }

        let card = doc.ancestors(start).find(|&id| {
            doc.node(id)
                .map(|node| self.patterns.iter().any(|p| p.matches(node)))
                .unwrap_or(false)
        });
        match card {
            Some(node_id) if doc.node(node_id).is_some_and(Node::is_disabled) => {
                Resolution::Disabled { node: node_id }
            }
            Some(node_id) => Resolution::Repaired {
                node: node_id,
                action: REPAIR_ACTION.to_string(),
            },
            None => Resolution::None,
        }
    }

    /// Write the repaired marker back onto the card
    ///
    /// Idempotent: a card that already carries a marker is left untouched.
    /// Returns whether the document changed.
    pub fn normalize(
        &self,
        doc: &mut Document,
        resolution: &Resolution,
    ) -> Result<bool, DocumentError> {
        let Resolution::Repaired { node, action } = resolution else {
            return Ok(false);
        };
        let current = doc.node(*node).ok_or(DocumentError::UnknownNode(*node))?;
        if self.marker_value(current).is_some() {
            return Ok(false);
        }
        doc.set_attribute(*node, self.marker.clone(), action.clone())?;
        tracing::debug!(node = ?node, action = %action, "repaired missing action marker");
        Ok(true)
    }

    /// Collect the `data-*` parameters of the resolved node
    pub fn params(&self, doc: &Document, node: NodeId) -> Params {
        doc.node(node)
            .map(|node| {
                node.attributes()
                    .filter(|(name, _)| *name != self.marker)
                    .filter_map(|(name, value)| {
                        name.strip_prefix(PARAM_PREFIX)
                            .filter(|stripped| !stripped.is_empty())
                            .map(|stripped| (stripped, value))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build the request for an actionable resolution
    pub fn request(&self, doc: &Document, resolution: &Resolution) -> Option<ActionRequest> {
        let node = resolution.node()?;
        let action = resolution.action()?;
        Some(ActionRequest {
            node,
            action: Some(action.to_string()),
            params: self.params(doc, node),
            repaired: resolution.is_repaired(),
        })
    }
}
