//! Per-interaction action requests

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::document::NodeId;

/// String parameters read from `data-*` attributes of the resolved node
///
/// Keys have the `data-` prefix stripped (`data-target-id` → `target-id`).
/// Values are never interpreted here; numeric parameters are parsed by the
/// dispatch branch that needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// A parameter that is present and not blank
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Parse a parameter, returning `None` when it is absent
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.non_empty(name).map(str::parse)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// What a single interaction asked for
///
/// Created at event entry and dropped at the end of the dispatch turn.
/// Async collaborator work receives owned copies of the values it needs,
/// never the request itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRequest {
    /// The node carrying the action marker
    pub node: NodeId,
    /// The marker value, absent when the node carries none
    pub action: Option<String>,
    pub params: Params,
    /// Whether the marker was attached by the repair heuristic on this turn
    pub repaired: bool,
}

impl ActionRequest {
    pub fn new(node: NodeId, action: impl Into<String>) -> Self {
        Self {
            node,
            action: Some(action.into()),
            params: Params::new(),
            repaired: false,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}
