//! Error types shared across the dispatch core

use crate::document::NodeId;

/// Errors raised while editing the UI tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0:?} is a text node and cannot carry attributes")]
    TextNodeAttributes(NodeId),
    #[error("node {0:?} is a text node and cannot have children")]
    TextNodeChildren(NodeId),
}

/// Errors raised while loading a [`DispatchConfig`](crate::config::DispatchConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid dispatch config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid activation key {0:?}")]
    InvalidKey(String),
    #[error("marker attribute must not be empty")]
    EmptyMarker,
}

/// Failure reported by a collaborator hook, synchronously or from its future
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors raised when attaching the document-root listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttachError {
    #[error("the dispatch listener is already attached")]
    AlreadyAttached,
    #[error("no tokio runtime is available to drive the listener")]
    NoRuntime,
}
