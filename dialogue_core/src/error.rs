//! Error types for dialogue construction and configuration.

use thiserror::Error;

/// Authoring mistakes caught when a dialogue tree is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Dialogue tree has no nodes")]
    EmptyTree,

    /// A choice referenced a node ID that was never added.
    #[error("Unresolved node '{target}' referenced by choice '{choice_key}' on node '{from}'")]
    UnresolvedReference {
        from: String,
        choice_key: String,
        target: String,
    },

    #[error("Choice '{choice_key}' on node '{from}' leads to '{target}', which is not in the tree")]
    DanglingEdge {
        from: String,
        choice_key: String,
        target: String,
    },

    #[error("Entry node '{node}' is not in the tree")]
    MissingEntryNode { node: String },
}

/// Errors loading a [`DialogueConfig`](crate::DialogueConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid dialogue configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
