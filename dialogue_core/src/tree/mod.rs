//! Dialogue Tree - validated conversation graph.
//!
//! Trees are assembled with [`DialogueTreeBuilder`] and are read-only once
//! built. Every non-null edge target and every entry node is guaranteed to be
//! present in the node set.

mod builder;

pub use builder::*;

use game_progress::{Condition, ModuleContext};
use std::collections::HashMap;

use crate::actions::Action;
use crate::node::{NodeDefinition, NodeRef};

/// A transition derived from a node's static choice.
#[derive(Debug, Clone)]
pub struct DialogueEdge {
    pub from: String,
    pub choice_key: String,
    /// Target node. `None` = the choice closes or stays without navigating.
    pub next: Option<NodeRef>,
    pub condition: Option<Condition>,
    pub actions: Vec<Action>,
}

impl DialogueEdge {
    /// True when the edge has no condition or its condition holds.
    pub fn is_available(&self, ctx: &dyn ModuleContext) -> bool {
        self.condition.as_ref().map_or(true, |c| c.evaluate(ctx))
    }
}

/// A conditional entry point.
#[derive(Debug, Clone)]
pub struct EntryCondition {
    pub condition: Condition,
    pub node: NodeRef,
}

/// Ordered entry conditions with a mandatory fallback.
#[derive(Debug, Clone)]
pub struct DialogueEntryConfig {
    pub conditions: Vec<EntryCondition>,
    pub default: NodeRef,
}

impl DialogueEntryConfig {
    /// First node whose condition holds, in declaration order, else the default.
    pub fn resolve(&self, ctx: &dyn ModuleContext) -> &NodeRef {
        self.conditions
            .iter()
            .find(|entry| entry.condition.evaluate(ctx))
            .map(|entry| &entry.node)
            .unwrap_or(&self.default)
    }
}

/// Where a conversation with the tree starts.
#[derive(Debug, Clone)]
pub enum DialogueEntry {
    Node(NodeRef),
    Conditional(DialogueEntryConfig),
}

impl DialogueEntry {
    pub fn resolve(&self, ctx: &dyn ModuleContext) -> &NodeRef {
        match self {
            DialogueEntry::Node(node) => node,
            DialogueEntry::Conditional(config) => config.resolve(ctx),
        }
    }
}

/// A built dialogue graph.
#[derive(Debug, Clone)]
pub struct DialogueTree {
    pub(crate) nodes: HashMap<String, NodeRef>,
    pub(crate) edges: Vec<DialogueEdge>,
    pub(crate) entry: DialogueEntry,
    pub(crate) definitions: HashMap<String, NodeDefinition>,
}

impl DialogueTree {
    /// Start building a tree.
    pub fn builder() -> DialogueTreeBuilder {
        DialogueTreeBuilder::new()
    }

    /// A node by id.
    pub fn node(&self, id: &str) -> Option<&NodeRef> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef> {
        self.nodes.values()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edges(&self) -> &[DialogueEdge] {
        &self.edges
    }

    /// The edge for `choice_key` on node `from`.
    pub fn edge(&self, from: &str, choice_key: &str) -> Option<&DialogueEdge> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.choice_key == choice_key)
    }

    /// Edges leaving node `from`, in choice order.
    pub fn edges_from<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a DialogueEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.from == from)
    }

    pub fn entry(&self) -> &DialogueEntry {
        &self.entry
    }

    /// Resolve the entry node against the current state.
    pub fn entry_node(&self, ctx: &dyn ModuleContext) -> &NodeRef {
        self.entry.resolve(ctx)
    }

    /// The authored definition of a node added from a [`NodeDefinition`].
    pub fn definition(&self, id: &str) -> Option<&NodeDefinition> {
        self.definitions.get(id)
    }
}
