//! Two-phase tree construction: accumulate nodes, then link references.

use game_progress::Condition;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{DialogueEdge, DialogueEntry, DialogueEntryConfig, DialogueTree, EntryCondition};
use crate::error::BuildError;
use crate::node::{ChoiceTarget, DialogueNode, NodeChoices, NodeDefinition, NodeRef};

/// Anything the builder accepts as a node.
#[derive(Debug, Clone)]
pub enum NodeInput {
    Node(NodeRef),
    Definition(NodeDefinition),
}

impl From<NodeRef> for NodeInput {
    fn from(node: NodeRef) -> Self {
        NodeInput::Node(node)
    }
}

impl From<&NodeRef> for NodeInput {
    fn from(node: &NodeRef) -> Self {
        NodeInput::Node(Arc::clone(node))
    }
}

impl From<DialogueNode> for NodeInput {
    fn from(node: DialogueNode) -> Self {
        NodeInput::Node(Arc::new(node))
    }
}

impl From<NodeDefinition> for NodeInput {
    fn from(definition: NodeDefinition) -> Self {
        NodeInput::Definition(definition)
    }
}

/// An edge whose target was named by ID before that node was added.
#[derive(Debug, Clone)]
struct PendingReference {
    edge: usize,
    target: String,
}

/// Incrementally assembles a [`DialogueTree`].
///
/// Nodes may be added in any order. Choices can reference nodes by ID before
/// they are declared; such references are resolved by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct DialogueTreeBuilder {
    nodes: HashMap<String, NodeRef>,
    first: Option<NodeRef>,
    edges: Vec<DialogueEdge>,
    pending: Vec<PendingReference>,
    entry: Option<DialogueEntryConfig>,
    definitions: HashMap<String, NodeDefinition>,
}

impl DialogueTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or a definition to construct one from.
    ///
    /// Nodes reachable through static choices are added as well. Adding an ID
    /// that is already present is a no-op.
    pub fn node(mut self, input: impl Into<NodeInput>) -> Self {
        match input.into() {
            NodeInput::Node(node) => {
                self.insert(node);
            }
            NodeInput::Definition(definition) => {
                let node = Arc::new(definition.to_node());
                if self.insert(Arc::clone(&node)) {
                    self.definitions.insert(node.id.clone(), definition);
                }
            }
        }
        self
    }

    /// Configure a conditional entry point.
    pub fn configure_entry(self) -> EntryConfigBuilder {
        EntryConfigBuilder {
            builder: self,
            conditions: Vec::new(),
        }
    }

    /// Resolve pending references, validate, and produce the tree.
    ///
    /// The entry defaults to the first node added when no entry was configured.
    pub fn build(self) -> Result<DialogueTree, BuildError> {
        let DialogueTreeBuilder {
            nodes,
            first,
            mut edges,
            pending,
            entry,
            definitions,
        } = self;

        let Some(first) = first else {
            return Err(BuildError::EmptyTree);
        };

        for reference in pending {
            let edge = &mut edges[reference.edge];
            let target = nodes.get(&reference.target).ok_or_else(|| {
                BuildError::UnresolvedReference {
                    from: edge.from.clone(),
                    choice_key: edge.choice_key.clone(),
                    target: reference.target.clone(),
                }
            })?;
            edge.next = Some(Arc::clone(target));
        }

        for edge in &mut edges {
            if let Some(next) = &edge.next {
                let stored = nodes.get(&next.id).ok_or_else(|| BuildError::DanglingEdge {
                    from: edge.from.clone(),
                    choice_key: edge.choice_key.clone(),
                    target: next.id.clone(),
                })?;
                edge.next = Some(Arc::clone(stored));
            }
        }

        let entry = match entry {
            Some(mut config) => {
                config.default = lookup_entry(&nodes, &config.default)?;
                for condition in &mut config.conditions {
                    condition.node = lookup_entry(&nodes, &condition.node)?;
                }
                DialogueEntry::Conditional(config)
            }
            None => DialogueEntry::Node(lookup_entry(&nodes, &first)?),
        };

        debug!(nodes = nodes.len(), edges = edges.len(), "built dialogue tree");

        Ok(DialogueTree {
            nodes,
            edges,
            entry,
            definitions,
        })
    }

    /// Insert a node and derive its edges. Returns `false` if the ID was taken.
    fn insert(&mut self, node: NodeRef) -> bool {
        if self.nodes.contains_key(&node.id) {
            trace!(node = %node.id, "node already present");
            return false;
        }

        self.nodes.insert(node.id.clone(), Arc::clone(&node));
        if self.first.is_none() {
            self.first = Some(Arc::clone(&node));
        }

        let NodeChoices::Static(choices) = &node.choices else {
            trace!(node = %node.id, "dynamic choices are resolved at traversal time");
            return true;
        };

        for (key, choice) in choices {
            let next = match &choice.next {
                ChoiceTarget::Node(target) => {
                    self.insert(Arc::clone(target));
                    Some(Arc::clone(target))
                }
                ChoiceTarget::Id(target) => match self.nodes.get(target) {
                    Some(resolved) => Some(Arc::clone(resolved)),
                    None => {
                        self.pending.push(PendingReference {
                            edge: self.edges.len(),
                            target: target.clone(),
                        });
                        None
                    }
                },
                ChoiceTarget::Close | ChoiceTarget::Stay => None,
                ChoiceTarget::Dynamic(_) => continue,
            };

            self.edges.push(DialogueEdge {
                from: node.id.clone(),
                choice_key: key.clone(),
                next,
                condition: choice.condition.clone(),
                actions: choice.actions.clone(),
            });
        }

        true
    }
}

fn lookup_entry(nodes: &HashMap<String, NodeRef>, node: &NodeRef) -> Result<NodeRef, BuildError> {
    nodes
        .get(&node.id)
        .cloned()
        .ok_or_else(|| BuildError::MissingEntryNode {
            node: node.id.clone(),
        })
}

/// Collects entry conditions. Finished by [`default`](Self::default).
#[derive(Debug)]
pub struct EntryConfigBuilder {
    builder: DialogueTreeBuilder,
    conditions: Vec<EntryCondition>,
}

impl EntryConfigBuilder {
    /// Start an entry condition. Conditions are checked in declaration order.
    pub fn when(self, condition: Condition) -> EntryConditionBuilder {
        EntryConditionBuilder {
            config: self,
            condition,
        }
    }

    /// Set the fallback entry node and return to the tree builder.
    pub fn default(self, node: impl Into<NodeInput>) -> DialogueTreeBuilder {
        let EntryConfigBuilder {
            mut builder,
            conditions,
        } = self;
        let default = builder.add_entry_node(node.into());
        builder.entry = Some(DialogueEntryConfig {
            conditions,
            default,
        });
        builder
    }
}

/// A pending entry condition awaiting its node.
#[derive(Debug)]
pub struct EntryConditionBuilder {
    config: EntryConfigBuilder,
    condition: Condition,
}

impl EntryConditionBuilder {
    pub fn use_node(self, node: impl Into<NodeInput>) -> EntryConfigBuilder {
        let EntryConditionBuilder {
            mut config,
            condition,
        } = self;
        let node = config.builder.add_entry_node(node.into());
        config.conditions.push(EntryCondition { condition, node });
        config
    }
}

impl DialogueTreeBuilder {
    fn add_entry_node(&mut self, input: NodeInput) -> NodeRef {
        let node = match input {
            NodeInput::Node(node) => node,
            NodeInput::Definition(definition) => {
                let node = Arc::new(definition.to_node());
                if !self.nodes.contains_key(&node.id) {
                    self.definitions.insert(node.id.clone(), definition);
                }
                node
            }
        };
        self.insert(Arc::clone(&node));
        node
    }
}
