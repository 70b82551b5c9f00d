//! Dialogue nodes and the choices they offer.

use game_progress::{Condition, ModuleContext, ModuleData, Task};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

use crate::actions::Action;

/// Shared handle to an immutable node.
pub type NodeRef = Arc<DialogueNode>;

/// Ordered choice map; declaration order is presentation order.
pub type ChoiceMap = IndexMap<String, Choice>;

type NextFnInner = dyn Fn(&dyn ModuleContext, &ModuleData) -> Option<NodeRef> + Send + Sync;
type ChoicesFnInner = dyn Fn(&dyn ModuleContext, &ModuleData) -> ChoiceMap + Send + Sync;

/// Computes a choice's target at traversal time.
#[derive(Clone)]
pub struct NextFn(Arc<NextFnInner>);

impl NextFn {
    pub fn call(&self, ctx: &dyn ModuleContext, module: &ModuleData) -> Option<NodeRef> {
        (self.0)(ctx, module)
    }
}

impl std::fmt::Debug for NextFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NextFn(..)")
    }
}

/// Computes a node's choices at traversal time.
#[derive(Clone)]
pub struct ChoicesFn(Arc<ChoicesFnInner>);

impl ChoicesFn {
    pub fn call(&self, ctx: &dyn ModuleContext, module: &ModuleData) -> ChoiceMap {
        (self.0)(ctx, module)
    }
}

impl std::fmt::Debug for ChoicesFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChoicesFn(..)")
    }
}

/// Where a choice leads.
#[derive(Debug, Clone, Default)]
pub enum ChoiceTarget {
    /// No transition; the conversation stays open on the current node.
    #[default]
    Stay,
    /// Close the conversation.
    Close,
    Node(NodeRef),
    /// A node referenced by ID, resolved when the tree is built.
    Id(String),
    /// Resolved at traversal time. `None` closes the conversation.
    Dynamic(NextFn),
}

/// A single option offered on a node.
#[derive(Debug, Clone)]
pub struct Choice {
    pub text: String,
    pub next: ChoiceTarget,
    /// Gate for offering this choice. `None` = always offered.
    pub condition: Option<Condition>,
    /// Executed in order when the choice is taken, before navigation.
    pub actions: Vec<Action>,
}

impl Choice {
    /// Create a choice with no transition, condition, or actions.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: ChoiceTarget::Stay,
            condition: None,
            actions: Vec::new(),
        }
    }

    /// Lead to a node.
    pub fn to(mut self, node: impl Into<NodeRef>) -> Self {
        self.next = ChoiceTarget::Node(node.into());
        self
    }

    /// Lead to a node by ID, which may be added to the tree later.
    pub fn to_id(mut self, id: impl Into<String>) -> Self {
        self.next = ChoiceTarget::Id(id.into());
        self
    }

    /// Close the conversation.
    pub fn close(mut self) -> Self {
        self.next = ChoiceTarget::Close;
        self
    }

    /// Compute the target when the choice is taken.
    pub fn to_dynamic(
        mut self,
        next: impl Fn(&dyn ModuleContext, &ModuleData) -> Option<NodeRef> + Send + Sync + 'static,
    ) -> Self {
        self.next = ChoiceTarget::Dynamic(NextFn(Arc::new(next)));
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Check whether the choice's condition (if any) holds.
    pub fn is_available(&self, ctx: &dyn ModuleContext) -> bool {
        self.condition.as_ref().map_or(true, |c| c.evaluate(ctx))
    }
}

/// The choices of a node: a fixed map, or a function of the current state.
#[derive(Debug, Clone)]
pub enum NodeChoices {
    Static(ChoiceMap),
    Dynamic(ChoicesFn),
}

impl Default for NodeChoices {
    fn default() -> Self {
        NodeChoices::Static(ChoiceMap::new())
    }
}

impl NodeChoices {
    pub fn dynamic(
        choices: impl Fn(&dyn ModuleContext, &ModuleData) -> ChoiceMap + Send + Sync + 'static,
    ) -> Self {
        NodeChoices::Dynamic(ChoicesFn(Arc::new(choices)))
    }

    /// The concrete choice map for the current state.
    pub fn resolve(&self, ctx: &dyn ModuleContext, module: &ModuleData) -> Cow<'_, ChoiceMap> {
        match self {
            NodeChoices::Static(choices) => Cow::Borrowed(choices),
            NodeChoices::Dynamic(choices) => Cow::Owned(choices.call(ctx, module)),
        }
    }

    fn insert(&mut self, key: String, choice: Choice) {
        match self {
            NodeChoices::Static(choices) => {
                choices.insert(key, choice);
            }
            NodeChoices::Dynamic(_) => {
                let mut choices = ChoiceMap::new();
                choices.insert(key, choice);
                *self = NodeChoices::Static(choices);
            }
        }
    }
}

/// A unit of dialogue: lines to display and choices to offer.
#[derive(Debug, Clone)]
pub struct DialogueNode {
    pub id: String,
    pub lines: Vec<String>,
    /// Task this node is about, if any.
    pub task: Option<Task>,
    pub choices: NodeChoices,
}

impl DialogueNode {
    /// Create a node with the given ID and lines.
    pub fn new(id: impl Into<String>, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            lines: lines.into_iter().map(Into::into).collect(),
            task: None,
            choices: NodeChoices::default(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    /// Add a choice. Replaces dynamic choices with a static map.
    pub fn with_choice(mut self, key: impl Into<String>, choice: Choice) -> Self {
        self.choices.insert(key.into(), choice);
        self
    }

    pub fn with_dynamic_choices(
        mut self,
        choices: impl Fn(&dyn ModuleContext, &ModuleData) -> ChoiceMap + Send + Sync + 'static,
    ) -> Self {
        self.choices = NodeChoices::dynamic(choices);
        self
    }

    /// Check whether the node has at least one non-blank line.
    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }
}

/// Raw node definition, as authored. The ID is generated when absent.
#[derive(Debug, Clone, Default)]
pub struct NodeDefinition {
    pub id: Option<String>,
    pub lines: Vec<String>,
    pub task: Option<Task>,
    pub choices: NodeChoices,
}

impl NodeDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_choice(mut self, key: impl Into<String>, choice: Choice) -> Self {
        self.choices.insert(key.into(), choice);
        self
    }

    pub fn with_dynamic_choices(
        mut self,
        choices: impl Fn(&dyn ModuleContext, &ModuleData) -> ChoiceMap + Send + Sync + 'static,
    ) -> Self {
        self.choices = NodeChoices::dynamic(choices);
        self
    }

    /// Construct the node this definition describes.
    pub fn to_node(&self) -> DialogueNode {
        DialogueNode {
            id: self.id.clone().unwrap_or_else(generate_node_id),
            lines: self.lines.clone(),
            task: self.task.clone(),
            choices: self.choices.clone(),
        }
    }
}

fn generate_node_id() -> String {
    format!("node_{}", Uuid::new_v4().simple())
}
