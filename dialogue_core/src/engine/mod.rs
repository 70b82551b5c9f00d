//! Dialogue Engine - traverses built trees against the player's progress.
//!
//! The query operations never mutate the tree or the context and never fail:
//! a missing edge, unknown choice key, or false condition yields `None` or an
//! empty list. [`DialogueEngine::take_choice`] is the single mutating entry
//! point; it runs the choice's actions and then reports where to go.

mod root;

pub use root::*;

use game_progress::{ModuleContext, ModuleData};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::actions::{execute_actions, Action};
use crate::config::DialogueConfig;
use crate::node::{Choice, ChoiceTarget, DialogueNode, NodeRef};
use crate::npc::Npc;
use crate::tree::{DialogueEdge, DialogueTree};

/// A choice that may be offered to the player right now.
#[derive(Debug, Clone)]
pub struct AvailableChoice {
    pub key: String,
    pub text: String,
    pub actions: Vec<Action>,
}

/// Result of taking a choice.
#[derive(Debug, Clone)]
pub enum ChoiceOutcome {
    Navigate(NodeRef),
    Close,
    /// Remain on the current node.
    Stay,
    /// The choice does not exist or its condition is false. Nothing was run.
    Unavailable,
}

enum Transition {
    Node(NodeRef),
    Close,
    Stay,
}

/// Resolves entry points, choices, and transitions.
#[derive(Debug, Clone, Default)]
pub struct DialogueEngine {
    config: DialogueConfig,
}

impl DialogueEngine {
    pub fn new(config: DialogueConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DialogueConfig::default())
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    /// The node reached by taking `choice_key` on `current`.
    ///
    /// Returns `None` when the choice is missing, its condition is false, or it
    /// closes the conversation.
    pub fn next_node(
        &self,
        current: &DialogueNode,
        choice_key: &str,
        tree: &DialogueTree,
        ctx: &dyn ModuleContext,
        module: &ModuleData,
    ) -> Option<NodeRef> {
        match self.transition(current, choice_key, tree, ctx, module) {
            Some(Transition::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// Choices of `node` whose condition holds, in declaration order.
    pub fn available_choices(
        &self,
        node: &DialogueNode,
        tree: &DialogueTree,
        ctx: &dyn ModuleContext,
        module: &ModuleData,
    ) -> Vec<AvailableChoice> {
        self.choices_for(node, Some(tree), ctx, module)
    }

    /// Take a choice on `current` in a conversation with `npc`.
    ///
    /// Actions run first, in order. A trailing navigation action (`GoTo` or
    /// `CloseDialogue`) then overrides the choice's own target. Handler errors
    /// are returned unchanged.
    #[instrument(skip_all, fields(npc = %npc.id, node = %current.id, choice = choice_key))]
    pub async fn take_choice(
        &self,
        npc: &Npc,
        current: &DialogueNode,
        choice_key: &str,
        ctx: &mut dyn ModuleContext,
        module: &ModuleData,
    ) -> anyhow::Result<ChoiceOutcome> {
        let tree = npc.dialogue.as_ref();
        let edge = tree.and_then(|t| t.edge(&current.id, choice_key));

        // Resolved once: actions may change what a dynamic map would offer.
        let Some(choice) = current
            .choices
            .resolve(&*ctx, module)
            .get(choice_key)
            .filter(|choice| match edge {
                Some(edge) => edge.is_available(&*ctx),
                None => choice.is_available(&*ctx),
            })
            .cloned()
        else {
            debug!("choice is not available");
            return Ok(ChoiceOutcome::Unavailable);
        };

        execute_actions(&choice.actions, ctx).await?;

        if let Some(outcome) = navigation_override(&choice.actions) {
            return Ok(outcome);
        }

        let target = match edge {
            Some(edge) => edge_target(edge, Some(&choice)),
            None => choice_target(&current.id, &choice, tree, &*ctx, module),
        };
        Ok(target.into())
    }

    fn choices_for(
        &self,
        node: &DialogueNode,
        tree: Option<&DialogueTree>,
        ctx: &dyn ModuleContext,
        module: &ModuleData,
    ) -> Vec<AvailableChoice> {
        node.choices
            .resolve(ctx, module)
            .iter()
            .filter(|(key, choice)| match tree.and_then(|t| t.edge(&node.id, key)) {
                Some(edge) => edge.is_available(ctx),
                None => choice.is_available(ctx),
            })
            .map(|(key, choice)| AvailableChoice {
                key: key.clone(),
                text: choice.text.clone(),
                actions: choice.actions.clone(),
            })
            .collect()
    }

    /// Edges of the tree take precedence. Nodes outside the tree, dynamic
    /// choices, and dynamic targets fall back to the node's own choice map.
    fn transition(
        &self,
        current: &DialogueNode,
        choice_key: &str,
        tree: &DialogueTree,
        ctx: &dyn ModuleContext,
        module: &ModuleData,
    ) -> Option<Transition> {
        let choices = current.choices.resolve(ctx, module);
        let choice = choices.get(choice_key);

        if let Some(edge) = tree.edge(&current.id, choice_key) {
            if !edge.is_available(ctx) {
                debug!(node = %current.id, choice = choice_key, "edge condition not met");
                return None;
            }
            return Some(edge_target(edge, choice));
        }

        let Some(choice) = choice else {
            debug!(node = %current.id, choice = choice_key, "no such choice");
            return None;
        };
        if !choice.is_available(ctx) {
            debug!(node = %current.id, choice = choice_key, "choice condition not met");
            return None;
        }

        Some(choice_target(&current.id, choice, Some(tree), ctx, module))
    }
}

impl From<Transition> for ChoiceOutcome {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Node(node) => ChoiceOutcome::Navigate(node),
            Transition::Close => ChoiceOutcome::Close,
            Transition::Stay => ChoiceOutcome::Stay,
        }
    }
}

fn edge_target(edge: &DialogueEdge, choice: Option<&Choice>) -> Transition {
    match &edge.next {
        Some(next) => Transition::Node(Arc::clone(next)),
        None if matches!(choice.map(|c| &c.next), Some(ChoiceTarget::Stay)) => Transition::Stay,
        None => Transition::Close,
    }
}

/// Where `choice` leads when no edge describes it. Dynamic targets are
/// evaluated against `ctx` as it is now.
fn choice_target(
    from: &str,
    choice: &Choice,
    tree: Option<&DialogueTree>,
    ctx: &dyn ModuleContext,
    module: &ModuleData,
) -> Transition {
    match &choice.next {
        ChoiceTarget::Stay => Transition::Stay,
        ChoiceTarget::Close => Transition::Close,
        ChoiceTarget::Node(node) => Transition::Node(
            tree.and_then(|t| t.node(&node.id))
                .map_or_else(|| Arc::clone(node), Arc::clone),
        ),
        ChoiceTarget::Id(id) => match tree.and_then(|t| t.node(id)) {
            Some(node) => Transition::Node(Arc::clone(node)),
            None => {
                warn!(node = %from, target = %id, "choice leads to a node outside the tree");
                Transition::Close
            }
        },
        ChoiceTarget::Dynamic(next) => next
            .call(ctx, module)
            .map_or(Transition::Close, Transition::Node),
    }
}

/// The last navigation action in the list, if any.
fn navigation_override(actions: &[Action]) -> Option<ChoiceOutcome> {
    actions.iter().rev().find_map(|action| match action {
        Action::GoTo(Some(node)) => Some(ChoiceOutcome::Navigate(Arc::clone(node))),
        Action::GoTo(None) | Action::CloseDialogue => Some(ChoiceOutcome::Close),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Choice;
    use futures_util::FutureExt;
    use game_progress::{Condition, MemoryContext, Task, TaskId};
    use serde_json::json;

    fn module() -> ModuleData {
        ModuleData::new("intro", "Introduction")
    }

    fn scenario_tree() -> DialogueTree {
        DialogueTree::builder()
            .node(
                DialogueNode::new("greeting", ["Hello, traveller."])
                    .with_choice("ask", Choice::new("Any work?").to_id("offer")),
            )
            .node(
                DialogueNode::new("offer", ["Fetch me some water."])
                    .with_choice("close", Choice::new("Later").close()),
            )
            .build()
            .unwrap()
    }

    fn npc_with(tree: DialogueTree) -> Npc {
        Npc::new("elder", "Elder").with_dialogue(tree)
    }

    #[test]
    fn test_next_node_follows_edges() {
        let engine = DialogueEngine::with_defaults();
        let tree = scenario_tree();
        let ctx = MemoryContext::new();

        let greeting = tree.node("greeting").unwrap();
        let offer = engine
            .next_node(greeting, "ask", &tree, &ctx, &module())
            .unwrap();
        assert_eq!(offer.id, "offer");

        assert!(engine
            .next_node(&offer, "close", &tree, &ctx, &module())
            .is_none());
    }

    #[test]
    fn test_next_node_missing_choice() {
        let engine = DialogueEngine::with_defaults();
        let tree = scenario_tree();
        let greeting = tree.node("greeting").unwrap();

        assert!(engine
            .next_node(greeting, "nope", &tree, &MemoryContext::new(), &module())
            .is_none());
    }

    #[test]
    fn test_next_node_rechecks_condition() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("gate", ["Password?"]).with_choice(
                    "enter",
                    Choice::new("Enter")
                        .to(DialogueNode::new("inside", ["Welcome."]))
                        .when(Condition::state_check("knows_password", true)),
                ),
            )
            .build()
            .unwrap();
        let gate = tree.node("gate").unwrap();

        let outsider = MemoryContext::new();
        assert!(engine
            .next_node(gate, "enter", &tree, &outsider, &module())
            .is_none());

        let insider = MemoryContext::new().with_field("knows_password", true);
        let inside = engine
            .next_node(gate, "enter", &tree, &insider, &module())
            .unwrap();
        assert_eq!(inside.id, "inside");
    }

    #[test]
    fn test_null_edge_with_satisfied_condition() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(DialogueNode::new("bye", ["Farewell."]).with_choice(
                "leave",
                Choice::new("Leave")
                    .close()
                    .when(Condition::task_complete("t1")),
            ))
            .build()
            .unwrap();
        let ctx = MemoryContext::new().with_completed_task("t1");
        let bye = tree.node("bye").unwrap();

        assert!(engine.next_node(bye, "leave", &tree, &ctx, &module()).is_none());
        let choices = engine.available_choices(bye, &tree, &ctx, &module());
        assert_eq!(choices.len(), 1);
    }

    #[test]
    fn test_available_choices_filters_and_keeps_order() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("hub", ["What now?"])
                    .with_choice("hidden", Choice::new("Secret").when(Condition::task_active("t9")))
                    .with_choice("leave", Choice::new("Leave").close())
                    .with_choice(
                        "report",
                        Choice::new("Report")
                            .close()
                            .when(Condition::task_active("t1"))
                            .with_action(Action::set_state("reported", true)),
                    )
                    .with_choice("wait", Choice::new("Wait")),
            )
            .build()
            .unwrap();
        let ctx = MemoryContext::new().with_current_task("t1");
        let hub = tree.node("hub").unwrap();

        let choices = engine.available_choices(hub, &tree, &ctx, &module());
        let keys: Vec<_> = choices.iter().map(|c| c.key.as_str()).collect();

        assert_eq!(keys, vec!["leave", "report", "wait"]);
        assert_eq!(choices[1].text, "Report");
        assert_eq!(choices[1].actions.len(), 1);
    }

    #[test]
    fn test_dynamic_choices_and_targets() {
        let engine = DialogueEngine::with_defaults();
        let vault = Arc::new(DialogueNode::new("vault", ["Gold everywhere."]));
        let tree = DialogueTree::builder()
            .node(DialogueNode::new("door", ["A heavy door."]).with_dynamic_choices(
                move |ctx, _| {
                    let vault = Arc::clone(&vault);
                    let mut choices = crate::node::ChoiceMap::new();
                    if ctx.module_state_field("has_key") == Some(json!(true)) {
                        choices.insert(
                            "open".to_string(),
                            Choice::new("Open").to_dynamic(move |_, _| Some(Arc::clone(&vault))),
                        );
                    }
                    choices
                },
            ))
            .build()
            .unwrap();
        let door = tree.node("door").unwrap();

        let locked = MemoryContext::new();
        assert!(engine.available_choices(door, &tree, &locked, &module()).is_empty());
        assert!(engine.next_node(door, "open", &tree, &locked, &module()).is_none());

        let unlocked = MemoryContext::new().with_field("has_key", true);
        let next = engine.next_node(door, "open", &tree, &unlocked, &module()).unwrap();
        assert_eq!(next.id, "vault");
    }

    #[tokio::test]
    async fn test_take_choice_runs_actions_then_navigates() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("greeting", ["Hi."]).with_choice(
                    "ask",
                    Choice::new("Ask")
                        .to_id("offer")
                        .with_action(Action::set_state("asked", true)),
                ),
            )
            .node(DialogueNode::new("offer", ["Here."]))
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let greeting = Arc::clone(npc.dialogue.as_ref().unwrap().node("greeting").unwrap());
        let mut ctx = MemoryContext::new();

        let outcome = engine
            .take_choice(&npc, &greeting, "ask", &mut ctx, &module())
            .await
            .unwrap();

        assert!(matches!(outcome, ChoiceOutcome::Navigate(ref node) if node.id == "offer"));
        assert_eq!(ctx.module_state_field("asked"), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_take_choice_trailing_navigation_wins() {
        let engine = DialogueEngine::with_defaults();
        let detour = DialogueNode::new("detour", ["This way."]);
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("start", ["Go?"])
                    .with_choice(
                        "go",
                        Choice::new("Go")
                            .to_id("end")
                            .with_action(Action::go_to(detour))
                            .with_action(Action::close_dialogue()),
                    )
                    .with_choice(
                        "turn",
                        Choice::new("Turn").close().with_action(Action::go_to(
                            DialogueNode::new("elsewhere", ["Over here."]),
                        )),
                    ),
            )
            .node(DialogueNode::new("end", ["The end."]))
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let start = Arc::clone(npc.dialogue.as_ref().unwrap().node("start").unwrap());
        let mut ctx = MemoryContext::new();

        let go = engine
            .take_choice(&npc, &start, "go", &mut ctx, &module())
            .await
            .unwrap();
        assert!(matches!(go, ChoiceOutcome::Close));

        let turn = engine
            .take_choice(&npc, &start, "turn", &mut ctx, &module())
            .await
            .unwrap();
        assert!(matches!(turn, ChoiceOutcome::Navigate(ref node) if node.id == "elsewhere"));
    }

    #[tokio::test]
    async fn test_take_choice_unavailable_runs_nothing() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("start", ["Hm."]).with_choice(
                    "secret",
                    Choice::new("Secret")
                        .when(Condition::task_complete("t1"))
                        .with_action(Action::set_state("touched", true)),
                ),
            )
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let start = Arc::clone(npc.dialogue.as_ref().unwrap().node("start").unwrap());
        let mut ctx = MemoryContext::new();

        let outcome = engine
            .take_choice(&npc, &start, "secret", &mut ctx, &module())
            .await
            .unwrap();

        assert!(matches!(outcome, ChoiceOutcome::Unavailable));
        assert_eq!(ctx.module_state_field("touched"), None);
    }

    #[tokio::test]
    async fn test_take_choice_stay_and_handler_error() {
        let engine = DialogueEngine::with_defaults();
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("start", ["Hm."])
                    .with_choice("wait", Choice::new("Wait"))
                    .with_choice(
                        "break",
                        Choice::new("Break it").close().with_action(Action::call_function(|_| {
                            async { Err(anyhow::anyhow!("it broke")) }.boxed()
                        })),
                    ),
            )
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let start = Arc::clone(npc.dialogue.as_ref().unwrap().node("start").unwrap());
        let mut ctx = MemoryContext::new();

        let wait = engine
            .take_choice(&npc, &start, "wait", &mut ctx, &module())
            .await
            .unwrap();
        assert!(matches!(wait, ChoiceOutcome::Stay));

        let err = engine
            .take_choice(&npc, &start, "break", &mut ctx, &module())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "it broke");
    }

    #[tokio::test]
    async fn test_dynamic_target_sees_action_effects() {
        let engine = DialogueEngine::with_defaults();
        let prize = Arc::new(DialogueNode::new("prize", ["You win!"]));
        let tree = DialogueTree::builder()
            .node(
                DialogueNode::new("game", ["Pull the lever?"]).with_choice(
                    "pull",
                    Choice::new("Pull")
                        .with_action(Action::set_interactable_state("lever", "pulled", true))
                        .to_dynamic(move |ctx, _| {
                            (ctx.interactable_state("lever", "pulled") == Some(json!(true)))
                                .then(|| Arc::clone(&prize))
                        }),
                ),
            )
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let game = Arc::clone(npc.dialogue.as_ref().unwrap().node("game").unwrap());
        let mut ctx = MemoryContext::new();

        let outcome = engine
            .take_choice(&npc, &game, "pull", &mut ctx, &module())
            .await
            .unwrap();
        assert!(matches!(outcome, ChoiceOutcome::Navigate(ref node) if node.id == "prize"));
    }

    #[tokio::test]
    async fn test_take_choice_keeps_target_when_offer_disappears() {
        let engine = DialogueEngine::with_defaults();
        let quest = Arc::new(DialogueNode::new("quest", ["Off you go."]));
        let tree = DialogueTree::builder()
            .node(DialogueNode::new("board", ["A notice board."]).with_dynamic_choices(
                move |ctx, _| {
                    let mut choices = crate::node::ChoiceMap::new();
                    if ctx.current_task_id().is_none() {
                        choices.insert(
                            "accept".to_string(),
                            Choice::new("Take the notice")
                                .to(Arc::clone(&quest))
                                .with_action(Action::accept_task(Task::new("t1", "Hunt rats"))),
                        );
                    }
                    choices
                },
            ))
            .build()
            .unwrap();
        let npc = npc_with(tree);
        let board = Arc::clone(npc.dialogue.as_ref().unwrap().node("board").unwrap());
        let mut ctx = MemoryContext::new();

        let outcome = engine
            .take_choice(&npc, &board, "accept", &mut ctx, &module())
            .await
            .unwrap();

        assert!(matches!(outcome, ChoiceOutcome::Navigate(ref node) if node.id == "quest"));
        assert_eq!(ctx.current_task_id(), Some(TaskId::new("t1")));
        assert!(engine
            .available_choices(&board, npc.dialogue.as_ref().unwrap(), &ctx, &module())
            .is_empty());
    }
}
