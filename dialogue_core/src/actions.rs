//! Side effects attached to dialogue choices.

use futures_util::future::BoxFuture;
use game_progress::{ModuleContext, StateValue, Task};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::node::NodeRef;

type HandlerFn = dyn for<'a> Fn(&'a mut dyn ModuleContext) -> BoxFuture<'a, anyhow::Result<()>>
    + Send
    + Sync;

/// Asynchronous side effect with mutable access to the module context.
#[derive(Clone)]
pub struct ActionHandler(Arc<HandlerFn>);

impl ActionHandler {
    /// Wrap an async handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn ModuleContext) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Run the handler against `ctx`.
    pub fn call<'a>(&self, ctx: &'a mut dyn ModuleContext) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ActionHandler(..)")
    }
}

/// A side effect executed when a choice is taken.
#[derive(Debug, Clone)]
pub enum Action {
    AcceptTask(Task),
    /// Set a module-scoped persisted field.
    SetState { key: String, value: StateValue },
    SetInteractableState {
        interactable_id: String,
        key: String,
        value: StateValue,
    },
    /// Same store as [`Action::SetState`]; kept for authoring clarity.
    SetModuleState { key: String, value: StateValue },
    CallFunction(ActionHandler),
    /// Navigation intent, applied after the choice's actions have run.
    /// `None` closes the conversation.
    GoTo(Option<NodeRef>),
    CloseDialogue,
}

impl Action {
    /// Make `task` the current task.
    pub fn accept_task(task: Task) -> Self {
        Action::AcceptTask(task)
    }

    /// Set a module field.
    pub fn set_state(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Action::SetState {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn set_interactable_state(
        interactable_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Self {
        Action::SetInteractableState {
            interactable_id: interactable_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn set_module_state(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Action::SetModuleState {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Run an async handler. Its error aborts the remaining actions.
    pub fn call_function<F>(handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn ModuleContext) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Action::CallFunction(ActionHandler::new(handler))
    }

    /// Navigate to `node` after the actions run.
    pub fn go_to(node: impl Into<NodeRef>) -> Self {
        Action::GoTo(Some(node.into()))
    }

    /// Close the conversation after the actions run.
    pub fn close_dialogue() -> Self {
        Action::CloseDialogue
    }

    /// Kebab-case name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AcceptTask(_) => "accept-task",
            Action::SetState { .. } => "set-state",
            Action::SetInteractableState { .. } => "set-interactable-state",
            Action::SetModuleState { .. } => "set-module-state",
            Action::CallFunction(_) => "call-function",
            Action::GoTo(_) => "go-to",
            Action::CloseDialogue => "close-dialogue",
        }
    }
}

/// Execute actions strictly in order, awaiting each before starting the next.
///
/// The first failing handler aborts the sequence; its error is returned as-is
/// and effects of earlier actions remain applied. Navigation actions have no
/// effect here, see [`DialogueEngine::take_choice`](crate::DialogueEngine::take_choice).
pub async fn execute_actions(actions: &[Action], ctx: &mut dyn ModuleContext) -> anyhow::Result<()> {
    for action in actions {
        debug!(action = action.kind(), "executing action");
        match action {
            Action::AcceptTask(task) => ctx.accept_task(task),
            Action::SetState { key, value } | Action::SetModuleState { key, value } => {
                ctx.set_module_state_field(key, value.clone())
            }
            Action::SetInteractableState {
                interactable_id,
                key,
                value,
            } => ctx.set_interactable_state(interactable_id, key, value.clone()),
            Action::CallFunction(handler) => handler.call(ctx).await?,
            Action::GoTo(_) | Action::CloseDialogue => {
                trace!("navigation action deferred to the engine");
            }
        }
    }
    Ok(())
}
