//! Module context - the state-access capability injected into every evaluator.
//!
//! Conditions, requirements, and actions never reach a global store. They read
//! and write progress exclusively through a [`ModuleContext`] handed to them by
//! the caller, so any store (or an in-memory fake) can stand behind it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::entities::{ModuleId, Task, TaskId};

/// Value of a persisted state field.
pub type StateValue = serde_json::Value;

/// State accessor for the module the player is currently in.
pub trait ModuleContext: Send + Sync {
    /// The module this context is scoped to, if any.
    fn module_id(&self) -> Option<ModuleId>;

    /// The task the player has currently accepted.
    fn current_task_id(&self) -> Option<TaskId>;

    fn is_task_completed(&self, task_id: &TaskId) -> bool;

    /// Read a module-scoped persisted field.
    fn module_state_field(&self, key: &str) -> Option<StateValue>;

    fn set_module_state_field(&mut self, key: &str, value: StateValue);

    fn interactable_state(&self, interactable_id: &str, key: &str) -> Option<StateValue>;

    fn set_interactable_state(&mut self, interactable_id: &str, key: &str, value: StateValue);

    /// Make `task` the player's current task.
    fn accept_task(&mut self, task: &Task);

    fn is_module_completed(&self, module_id: &ModuleId) -> bool;

    /// Hand the task over to the UI for submission.
    ///
    /// The hand-off is optional; contexts without a UI leave this as a no-op.
    fn open_task_submission(&mut self, task_id: &TaskId) {
        tracing::debug!(task = %task_id, "no task submission handler installed");
    }
}

/// A self-contained, in-memory [`ModuleContext`].
///
/// Records every accepted task and submission hand-off so callers can inspect
/// the side effects that were applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    module_id: Option<ModuleId>,
    current_task: Option<TaskId>,
    completed_tasks: HashSet<TaskId>,
    completed_modules: HashSet<ModuleId>,
    fields: HashMap<String, StateValue>,
    interactables: HashMap<String, HashMap<String, StateValue>>,
    accepted_tasks: Vec<TaskId>,
    submissions: Vec<TaskId>,
}

impl MemoryContext {
    /// Create an empty context that is not scoped to any module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the context to a module.
    pub fn in_module(mut self, module_id: impl Into<ModuleId>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }

    /// Set the current task.
    pub fn with_current_task(mut self, task_id: impl Into<TaskId>) -> Self {
        self.current_task = Some(task_id.into());
        self
    }

    /// Mark a task as completed.
    pub fn with_completed_task(mut self, task_id: impl Into<TaskId>) -> Self {
        self.completed_tasks.insert(task_id.into());
        self
    }

    /// Mark a module as completed.
    pub fn with_completed_module(mut self, module_id: impl Into<ModuleId>) -> Self {
        self.completed_modules.insert(module_id.into());
        self
    }

    /// Set a module state field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set a field on an interactable.
    pub fn with_interactable_state(
        mut self,
        interactable_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Self {
        self.interactables
            .entry(interactable_id.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Mark a task as completed in place.
    pub fn complete_task(&mut self, task_id: impl Into<TaskId>) {
        let task_id = task_id.into();
        if self.current_task.as_ref() == Some(&task_id) {
            self.current_task = None;
        }
        self.completed_tasks.insert(task_id);
    }

    /// Tasks accepted through this context, in order.
    pub fn accepted_tasks(&self) -> &[TaskId] {
        &self.accepted_tasks
    }

    /// Tasks handed to submission through this context, in order.
    pub fn submissions(&self) -> &[TaskId] {
        &self.submissions
    }
}

impl ModuleContext for MemoryContext {
    fn module_id(&self) -> Option<ModuleId> {
        self.module_id.clone()
    }

    fn current_task_id(&self) -> Option<TaskId> {
        self.current_task.clone()
    }

    fn is_task_completed(&self, task_id: &TaskId) -> bool {
        self.completed_tasks.contains(task_id)
    }

    fn module_state_field(&self, key: &str) -> Option<StateValue> {
        self.fields.get(key).cloned()
    }

    fn set_module_state_field(&mut self, key: &str, value: StateValue) {
        self.fields.insert(key.to_string(), value);
    }

    fn interactable_state(&self, interactable_id: &str, key: &str) -> Option<StateValue> {
        self.interactables
            .get(interactable_id)
            .and_then(|fields| fields.get(key))
            .cloned()
    }

    fn set_interactable_state(&mut self, interactable_id: &str, key: &str, value: StateValue) {
        self.interactables
            .entry(interactable_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn accept_task(&mut self, task: &Task) {
        self.current_task = Some(task.id.clone());
        self.accepted_tasks.push(task.id.clone());
    }

    fn is_module_completed(&self, module_id: &ModuleId) -> bool {
        self.completed_modules.contains(module_id)
    }

    fn open_task_submission(&mut self, task_id: &TaskId) {
        self.submissions.push(task_id.clone());
    }
}
