//! Progress management - the persisted record of what the player has done.
//!
//! [`ProgressStore`] is the single owner of all mutable progress data.
//! [`StoreContext`] exposes one module's slice of it as a [`ModuleContext`],
//! and [`ProgressTracker`] runs the unlock workflow on top.

mod registry;
mod tracker;

pub use registry::*;
pub use tracker::*;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::context::{ModuleContext, StateValue};
use crate::entities::{ModuleId, ModuleState, Task, TaskId};

/// UI hand-off invoked when a task is opened for submission.
pub type SubmissionHook = Arc<dyn Fn(&ModuleId, &TaskId) + Send + Sync>;

/// The complete progress record of one player.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressStore {
    /// Progression state per module. Missing = locked.
    pub module_states: HashMap<ModuleId, ModuleState>,

    pub completed_tasks: HashMap<ModuleId, HashSet<TaskId>>,

    /// Task currently accepted in each module.
    pub current_tasks: HashMap<ModuleId, TaskId>,

    /// Module-scoped persisted fields.
    pub module_fields: HashMap<ModuleId, HashMap<String, StateValue>>,

    /// Module -> interactable -> field -> value.
    pub interactables: HashMap<ModuleId, HashMap<String, HashMap<String, StateValue>>>,
}

impl ProgressStore {
    /// Create a new empty progress store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle state of a module, `Locked` if never recorded.
    pub fn module_state(&self, module_id: &ModuleId) -> ModuleState {
        self.module_states.get(module_id).copied().unwrap_or_default()
    }

    /// Overwrite a module's lifecycle state.
    pub fn set_module_state(&mut self, module_id: &ModuleId, state: ModuleState) {
        self.module_states.insert(module_id.clone(), state);
    }

    /// Completed tasks of a module (empty if none).
    pub fn completed_tasks(&self, module_id: &ModuleId) -> HashSet<TaskId> {
        self.completed_tasks.get(module_id).cloned().unwrap_or_default()
    }

    /// Whether the task was completed within this module.
    pub fn is_task_completed(&self, module_id: &ModuleId, task_id: &TaskId) -> bool {
        self.completed_tasks
            .get(module_id)
            .map(|tasks| tasks.contains(task_id))
            .unwrap_or(false)
    }

    /// Record a completed task. Returns `false` if it was already recorded.
    pub fn mark_task_completed(&mut self, module_id: &ModuleId, task_id: &TaskId) -> bool {
        if self.current_tasks.get(module_id) == Some(task_id) {
            self.current_tasks.remove(module_id);
        }
        self.completed_tasks
            .entry(module_id.clone())
            .or_default()
            .insert(task_id.clone())
    }

    /// The task the player is working on in this module.
    pub fn current_task(&self, module_id: &ModuleId) -> Option<&TaskId> {
        self.current_tasks.get(module_id)
    }

    /// Make `task_id` the module's current task, replacing any other.
    pub fn set_current_task(&mut self, module_id: &ModuleId, task_id: TaskId) {
        self.current_tasks.insert(module_id.clone(), task_id);
    }

    /// A module state field.
    pub fn field(&self, module_id: &ModuleId, key: &str) -> Option<&StateValue> {
        self.module_fields.get(module_id).and_then(|f| f.get(key))
    }

    /// Set a module state field, creating the module's field map on first use.
    pub fn set_field(&mut self, module_id: &ModuleId, key: &str, value: StateValue) {
        self.module_fields
            .entry(module_id.clone())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// A field of one interactable in the module.
    pub fn interactable_state(
        &self,
        module_id: &ModuleId,
        interactable_id: &str,
        key: &str,
    ) -> Option<&StateValue> {
        self.interactables
            .get(module_id)
            .and_then(|m| m.get(interactable_id))
            .and_then(|f| f.get(key))
    }

    /// Set a field of one interactable in the module.
    pub fn set_interactable_state(
        &mut self,
        module_id: &ModuleId,
        interactable_id: &str,
        key: &str,
        value: StateValue,
    ) {
        self.interactables
            .entry(module_id.clone())
            .or_default()
            .entry(interactable_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

/// A [`ModuleContext`] over one module's slice of a [`ProgressStore`].
pub struct StoreContext<'a> {
    store: &'a mut ProgressStore,
    registry: &'a ModuleRegistry,
    module_id: ModuleId,
    submission_hook: Option<&'a SubmissionHook>,
}

impl<'a> StoreContext<'a> {
    /// A context scoped to `module_id`, with no submission hook.
    pub fn new(
        store: &'a mut ProgressStore,
        registry: &'a ModuleRegistry,
        module_id: ModuleId,
    ) -> Self {
        Self {
            store,
            registry,
            module_id,
            submission_hook: None,
        }
    }

    /// Install the UI hand-off used by `open_task_submission`.
    pub fn with_submission_hook(mut self, hook: Option<&'a SubmissionHook>) -> Self {
        self.submission_hook = hook;
        self
    }
}

impl ModuleContext for StoreContext<'_> {
    fn module_id(&self) -> Option<ModuleId> {
        Some(self.module_id.clone())
    }

    fn current_task_id(&self) -> Option<TaskId> {
        self.store.current_task(&self.module_id).cloned()
    }

    fn is_task_completed(&self, task_id: &TaskId) -> bool {
        self.store.is_task_completed(&self.module_id, task_id)
    }

    fn module_state_field(&self, key: &str) -> Option<StateValue> {
        self.store.field(&self.module_id, key).cloned()
    }

    fn set_module_state_field(&mut self, key: &str, value: StateValue) {
        self.store.set_field(&self.module_id, key, value);
    }

    fn interactable_state(&self, interactable_id: &str, key: &str) -> Option<StateValue> {
        self.store
            .interactable_state(&self.module_id, interactable_id, key)
            .cloned()
    }

    fn set_interactable_state(&mut self, interactable_id: &str, key: &str, value: StateValue) {
        self.store
            .set_interactable_state(&self.module_id, interactable_id, key, value);
    }

    fn accept_task(&mut self, task: &Task) {
        tracing::debug!(module = %self.module_id, task = %task.id, "task accepted");
        self.store.set_current_task(&self.module_id, task.id.clone());
    }

    fn is_module_completed(&self, module_id: &ModuleId) -> bool {
        if self.store.module_state(module_id) == ModuleState::Completed {
            return true;
        }
        self.registry
            .get(module_id)
            .map(|module| module.is_fully_completed(&self.store.completed_tasks(module_id)))
            .unwrap_or(false)
    }

    fn open_task_submission(&mut self, task_id: &TaskId) {
        match self.submission_hook {
            Some(hook) => hook(&self.module_id, task_id),
            None => tracing::debug!(task = %task_id, "no task submission handler installed"),
        }
    }
}
