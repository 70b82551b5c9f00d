//! Module definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ModuleId, Task, TaskId};
use crate::requirements::UnlockRequirement;

/// Progression state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    #[default]
    Locked,
    Unlocked,
    Completed,
}

impl ModuleState {
    /// Check whether the module is open to the player (unlocked or completed).
    pub fn is_open(&self) -> bool {
        matches!(self, ModuleState::Unlocked | ModuleState::Completed)
    }
}

/// Static definition of a module: its tasks and the requirement gating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleData {
    pub id: ModuleId,
    pub name: String,

    /// Tasks in authoring order.
    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_requirement: Option<UnlockRequirement>,
}

impl ModuleData {
    /// Create a new module with no tasks and no unlock requirement.
    pub fn new(id: impl Into<ModuleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks: Vec::new(),
            unlock_requirement: None,
        }
    }

    /// Add a task.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Set the unlock requirement.
    pub fn with_unlock_requirement(mut self, requirement: UnlockRequirement) -> Self {
        self.unlock_requirement = Some(requirement);
        self
    }

    /// Look up a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id.as_str() == id)
    }

    /// Check whether every task in this module appears in `completed`.
    ///
    /// A module without tasks is never fully completed.
    pub fn is_fully_completed(&self, completed: &HashSet<TaskId>) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| completed.contains(&t.id))
    }

    /// Module IDs this module's unlock requirement depends on.
    pub fn dependencies(&self) -> Vec<ModuleId> {
        self.unlock_requirement
            .as_ref()
            .map(UnlockRequirement::module_dependencies)
            .unwrap_or_default()
    }
}
