//! Task definitions.

use serde::{Deserialize, Serialize};

use super::TaskId;
use crate::conditions::Condition;

/// A validated unit of work the player completes to progress through a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Gate that must hold before the task is offered. `None` = always offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Condition>,
}

impl Task {
    /// Create a new task with the given ID and display name.
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            requirement: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the condition that gates whether the task is offered.
    pub fn with_requirement(mut self, requirement: Condition) -> Self {
        self.requirement = Some(requirement);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("fix-bug", "Fix the bug")
            .with_description("Find and fix the off-by-one")
            .with_requirement(Condition::task_complete("read-code"));

        assert_eq!(task.id, TaskId::new("fix-bug"));
        assert_eq!(task.name, "Fix the bug");
        assert!(task.requirement.is_some());
    }

    #[test]
    fn test_task_deserializes_without_optional_fields() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","name":"First"}"#).unwrap();

        assert_eq!(task.id.as_str(), "t1");
        assert!(task.description.is_empty());
        assert!(task.requirement.is_none());
    }
}
