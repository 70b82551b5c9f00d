//! Conditions - pure boolean predicates over context state.
//!
//! A [`Condition`] gates dialogue choices, dialogue entry points, and task
//! availability. Evaluation is synchronous, total, and never mutates state.
//! `and`/`or` evaluate children left to right and stop at the first decisive
//! result; that early exit is not part of the contract, so custom predicates
//! must not rely on being run or skipped.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::{ModuleContext, StateValue};
use crate::entities::TaskId;

type PredicateFn = dyn Fn(&dyn ModuleContext) -> bool + Send + Sync;

/// A caller-supplied predicate used by [`Condition::Custom`].
#[derive(Clone)]
pub struct ConditionFn(Arc<PredicateFn>);

impl ConditionFn {
    /// Wrap a predicate.
    pub fn new(predicate: impl Fn(&dyn ModuleContext) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Run the predicate against `ctx`.
    pub fn call(&self, ctx: &dyn ModuleContext) -> bool {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for ConditionFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConditionFn(..)")
    }
}

/// A composable predicate over the module context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Condition {
    TaskComplete {
        task: TaskId,
    },

    /// The task is the player's current task.
    TaskActive {
        task: TaskId,
    },

    /// A module-scoped persisted field equals `value`.
    StateCheck {
        key: String,
        value: StateValue,
    },

    InteractableState {
        interactable_id: String,
        key: String,
        value: StateValue,
    },

    /// Same check as `StateCheck`, spelled the way unlock requirements spell it.
    ModuleState {
        key: String,
        value: StateValue,
    },

    And {
        conditions: Vec<Condition>,
    },

    Or {
        conditions: Vec<Condition>,
    },

    /// Code-only predicate; never serialized.
    #[serde(skip)]
    Custom(ConditionFn),
}

impl Condition {
    /// The task has been completed.
    pub fn task_complete(task: impl Into<TaskId>) -> Self {
        Condition::TaskComplete { task: task.into() }
    }

    /// The task is the current task.
    pub fn task_active(task: impl Into<TaskId>) -> Self {
        Condition::TaskActive { task: task.into() }
    }

    /// A module field equals `value`.
    pub fn state_check(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Condition::StateCheck {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A field of an interactable equals `value`.
    pub fn interactable_state(
        interactable_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Self {
        Condition::InteractableState {
            interactable_id: interactable_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Same as [`Condition::state_check`].
    pub fn module_state(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Condition::ModuleState {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when every condition holds. Empty is true.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// True when any condition holds. Empty is false.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// A code-only predicate.
    pub fn custom(predicate: impl Fn(&dyn ModuleContext) -> bool + Send + Sync + 'static) -> Self {
        Condition::Custom(ConditionFn::new(predicate))
    }

    /// Evaluate this condition against the context.
    pub fn evaluate(&self, ctx: &dyn ModuleContext) -> bool {
        let result = match self {
            Condition::TaskComplete { task } => ctx.is_task_completed(task),
            Condition::TaskActive { task } => ctx.current_task_id().as_ref() == Some(task),
            Condition::StateCheck { key, value } | Condition::ModuleState { key, value } => {
                ctx.module_state_field(key).as_ref() == Some(value)
            }
            Condition::InteractableState {
                interactable_id,
                key,
                value,
            } => ctx.interactable_state(interactable_id, key).as_ref() == Some(value),
            Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(ctx)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(ctx)),
            Condition::Custom(predicate) => predicate.call(ctx),
        };

        tracing::trace!(condition = self.kind(), result, "evaluated condition");
        result
    }

    /// Short name of the variant, matching its serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::TaskComplete { .. } => "task-complete",
            Condition::TaskActive { .. } => "task-active",
            Condition::StateCheck { .. } => "state-check",
            Condition::InteractableState { .. } => "interactable-state",
            Condition::ModuleState { .. } => "module-state",
            Condition::And { .. } => "and",
            Condition::Or { .. } => "or",
            Condition::Custom(_) => "custom",
        }
    }
}

/// Evaluate `condition` against `ctx`.
pub fn evaluate_condition(condition: &Condition, ctx: &dyn ModuleContext) -> bool {
    condition.evaluate(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContext;
    use serde_json::json;

    fn yes() -> Condition {
        Condition::custom(|_| true)
    }

    fn no() -> Condition {
        Condition::custom(|_| false)
    }

    #[test]
    fn test_and_truth_table() {
        let ctx = MemoryContext::new();
        assert!(Condition::and([yes(), yes()]).evaluate(&ctx));
        assert!(!Condition::and([yes(), no()]).evaluate(&ctx));
        assert!(!Condition::and([no(), yes()]).evaluate(&ctx));
    }

    #[test]
    fn test_or_truth_table() {
        let ctx = MemoryContext::new();
        assert!(Condition::or([no(), yes()]).evaluate(&ctx));
        assert!(Condition::or([yes(), no()]).evaluate(&ctx));
        assert!(!Condition::or([no(), no()]).evaluate(&ctx));
    }

    #[test]
    fn test_nested_composition() {
        let ctx = MemoryContext::new();

        assert!(Condition::and([Condition::or([no(), yes()]), yes()]).evaluate(&ctx));
        assert!(!Condition::and([Condition::or([no(), no()]), yes()]).evaluate(&ctx));
        assert!(Condition::or([Condition::and([yes(), no()]), Condition::and([yes(), yes()])])
            .evaluate(&ctx));
    }

    #[test]
    fn test_task_conditions() {
        let ctx = MemoryContext::new()
            .with_completed_task("done")
            .with_current_task("doing");

        assert!(Condition::task_complete("done").evaluate(&ctx));
        assert!(!Condition::task_complete("doing").evaluate(&ctx));
        assert!(Condition::task_active("doing").evaluate(&ctx));
        assert!(!Condition::task_active("done").evaluate(&ctx));
    }

    #[test]
    fn test_state_checks() {
        let ctx = MemoryContext::new()
            .with_field("gate", "open")
            .with_field("attempts", 3)
            .with_interactable_state("chest", "locked", false);

        assert!(Condition::state_check("gate", "open").evaluate(&ctx));
        assert!(!Condition::state_check("gate", "closed").evaluate(&ctx));
        assert!(Condition::module_state("attempts", 3).evaluate(&ctx));
        assert!(!Condition::module_state("attempts", "3").evaluate(&ctx));
        assert!(Condition::interactable_state("chest", "locked", false).evaluate(&ctx));
        assert!(!Condition::interactable_state("chest", "opened", true).evaluate(&ctx));
    }

    #[test]
    fn test_missing_field_never_equals_null() {
        let ctx = MemoryContext::new();
        assert!(!Condition::state_check("absent", json!(null)).evaluate(&ctx));
    }

    #[test]
    fn test_custom_receives_context() {
        let ctx = MemoryContext::new().in_module("intro");
        let condition = Condition::custom(|ctx| {
            ctx.module_id().map(|id| id.as_str() == "intro").unwrap_or(false)
        });

        assert!(evaluate_condition(&condition, &ctx));
    }

    #[test]
    fn test_condition_deserializes_from_tagged_table() {
        let condition: Condition = serde_json::from_value(json!({
            "type": "and",
            "conditions": [
                { "type": "task-complete", "task": "t1" },
                { "type": "interactable-state", "interactableId": "door", "key": "open", "value": true }
            ]
        }))
        .unwrap();

        let ctx = MemoryContext::new()
            .with_completed_task("t1")
            .with_interactable_state("door", "open", true);

        assert_eq!(condition.kind(), "and");
        assert!(condition.evaluate(&ctx));
    }
}
