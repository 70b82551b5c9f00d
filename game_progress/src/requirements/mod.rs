//! Unlock requirements - conditions that gate progression between modules and tasks.
//!
//! Requirements mirror [`Condition`](crate::conditions::Condition) but are
//! evaluated asynchronously, so custom checks may perform I/O. The `password`
//! variant is never satisfied by passive evaluation: it always needs a secret
//! supplied by the player.

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::{ModuleContext, StateValue};
use crate::entities::{ModuleId, TaskId};

type CheckFn = dyn for<'a> Fn(&'a dyn ModuleContext) -> BoxFuture<'a, bool> + Send + Sync;

/// A caller-supplied asynchronous check used by [`UnlockRequirement::Custom`].
#[derive(Clone)]
pub struct RequirementCheck(Arc<CheckFn>);

impl RequirementCheck {
    /// Wrap an async check.
    pub fn new<F>(check: F) -> Self
    where
        F: for<'a> Fn(&'a dyn ModuleContext) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Run the check against `ctx`.
    pub fn call<'a>(&self, ctx: &'a dyn ModuleContext) -> BoxFuture<'a, bool> {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for RequirementCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RequirementCheck(..)")
    }
}

/// A requirement gating a module or task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UnlockRequirement {
    /// A task in the context's module is completed. Fails closed without a module.
    TaskComplete { task_id: TaskId },

    ModuleComplete { module_id: ModuleId },

    StateCheck { key: String, value: StateValue },

    /// Satisfied only by an explicit, matching secret from the player.
    Password { password: String },

    And { requirements: Vec<UnlockRequirement> },

    Or { requirements: Vec<UnlockRequirement> },

    /// Code-only check; never serialized.
    #[serde(skip)]
    Custom(RequirementCheck),
}

impl UnlockRequirement {
    /// A task of the module being unlocked is completed.
    pub fn task_complete(task_id: impl Into<TaskId>) -> Self {
        UnlockRequirement::TaskComplete {
            task_id: task_id.into(),
        }
    }

    /// Another module is completed.
    pub fn module_complete(module_id: impl Into<ModuleId>) -> Self {
        UnlockRequirement::ModuleComplete {
            module_id: module_id.into(),
        }
    }

    /// A module field equals `value`.
    pub fn state_check(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        UnlockRequirement::StateCheck {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Unlocked only by entering `password`.
    pub fn password(password: impl Into<String>) -> Self {
        UnlockRequirement::Password {
            password: password.into(),
        }
    }

    /// Every requirement holds.
    pub fn and(requirements: impl IntoIterator<Item = UnlockRequirement>) -> Self {
        UnlockRequirement::And {
            requirements: requirements.into_iter().collect(),
        }
    }

    /// At least one requirement holds.
    pub fn or(requirements: impl IntoIterator<Item = UnlockRequirement>) -> Self {
        UnlockRequirement::Or {
            requirements: requirements.into_iter().collect(),
        }
    }

    /// A code-only async check.
    pub fn custom<F>(check: F) -> Self
    where
        F: for<'a> Fn(&'a dyn ModuleContext) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        UnlockRequirement::Custom(RequirementCheck::new(check))
    }

    /// Check whether this requirement is, or contains, a `password`.
    pub fn requires_user_interaction(&self) -> bool {
        match self {
            UnlockRequirement::Password { .. } => true,
            UnlockRequirement::And { requirements } | UnlockRequirement::Or { requirements } => {
                requirements.iter().any(Self::requires_user_interaction)
            }
            _ => false,
        }
    }

    /// Module IDs referenced by `module-complete` leaves, deduplicated, in first-seen order.
    pub fn module_dependencies(&self) -> Vec<ModuleId> {
        let mut dependencies = Vec::new();
        self.collect_module_dependencies(&mut dependencies);
        dependencies
    }

    fn collect_module_dependencies(&self, out: &mut Vec<ModuleId>) {
        match self {
            UnlockRequirement::ModuleComplete { module_id } => {
                if !out.contains(module_id) {
                    out.push(module_id.clone());
                }
            }
            UnlockRequirement::And { requirements } | UnlockRequirement::Or { requirements } => {
                for requirement in requirements {
                    requirement.collect_module_dependencies(out);
                }
            }
            _ => {}
        }
    }
}

/// Check whether `requirement` is met by the current state.
///
/// `password` leaves always evaluate to `false` here.
pub fn check_unlock_requirement<'a>(
    requirement: &'a UnlockRequirement,
    ctx: &'a dyn ModuleContext,
) -> BoxFuture<'a, bool> {
    evaluate(requirement, ctx, None)
}

/// Check `requirement`, treating each `password` leaf as satisfied iff `secret`
/// equals its stored password exactly.
pub fn check_with_secret<'a>(
    requirement: &'a UnlockRequirement,
    ctx: &'a dyn ModuleContext,
    secret: &'a str,
) -> BoxFuture<'a, bool> {
    evaluate(requirement, ctx, Some(secret))
}

fn evaluate<'a>(
    requirement: &'a UnlockRequirement,
    ctx: &'a dyn ModuleContext,
    secret: Option<&'a str>,
) -> BoxFuture<'a, bool> {
    async move {
        match requirement {
            UnlockRequirement::TaskComplete { task_id } => {
                if ctx.module_id().is_none() {
                    tracing::debug!(task = %task_id, "task requirement checked without a module");
                    return false;
                }
                ctx.is_task_completed(task_id)
            }
            UnlockRequirement::ModuleComplete { module_id } => ctx.is_module_completed(module_id),
            UnlockRequirement::StateCheck { key, value } => {
                ctx.module_state_field(key).as_ref() == Some(value)
            }
            UnlockRequirement::Password { password } => secret == Some(password.as_str()),
            UnlockRequirement::And { requirements } => {
                for requirement in requirements {
                    if !evaluate(requirement, ctx, secret).await {
                        return false;
                    }
                }
                true
            }
            UnlockRequirement::Or { requirements } => {
                for requirement in requirements {
                    if evaluate(requirement, ctx, secret).await {
                        return true;
                    }
                }
                false
            }
            UnlockRequirement::Custom(check) => check.call(ctx).await,
        }
    }
    .boxed()
}
