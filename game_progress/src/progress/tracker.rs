//! Progress tracker - the unlock and completion workflow.
//!
//! A module is never auto-unlocked once it is unlocked or completed. Modules
//! whose requirement needs user interaction are only unlocked through
//! [`ProgressTracker::unlock_with_password`]. Completing a module's last task
//! re-evaluates every module that depends on it.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{ModuleRegistry, ProgressStore, StoreContext, SubmissionHook};
use crate::entities::{ModuleId, ModuleState, TaskId};
use crate::error::ProgressError;
use crate::requirements::{check_unlock_requirement, check_with_secret, UnlockRequirement};

/// Result of an unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The module moved from locked to unlocked.
    Unlocked,
    /// The module was already unlocked or completed; nothing changed.
    AlreadyOpen,
    /// The requirement is not satisfied by the current state.
    RequirementNotMet,
    /// The requirement needs a matching secret from the player.
    InteractionRequired,
}

/// Result of recording a task completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCompletion {
    /// `false` if the task was already recorded as completed.
    pub newly_completed: bool,
    /// The module became completed with this task.
    pub module_completed: bool,
    /// Dependent modules unlocked as a consequence.
    pub unlocked: Vec<ModuleId>,
}

/// Where a module stands before an unlock attempt.
enum Gate {
    Open,
    Ungated,
    Requirement(UnlockRequirement),
}

/// Owns the progress store and drives unlocks against the module registry.
pub struct ProgressTracker {
    registry: ModuleRegistry,
    store: ProgressStore,
    submission_hook: Option<SubmissionHook>,
}

impl ProgressTracker {
    /// Create a tracker with an empty progress store.
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            store: ProgressStore::new(),
            submission_hook: None,
        }
    }

    /// Resume from an existing progress store.
    pub fn with_store(mut self, store: ProgressStore) -> Self {
        self.store = store;
        self
    }

    /// Install the UI hand-off used when a task is opened for submission.
    pub fn with_submission_hook(
        mut self,
        hook: impl Fn(&ModuleId, &TaskId) + Send + Sync + 'static,
    ) -> Self {
        self.submission_hook = Some(Arc::new(hook));
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn module_state(&self, module_id: &ModuleId) -> ModuleState {
        self.store.module_state(module_id)
    }

    /// A context scoped to `module_id`, for dialogue and action execution.
    pub fn context(&mut self, module_id: &ModuleId) -> StoreContext<'_> {
        StoreContext::new(&mut self.store, &self.registry, module_id.clone())
            .with_submission_hook(self.submission_hook.as_ref())
    }

    /// Unlock `module_id` if its requirement is met without user interaction.
    #[instrument(skip_all, fields(module = %module_id))]
    pub async fn try_unlock(&mut self, module_id: &ModuleId) -> Result<UnlockOutcome, ProgressError> {
        let requirement = match self.gate(module_id)? {
            Gate::Open => return Ok(UnlockOutcome::AlreadyOpen),
            Gate::Ungated => return Ok(self.unlock(module_id)),
            Gate::Requirement(requirement) => requirement,
        };

        if requirement.requires_user_interaction() {
            debug!("module requires user interaction");
            return Ok(UnlockOutcome::InteractionRequired);
        }

        let met = {
            let ctx = self.context(module_id);
            check_unlock_requirement(&requirement, &ctx).await
        };

        if met {
            Ok(self.unlock(module_id))
        } else {
            debug!("unlock requirement not met");
            Ok(UnlockOutcome::RequirementNotMet)
        }
    }

    /// Unlock `module_id` using a secret supplied by the player.
    ///
    /// Requirements that need no interaction fall back to [`Self::try_unlock`].
    #[instrument(skip_all, fields(module = %module_id))]
    pub async fn unlock_with_password(
        &mut self,
        module_id: &ModuleId,
        secret: &str,
    ) -> Result<UnlockOutcome, ProgressError> {
        let requirement = match self.gate(module_id)? {
            Gate::Open => return Ok(UnlockOutcome::AlreadyOpen),
            Gate::Requirement(requirement) if requirement.requires_user_interaction() => requirement,
            _ => return self.try_unlock(module_id).await,
        };

        let met = {
            let ctx = self.context(module_id);
            check_with_secret(&requirement, &ctx, secret).await
        };

        if met {
            Ok(self.unlock(module_id))
        } else {
            debug!("secret rejected");
            Ok(UnlockOutcome::InteractionRequired)
        }
    }

    /// Record a completed task and propagate module completion.
    #[instrument(skip_all, fields(module = %module_id, task = %task_id))]
    pub async fn complete_task(
        &mut self,
        module_id: &ModuleId,
        task_id: &TaskId,
    ) -> Result<TaskCompletion, ProgressError> {
        let module = self
            .registry
            .get(module_id)
            .ok_or_else(|| ProgressError::UnknownModule(module_id.clone()))?;
        if module.task(task_id.as_str()).is_none() {
            return Err(ProgressError::UnknownTask {
                module: module_id.clone(),
                task: task_id.clone(),
            });
        }

        let mut completion = TaskCompletion {
            newly_completed: self.store.mark_task_completed(module_id, task_id),
            ..TaskCompletion::default()
        };

        let fully_completed = module.is_fully_completed(&self.store.completed_tasks(module_id));
        if !fully_completed || self.store.module_state(module_id) == ModuleState::Completed {
            return Ok(completion);
        }

        self.store.set_module_state(module_id, ModuleState::Completed);
        completion.module_completed = true;
        info!("module completed");

        let dependents: Vec<ModuleId> = self
            .registry
            .dependents_of(module_id)
            .map(|m| m.id.clone())
            .collect();
        for dependent in dependents {
            if self.try_unlock(&dependent).await? == UnlockOutcome::Unlocked {
                completion.unlocked.push(dependent);
            }
        }

        Ok(completion)
    }

    fn gate(&self, module_id: &ModuleId) -> Result<Gate, ProgressError> {
        let module = self
            .registry
            .get(module_id)
            .ok_or_else(|| ProgressError::UnknownModule(module_id.clone()))?;

        if self.store.module_state(module_id).is_open() {
            return Ok(Gate::Open);
        }

        Ok(match &module.unlock_requirement {
            Some(requirement) => Gate::Requirement(requirement.clone()),
            None => Gate::Ungated,
        })
    }

    fn unlock(&mut self, module_id: &ModuleId) -> UnlockOutcome {
        self.store.set_module_state(module_id, ModuleState::Unlocked);
        info!(module = %module_id, "module unlocked");
        UnlockOutcome::Unlocked
    }
}
