//! Entry resolution and the synthesized task menu.

use futures_util::FutureExt;
use game_progress::{ModuleContext, ModuleData, Task};
use std::sync::Arc;
use tracing::{debug, warn};

use super::DialogueEngine;
use crate::actions::Action;
use crate::node::{Choice, DialogueNode, NodeRef};
use crate::npc::Npc;

/// Progress of a task from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task is the player's current task.
    InProgress,
    /// Not completed, not current, and its requirement (if any) holds.
    Available,
}

/// Status of `task`, or `None` if it is completed or still locked.
pub fn task_status(task: &Task, ctx: &dyn ModuleContext) -> Option<TaskStatus> {
    if ctx.is_task_completed(&task.id) {
        return None;
    }
    if ctx.current_task_id().as_ref() == Some(&task.id) {
        return Some(TaskStatus::InProgress);
    }
    task.requirement
        .as_ref()
        .map_or(true, |requirement| requirement.evaluate(ctx))
        .then_some(TaskStatus::Available)
}

impl DialogueEngine {
    /// The node a conversation with `npc` starts on.
    ///
    /// The task menu takes priority whenever the NPC has an in-progress or
    /// available task. Otherwise the NPC's tree entry is used.
    pub fn initial_node(
        &self,
        npc: &Npc,
        module: &ModuleData,
        ctx: &dyn ModuleContext,
    ) -> Option<NodeRef> {
        if npc.has_tasks() {
            if let Some(root) = self.root_dialogue(npc, module, ctx) {
                return Some(root);
            }
        }

        let Some(tree) = npc.dialogue.as_ref() else {
            debug!(npc = %npc.id, "NPC has nothing to say");
            return None;
        };
        Some(Arc::clone(tree.entry_node(ctx)))
    }

    /// Synthesize the task menu for `npc`, with ID `{npc}_root`.
    ///
    /// Returns `None` unless at least one of the NPC's tasks is in progress or
    /// available.
    pub fn root_dialogue(
        &self,
        npc: &Npc,
        module: &ModuleData,
        ctx: &dyn ModuleContext,
    ) -> Option<NodeRef> {
        let offered: Vec<(&Task, TaskStatus)> = npc
            .tasks
            .iter()
            .filter_map(|task_id| {
                let task = module.task(task_id.as_str());
                if task.is_none() {
                    warn!(
                        npc = %npc.id,
                        task = %task_id,
                        module = %module.id,
                        "NPC offers a task the module does not define"
                    );
                }
                task
            })
            .filter_map(|task| task_status(task, ctx).map(|status| (task, status)))
            .collect();

        if offered.is_empty() {
            return None;
        }

        let mut root = DialogueNode::new(
            format!("{}_root", npc.id),
            [self.config.root_prompt.clone()],
        );

        if let Some(entry) = talk_target(npc, ctx) {
            let talk = Choice::new(self.config.talk_text(&npc.name)).to(entry);
            root = root.with_choice("talk", talk);
        }

        let task_count = offered.len();
        for (task, status) in offered {
            root = root.with_choice(format!("task_{}", task.id), self.task_choice(task, status));
        }

        let goodbye = Choice::new(self.config.goodbye_text.clone()).close();
        root = root.with_choice("goodbye", goodbye);

        debug!(npc = %npc.id, tasks = task_count, "synthesized root dialogue");
        Some(Arc::new(root))
    }

    fn task_choice(&self, task: &Task, status: TaskStatus) -> Choice {
        let label = match status {
            TaskStatus::InProgress => &self.config.in_progress_label,
            TaskStatus::Available => &self.config.available_label,
        };
        let text = self.config.task_choice_text(&task.name, label);

        let action = match status {
            TaskStatus::Available => Action::accept_task(task.clone()),
            TaskStatus::InProgress => {
                let task_id = task.id.clone();
                Action::call_function(move |ctx| {
                    let task_id = task_id.clone();
                    async move {
                        ctx.open_task_submission(&task_id);
                        Ok(())
                    }
                    .boxed()
                })
            }
        };

        Choice::new(text).close().with_action(action)
    }
}

/// The NPC's entry node, if the tree has anything worth talking about.
fn talk_target(npc: &Npc, ctx: &dyn ModuleContext) -> Option<NodeRef> {
    let tree = npc.dialogue.as_ref().filter(|tree| !tree.is_empty())?;
    let entry = tree.entry_node(ctx);
    entry.has_content().then(|| Arc::clone(entry))
}
