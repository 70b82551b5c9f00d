//! Non-player characters that offer dialogue and tasks.

use game_progress::TaskId;
use serde::{Deserialize, Serialize};

use crate::tree::DialogueTree;

/// Position on the module map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A character the player can talk to.
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub dialogue: Option<DialogueTree>,
    /// IDs of module tasks this NPC hands out.
    pub tasks: Vec<TaskId>,
}

impl Npc {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: Position::default(),
            dialogue: None,
            tasks: Vec::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_dialogue(mut self, tree: DialogueTree) -> Self {
        self.dialogue = Some(tree);
        self
    }

    pub fn with_task(mut self, task_id: impl Into<TaskId>) -> Self {
        self.tasks.push(task_id.into());
        self
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }
}
