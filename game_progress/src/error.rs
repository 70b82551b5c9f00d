//! Error types for the progression layer.

use thiserror::Error;

use crate::entities::{ModuleId, TaskId};

/// Errors raised by the progress tracker and module registry.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Unknown module: {0}")]
    UnknownModule(ModuleId),

    #[error("Unknown task {task} in module {module}")]
    UnknownTask { module: ModuleId, task: TaskId },

    #[error("Invalid module configuration: {0}")]
    Config(#[from] toml::de::Error),
}
