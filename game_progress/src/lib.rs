//! # Game Progress
//!
//! The progression crate - tasks, modules, and the rules that gate moving
//! between them. This crate is the single source of truth for player progress
//! and knows nothing about dialogue.
//!
//! ## Core Components
//!
//! - **context**: The `ModuleContext` capability every evaluator reads and writes through
//! - **conditions**: Pure boolean predicates (task, state, interactable, and/or, custom)
//! - **requirements**: Asynchronous unlock requirements, including password gates
//! - **progress**: The progress store, module registry, and unlock workflow

pub mod conditions;
pub mod context;
pub mod entities;
pub mod error;
pub mod progress;
pub mod requirements;

pub use conditions::*;
pub use context::*;
pub use entities::*;
pub use error::*;
pub use progress::*;
pub use requirements::*;
