//! # Dialogue Core
//!
//! Conversation graphs for module NPCs. This crate builds dialogue trees,
//! resolves where a conversation starts and where each choice leads, and
//! applies the side effects attached to choices. All progress is read and
//! written through `game_progress::ModuleContext`.
//!
//! ## Core Components
//!
//! - **node**: Dialogue nodes, choices, and their targets
//! - **actions**: Side effects executed when a choice is taken
//! - **tree**: The validated dialogue graph and its builder
//! - **engine**: Entry resolution, the synthesized task menu, and traversal
//! - **npc**: Characters that own dialogue and hand out tasks

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod node;
pub mod npc;
pub mod tree;

pub use actions::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use node::*;
pub use npc::*;
pub use tree::*;
