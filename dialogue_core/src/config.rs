//! Presentation settings for synthesized dialogue.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the dialogue engine's synthesized content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Task names longer than this many characters are truncated.
    pub max_task_name_length: usize,

    /// Appended to a truncated task name.
    pub ellipsis: String,

    pub in_progress_label: String,

    pub available_label: String,

    /// Text of the root menu's talk choice. `{name}` is replaced by the NPC name.
    pub talk_template: String,

    pub goodbye_text: String,

    /// Line shown on the synthesized root node.
    pub root_prompt: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_task_name_length: 40,
            ellipsis: "...".to_string(),
            in_progress_label: "In Progress".to_string(),
            available_label: "Available".to_string(),
            talk_template: "Talk to {name}...".to_string(),
            goodbye_text: "Goodbye".to_string(),
            root_prompt: "What would you like to do?".to_string(),
        }
    }
}

impl DialogueConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Text of a task choice: `"{name} - {label}"`.
    ///
    /// Names up to `max_task_name_length` characters are kept whole. Longer
    /// names are cut so the whole text fits in `max_task_name_length` plus the
    /// ellipsis.
    pub fn task_choice_text(&self, name: &str, label: &str) -> String {
        let suffix = format!(" - {label}");
        if name.chars().count() <= self.max_task_name_length {
            return format!("{name}{suffix}");
        }

        let ellipsis_len = self.ellipsis.chars().count();
        let limit = self.max_task_name_length + ellipsis_len;
        let keep = limit.saturating_sub(suffix.chars().count() + ellipsis_len);

        let mut text: String = name.chars().take(keep).collect();
        text.push_str(&self.ellipsis);
        text.push_str(&suffix);
        text
    }

    pub fn talk_text(&self, npc_name: &str) -> String {
        self.talk_template.replace("{name}", npc_name)
    }
}
