use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Choice;
use crate::value::VarValue;

pub const SNAPSHOT_SCHEMA_V1: &str = "dlg-snapshot.v1";

/// One option offered to the player. `id` is the position in the offered
/// list and is what option selection takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueOption {
    pub id: usize,
    pub choice_id: String,
    pub line_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_node: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuntimeEvent {
    NodeStart { node_id: String },
    Line { line_id: String, node_id: String },
    Options { options: Vec<DialogueOption> },
    NodeComplete { node_id: String },
    DialogueComplete,
}

impl RuntimeEvent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NodeStart { .. } => "node_start",
            Self::Line { .. } => "line",
            Self::Options { .. } => "options",
            Self::NodeComplete { .. } => "node_complete",
            Self::DialogueComplete => "dialogue_complete",
        }
    }
}

/// Text resolved for a line id at the moment the line was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLine {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimePhase {
    Entering,
    Content,
    Choices,
    Exiting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuntimeState {
    Idle,
    Running {
        current_node_id: String,
        phase: RuntimePhase,
    },
    WaitingForOption {
        current_node_id: String,
        options: Vec<DialogueOption>,
    },
    Complete,
}

impl RuntimeState {
    pub fn current_node_id(&self) -> Option<&str> {
        match self {
            Self::Running {
                current_node_id, ..
            }
            | Self::WaitingForOption {
                current_node_id, ..
            } => Some(current_node_id.as_str()),
            Self::Idle | Self::Complete => None,
        }
    }
}

/// What a node yields for the current variable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedNode {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    pub is_end: bool,
    pub is_player_choice: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

impl ProcessedNode {
    pub fn end() -> Self {
        Self {
            content: String::new(),
            speaker: None,
            next_node_id: None,
            is_end: true,
            is_player_choice: false,
            choices: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub schema_version: String,
    pub tree_id: String,
    pub state: RuntimeState,
    pub pending_events: Vec<RuntimeEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_node: Option<ProcessedNode>,
    pub lines: BTreeMap<String, DisplayLine>,
    /// How often each node has been entered; part of every line id.
    #[serde(default)]
    pub node_visits: BTreeMap<String, u32>,
    pub variables: BTreeMap<String, VarValue>,
    #[serde(default)]
    pub memory_flags: Vec<String>,
}

#[cfg(test)]
mod events_tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_type_tags() {
        let json = serde_json::to_string(&RuntimeEvent::NodeStart {
            node_id: "start".to_string(),
        })
        .expect("event should serialize");
        assert_eq!(json, r#"{"type":"node_start","nodeId":"start"}"#);

        let json =
            serde_json::to_string(&RuntimeEvent::DialogueComplete).expect("event should serialize");
        assert_eq!(json, r#"{"type":"dialogue_complete"}"#);
    }

    #[test]
    fn state_reports_current_node_only_while_active() {
        let running = RuntimeState::Running {
            current_node_id: "a".to_string(),
            phase: RuntimePhase::Content,
        };
        assert_eq!(running.current_node_id(), Some("a"));
        assert_eq!(RuntimeState::Complete.current_node_id(), None);
        assert_eq!(RuntimeState::Idle.current_node_id(), None);
    }
}
