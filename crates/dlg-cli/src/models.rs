use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use dlg_core::{DisplayLine, RuntimeSnapshot, VarValue};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "dlg-player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScenario {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) tree_path: PathBuf,
    pub(crate) tree_json: String,
}

/// How a fresh session is started; kept around so the TUI can restart.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionConfig {
    pub(crate) entry_node: Option<String>,
    pub(crate) variables: BTreeMap<String, VarValue>,
    pub(crate) memory_flags: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) scenario_id: String,
    pub(crate) snapshot: RuntimeSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Options,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) lines: Vec<DisplayLine>,
    pub(crate) choices: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct TuiCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) scenario: &'a LoadedScenario,
    pub(crate) session: &'a SessionConfig,
}

pub(crate) fn format_display_line(line: &DisplayLine) -> String {
    match &line.speaker {
        Some(speaker) => format!("{}: {}", speaker, line.text),
        None => line.text.clone(),
    }
}
