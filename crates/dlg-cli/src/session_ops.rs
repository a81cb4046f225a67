use std::path::Path;

use dlg_api::{create_runtime, resume_runtime, CreateRuntimeOptions, ResumeRuntimeOptions};
use dlg_core::DialogueError;
use dlg_runtime::DialogueRuntime;

use crate::{
    emit_boundary, load_player_state, load_source_by_ref, save_player_state, BoundaryEvent,
    BoundaryResult, LoadedScenario, PlayerState, SessionConfig, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_runtime_for_scenario(
    scenario: &LoadedScenario,
    session: &SessionConfig,
) -> Result<DialogueRuntime, DialogueError> {
    create_runtime(CreateRuntimeOptions {
        tree_json: scenario.tree_json.clone(),
        entry_node: session.entry_node.clone(),
        variables: session.variables.clone(),
        memory_flags: session.memory_flags.clone(),
    })
}

pub(crate) fn resume_runtime_for_state(
    scenario: &LoadedScenario,
    state: &PlayerState,
) -> Result<DialogueRuntime, DialogueError> {
    resume_runtime(ResumeRuntimeOptions {
        tree_json: scenario.tree_json.clone(),
        snapshot: state.snapshot.clone(),
    })
}

pub(crate) fn save_runtime_state(
    path: &Path,
    runtime: &DialogueRuntime,
    scenario_id: &str,
) -> Result<(), DialogueError> {
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        scenario_id: scenario_id.to_string(),
        snapshot: runtime.snapshot()?,
    };
    save_player_state(path, &state)
}

pub(crate) fn load_runtime_from_state_for_ref(
    path: &Path,
) -> Result<(LoadedScenario, PlayerState, DialogueRuntime), DialogueError> {
    let state = load_player_state(path)?;
    let scenario = load_source_by_ref(&state.scenario_id)?;
    let runtime = resume_runtime_for_state(&scenario, &state)?;
    Ok((scenario, state, runtime))
}

pub(crate) fn load_runtime_from_state_for_scenario(
    path: &Path,
    scenario: &LoadedScenario,
) -> Result<(PlayerState, DialogueRuntime), DialogueError> {
    let state = load_player_state(path)?;
    if state.scenario_id != scenario.id {
        return Err(DialogueError::new(
            "TUI_STATE_SCENARIO_MISMATCH",
            format!(
                "State scenario mismatch. expected={} actual={}",
                scenario.id, state.scenario_id
            ),
        ));
    }
    let runtime = resume_runtime_for_state(scenario, &state)?;
    Ok((state, runtime))
}

/// Persists the runtime only while it waits for an option; a finished
/// dialogue has nothing left to resume.
pub(crate) fn emit_boundary_with_saved_state(
    runtime: &DialogueRuntime,
    boundary: BoundaryResult,
    state_out: &str,
    scenario_id: &str,
) -> Result<i32, DialogueError> {
    if boundary.event == BoundaryEvent::Options {
        save_runtime_state(Path::new(state_out), runtime, scenario_id)?;
        emit_boundary(boundary, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_boundary(boundary, None);
    Ok(0)
}
