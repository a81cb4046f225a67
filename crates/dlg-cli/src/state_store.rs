use std::fs;
use std::path::Path;

use dlg_core::DialogueError;

use crate::{
    map_cli_state_encode, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    PlayerState, PLAYER_STATE_SCHEMA,
};

pub(crate) fn save_player_state(path: &Path, state: &PlayerState) -> Result<(), DialogueError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)?;

    let payload = serde_json::to_string(state).map_err(map_cli_state_encode)?;
    fs::write(path, payload).map_err(map_cli_state_write)
}

pub(crate) fn load_player_state(path: &Path) -> Result<PlayerState, DialogueError> {
    if !path.exists() {
        return Err(DialogueError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;

    let state: PlayerState = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    if state.schema_version != PLAYER_STATE_SCHEMA {
        return Err(DialogueError::new(
            "CLI_STATE_SCHEMA",
            format!("Unsupported player state schema: {}", state.schema_version),
        ));
    }

    Ok(state)
}

#[cfg(test)]
mod state_store_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{create_runtime_for_scenario, load_source_by_tree_path, SessionConfig};

    fn sample_state() -> PlayerState {
        let root = temp_path("state-store-scenario");
        let tree_path = root.join("tree.json");
        write_file(&tree_path, SMALL_TREE);
        let scenario =
            load_source_by_tree_path(tree_path.to_string_lossy().as_ref()).expect("scenario");
        let runtime = create_runtime_for_scenario(&scenario, &SessionConfig::default())
            .expect("runtime should build");
        PlayerState {
            schema_version: PLAYER_STATE_SCHEMA.to_string(),
            scenario_id: scenario.id,
            snapshot: runtime.snapshot().expect("snapshot"),
        }
    }

    #[test]
    fn save_and_load_player_state_roundtrip() {
        let path = temp_path("state-store").join("nested").join("state.json");
        let state = sample_state();
        save_player_state(&path, &state).expect("save should pass");

        let loaded = load_player_state(&path).expect("load should pass");
        assert_eq!(loaded.scenario_id, state.scenario_id);
        assert_eq!(loaded.snapshot, state.snapshot);
    }

    #[test]
    fn load_player_state_reports_missing_invalid_and_schema_errors() {
        let missing = load_player_state(&temp_path("state-missing.json"))
            .expect_err("missing state should fail");
        assert_eq!(missing.code, "CLI_STATE_NOT_FOUND");

        let invalid_path = temp_path("state-invalid.json");
        write_file(&invalid_path, "{");
        let invalid = load_player_state(&invalid_path).expect_err("invalid state should fail");
        assert_eq!(invalid.code, "CLI_STATE_INVALID");

        let mut state = sample_state();
        state.schema_version = "dlg-player-state.v0".to_string();
        let schema_path = temp_path("state-schema.json");
        write_file(
            &schema_path,
            &serde_json::to_string(&state).expect("state should serialize"),
        );
        let schema = load_player_state(&schema_path).expect_err("old schema should fail");
        assert_eq!(schema.code, "CLI_STATE_SCHEMA");
    }
}
