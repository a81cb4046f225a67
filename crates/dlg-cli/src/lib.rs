use std::ffi::OsString;

use clap::Parser;
use dlg_core::DialogueError;

mod agent;
mod boundary_runner;
mod check;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod session_ops;
mod source_loader;
mod state_store;
mod tui;
mod tui_actions;
mod tui_render;
mod tui_state;

pub(crate) use boundary_runner::{emit_boundary, run_to_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, CheckArgs, ChooseArgs, Cli, Mode, StartArgs, TuiArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_source_path, map_cli_source_read, map_cli_state_encode,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_tui_io,
};
pub(crate) use line_tui::run_tui_line_mode;
pub(crate) use models::{
    format_display_line, BoundaryEvent, BoundaryResult, LoadedScenario, PlayerState,
    SessionConfig, TuiCommandAction, TuiCommandContext, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_runtime_for_scenario, emit_boundary_with_saved_state, load_runtime_from_state_for_ref,
    load_runtime_from_state_for_scenario, save_runtime_state,
};
pub(crate) use source_loader::{load_source_by_ref, load_source_by_tree_path};
pub(crate) use state_store::{load_player_state, save_player_state};

const DEFAULT_STATE_FILE: &str = ".dlg/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Tui(args) => run_tui(args),
        Mode::Check(args) => check::run_check(args),
    }
}

fn run_tui(args: TuiArgs) -> Result<i32, DialogueError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let scenario = load_source_by_tree_path(&args.session.tree)?;
    let session = args.session.to_session_config()?;
    let mut runtime = create_runtime_for_scenario(&scenario, &session)?;

    let context = TuiCommandContext {
        state_file: &state_file,
        scenario: &scenario,
        session: &session,
    };
    tui::run_tui(&context, &mut runtime)
}
