use std::path::Path;

use dlg_core::DialogueError;
use tracing::debug;

use crate::{
    create_runtime_for_scenario, emit_boundary_with_saved_state, load_runtime_from_state_for_ref,
    load_source_by_tree_path, run_to_boundary, AgentArgs, AgentCommand, ChooseArgs, StartArgs,
};

pub(crate) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let scenario = load_source_by_tree_path(&args.session.tree)?;
    let session = args.session.to_session_config()?;
    let mut runtime = create_runtime_for_scenario(&scenario, &session)?;

    let boundary = run_to_boundary(&mut runtime)?;
    emit_boundary_with_saved_state(&runtime, boundary, &args.state_out, &scenario.id)
}

fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    let (scenario, state, mut runtime) = load_runtime_from_state_for_ref(Path::new(&args.state_in))?;
    debug!(option = args.option, scenario = %scenario.id, "agent choose");

    runtime.set_selected_option(args.option)?;
    let boundary = run_to_boundary(&mut runtime)?;
    emit_boundary_with_saved_state(&runtime, boundary, &args.state_out, &state.scenario_id)
}
