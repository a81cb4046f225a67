use std::collections::BTreeMap;

use clap::{Args, Parser, Subcommand};
use dlg_core::{DialogueError, VarValue};

use crate::SessionConfig;

#[derive(Debug, Parser)]
#[command(name = "dlg-player")]
#[command(about = "Dialogue tree player and agent CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Tui(TuiArgs),
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
}

/// Flags shared by every command that starts a fresh session.
#[derive(Debug, Clone, Args)]
pub(crate) struct SessionArgs {
    #[arg(long = "tree")]
    pub(crate) tree: String,
    #[arg(long = "entry-node")]
    pub(crate) entry_node: Option<String>,
    /// Initial variable as `name=value`; repeatable.
    #[arg(long = "var")]
    pub(crate) vars: Vec<String>,
    #[arg(long = "memory-flag")]
    pub(crate) memory_flags: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "option")]
    pub(crate) option: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "tree")]
    pub(crate) tree: String,
}

impl SessionArgs {
    pub(crate) fn to_session_config(&self) -> Result<SessionConfig, DialogueError> {
        Ok(SessionConfig {
            entry_node: self.entry_node.clone(),
            variables: parse_var_args(&self.vars)?,
            memory_flags: self.memory_flags.iter().cloned().collect(),
        })
    }
}

pub(crate) fn parse_var_args(raw: &[String]) -> Result<BTreeMap<String, VarValue>, DialogueError> {
    let mut variables = BTreeMap::new();
    for item in raw {
        let Some((name, value)) = item.split_once('=') else {
            return Err(DialogueError::new(
                "CLI_VAR_INVALID",
                format!("Expected name=value, got \"{}\".", item),
            ));
        };
        let name = name.trim().trim_start_matches('$');
        if name.is_empty() {
            return Err(DialogueError::new(
                "CLI_VAR_INVALID",
                format!("Variable name is empty in \"{}\".", item),
            ));
        }
        variables.insert(name.to_string(), VarValue::parse_literal(value));
    }
    Ok(variables)
}

#[cfg(test)]
mod cli_args_tests {
    use super::*;

    #[test]
    fn cli_parses_agent_start_with_repeated_vars() {
        let cli = Cli::try_parse_from([
            "dlg-cli",
            "agent",
            "start",
            "--tree",
            "demo/tree.json",
            "--var",
            "gold=7",
            "--var",
            "$name='Ada'",
            "--memory-flag",
            "met_guard",
            "--state-out",
            "state.json",
        ])
        .expect("args should parse");

        let Mode::Agent(AgentArgs {
            command: AgentCommand::Start(start),
        }) = cli.command
        else {
            panic!("expected agent start");
        };
        assert_eq!(start.session.tree, "demo/tree.json");
        assert_eq!(start.session.entry_node, None);
        assert_eq!(start.session.vars, vec!["gold=7", "$name='Ada'"]);
        assert_eq!(start.session.memory_flags, vec!["met_guard"]);
        assert_eq!(start.state_out, "state.json");

        let session = start.session.to_session_config().expect("session should build");
        assert_eq!(session.variables.get("gold"), Some(&VarValue::Number(7.0)));
        assert!(session.memory_flags.contains("met_guard"));
    }

    #[test]
    fn cli_requires_option_for_choose() {
        let error = Cli::try_parse_from([
            "dlg-cli",
            "agent",
            "choose",
            "--state-in",
            "a.json",
            "--state-out",
            "b.json",
        ])
        .expect_err("missing option should fail");
        assert_eq!(error.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parse_var_args_uses_literal_rules() {
        let variables = parse_var_args(&[
            "gold=7".to_string(),
            "$name=\"Ada\"".to_string(),
            "brave=true".to_string(),
            "title=Sir".to_string(),
        ])
        .expect("vars should parse");

        assert_eq!(variables.get("gold"), Some(&VarValue::Number(7.0)));
        assert_eq!(variables.get("name"), Some(&VarValue::String("Ada".to_string())));
        assert_eq!(variables.get("brave"), Some(&VarValue::Bool(true)));
        assert_eq!(variables.get("title"), Some(&VarValue::String("Sir".to_string())));
    }

    #[test]
    fn parse_var_args_rejects_malformed_items() {
        let missing_eq = parse_var_args(&["gold".to_string()]).expect_err("no = should fail");
        assert_eq!(missing_eq.code, "CLI_VAR_INVALID");

        let empty_name = parse_var_args(&["=3".to_string()]).expect_err("empty name should fail");
        assert_eq!(empty_name.code, "CLI_VAR_INVALID");
    }
}
