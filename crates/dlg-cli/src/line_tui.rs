use std::io::{self, BufRead, Write};
use std::path::Path;

use dlg_core::DialogueError;
use dlg_runtime::DialogueRuntime;

use crate::{
    create_runtime_for_scenario, format_display_line, load_runtime_from_state_for_scenario,
    map_tui_io, run_to_boundary, save_runtime_state, BoundaryEvent, TuiCommandAction,
    TuiCommandContext,
};

const LINE_MODE_HELP: &str = "commands: :help :save :load :restart :quit";

pub(crate) fn run_tui_line_mode(
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_tui_line_mode_with_io(context, runtime, &mut reader, &mut writer)
}

pub(crate) fn run_tui_line_mode_with_io(
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "{}", context.scenario.title).map_err(map_tui_io)?;
    writeln!(writer, "{}", LINE_MODE_HELP).map_err(map_tui_io)?;

    loop {
        let boundary = run_to_boundary(runtime)?;
        for line in &boundary.lines {
            writeln!(writer).map_err(map_tui_io)?;
            writeln!(writer, "{}", format_display_line(line)).map_err(map_tui_io)?;
        }

        if boundary.event == BoundaryEvent::End {
            writeln!(writer).map_err(map_tui_io)?;
            writeln!(writer, "[END]").map_err(map_tui_io)?;
            return Ok(0);
        }

        writeln!(writer).map_err(map_tui_io)?;
        for (index, text) in &boundary.choices {
            writeln!(writer, "  [{}] {}", index, text).map_err(map_tui_io)?;
        }

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut messages = Vec::new();
            let mut emit = |line: String| messages.push(line);
            let action = handle_tui_command(raw.trim(), context, runtime, &mut emit)?;
            for message in messages {
                writeln!(writer, "{}", message).map_err(map_tui_io)?;
            }
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }

            let selected = match raw.trim().parse::<usize>() {
                Ok(index) => runtime.set_selected_option(index),
                Err(_) => Err(DialogueError::new(
                    "TUI_CHOICE_PARSE",
                    format!("Invalid option index: {}", raw),
                )),
            };
            match selected {
                Ok(()) => break,
                Err(error) => writeln!(writer, "{}", error).map_err(map_tui_io)?,
            }
        }
    }
}

pub(crate) fn handle_tui_command(
    raw: &str,
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, DialogueError> {
    match raw {
        ":help" => {
            emit(LINE_MODE_HELP.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":save" => {
            save_runtime_state(Path::new(context.state_file), runtime, &context.scenario.id)?;
            emit(format!("saved: {}", context.state_file));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => {
            let (_, resumed) =
                load_runtime_from_state_for_scenario(Path::new(context.state_file), context.scenario)?;
            *runtime = resumed;
            emit(format!("loaded: {}", context.state_file));
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":restart" => {
            *runtime = create_runtime_for_scenario(context.scenario, context.session)?;
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

/// `None` once the reader is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_tui_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
