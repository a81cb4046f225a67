use dlg_core::{DialogueError, DialogueOption, DisplayLine, RuntimeEvent, RuntimeState};
use dlg_runtime::DialogueRuntime;

use crate::{json_string, BoundaryEvent, BoundaryResult};

// Trees may loop without ever offering options.
const BOUNDARY_EVENT_GUARD: usize = 10_000;

/// Drains events until the runtime waits for an option or finishes.
pub(crate) fn run_to_boundary(
    runtime: &mut DialogueRuntime,
) -> Result<BoundaryResult, DialogueError> {
    let mut lines = Vec::new();

    for _ in 0..BOUNDARY_EVENT_GUARD {
        match runtime.next_event()? {
            Some(RuntimeEvent::Line { line_id, .. }) => {
                lines.push(resolve_line(runtime, &line_id)?);
            }
            Some(RuntimeEvent::Options { options }) => {
                return Ok(BoundaryResult {
                    event: BoundaryEvent::Options,
                    lines,
                    choices: option_rows(runtime, &options)?,
                })
            }
            Some(RuntimeEvent::DialogueComplete) => {
                return Ok(BoundaryResult {
                    event: BoundaryEvent::End,
                    lines,
                    choices: Vec::new(),
                })
            }
            Some(RuntimeEvent::NodeStart { .. } | RuntimeEvent::NodeComplete { .. }) => {}
            None => return settled_boundary(runtime, lines),
        }
    }

    Err(DialogueError::new(
        "CLI_BOUNDARY_GUARD",
        format!(
            "No options or end within {} events; the tree probably loops.",
            BOUNDARY_EVENT_GUARD
        ),
    ))
}

// A resumed runtime that was saved at a boundary yields no new events.
fn settled_boundary(
    runtime: &DialogueRuntime,
    lines: Vec<DisplayLine>,
) -> Result<BoundaryResult, DialogueError> {
    match runtime.state() {
        RuntimeState::WaitingForOption { options, .. } => Ok(BoundaryResult {
            event: BoundaryEvent::Options,
            lines,
            choices: option_rows(runtime, options)?,
        }),
        RuntimeState::Complete => Ok(BoundaryResult {
            event: BoundaryEvent::End,
            lines,
            choices: Vec::new(),
        }),
        RuntimeState::Idle | RuntimeState::Running { .. } => Err(DialogueError::new(
            "CLI_RUNTIME_IDLE",
            "Runtime has no started node.",
        )),
    }
}

fn resolve_line(runtime: &DialogueRuntime, line_id: &str) -> Result<DisplayLine, DialogueError> {
    runtime.line(line_id).cloned().ok_or_else(|| {
        DialogueError::new(
            "CLI_LINE_MISSING",
            format!("Line \"{}\" has no recorded text.", line_id),
        )
    })
}

fn option_rows(
    runtime: &DialogueRuntime,
    options: &[DialogueOption],
) -> Result<Vec<(usize, String)>, DialogueError> {
    options
        .iter()
        .map(|option| resolve_line(runtime, &option.line_id).map(|line| (option.id, line.text)))
        .collect()
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Options => println!("EVENT:OPTIONS"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    for line in boundary.lines {
        if let Some(speaker) = &line.speaker {
            println!("SPEAKER_JSON:{}", json_string(speaker));
        }
        println!("TEXT_JSON:{}", json_string(&line.text));
    }

    for (index, text) in boundary.choices {
        println!("CHOICE:{}|{}", index, json_string(&text));
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}
