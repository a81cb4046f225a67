use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dlg_core::DialogueError;
use dlg_runtime::DialogueRuntime;

use crate::tui_state::TuiUiState;
use crate::{
    create_runtime_for_scenario, load_runtime_from_state_for_scenario, run_to_boundary,
    save_runtime_state, TuiCommandContext,
};

pub(crate) const CHOICE_VIEWPORT_ROWS: usize = 5;

/// Applies one key press. Returns true when the player asked to quit.
pub(crate) fn handle_key(
    key: KeyEvent,
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
    ui: &mut TuiUiState,
) -> Result<bool, DialogueError> {
    if key.code == KeyCode::Esc || matches!(key.code, KeyCode::Char('q')) {
        return Ok(true);
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match key.code {
        KeyCode::Char('h') => {
            ui.help_visible = !ui.help_visible;
            return Ok(false);
        }
        KeyCode::Char('r') => {
            *runtime = create_runtime_for_scenario(context.scenario, context.session)?;
            let boundary = run_to_boundary(runtime)?;
            ui.replace_boundary(boundary);
            ui.status = "restarted".to_string();
            return Ok(false);
        }
        KeyCode::Char('s') => {
            save_runtime_state(Path::new(context.state_file), runtime, &context.scenario.id)?;
            ui.status = format!("saved to {}", context.state_file);
            return Ok(false);
        }
        KeyCode::Char('l') => {
            let (_state, resumed) =
                load_runtime_from_state_for_scenario(Path::new(context.state_file), context.scenario)?;
            *runtime = resumed;
            let boundary = run_to_boundary(runtime)?;
            ui.append_boundary(boundary);
            ui.status = format!("loaded from {}", context.state_file);
            return Ok(false);
        }
        _ => {}
    }

    let typing_in_progress = ui.typing_in_progress();
    match key.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Enter if typing_in_progress => {
            ui.status = "text streaming...".to_string();
        }
        KeyCode::Up | KeyCode::Down | KeyCode::Enter if ui.choices.is_empty() => {
            ui.status = "no pending option".to_string();
        }
        KeyCode::Up => {
            ui.selected_choice_index = ui.selected_choice_index.saturating_sub(1);
            if ui.selected_choice_index < ui.choice_scroll_offset {
                ui.choice_scroll_offset = ui.selected_choice_index;
            }
        }
        KeyCode::Down => {
            let last = ui.choices.len().saturating_sub(1);
            ui.selected_choice_index = (ui.selected_choice_index + 1).min(last);
            if ui.selected_choice_index >= ui.choice_scroll_offset + CHOICE_VIEWPORT_ROWS {
                ui.choice_scroll_offset = ui.selected_choice_index + 1 - CHOICE_VIEWPORT_ROWS;
            }
        }
        KeyCode::Enter => {
            let selected = ui.choices.get(ui.selected_choice_index).ok_or_else(|| {
                DialogueError::new("TUI_CHOICE_PARSE", "No options available")
            })?;
            let chosen = selected.index;
            runtime.set_selected_option(chosen)?;
            let boundary = run_to_boundary(runtime)?;
            ui.append_boundary(boundary);
            ui.status = format!("chose {}", chosen);
        }
        _ => {}
    }

    Ok(false)
}
