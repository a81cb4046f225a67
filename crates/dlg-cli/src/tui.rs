use dlg_core::DialogueError;
use dlg_runtime::DialogueRuntime;

use crate::TuiCommandContext;

#[cfg(coverage)]
pub(crate) fn run_tui(
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
) -> Result<i32, DialogueError> {
    crate::run_tui_line_mode(context, runtime)
}

/// Full-screen player when attached to a terminal, line mode otherwise.
#[cfg(not(coverage))]
pub(crate) fn run_tui(
    context: &TuiCommandContext<'_>,
    runtime: &mut DialogueRuntime,
) -> Result<i32, DialogueError> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return crate::run_tui_line_mode(context, runtime);
    }
    rich::run_tui_ratatui_mode(context, runtime)
}

#[cfg(not(coverage))]
mod rich {
    use std::io;
    use std::time::{Duration, Instant};

    use crossterm::event::{self, Event, KeyEventKind};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use dlg_core::DialogueError;
    use dlg_runtime::DialogueRuntime;
    use ratatui::backend::CrosstermBackend;
    use ratatui::Terminal;

    use crate::tui_actions::handle_key;
    use crate::tui_render::render_tui;
    use crate::tui_state::TuiUiState;
    use crate::{map_tui_io, run_to_boundary, TuiCommandContext};

    const TYPEWRITER_CHARS_PER_SECOND: u64 = 60;
    const TYPEWRITER_TICK_MS: u64 = 1000 / TYPEWRITER_CHARS_PER_SECOND;

    /// Restores the terminal on drop, including on error paths.
    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, DialogueError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(super) fn run_tui_ratatui_mode(
        context: &TuiCommandContext<'_>,
        runtime: &mut DialogueRuntime,
    ) -> Result<i32, DialogueError> {
        let mut terminal = TuiTerminal::new()?;
        let mut ui = TuiUiState {
            status: "ready".to_string(),
            ..TuiUiState::default()
        };
        ui.replace_boundary(run_to_boundary(runtime)?);

        let tick = Duration::from_millis(TYPEWRITER_TICK_MS);
        let mut last_tick = Instant::now();

        loop {
            terminal
                .terminal
                .draw(|frame| render_tui(frame, &ui, context.scenario, context.state_file))
                .map_err(map_tui_io)?;

            if last_tick.elapsed() >= tick && ui.advance_typewriter() {
                last_tick = Instant::now();
            }

            let timeout = tick.saturating_sub(last_tick.elapsed());
            if !event::poll(timeout).map_err(map_tui_io)? {
                continue;
            }

            let Event::Key(key) = event::read().map_err(map_tui_io)? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match handle_key(key, context, runtime, &mut ui) {
                Ok(true) => break,
                Ok(false) => {}
                Err(error) => ui.status = error.to_string(),
            }
        }

        Ok(0)
    }
}
