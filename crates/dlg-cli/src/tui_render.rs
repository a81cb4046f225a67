#![cfg(not(coverage))]

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::tui_actions::CHOICE_VIEWPORT_ROWS;
use crate::tui_state::TuiUiState;
use crate::LoadedScenario;

const ELLIPSIS: &str = "…";

pub(crate) fn render_tui(
    frame: &mut Frame<'_>,
    ui: &TuiUiState,
    scenario: &LoadedScenario,
    state_file: &str,
) {
    let terminal_width = frame.area().width as usize;
    let terminal_rows = frame.area().height as usize;
    let content_width = (terminal_width.saturating_sub(2)).max(16);

    let typing_in_progress = ui.typing_in_progress();
    let mut transcript = ui.rendered_lines.clone();
    if let Some(typing) = &ui.typing_line {
        transcript.push(typing.chars().take(ui.typing_chars).collect());
    }
    let wrapped_text_rows = transcript
        .iter()
        .flat_map(|line| wrap_line_to_width(line, content_width))
        .collect::<Vec<_>>();

    let show_choices = !typing_in_progress && !ui.choices.is_empty();
    let choice_header_text = if show_choices {
        truncate_to_width("options (up/down + enter):", content_width)
    } else {
        String::new()
    };

    let mut reserved_rows = 3 + 1 + CHOICE_VIEWPORT_ROWS + 1 + 1;
    if ui.ended {
        reserved_rows += 1;
    }
    if ui.help_visible {
        reserved_rows += 1;
    }
    if !choice_header_text.is_empty() {
        reserved_rows += 1;
    }
    let visible_text_rows = terminal_rows.saturating_sub(reserved_rows).max(1);
    let skipped_rows = wrapped_text_rows.len().saturating_sub(visible_text_rows);

    let choice_text_width = content_width.saturating_sub(2).max(8);
    let visible_choice_rows = (0..CHOICE_VIEWPORT_ROWS)
        .map(|row_index| {
            let absolute_index = ui.choice_scroll_offset + row_index;
            match ui.choices.get(absolute_index).filter(|_| show_choices) {
                Some(choice) => (
                    truncate_to_width(&choice.text, choice_text_width),
                    absolute_index == ui.selected_choice_index,
                ),
                None => (" ".to_string(), false),
            }
        })
        .collect::<Vec<_>>();

    let choice_window_text = if show_choices && ui.choices.len() > CHOICE_VIEWPORT_ROWS {
        truncate_to_width(
            &format!(
                "window {}-{} / {}",
                ui.choice_scroll_offset + 1,
                (ui.choice_scroll_offset + CHOICE_VIEWPORT_ROWS).min(ui.choices.len()),
                ui.choices.len()
            ),
            content_width,
        )
    } else {
        " ".to_string()
    };

    let gray = Style::default().fg(Color::Gray);
    let mut lines_out: Vec<Line<'_>> = Vec::new();
    lines_out.push(Line::from(truncate_to_width(
        &format!("{} | {}", scenario.title, scenario.tree_path.display()),
        content_width,
    )));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(&format!("state: {}", state_file), content_width),
        gray,
    )));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(&format!("status: {}", ui.status), content_width),
        gray,
    )));
    for row in wrapped_text_rows.into_iter().skip(skipped_rows) {
        lines_out.push(Line::from(row));
    }
    lines_out.push(Line::from(Span::styled("─".repeat(content_width), gray)));
    if !choice_header_text.is_empty() {
        lines_out.push(Line::from(Span::styled(
            choice_header_text,
            Style::default().fg(Color::Cyan),
        )));
    }
    for (text, selected) in visible_choice_rows {
        let (prefix, style) = if selected {
            ("> ", Style::default().fg(Color::Green))
        } else {
            ("  ", Style::default())
        };
        lines_out.push(Line::from(Span::styled(format!("{}{}", prefix, text), style)));
    }
    lines_out.push(Line::from(Span::styled(choice_window_text, gray)));
    if ui.ended {
        lines_out.push(Line::from(Span::styled(
            "[end]".to_string(),
            Style::default().fg(Color::Green),
        )));
    }
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(
            "keys: up/down move | enter choose | s save | l load | r restart | h help | q quit",
            content_width,
        ),
        Style::default().fg(Color::Yellow),
    )));
    if ui.help_visible {
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(
                "saving works while options are shown; loading resumes at the saved options.",
                content_width,
            ),
            Style::default().fg(Color::Magenta),
        )));
    }

    let paragraph = Paragraph::new(lines_out).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area());
}

fn truncate_to_width(value: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width == 1 {
        return ELLIPSIS.to_string();
    }
    let mut out = value.chars().take(width - 1).collect::<String>();
    out.push_str(ELLIPSIS);
    out
}

fn wrap_line_to_width(value: &str, width: usize) -> Vec<String> {
    let chars = value.chars().collect::<Vec<_>>();
    if width == 0 || chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
