use crate::{format_display_line, BoundaryEvent, BoundaryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceRow {
    pub(crate) index: usize,
    pub(crate) text: String,
}

#[derive(Debug, Default)]
pub(crate) struct TuiUiState {
    pub(crate) rendered_lines: Vec<String>,
    pub(crate) pending_lines: Vec<String>,
    pub(crate) typing_line: Option<String>,
    pub(crate) typing_chars: usize,
    pub(crate) choices: Vec<ChoiceRow>,
    pub(crate) selected_choice_index: usize,
    pub(crate) choice_scroll_offset: usize,
    pub(crate) ended: bool,
    pub(crate) help_visible: bool,
    pub(crate) status: String,
}

impl TuiUiState {
    pub(crate) fn typing_in_progress(&self) -> bool {
        self.typing_line.is_some() || !self.pending_lines.is_empty()
    }

    pub(crate) fn set_boundary_state(&mut self, boundary: BoundaryResult) {
        match boundary.event {
            BoundaryEvent::Options => {
                self.choices = boundary
                    .choices
                    .into_iter()
                    .map(|(index, text)| ChoiceRow { index, text })
                    .collect();
                self.ended = false;
            }
            BoundaryEvent::End => {
                self.choices.clear();
                self.ended = true;
            }
        }
        self.selected_choice_index = 0;
        self.choice_scroll_offset = 0;
    }

    pub(crate) fn append_boundary(&mut self, boundary: BoundaryResult) {
        self.pending_lines
            .extend(boundary.lines.iter().map(format_display_line));
        self.set_boundary_state(boundary);
    }

    pub(crate) fn replace_boundary(&mut self, boundary: BoundaryResult) {
        self.rendered_lines.clear();
        self.pending_lines = boundary.lines.iter().map(format_display_line).collect();
        self.typing_line = None;
        self.typing_chars = 0;
        self.set_boundary_state(boundary);
    }

    /// Reveals one more character, or moves to the next pending line.
    /// Returns false when there is nothing left to type.
    pub(crate) fn advance_typewriter(&mut self) -> bool {
        let Some(line) = self.typing_line.take() else {
            if self.pending_lines.is_empty() {
                return false;
            }
            let next_line = self.pending_lines.remove(0);
            if next_line.is_empty() {
                self.rendered_lines.push(next_line);
            } else {
                self.typing_line = Some(next_line);
                self.typing_chars = 1;
            }
            return true;
        };

        if self.typing_chars >= line.chars().count() {
            self.rendered_lines.push(line);
            self.typing_chars = 0;
            return true;
        }
        self.typing_chars += 1;
        self.typing_line = Some(line);
        true
    }
}
