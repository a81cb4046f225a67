use dlg_core::{
    DialogueError, DialogueOption, DisplayLine, ProcessedNode, RuntimeEvent, RuntimePhase,
    RuntimeState,
};
use tracing::debug;

use super::DialogueRuntime;
use crate::node_processor::{
    is_valid_next_node, matched_block, process_node, process_node_with_block, render_text,
};
use crate::var_ops::execute_variable_operations;

// A node passes through at most four phases before yielding an event.
const PHASE_GUARD: usize = 16;

impl DialogueRuntime {
    /// Returns the next event, advancing at most one node phase when nothing
    /// is queued. `None` means the runtime is idle or finished.
    pub fn next_event(&mut self) -> Result<Option<RuntimeEvent>, DialogueError> {
        if let Some(event) = self.pending_events.pop_front() {
            return Ok(Some(event));
        }

        for _ in 0..PHASE_GUARD {
            let RuntimeState::Running {
                current_node_id,
                phase,
            } = &self.state
            else {
                return Ok(None);
            };
            let node_id = current_node_id.clone();
            let phase = *phase;

            let event = match phase {
                RuntimePhase::Entering => {
                    self.enter_node(&node_id)?;
                    None
                }
                RuntimePhase::Content => self.resolve_content(&node_id)?,
                RuntimePhase::Choices => self.offer_choices(&node_id)?,
                RuntimePhase::Exiting => Some(self.exit_node(node_id)?),
            };
            if event.is_some() {
                return Ok(event);
            }
        }

        Err(DialogueError::new(
            "RUNTIME_GUARD_EXCEEDED",
            format!("Node phases did not yield an event within {} steps.", PHASE_GUARD),
        ))
    }

    fn enter_node(&mut self, node_id: &str) -> Result<(), DialogueError> {
        let node = self.lookup_node(node_id)?;
        let set_flags = node.set_flags.clone();
        let content = node.content.clone();

        for flag in set_flags {
            self.variables.set(flag, true);
        }
        let applied = execute_variable_operations(&content, &mut self.variables);
        let visit = self.node_visits.entry(node_id.to_string()).or_default();
        *visit += 1;
        debug!(node = %node_id, applied, visit = *visit, "entered node");

        self.set_phase(RuntimePhase::Content);
        Ok(())
    }

    fn resolve_content(&mut self, node_id: &str) -> Result<Option<RuntimeEvent>, DialogueError> {
        let block = matched_block(
            self.lookup_node(node_id)?,
            &self.variables,
            Some(&self.memory_flags),
        )
        .cloned();
        if let Some(block) = &block {
            let applied = execute_variable_operations(&block.content, &mut self.variables);
            debug!(node = %node_id, block = %block.id, applied, "matched block");
        }

        let processed = process_node_with_block(
            self.lookup_node(node_id)?,
            block.as_ref(),
            &self.variables,
            Some(&self.memory_flags),
        );

        if processed.is_player_choice {
            self.resolved_node = Some(processed);
            self.set_phase(RuntimePhase::Choices);
            return Ok(None);
        }

        let line = (!processed.content.is_empty()).then(|| DisplayLine {
            text: processed.content.clone(),
            speaker: processed.speaker.clone(),
        });
        self.resolved_node = Some(processed);
        self.set_phase(RuntimePhase::Exiting);

        Ok(line.map(|line| RuntimeEvent::Line {
            line_id: self.record_line(node_id, node_id, line),
            node_id: node_id.to_string(),
        }))
    }

    fn offer_choices(&mut self, node_id: &str) -> Result<Option<RuntimeEvent>, DialogueError> {
        let choices = match self.resolved_node.as_ref().and_then(|node| node.choices.clone()) {
            Some(choices) => choices,
            None => {
                let node = self.lookup_node(node_id)?;
                process_node(node, &self.variables, Some(&self.memory_flags))
                    .choices
                    .unwrap_or_default()
            }
        };

        if choices.is_empty() {
            debug!(node = %node_id, "no choices available");
            self.set_phase(RuntimePhase::Exiting);
            return Ok(None);
        }

        let mut options = Vec::with_capacity(choices.len());
        for (index, choice) in choices.iter().enumerate() {
            let line_id = self.record_line(
                &format!("{}:{}", node_id, choice.id),
                node_id,
                DisplayLine {
                    text: render_text(&choice.text, &self.variables),
                    speaker: None,
                },
            );
            options.push(DialogueOption {
                id: index,
                choice_id: choice.id.clone(),
                line_id,
                destination_node: choice
                    .next_node_id
                    .clone()
                    .filter(|next| !next.trim().is_empty()),
            });
        }

        debug!(node = %node_id, count = options.len(), "offering options");
        self.state = RuntimeState::WaitingForOption {
            current_node_id: node_id.to_string(),
            options: options.clone(),
        };
        Ok(Some(RuntimeEvent::Options { options }))
    }

    fn exit_node(&mut self, node_id: String) -> Result<RuntimeEvent, DialogueError> {
        let resolved = match self.resolved_node.take() {
            Some(resolved) => resolved,
            None => self.reprocess(&node_id)?,
        };

        let next = resolved.next_node_id;
        let has_next = match &self.tree {
            Some(tree) => is_valid_next_node(next.as_deref(), &tree.nodes),
            None => false,
        };

        match next {
            Some(next) if has_next => self.start_node(next),
            _ => self.complete(),
        }
        Ok(RuntimeEvent::NodeComplete { node_id })
    }

    fn reprocess(&self, node_id: &str) -> Result<ProcessedNode, DialogueError> {
        let node = self.lookup_node(node_id)?;
        Ok(process_node(node, &self.variables, Some(&self.memory_flags)))
    }
}
