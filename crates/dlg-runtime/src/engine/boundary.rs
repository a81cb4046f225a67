use dlg_core::{DialogueError, NodeKind, RuntimeEvent, RuntimeState};
use tracing::debug;

use super::DialogueRuntime;
use crate::node_processor::is_valid_next_node;

impl DialogueRuntime {
    /// Picks option `id` from the last `options` event and moves on to its
    /// destination, or finishes the dialogue when it has none.
    pub fn set_selected_option(&mut self, id: usize) -> Result<(), DialogueError> {
        let RuntimeState::WaitingForOption {
            current_node_id,
            options,
        } = &self.state
        else {
            return Err(DialogueError::new(
                "RUNTIME_NOT_WAITING",
                "No options are pending; call next_event until an options event arrives.",
            ));
        };

        let option = options
            .iter()
            .find(|option| option.id == id)
            .cloned()
            .ok_or_else(|| {
                DialogueError::new(
                    "RUNTIME_OPTION_NOT_FOUND",
                    format!("Option \"{}\" is not among the {} offered.", id, options.len()),
                )
            })?;
        let node_id = current_node_id.clone();

        let node = self.lookup_node(&node_id)?;
        let choice_flags = match &node.kind {
            NodeKind::Player { choices } => choices
                .iter()
                .find(|choice| choice.id == option.choice_id)
                .map(|choice| choice.set_flags.clone())
                .ok_or_else(|| {
                    DialogueError::new(
                        "RUNTIME_OPTION_NOT_FOUND",
                        format!(
                            "Choice \"{}\" no longer exists on node \"{}\".",
                            option.choice_id, node_id
                        ),
                    )
                })?,
            _ => Vec::new(),
        };

        debug!(node = %node_id, option = id, choice = %option.choice_id, "option selected");
        for flag in choice_flags {
            self.variables.set(flag, true);
        }

        self.resolved_node = None;
        self.pending_events
            .push_back(RuntimeEvent::NodeComplete { node_id });

        let has_destination = match &self.tree {
            Some(tree) => is_valid_next_node(option.destination_node.as_deref(), &tree.nodes),
            None => false,
        };
        match option.destination_node {
            Some(destination) if has_destination => self.start_node(destination),
            _ => self.complete(),
        }
        Ok(())
    }
}
