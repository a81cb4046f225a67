use dlg_core::{DialogueError, RuntimeSnapshot, SNAPSHOT_SCHEMA_V1};
use tracing::debug;

use super::DialogueRuntime;
use crate::variables::VariableStore;

impl DialogueRuntime {
    pub fn snapshot(&self) -> Result<RuntimeSnapshot, DialogueError> {
        let tree = self.tree.as_ref().ok_or_else(|| {
            DialogueError::new("RUNTIME_NO_TREE", "Cannot snapshot without a dialogue tree.")
        })?;

        Ok(RuntimeSnapshot {
            schema_version: SNAPSHOT_SCHEMA_V1.to_string(),
            tree_id: tree.id.clone(),
            state: self.state.clone(),
            pending_events: self.pending_events.iter().cloned().collect(),
            resolved_node: self.resolved_node.clone(),
            lines: self.lines.clone(),
            node_visits: self.node_visits.clone(),
            variables: self.variables.get_all(),
            memory_flags: self.memory_flags.iter().cloned().collect(),
        })
    }

    /// Restores a snapshot taken from a runtime running the same tree.
    pub fn resume(&mut self, snapshot: RuntimeSnapshot) -> Result<(), DialogueError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_V1 {
            return Err(DialogueError::new(
                "RUNTIME_SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SNAPSHOT_SCHEMA_V1
                ),
            ));
        }

        let tree = self.tree.as_ref().ok_or_else(|| {
            DialogueError::new("RUNTIME_NO_TREE", "Cannot resume without a dialogue tree.")
        })?;
        if tree.id != snapshot.tree_id {
            return Err(DialogueError::new(
                "RUNTIME_SNAPSHOT_TREE_MISMATCH",
                format!(
                    "Snapshot belongs to tree \"{}\" but \"{}\" is loaded.",
                    snapshot.tree_id, tree.id
                ),
            ));
        }
        if let Some(node_id) = snapshot.state.current_node_id() {
            if !tree.contains_node(node_id) {
                return Err(DialogueError::new(
                    "RUNTIME_NODE_NOT_FOUND",
                    format!("Snapshot node \"{}\" does not exist in the loaded tree.", node_id),
                ));
            }
        }

        debug!(tree = %snapshot.tree_id, "resuming from snapshot");
        self.state = snapshot.state;
        self.pending_events = snapshot.pending_events.into_iter().collect();
        self.resolved_node = snapshot.resolved_node;
        self.lines = snapshot.lines;
        self.node_visits = snapshot.node_visits;
        self.variables = VariableStore::from(snapshot.variables);
        self.memory_flags = snapshot.memory_flags.into_iter().collect();
        Ok(())
    }
}
