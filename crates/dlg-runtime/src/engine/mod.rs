use std::collections::{BTreeMap, BTreeSet, VecDeque};

use dlg_core::{
    DialogueError, DialogueNode, DialogueTree, DisplayLine, ProcessedNode, RuntimeEvent,
    RuntimePhase, RuntimeState, VarValue,
};
use tracing::debug;

use crate::variables::VariableStore;

mod boundary;
mod snapshot;
mod step;


#[derive(Debug, Clone, Default)]
pub struct DialogueRuntimeOptions {
    pub tree: Option<DialogueTree>,
    pub variables: BTreeMap<String, VarValue>,
    pub memory_flags: BTreeSet<String>,
}

/// Something a runtime can be asked to execute.
#[derive(Debug, Clone)]
pub enum DialogueProgram {
    Tree(DialogueTree),
    Compiled(Vec<u8>),
}

/// Pull-based interpreter over one dialogue tree. Each instance owns its
/// variables; nothing is shared between runtimes.
#[derive(Debug, Clone)]
pub struct DialogueRuntime {
    tree: Option<DialogueTree>,
    variables: VariableStore,
    memory_flags: BTreeSet<String>,

    state: RuntimeState,
    pending_events: VecDeque<RuntimeEvent>,
    resolved_node: Option<ProcessedNode>,
    lines: BTreeMap<String, DisplayLine>,
    node_visits: BTreeMap<String, u32>,
}

impl Default for DialogueRuntime {
    fn default() -> Self {
        Self::new(DialogueRuntimeOptions::default())
    }
}

impl DialogueRuntime {
    pub fn new(options: DialogueRuntimeOptions) -> Self {
        Self {
            tree: options.tree,
            variables: VariableStore::from(options.variables),
            memory_flags: options.memory_flags,
            state: RuntimeState::Idle,
            pending_events: VecDeque::new(),
            resolved_node: None,
            lines: BTreeMap::new(),
            node_visits: BTreeMap::new(),
        }
    }

    /// Replaces the tree and the variable set, then returns to idle.
    pub fn load(&mut self, tree: DialogueTree, variables: BTreeMap<String, VarValue>) {
        debug!(tree = %tree.id, variables = variables.len(), "loading dialogue tree");
        self.tree = Some(tree);
        self.variables = VariableStore::from(variables);
        self.reset();
    }

    /// Loads a program while keeping the current variables. Only direct tree
    /// interpretation is supported.
    pub fn load_program(&mut self, program: DialogueProgram) -> Result<(), DialogueError> {
        match program {
            DialogueProgram::Tree(tree) => {
                debug!(tree = %tree.id, "loading dialogue program");
                self.tree = Some(tree);
                self.reset();
                Ok(())
            }
            DialogueProgram::Compiled(bytes) => Err(DialogueError::new(
                "RUNTIME_PROGRAM_UNSUPPORTED",
                format!(
                    "Compiled programs ({} bytes) are not supported; load a dialogue tree.",
                    bytes.len()
                ),
            )),
        }
    }

    pub fn tree(&self) -> Option<&DialogueTree> {
        self.tree.as_ref()
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn is_waiting_for_option(&self) -> bool {
        matches!(self.state, RuntimeState::WaitingForOption { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, RuntimeState::Complete)
    }

    /// Jumps to `name`, discarding anything not yet delivered.
    pub fn set_node(&mut self, name: &str) -> Result<(), DialogueError> {
        let Some(tree) = &self.tree else {
            return Err(DialogueError::new(
                "RUNTIME_NO_TREE",
                "No dialogue tree is loaded.",
            ));
        };
        if !tree.contains_node(name) {
            return Err(DialogueError::new(
                "RUNTIME_NODE_NOT_FOUND",
                format!("Node \"{}\" does not exist in tree \"{}\".", name, tree.id),
            ));
        }

        self.pending_events.clear();
        self.resolved_node = None;
        self.start_node(name.to_string());
        Ok(())
    }

    /// Abandons the current run. Variables are kept.
    pub fn reset(&mut self) {
        self.state = RuntimeState::Idle;
        self.pending_events.clear();
        self.resolved_node = None;
        self.lines.clear();
        self.node_visits.clear();
    }

    pub fn get_variable(&self, name: &str) -> Option<&VarValue> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<VarValue>) {
        self.variables.set(name, value);
    }

    pub fn get_variable_names(&self) -> Vec<String> {
        self.variables.get_all_names()
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn set_memory_flag(&mut self, name: impl Into<String>) {
        self.memory_flags.insert(name.into());
    }

    pub fn clear_memory_flags(&mut self) {
        self.memory_flags.clear();
    }

    pub fn memory_flags(&self) -> &BTreeSet<String> {
        &self.memory_flags
    }

    /// Text and speaker recorded for a line id from a `line` or `options` event.
    /// Ids are `<nodeId>#<visit>` and `<nodeId>:<choiceId>#<visit>`, so a
    /// revisited node never overwrites an earlier line.
    pub fn line(&self, line_id: &str) -> Option<&DisplayLine> {
        self.lines.get(line_id)
    }

    fn record_line(&mut self, key: &str, node_id: &str, line: DisplayLine) -> String {
        let visit = self.node_visits.get(node_id).copied().unwrap_or_default();
        let line_id = format!("{}#{}", key, visit);
        self.lines.insert(line_id.clone(), line);
        line_id
    }

    fn start_node(&mut self, node_id: String) {
        debug!(node = %node_id, "starting node");
        self.pending_events.push_back(RuntimeEvent::NodeStart {
            node_id: node_id.clone(),
        });
        self.state = RuntimeState::Running {
            current_node_id: node_id,
            phase: RuntimePhase::Entering,
        };
    }

    fn complete(&mut self) {
        debug!("dialogue complete");
        self.state = RuntimeState::Complete;
        self.resolved_node = None;
        self.pending_events
            .push_back(RuntimeEvent::DialogueComplete);
    }

    fn lookup_node(&self, node_id: &str) -> Result<&DialogueNode, DialogueError> {
        let tree = self.tree.as_ref().ok_or_else(|| {
            DialogueError::new("RUNTIME_NO_TREE", "No dialogue tree is loaded.")
        })?;
        tree.node(node_id).ok_or_else(|| {
            DialogueError::new(
                "RUNTIME_NODE_NOT_FOUND",
                format!("Node \"{}\" does not exist in tree \"{}\".", node_id, tree.id),
            )
        })
    }

    fn set_phase(&mut self, next: RuntimePhase) {
        if let RuntimeState::Running { phase, .. } = &mut self.state {
            *phase = next;
        }
    }
}
