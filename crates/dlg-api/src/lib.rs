use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dlg_core::{DialogueError, DialogueTree, RuntimeSnapshot, VarValue};
use dlg_runtime::{DialogueRuntime, DialogueRuntimeOptions};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct CreateRuntimeOptions {
    pub tree_json: String,
    pub entry_node: Option<String>,
    pub variables: BTreeMap<String, VarValue>,
    pub memory_flags: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct ResumeRuntimeOptions {
    pub tree_json: String,
    pub snapshot: RuntimeSnapshot,
}

/// A reference that the runtime will treat as the end of the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeWarning {
    DanglingReference {
        node_id: String,
        via: String,
        target: String,
    },
    NodeIdMismatch {
        key: String,
        node_id: String,
    },
}

impl fmt::Display for TreeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                node_id,
                via,
                target,
            } => write!(
                f,
                "node \"{}\" ({}) points at missing node \"{}\"",
                node_id, via, target
            ),
            Self::NodeIdMismatch { key, node_id } => {
                write!(f, "node stored under \"{}\" declares id \"{}\"", key, node_id)
            }
        }
    }
}

pub fn parse_tree_json(tree_json: &str) -> Result<DialogueTree, DialogueError> {
    serde_json::from_str(tree_json).map_err(|error| {
        DialogueError::new(
            "API_TREE_INVALID",
            format!("Dialogue tree JSON is invalid: {}", error),
        )
    })
}

/// Fails only when the start node is missing; broken edges are warnings.
pub fn validate_tree(tree: &DialogueTree) -> Result<Vec<TreeWarning>, DialogueError> {
    if !tree.contains_node(&tree.start_node_id) {
        return Err(DialogueError::new(
            "API_START_NODE_MISSING",
            format!(
                "Start node \"{}\" is not part of tree \"{}\".",
                tree.start_node_id, tree.id
            ),
        ));
    }

    let mut warnings = Vec::new();
    for (key, node) in &tree.nodes {
        if key != &node.id {
            warnings.push(TreeWarning::NodeIdMismatch {
                key: key.clone(),
                node_id: node.id.clone(),
            });
        }
        for (via, target) in node.outgoing_targets() {
            if !tree.contains_node(target) {
                warnings.push(TreeWarning::DanglingReference {
                    node_id: key.clone(),
                    via,
                    target: target.to_string(),
                });
            }
        }
    }
    Ok(warnings)
}

pub fn create_runtime(options: CreateRuntimeOptions) -> Result<DialogueRuntime, DialogueError> {
    let tree = load_validated_tree(&options.tree_json)?;
    let entry_node = resolve_entry_node(&tree, options.entry_node)?;

    let mut runtime = DialogueRuntime::new(DialogueRuntimeOptions {
        tree: Some(tree),
        variables: options.variables,
        memory_flags: options.memory_flags,
    });
    runtime.set_node(&entry_node)?;
    Ok(runtime)
}

pub fn resume_runtime(options: ResumeRuntimeOptions) -> Result<DialogueRuntime, DialogueError> {
    let tree = load_validated_tree(&options.tree_json)?;
    let mut runtime = DialogueRuntime::new(DialogueRuntimeOptions {
        tree: Some(tree),
        ..DialogueRuntimeOptions::default()
    });
    runtime.resume(options.snapshot)?;
    Ok(runtime)
}

fn load_validated_tree(tree_json: &str) -> Result<DialogueTree, DialogueError> {
    let tree = parse_tree_json(tree_json)?;
    for warning in validate_tree(&tree)? {
        warn!(tree = %tree.id, "{}", warning);
    }
    Ok(tree)
}

fn resolve_entry_node(
    tree: &DialogueTree,
    explicit: Option<String>,
) -> Result<String, DialogueError> {
    match explicit {
        Some(entry) if !tree.contains_node(&entry) => Err(DialogueError::new(
            "API_ENTRY_NODE_NOT_FOUND",
            format!("Entry node \"{}\" is not part of tree \"{}\".", entry, tree.id),
        )),
        Some(entry) => Ok(entry),
        None => Ok(tree.start_node_id.clone()),
    }
}
