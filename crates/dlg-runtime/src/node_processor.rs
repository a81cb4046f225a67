use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use dlg_core::{BlockKind, Choice, ConditionalBlock, DialogueNode, NodeKind, ProcessedNode};
use regex::{Captures, Regex};

use crate::conditions::{evaluate_conditions, VariableSource};
use crate::var_ops::strip_set_commands;
use crate::variables::VariableStore;

/// Resolves what `node` yields for the current variables.
pub fn process_node(
    node: &DialogueNode,
    variables: &VariableStore,
    memory_flags: Option<&BTreeSet<String>>,
) -> ProcessedNode {
    let block = matched_block(node, variables, memory_flags);
    process_node_with_block(node, block, variables, memory_flags)
}

/// The conditional block `node` currently selects, if it carries any.
pub fn matched_block<'a, V: VariableSource + ?Sized>(
    node: &'a DialogueNode,
    variables: &V,
    memory_flags: Option<&BTreeSet<String>>,
) -> Option<&'a ConditionalBlock> {
    match &node.kind {
        NodeKind::Npc { conditional_blocks } | NodeKind::Conditional { conditional_blocks } => {
            select_block(conditional_blocks, variables, memory_flags)
        }
        NodeKind::Player { .. } | NodeKind::Unknown => None,
    }
}

/// Like [`process_node`], but with the block already chosen, so variable
/// changes made after selection cannot switch to another block.
pub fn process_node_with_block(
    node: &DialogueNode,
    block: Option<&ConditionalBlock>,
    variables: &VariableStore,
    memory_flags: Option<&BTreeSet<String>>,
) -> ProcessedNode {
    match &node.kind {
        NodeKind::Player { choices } => ProcessedNode {
            content: String::new(),
            speaker: node.speaker.clone(),
            next_node_id: non_empty(node.next_node_id.as_deref()),
            is_end: false,
            is_player_choice: true,
            choices: Some(available_choices(choices, variables, memory_flags)),
        },
        NodeKind::Conditional { .. } => {
            let Some(block) = block else {
                return ProcessedNode::end();
            };
            let next_node_id = non_empty(block.next_node_id.as_deref())
                .or_else(|| non_empty(node.next_node_id.as_deref()));
            ProcessedNode {
                content: render_text(&block.content, variables),
                speaker: block.speaker.clone(),
                is_end: next_node_id.is_none(),
                next_node_id,
                is_player_choice: false,
                choices: None,
            }
        }
        NodeKind::Npc { .. } => {
            let (content, speaker, next_node_id) = match block {
                Some(block) => (
                    block.content.as_str(),
                    block.speaker.clone().or_else(|| node.speaker.clone()),
                    non_empty(block.next_node_id.as_deref())
                        .or_else(|| non_empty(node.next_node_id.as_deref())),
                ),
                None => (
                    node.content.as_str(),
                    node.speaker.clone(),
                    non_empty(node.next_node_id.as_deref()),
                ),
            };
            ProcessedNode {
                content: render_text(content, variables),
                speaker,
                is_end: next_node_id.is_none(),
                next_node_id,
                is_player_choice: false,
                choices: None,
            }
        }
        NodeKind::Unknown => ProcessedNode::end(),
    }
}

/// First block whose condition holds wins; an `else` wins when reached.
pub fn select_block<'a, V: VariableSource + ?Sized>(
    blocks: &'a [ConditionalBlock],
    variables: &V,
    memory_flags: Option<&BTreeSet<String>>,
) -> Option<&'a ConditionalBlock> {
    blocks.iter().find(|block| match block.kind {
        BlockKind::Else => true,
        BlockKind::If | BlockKind::Elseif => evaluate_conditions(
            block.condition.as_deref().unwrap_or_default(),
            variables,
            memory_flags,
        ),
    })
}

fn available_choices(
    choices: &[Choice],
    variables: &VariableStore,
    memory_flags: Option<&BTreeSet<String>>,
) -> Vec<Choice> {
    choices
        .iter()
        .filter(|choice| match &choice.conditions {
            Some(conditions) => evaluate_conditions(conditions, variables, memory_flags),
            None => true,
        })
        .cloned()
        .collect()
}

/// Display text for `template`: set commands removed, `{$name}` replaced by
/// the variable's value. Unknown names stay as written.
pub fn render_text(template: &str, variables: &VariableStore) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let regex = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\$(\w+)\}").expect("placeholder regex must compile"));

    let stripped = strip_set_commands(template);
    regex
        .replace_all(&stripped, |captures: &Captures<'_>| {
            match variables.get(&captures[1]) {
                Some(value) => value.to_string(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

/// True when `id` names an existing node; blank ids mean "end here".
pub fn is_valid_next_node(id: Option<&str>, available_nodes: &BTreeMap<String, DialogueNode>) -> bool {
    match id {
        Some(id) if !id.trim().is_empty() => available_nodes.contains_key(id),
        _ => false,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(ToString::to_string)
}
