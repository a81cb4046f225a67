use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::VarValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTree {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start_node_id: String,
    pub nodes: BTreeMap<String, DialogueNode>,
}

impl DialogueTree {
    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }
}

/// One node of the graph. The per-type payload lives in `kind`; the
/// remaining fields are shared by every node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNode {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl DialogueNode {
    /// Every non-empty edge this node can follow, labelled by where it comes from.
    pub fn outgoing_targets(&self) -> Vec<(String, &str)> {
        let mut targets = Vec::new();
        if let Some(next) = non_empty(self.next_node_id.as_deref()) {
            targets.push(("nextNodeId".to_string(), next));
        }
        match &self.kind {
            NodeKind::Player { choices } => {
                for choice in choices {
                    if let Some(next) = non_empty(choice.next_node_id.as_deref()) {
                        targets.push((format!("choice:{}", choice.id), next));
                    }
                }
            }
            NodeKind::Npc { conditional_blocks } | NodeKind::Conditional { conditional_blocks } => {
                for block in conditional_blocks {
                    if let Some(next) = non_empty(block.next_node_id.as_deref()) {
                        targets.push((format!("block:{}", block.id), next));
                    }
                }
            }
            NodeKind::Unknown => {}
        }
        targets
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum NodeKind {
    Npc {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        conditional_blocks: Vec<ConditionalBlock>,
    },
    Player {
        #[serde(default)]
        choices: Vec<Choice>,
    },
    Conditional {
        #[serde(default)]
        conditional_blocks: Vec<ConditionalBlock>,
    },
    /// Any node type this build does not know; it ends the dialogue.
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Npc { .. } => "npc",
            Self::Player { .. } => "player",
            Self::Conditional { .. } => "conditional",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_flags: Vec<String>,
    /// `None` and `Some(vec![])` both mean the choice is always offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Vec<Condition>>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    If,
    Elseif,
    Else,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub flag: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VarValue>,
}

impl Condition {
    pub fn new(flag: impl Into<String>, operator: ConditionOperator) -> Self {
        Self {
            flag: flag.into(),
            operator,
            value: None,
        }
    }

    pub fn with_value(
        flag: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<VarValue>,
    ) -> Self {
        Self {
            flag: flag.into(),
            operator,
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    IsSet,
    IsNotSet,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    /// Any operator name this build does not know.
    #[serde(other)]
    Unknown,
}

impl ConditionOperator {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::LessThan | Self::GreaterEqual | Self::LessEqual
        )
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    const TREE_JSON: &str = r#"{
  "id": "tree-1",
  "title": "Greeting",
  "startNodeId": "start",
  "nodes": {
    "start": {
      "id": "start",
      "type": "npc",
      "content": "Hi {$name}",
      "speaker": "Guard",
      "setFlags": ["met_guard"],
      "nextNodeId": "ask",
      "position": { "x": 10, "y": 20 }
    },
    "ask": {
      "id": "ask",
      "type": "player",
      "content": "",
      "choices": [
        { "id": "c1", "text": "Bye", "nextNodeId": "gate" },
        {
          "id": "c2",
          "text": "Bribe",
          "conditions": [{ "flag": "gold", "operator": "greater_equal", "value": 10 }]
        }
      ]
    },
    "gate": {
      "id": "gate",
      "type": "conditional",
      "content": "",
      "conditionalBlocks": [
        { "id": "b1", "type": "if", "condition": [{ "flag": "met_guard", "operator": "is_set" }], "content": "Pass", "nextNodeId": "" },
        { "id": "b2", "type": "else", "content": "Halt" }
      ]
    }
  }
}"#;

    #[test]
    fn tree_deserializes_tagged_node_variants() {
        let tree: DialogueTree = serde_json::from_str(TREE_JSON).expect("tree should parse");
        assert_eq!(tree.start_node_id, "start");
        let start = tree.node("start").expect("start node");
        assert!(matches!(start.kind, NodeKind::Npc { .. }));
        assert_eq!(start.set_flags, vec!["met_guard".to_string()]);

        let ask = tree.node("ask").expect("ask node");
        let NodeKind::Player { choices } = &ask.kind else {
            panic!("ask should be a player node");
        };
        assert_eq!(choices.len(), 2);
        assert!(choices[0].conditions.is_none());
        let condition = &choices[1].conditions.as_ref().expect("conditions")[0];
        assert_eq!(condition.operator, ConditionOperator::GreaterEqual);
        assert_eq!(condition.value, Some(VarValue::Number(10.0)));

        let gate = tree.node("gate").expect("gate node");
        let NodeKind::Conditional { conditional_blocks } = &gate.kind else {
            panic!("gate should be a conditional node");
        };
        assert_eq!(conditional_blocks[1].kind, BlockKind::Else);
    }

    #[test]
    fn unknown_operator_deserializes_to_unknown_variant() {
        let condition: Condition =
            serde_json::from_str(r#"{"flag":"x","operator":"matches_regex","value":"a"}"#)
                .expect("condition should parse");
        assert_eq!(condition.operator, ConditionOperator::Unknown);
    }

    #[test]
    fn unknown_node_type_deserializes_to_unknown_variant() {
        let node: DialogueNode = serde_json::from_str(
            r#"{"id":"n","type":"narration","content":"The wind howls.","nextNodeId":"later","mood":"grim"}"#,
        )
        .expect("node with unknown type should parse");
        assert_eq!(node.kind, NodeKind::Unknown);
        assert_eq!(node.kind.type_name(), "unknown");
        assert_eq!(node.content, "The wind howls.");
        assert_eq!(node.next_node_id.as_deref(), Some("later"));
    }

    #[test]
    fn outgoing_targets_skip_empty_references() {
        let tree: DialogueTree = serde_json::from_str(TREE_JSON).expect("tree should parse");
        let targets = tree.node("gate").expect("gate").outgoing_targets();
        assert!(targets.is_empty());

        let targets = tree.node("ask").expect("ask").outgoing_targets();
        assert_eq!(targets, vec![("choice:c1".to_string(), "gate")]);
    }
}
