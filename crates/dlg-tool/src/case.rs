use std::collections::BTreeMap;

use dlg_core::VarValue;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "dlg-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub entry_node: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, VarValue>,
    #[serde(default)]
    pub memory_flags: Vec<String>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Line {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
    },
    Options {
        choices: Vec<String>,
    },
    End,
}
