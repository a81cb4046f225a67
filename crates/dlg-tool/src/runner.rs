use std::path::Path;

use dlg_api::{create_runtime, CreateRuntimeOptions};
use dlg_core::{DisplayLine, RuntimeEvent};
use dlg_runtime::DialogueRuntime;
use tracing::debug;

use crate::source::{read_test_case, read_tree_from_dir};
use crate::{DlgToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

pub fn run_case(demo_dir: &Path, case: &TestCase) -> Result<RunReport, DlgToolError> {
    let tree_json = read_tree_from_dir(demo_dir)?;
    let mut runtime = create_runtime(CreateRuntimeOptions {
        tree_json,
        entry_node: case.entry_node.clone(),
        variables: case.variables.clone(),
        memory_flags: case.memory_flags.iter().cloned().collect(),
    })?;

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;

    for step in 1..=MAX_STEPS {
        let Some(event) = runtime.next_event()? else {
            return Err(DlgToolError::Stalled { steps: step });
        };
        match event {
            RuntimeEvent::NodeStart { .. } | RuntimeEvent::NodeComplete { .. } => {}
            RuntimeEvent::Line { line_id, .. } => {
                let line = recorded_line(&runtime, &line_id)?;
                observed_events.push(ExpectedEvent::Line {
                    text: line.text.clone(),
                    speaker: line.speaker.clone(),
                });
            }
            RuntimeEvent::Options { options } => {
                let choices = options
                    .iter()
                    .map(|option| {
                        recorded_line(&runtime, &option.line_id).map(|line| line.text.clone())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                observed_events.push(ExpectedEvent::Options { choices });
                let event_index = observed_events.len() - 1;

                let TestAction::Choose { index } = case
                    .actions
                    .get(action_index)
                    .ok_or(DlgToolError::MissingAction { event_index })?;
                debug!(step, index = *index, "choosing option");
                runtime.set_selected_option(*index)?;
                action_index += 1;
            }
            RuntimeEvent::DialogueComplete => {
                observed_events.push(ExpectedEvent::End);
                if action_index != case.actions.len() {
                    return Err(DlgToolError::UnusedActions {
                        used: action_index,
                        total: case.actions.len(),
                    });
                }
                return Ok(RunReport {
                    observed_events,
                    consumed_actions: action_index,
                    steps: step,
                });
            }
        }
    }

    Err(DlgToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

fn recorded_line<'a>(
    runtime: &'a DialogueRuntime,
    line_id: &str,
) -> Result<&'a DisplayLine, DlgToolError> {
    runtime
        .line(line_id)
        .ok_or_else(|| DlgToolError::MissingLine {
            line_id: line_id.to_string(),
        })
}

pub fn assert_case(demo_dir: &Path, case_path: &Path) -> Result<(), DlgToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(demo_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(DlgToolError::EventSerialize)?;
        return Err(DlgToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(DlgToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(DlgToolError::EventSerialize)?;
            return Err(DlgToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    const CHOICE_TREE: &str = r#"{
  "id": "runner",
  "startNodeId": "hello",
  "nodes": {
    "hello": {
      "id": "hello",
      "type": "npc",
      "speaker": "Guard",
      "content": "Halt, {$name}.",
      "nextNodeId": "pick"
    },
    "pick": {
      "id": "pick",
      "type": "player",
      "choices": [
        { "id": "pass", "text": "Let me pass", "nextNodeId": "bye" },
        { "id": "bribe", "text": "Pay {$gold} gold", "nextNodeId": "bye",
          "conditions": [{ "flag": "gold", "operator": "greater_than", "value": 0 }] }
      ]
    },
    "bye": { "id": "bye", "type": "npc", "content": "Move along." }
  }
}"#;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("dlg-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn demo_with(name: &str, tree: &str) -> std::path::PathBuf {
        let root = temp_dir(name);
        write_file(&root.join("tree.json"), tree);
        root
    }

    fn case_with(actions: Vec<TestAction>) -> TestCase {
        let mut variables = BTreeMap::new();
        variables.insert("name".to_string(), "Ada".into());
        variables.insert("gold".to_string(), 3.into());
        TestCase {
            schema_version: crate::TESTCASE_SCHEMA_V1.to_string(),
            entry_node: None,
            variables,
            memory_flags: Vec::new(),
            actions,
            expected_events: Vec::new(),
        }
    }

    #[test]
    fn run_case_records_lines_options_and_end() {
        let root = demo_with("choices", CHOICE_TREE);
        let report = run_case(&root, &case_with(vec![TestAction::Choose { index: 1 }]))
            .expect("run should pass");

        assert_eq!(report.consumed_actions, 1);
        assert_eq!(
            report.observed_events,
            vec![
                ExpectedEvent::Line {
                    text: "Halt, Ada.".to_string(),
                    speaker: Some("Guard".to_string()),
                },
                ExpectedEvent::Options {
                    choices: vec!["Let me pass".to_string(), "Pay 3 gold".to_string()],
                },
                ExpectedEvent::Line {
                    text: "Move along.".to_string(),
                    speaker: None,
                },
                ExpectedEvent::End,
            ]
        );
    }

    #[test]
    fn run_case_honors_entry_node() {
        let root = demo_with("entry", CHOICE_TREE);
        let mut case = case_with(Vec::new());
        case.entry_node = Some("bye".to_string());

        let report = run_case(&root, &case).expect("run should pass");
        assert_eq!(report.observed_events.len(), 2);
    }

    #[test]
    fn run_case_reports_action_problems() {
        let root = demo_with("actions", CHOICE_TREE);

        let missing = run_case(&root, &case_with(Vec::new())).expect_err("missing action");
        assert!(matches!(missing, DlgToolError::MissingAction { event_index: 1 }));

        let bad_index = run_case(&root, &case_with(vec![TestAction::Choose { index: 9 }]))
            .expect_err("invalid option should fail");
        match bad_index {
            DlgToolError::Runtime(error) => assert_eq!(error.code, "RUNTIME_OPTION_NOT_FOUND"),
            other => panic!("unexpected error: {}", other),
        }

        let unused = run_case(
            &root,
            &case_with(vec![
                TestAction::Choose { index: 0 },
                TestAction::Choose { index: 0 },
            ]),
        )
        .expect_err("unused action should fail");
        assert!(matches!(
            unused,
            DlgToolError::UnusedActions { used: 1, total: 2 }
        ));
    }

    #[test]
    fn run_case_reports_guard_exceeded() {
        let root = demo_with(
            "guard",
            r#"{
  "id": "loop",
  "startNodeId": "a",
  "nodes": {
    "a": { "id": "a", "type": "npc", "content": "ping", "nextNodeId": "b" },
    "b": { "id": "b", "type": "npc", "content": "pong", "nextNodeId": "a" }
  }
}"#,
        );
        let error = run_case(&root, &case_with(Vec::new())).expect_err("guard should fail");
        assert!(matches!(error, DlgToolError::GuardExceeded { .. }));
    }

    #[test]
    fn assert_case_reports_count_and_value_mismatches() {
        let root = demo_with("assert", CHOICE_TREE);

        let count_case = root.join("count.json");
        write_file(
            &count_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "variables":{"name":"Ada","gold":3},
  "actions":[{"kind":"choose","index":0}],
  "expectedEvents":[{"kind":"end"}]
}"#,
        );
        let count_error = assert_case(&root, &count_case).expect_err("count mismatch should fail");
        assert!(matches!(
            count_error,
            DlgToolError::EventCountMismatch { .. }
        ));

        let value_case = root.join("value.json");
        write_file(
            &value_case,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "variables":{"name":"Bob","gold":0},
  "actions":[{"kind":"choose","index":0}],
  "expectedEvents":[
    {"kind":"line","text":"Halt, Ada.","speaker":"Guard"},
    {"kind":"options","choices":["Let me pass"]},
    {"kind":"line","text":"Move along."},
    {"kind":"end"}
  ]
}"#,
        );
        let value_error = assert_case(&root, &value_case).expect_err("value mismatch should fail");
        assert!(matches!(
            value_error,
            DlgToolError::EventMismatch { index: 0, .. }
        ));
    }

    #[test]
    fn assert_case_passes_with_matching_expected_events() {
        let root = demo_with("assert-pass", CHOICE_TREE);
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "variables":{"name":"Bob","gold":0},
  "actions":[{"kind":"choose","index":0}],
  "expectedEvents":[
    {"kind":"line","text":"Halt, Bob.","speaker":"Guard"},
    {"kind":"options","choices":["Let me pass"]},
    {"kind":"line","text":"Move along."},
    {"kind":"end"}
  ]
}"#,
        );

        assert_case(&root, &case_path).expect("assert should pass");
    }
}
