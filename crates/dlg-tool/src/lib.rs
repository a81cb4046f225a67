mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_test_case, read_tree_from_dir};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DlgToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No tree.json or *.tree.json file under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("More than one dialogue tree under {path}: {found:?}.")]
    SourceAmbiguous { path: PathBuf, found: Vec<String> },
    #[error("Runtime error: {0}")]
    Runtime(#[from] dlg_core::DialogueError),
    #[error("Line \"{line_id}\" was announced but never recorded.")]
    MissingLine { line_id: String },
    #[error("Action missing at event index {event_index}: expected choose.")]
    MissingAction { event_index: usize },
    #[error("Unused actions: used {used} of {total}.")]
    UnusedActions { used: usize, total: usize },
    #[error("Runtime stopped without finishing after {steps} steps.")]
    Stalled { steps: usize },
    #[error("Guard exceeded: max_steps={max_steps}.")]
    GuardExceeded { max_steps: usize },
    #[error("Expected event count {expected}, actual {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event mismatch at index {index}. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize event for diff: {0}")]
    EventSerialize(serde_json::Error),
}
