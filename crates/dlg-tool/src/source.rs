use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{DlgToolError, TestCase, TESTCASE_SCHEMA_V1};

fn is_tree_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| name == "tree.json" || name.ends_with(".tree.json"))
}

/// Reads the single dialogue tree stored under `demo_dir`.
pub fn read_tree_from_dir(demo_dir: &Path) -> Result<String, DlgToolError> {
    let mut trees: Vec<PathBuf> = WalkDir::new(demo_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_tree_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    trees.sort();

    let tree_path = match trees.as_slice() {
        [] => {
            return Err(DlgToolError::SourceEmpty {
                path: demo_dir.to_path_buf(),
            })
        }
        [single] => single,
        many => {
            return Err(DlgToolError::SourceAmbiguous {
                path: demo_dir.to_path_buf(),
                found: many
                    .iter()
                    .map(|path| {
                        path.strip_prefix(demo_dir)
                            .unwrap_or(path)
                            .to_string_lossy()
                            .replace('\\', "/")
                    })
                    .collect(),
            })
        }
    };

    fs::read_to_string(tree_path).map_err(|source| DlgToolError::ReadFile {
        path: tree_path.clone(),
        source,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DlgToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| DlgToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DlgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
