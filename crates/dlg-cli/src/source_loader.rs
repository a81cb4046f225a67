use std::fs;
use std::path::{Path, PathBuf};

use dlg_api::parse_tree_json;
use dlg_core::DialogueError;
use tracing::debug;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, LoadedScenario};

const SCENARIO_REF_PREFIX: &str = "tree-file:";

pub(crate) fn load_source_by_tree_path(tree: &str) -> Result<LoadedScenario, DialogueError> {
    let tree_path = resolve_tree_path(tree)?;
    let tree_json = fs::read_to_string(&tree_path).map_err(map_cli_source_read)?;
    let parsed = parse_tree_json(&tree_json)?;
    let title = if parsed.title.trim().is_empty() {
        parsed.id.clone()
    } else {
        parsed.title.clone()
    };
    debug!(path = %tree_path.display(), tree = %parsed.id, "loaded dialogue source");

    Ok(LoadedScenario {
        id: make_tree_scenario_id(&tree_path),
        title,
        tree_path,
        tree_json,
    })
}

pub(crate) fn load_source_by_ref(scenario_ref: &str) -> Result<LoadedScenario, DialogueError> {
    let Some(raw) = scenario_ref.strip_prefix(SCENARIO_REF_PREFIX) else {
        return Err(DialogueError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported scenario ref: {}", scenario_ref),
        ));
    };
    load_source_by_tree_path(raw)
}

/// Accepts a tree file, or a directory holding exactly one
/// `tree.json` / `*.tree.json`.
pub(crate) fn resolve_tree_path(tree: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(tree);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("tree does not exist: {}", absolute.display()),
        ));
    }
    // Scenario ids are built from this path, so `..` and links must not leak in.
    let absolute = fs::canonicalize(&absolute).map_err(map_cli_source_path)?;

    if absolute.is_dir() {
        return find_tree_in_dir(&absolute);
    }
    Ok(absolute)
}

fn find_tree_in_dir(dir: &Path) -> Result<PathBuf, DialogueError> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| name == "tree.json" || name.ends_with(".tree.json"))
        })
        .collect();
    found.sort();

    match found.len() {
        0 => Err(DialogueError::new(
            "CLI_SOURCE_EMPTY",
            format!("No tree.json or *.tree.json under {}", dir.display()),
        )),
        1 => Ok(found.remove(0)),
        _ => Err(DialogueError::new(
            "CLI_SOURCE_AMBIGUOUS",
            format!(
                "More than one dialogue tree under {}; pass the file directly.",
                dir.display()
            ),
        )),
    }
}

pub(crate) fn make_tree_scenario_id(tree_path: &Path) -> String {
    format!("{}{}", SCENARIO_REF_PREFIX, tree_path.display())
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn load_source_by_ref_validates_ref_prefix() {
        let error = load_source_by_ref("scripts-dir:/tmp").expect_err("invalid ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");

        let error = load_source_by_ref("").expect_err("empty ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
    }

    #[test]
    fn resolve_tree_path_validates_existence() {
        let missing = temp_path("missing-tree.json");
        let error = resolve_tree_path(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");
    }

    #[test]
    fn resolve_tree_path_searches_directories() {
        let root = temp_path("tree-dir");
        write_file(&root.join("nested").join("inn.tree.json"), SMALL_TREE);
        write_file(&root.join("testcase.json"), "{}");
        let resolved =
            resolve_tree_path(root.to_string_lossy().as_ref()).expect("tree should be found");
        assert!(resolved.ends_with("inn.tree.json"));

        let empty = temp_path("tree-dir-empty");
        write_file(&empty.join("readme.txt"), "nothing");
        let error = resolve_tree_path(empty.to_string_lossy().as_ref()).expect_err("empty dir");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");

        let ambiguous = temp_path("tree-dir-ambiguous");
        write_file(&ambiguous.join("tree.json"), SMALL_TREE);
        write_file(&ambiguous.join("b.tree.json"), SMALL_TREE);
        let error =
            resolve_tree_path(ambiguous.to_string_lossy().as_ref()).expect_err("ambiguous dir");
        assert_eq!(error.code, "CLI_SOURCE_AMBIGUOUS");
    }

    #[test]
    fn load_source_by_tree_path_reads_title_and_builds_ref() {
        let root = temp_path("tree-load");
        let tree_path = root.join("tree.json");
        write_file(&tree_path, SMALL_TREE);

        let loaded =
            load_source_by_tree_path(tree_path.to_string_lossy().as_ref()).expect("load should pass");
        assert_eq!(loaded.title, "Small");
        assert!(loaded.id.starts_with("tree-file:"));
        assert_eq!(loaded.tree_json, SMALL_TREE);

        let by_ref = load_source_by_ref(&loaded.id).expect("load by ref should pass");
        assert_eq!(by_ref.id, loaded.id);
        assert_eq!(by_ref.tree_path, loaded.tree_path);
    }

    #[test]
    fn load_source_by_tree_path_reports_invalid_json() {
        let root = temp_path("tree-invalid");
        let tree_path = root.join("tree.json");
        write_file(&tree_path, "{ nope");
        let error = load_source_by_tree_path(tree_path.to_string_lossy().as_ref())
            .expect_err("invalid tree should fail");
        assert_eq!(error.code, "API_TREE_INVALID");
    }

    #[test]
    fn equivalent_paths_share_one_scenario_id() {
        let root = temp_path("tree-canonical");
        write_file(&root.join("inn").join("tree.json"), SMALL_TREE);

        let direct = root.join("inn").join("tree.json");
        let direct = load_source_by_tree_path(direct.to_string_lossy().as_ref())
            .expect("direct path should load");
        let detour = root.join("inn").join("..").join("inn").join("tree.json");
        let via_detour = load_source_by_tree_path(detour.to_string_lossy().as_ref())
            .expect("detour should load");
        let via_dir = load_source_by_tree_path(root.join("inn").to_string_lossy().as_ref())
            .expect("dir should load");

        assert_eq!(via_detour.id, direct.id);
        assert_eq!(via_dir.id, direct.id);
        assert!(!direct.id.contains(".."));
    }

    #[test]
    fn make_tree_scenario_id_is_stable() {
        let path = temp_path("stable").join("tree.json");
        assert_eq!(make_tree_scenario_id(&path), make_tree_scenario_id(&path));
    }
}
