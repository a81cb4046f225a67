use dlg_api::{parse_tree_json, validate_tree};
use dlg_core::DialogueError;

use crate::{json_string, load_source_by_tree_path, CheckArgs};

/// Validates a tree file. Dangling references are reported but do not fail.
pub(crate) fn run_check(args: CheckArgs) -> Result<i32, DialogueError> {
    let scenario = load_source_by_tree_path(&args.tree)?;
    let tree = parse_tree_json(&scenario.tree_json)?;
    let warnings = validate_tree(&tree)?;

    println!("RESULT:OK");
    println!("TREE_ID_JSON:{}", json_string(&tree.id));
    println!("NODE_COUNT:{}", tree.nodes.len());
    for warning in &warnings {
        println!("WARNING_JSON:{}", json_string(&warning.to_string()));
    }
    println!("WARNING_COUNT:{}", warnings.len());
    Ok(0)
}
