mod conditions;
mod engine;
mod node_processor;
mod var_ops;
mod variables;

pub use conditions::{evaluate_condition, evaluate_conditions, VariableSource};
pub use engine::{DialogueProgram, DialogueRuntime, DialogueRuntimeOptions};
pub use node_processor::{
    is_valid_next_node, matched_block, process_node, process_node_with_block, render_text,
    select_block,
};
pub use var_ops::{
    execute_variable_operations, parse_set_commands, strip_set_commands, AssignOp, SetCommand,
};
pub use variables::VariableStore;
