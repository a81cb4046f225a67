use std::ops::Range;

use dlg_core::VarValue;
use tracing::trace;

use crate::variables::VariableStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignOp {
    fn apply(self, current: f64, operand: f64) -> f64 {
        match self {
            Self::Set => operand,
            Self::Add => current + operand,
            Self::Subtract => current - operand,
            Self::Multiply => current * operand,
            Self::Divide => current / operand,
        }
    }
}

/// One `<<set $name OP value>>` command found in node text.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCommand {
    pub variable: String,
    pub op: AssignOp,
    pub value: VarValue,
    pub span: Range<usize>,
}

/// Finds every well-formed set command in textual order. Malformed
/// commands are skipped and left in the text.
pub fn parse_set_commands(content: &str) -> Vec<SetCommand> {
    let mut commands = Vec::new();
    let mut cursor = 0usize;
    while let Some(offset) = content[cursor..].find("<<") {
        let start = cursor + offset;
        match CommandScanner::new(content, start).parse() {
            Some(command) => {
                cursor = command.span.end;
                commands.push(command);
            }
            None => cursor = start + 2,
        }
    }
    commands
}

/// Applies all set commands in `content` to `store`, returning how many
/// changed a value. Compound assignment on a non-number is skipped.
pub fn execute_variable_operations(content: &str, store: &mut VariableStore) -> usize {
    let mut applied = 0usize;
    for command in parse_set_commands(content) {
        if apply_command(&command, store) {
            applied += 1;
        }
    }
    applied
}

pub fn strip_set_commands(content: &str) -> String {
    let commands = parse_set_commands(content);
    if commands.is_empty() {
        return content.to_string();
    }
    let mut output = String::with_capacity(content.len());
    let mut last_index = 0usize;
    for command in commands {
        output.push_str(&content[last_index..command.span.start]);
        last_index = command.span.end;
    }
    output.push_str(&content[last_index..]);
    output.trim().to_string()
}

fn apply_command(command: &SetCommand, store: &mut VariableStore) -> bool {
    if command.op == AssignOp::Set {
        trace!(variable = %command.variable, value = %command.value, "set variable");
        store.set(command.variable.clone(), command.value.clone());
        return true;
    }

    let current = store.get(&command.variable).and_then(VarValue::as_number);
    match (current, command.value.as_number()) {
        (Some(current), Some(operand)) => {
            let next = command.op.apply(current, operand);
            trace!(variable = %command.variable, from = current, to = next, "update variable");
            store.set(command.variable.clone(), next);
            true
        }
        _ => {
            trace!(variable = %command.variable, "compound assignment skipped on non-number");
            false
        }
    }
}

struct CommandScanner<'a> {
    source: &'a str,
    start: usize,
    pos: usize,
}

impl<'a> CommandScanner<'a> {
    fn new(source: &'a str, start: usize) -> Self {
        Self {
            source,
            start,
            pos: start + 2,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn parse(mut self) -> Option<SetCommand> {
        self.skip_whitespace();
        self.eat("set")?;
        if self.skip_whitespace() == 0 {
            return None;
        }
        self.eat("$")?;
        let variable = self.take_identifier()?;
        self.skip_whitespace();
        let op = self.take_operator()?;
        self.skip_whitespace();
        let raw_value = self.take_value()?;

        Some(SetCommand {
            variable: variable.to_string(),
            op,
            value: VarValue::parse_literal(raw_value),
            span: self.start..self.pos,
        })
    }

    fn skip_whitespace(&mut self) -> usize {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
        skipped
    }

    fn eat(&mut self, token: &str) -> Option<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Some(())
        } else {
            None
        }
    }

    fn take_identifier(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn take_operator(&mut self) -> Option<AssignOp> {
        const OPERATORS: [(&str, AssignOp); 5] = [
            ("+=", AssignOp::Add),
            ("-=", AssignOp::Subtract),
            ("*=", AssignOp::Multiply),
            ("/=", AssignOp::Divide),
            ("=", AssignOp::Set),
        ];
        OPERATORS.iter().find_map(|(token, op)| {
            self.rest().starts_with(token).then(|| {
                self.pos += token.len();
                *op
            })
        })
    }

    /// A quoted value may contain `>>`; anything else runs to the first `>>`.
    fn take_value(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|ch| *ch == '"' || *ch == '\'') {
            if let Some(close) = rest[1..].find(quote) {
                let quoted_end = close + 2;
                let after = &rest[quoted_end..];
                let trailing = after.len() - after.trim_start().len();
                if after.trim_start().starts_with(">>") {
                    self.pos += quoted_end + trailing + 2;
                    return Some(&rest[..quoted_end]);
                }
            }
        }

        let end = rest.find(">>")?;
        let raw = rest[..end].trim();
        if raw.is_empty() {
            return None;
        }
        self.pos += end + 2;
        Some(raw)
    }
}
