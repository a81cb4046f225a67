use std::fmt;

use serde::{Deserialize, Serialize};

/// A variable value. Dialogue state only ever holds these three shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl VarValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Falsy values are `false`, `0`, `NaN` and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::String(value) => !value.is_empty(),
        }
    }

    /// Numeric view used by comparisons. Strings are read like a float
    /// prefix (`"12px"` is 12), booleans map to 1 and 0.
    pub fn to_number(&self) -> Option<f64> {
        let number = match self {
            Self::Bool(value) => {
                if *value {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(value) => *value,
            Self::String(value) => parse_float_prefix(value)?,
        };
        number.is_finite().then_some(number)
    }

    /// Literal rules shared by `<<set>>` commands and command-line variables:
    /// boolean, then number, then quoted string, then the raw token.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }

        if let Some(number) = parse_number_literal(raw) {
            return Self::Number(number);
        }

        if let Some(inner) = strip_quotes(raw) {
            return Self::String(inner.to_string());
        }

        Self::String(raw.to_string())
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => write!(f, "{}", number_to_text(*value)),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for VarValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

fn number_to_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn parse_number_literal(raw: &str) -> Option<f64> {
    if raw.is_empty() || !raw.starts_with(|ch: char| ch.is_ascii_digit() || "+-.".contains(ch)) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn parse_float_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let candidate_len = trimmed
        .find(|ch: char| !(ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(trimmed.len());
    (1..=candidate_len)
        .rev()
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
}

fn strip_quotes(raw: &str) -> Option<&str> {
    if raw.len() < 2 {
        return None;
    }
    let quote = raw.chars().next()?;
    if (quote == '"' || quote == '\'') && raw.ends_with(quote) {
        return Some(&raw[1..raw.len() - 1]);
    }
    None
}
