use std::collections::{BTreeMap, BTreeSet, HashMap};

use dlg_core::{Condition, ConditionOperator, VarValue};
use tracing::debug;

use crate::variables::VariableStore;

/// Read access to variables for condition checks.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<&VarValue>;
}

impl VariableSource for VariableStore {
    fn lookup(&self, name: &str) -> Option<&VarValue> {
        self.get(name)
    }
}

impl VariableSource for BTreeMap<String, VarValue> {
    fn lookup(&self, name: &str) -> Option<&VarValue> {
        self.get(name)
    }
}

impl VariableSource for HashMap<String, VarValue> {
    fn lookup(&self, name: &str) -> Option<&VarValue> {
        self.get(name)
    }
}

static MEMORY_FLAG_VALUE: VarValue = VarValue::Bool(true);
static NUMERIC_DEFAULT: VarValue = VarValue::Number(0.0);

pub fn evaluate_condition<V: VariableSource + ?Sized>(
    condition: &Condition,
    variables: &V,
    memory_flags: Option<&BTreeSet<String>>,
) -> bool {
    let mut value = variables.lookup(&condition.flag).or_else(|| {
        memory_flags
            .filter(|flags| flags.contains(&condition.flag))
            .map(|_| &MEMORY_FLAG_VALUE)
    });

    // Unset flags compare as zero.
    if condition.operator.is_numeric() && value.is_none() {
        value = Some(&NUMERIC_DEFAULT);
    }

    match condition.operator {
        ConditionOperator::IsSet => is_set(value),
        ConditionOperator::IsNotSet => !is_set(value),
        ConditionOperator::Equals => value == condition.value.as_ref(),
        ConditionOperator::NotEquals => value != condition.value.as_ref(),
        ConditionOperator::GreaterThan
        | ConditionOperator::LessThan
        | ConditionOperator::GreaterEqual
        | ConditionOperator::LessEqual => {
            compare_numbers(condition.operator, value, condition.value.as_ref())
        }
        ConditionOperator::Unknown => {
            debug!(flag = %condition.flag, "unknown condition operator treated as true");
            true
        }
    }
}

/// Conjunction of all conditions; an empty list holds.
pub fn evaluate_conditions<V: VariableSource + ?Sized>(
    conditions: &[Condition],
    variables: &V,
    memory_flags: Option<&BTreeSet<String>>,
) -> bool {
    conditions
        .iter()
        .all(|condition| evaluate_condition(condition, variables, memory_flags))
}

fn is_set(value: Option<&VarValue>) -> bool {
    value.is_some_and(VarValue::is_truthy)
}

fn compare_numbers(
    operator: ConditionOperator,
    value: Option<&VarValue>,
    expected: Option<&VarValue>,
) -> bool {
    let (Some(left), Some(right)) = (
        value.and_then(VarValue::to_number),
        expected.and_then(VarValue::to_number),
    ) else {
        return false;
    };

    match operator {
        ConditionOperator::GreaterThan => left > right,
        ConditionOperator::LessThan => left < right,
        ConditionOperator::GreaterEqual => left >= right,
        ConditionOperator::LessEqual => left <= right,
        _ => false,
    }
}
