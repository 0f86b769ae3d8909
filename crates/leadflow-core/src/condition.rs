// Leadflow Core - Condition evaluation
//
// Conditions gate triggers and individual actions. A condition is a
// field-path/operator/value triple evaluated against an arbitrary JSON
// record. Lists combine with logical AND and short-circuit on the first
// failure; an empty list is vacuously true.
//
// Evaluation never fails: unresolvable paths yield an undefined value and
// malformed conditions evaluate to false (fail closed). The evaluator has
// no side effects and is safe to call from any number of concurrent
// executions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LeadflowError, LeadflowResult};

/// A single field/operator/value predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Dot-separated path into the record (e.g. "contact.email")
    pub field: String,

    /// Comparison operator
    pub operator: ConditionOperator,

    /// Expected value (absent for emptiness checks)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

/// Comparison operators for conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Strict value equality
    Equals,
    /// Strict value inequality
    NotEquals,
    /// Substring test after string-coercing both operands
    Contains,
    /// Negated substring test
    NotContains,
    /// Numeric-coerced comparison (non-numeric operands compare as 0)
    GreaterThan,
    /// Numeric-coerced comparison
    LessThan,
    /// True when the value is undefined, null, or the empty string
    IsEmpty,
    /// Negation of IsEmpty
    IsNotEmpty,
}

impl Condition {
    /// Structural validation, used when a definition is stored.
    /// Runtime evaluation never calls this; it fails closed instead.
    pub fn validate(&self) -> LeadflowResult<()> {
        if self.field.trim().is_empty() {
            return Err(LeadflowError::Condition(
                "condition field path is empty".to_string(),
            ));
        }
        if self.field.split('.').any(|seg| seg.is_empty()) {
            return Err(LeadflowError::Condition(format!(
                "condition field path '{}' has an empty segment",
                self.field
            )));
        }
        Ok(())
    }
}

/// Evaluate a condition list against a record. AND semantics,
/// short-circuiting on the first false condition.
pub fn evaluate_all(conditions: &[Condition], record: &Value) -> bool {
    conditions.iter().all(|c| evaluate(c, record))
}

/// Evaluate one condition against a record
pub fn evaluate(condition: &Condition, record: &Value) -> bool {
    if condition.field.trim().is_empty() {
        debug!("condition has empty field path, evaluating false");
        return false;
    }

    let resolved = resolve_path(record, &condition.field);

    match condition.operator {
        ConditionOperator::Equals => resolved == &condition.value,
        ConditionOperator::NotEquals => resolved != &condition.value,
        ConditionOperator::Contains => {
            coerce_string(resolved).contains(&coerce_string(&condition.value))
        }
        ConditionOperator::NotContains => {
            !coerce_string(resolved).contains(&coerce_string(&condition.value))
        }
        ConditionOperator::GreaterThan => coerce_number(resolved) > coerce_number(&condition.value),
        ConditionOperator::LessThan => coerce_number(resolved) < coerce_number(&condition.value),
        ConditionOperator::IsEmpty => is_empty(resolved),
        ConditionOperator::IsNotEmpty => !is_empty(resolved),
    }
}

/// Resolve a dot-separated path into a JSON value. Missing intermediate
/// keys resolve to Null rather than failing.
pub fn resolve_path<'a>(record: &'a Value, path: &str) -> &'a Value {
    let mut current = record;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return &Value::Null,
        }
    }
    current
}

/// String coercion used by contains/not_contains and message templating
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
