//! Condition Operators
//!
//! Every check returns a plain bool. Coercion failures and type mismatches
//! count as "not satisfied"; nothing here can fail an evaluation.

use crate::context::resolve;
use crate::model::{Condition, Literal, Operator};
use serde_json::Value;

/// Test one condition against the context
pub fn condition_holds(condition: &Condition, context: &Value) -> bool {
    // absent never satisfies any operator, negative ones included
    let Some(actual) = resolve(context, condition.field()) else {
        return false;
    };

    let target = condition.value();
    match condition.operator() {
        Operator::Equals => target.matches(actual),
        Operator::NotEquals => !target.matches(actual),
        Operator::GreaterThan => compare(actual, target, |a, b| a > b),
        Operator::LessThan => compare(actual, target, |a, b| a < b),
        Operator::GreaterEqual => compare(actual, target, |a, b| a >= b),
        Operator::LessEqual => compare(actual, target, |a, b| a <= b),
        Operator::In => member_of(actual, target).unwrap_or(false),
        Operator::NotIn => member_of(actual, target).map_or(false, |found| !found),
        Operator::Contains => contains(actual, target),
        Operator::Exists => matches!(target, Literal::Bool(true)),
    }
}

fn compare(actual: &Value, target: &Literal, op: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(actual), target) {
        (Some(a), Literal::Number(b)) => op(a, *b),
        _ => false,
    }
}

/// Numeric coercion: numbers, numeric strings and booleans
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// `None` when the target is not a list
fn member_of(actual: &Value, target: &Literal) -> Option<bool> {
    match target {
        Literal::List(items) => Some(items.iter().any(|item| item.matches(actual))),
        _ => None,
    }
}

fn contains(actual: &Value, target: &Literal) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| target.matches(item)),
        other => text_form(other).contains(&target.text_form()),
    }
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
