//! Rule types and operator evaluation over resolved attribute values.

use audience_core::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single field/operator/value predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: RuleOperator,
    /// Absent for the unary operators (`is_empty`, `is_set`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
}

/// AND/OR combinator applied across a segment's rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLogic {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    IsEmpty,
    IsSet,
    Between,
}

/// The right-hand side of a rule. Lists carry the operands of `in`,
/// `not_in`, and `between`; everything else takes a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    List(Vec<FieldValue>),
    Scalar(FieldValue),
}

impl RuleValue {
    pub fn scalar(value: impl Into<FieldValue>) -> Self {
        RuleValue::Scalar(value.into())
    }

    pub fn list(values: Vec<FieldValue>) -> Self {
        RuleValue::List(values)
    }

    fn as_scalar(&self) -> Option<&FieldValue> {
        match self {
            RuleValue::Scalar(v) => Some(v),
            RuleValue::List(_) => None,
        }
    }

    fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            RuleValue::List(vs) => Some(vs),
            RuleValue::Scalar(_) => None,
        }
    }
}

/// Evaluate one operator against a resolved attribute value.
///
/// `resolved` is `None` when the field is absent on the entity and
/// `Some(Null)` when it is present but empty. Any type mismatch, missing
/// operand, or malformed bound evaluates to `false`: one bad rule degrades
/// to a non-match for that rule instead of aborting a batch of thousands of
/// entities.
pub fn evaluate(
    resolved: Option<&FieldValue>,
    operator: RuleOperator,
    rule_value: Option<&RuleValue>,
) -> bool {
    let scalar = rule_value.and_then(RuleValue::as_scalar);
    let list = rule_value.and_then(RuleValue::as_list);

    match operator {
        RuleOperator::Equals => scalar.map_or(false, |e| values_equal(resolved, e)),
        RuleOperator::NotEquals => scalar.map_or(false, |e| !values_equal(resolved, e)),
        RuleOperator::Contains => text_match(resolved, scalar, |a, e| a.contains(e)),
        RuleOperator::StartsWith => text_match(resolved, scalar, |a, e| a.starts_with(e)),
        RuleOperator::EndsWith => text_match(resolved, scalar, |a, e| a.ends_with(e)),
        RuleOperator::GreaterThan => {
            ordering(resolved, scalar).map_or(false, |o| o == Ordering::Greater)
        }
        RuleOperator::LessThan => {
            ordering(resolved, scalar).map_or(false, |o| o == Ordering::Less)
        }
        RuleOperator::In => in_list(resolved, list),
        RuleOperator::NotIn => !in_list(resolved, list),
        RuleOperator::IsEmpty => is_empty(resolved),
        RuleOperator::IsSet => !is_empty(resolved),
        RuleOperator::Between => between(resolved, list),
    }
}

/// Absent, null, and blank strings all count as empty.
fn is_empty(resolved: Option<&FieldValue>) -> bool {
    match resolved {
        None => true,
        Some(v) => v.is_empty_like(),
    }
}

/// Type-coerced equality. Strings compare case-insensitively; a numeric
/// string equals the number it parses to. An absent value equals nothing.
fn values_equal(resolved: Option<&FieldValue>, expected: &FieldValue) -> bool {
    let actual = match resolved {
        Some(v) => v,
        None => return false,
    };

    match (actual, expected) {
        (FieldValue::Null, FieldValue::Null) => true,
        (FieldValue::Bool(a), FieldValue::Bool(e)) => a == e,
        (FieldValue::Text(a), FieldValue::Text(e)) => a.eq_ignore_ascii_case(e),
        _ => match (numeric(actual), numeric(expected)) {
            (Some(a), Some(e)) => a == e,
            _ => false,
        },
    }
}

/// Case-insensitive substring/prefix/suffix matching; both operands must be
/// strings.
fn text_match(
    resolved: Option<&FieldValue>,
    expected: Option<&FieldValue>,
    test: impl Fn(&str, &str) -> bool,
) -> bool {
    let actual = resolved.and_then(FieldValue::as_str);
    let expected = expected.and_then(FieldValue::as_str);
    match (actual, expected) {
        (Some(a), Some(e)) => test(&a.to_lowercase(), &e.to_lowercase()),
        _ => false,
    }
}

/// Order two values as numbers or as dates. `None` when either side is
/// neither.
fn ordering(resolved: Option<&FieldValue>, expected: Option<&FieldValue>) -> Option<Ordering> {
    let actual = resolved?;
    let expected = expected?;

    if let (Some(a), Some(e)) = (numeric(actual), numeric(expected)) {
        return a.partial_cmp(&e);
    }
    if let (Some(a), Some(e)) = (actual.as_datetime(), expected.as_datetime()) {
        return Some(a.cmp(&e));
    }
    None
}

/// Lenient numeric view: numbers as-is, numeric strings parsed.
fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Membership against the rule list using scalar equality semantics.
fn in_list(resolved: Option<&FieldValue>, list: Option<&[FieldValue]>) -> bool {
    match list {
        Some(items) => items.iter().any(|item| values_equal(resolved, item)),
        None => false,
    }
}

/// Inclusive range check; the bound must be exactly two orderable elements.
fn between(resolved: Option<&FieldValue>, list: Option<&[FieldValue]>) -> bool {
    let bounds = match list {
        Some(b) if b.len() == 2 => b,
        _ => return false,
    };
    let lower = ordering(resolved, Some(&bounds[0]));
    let upper = ordering(resolved, Some(&bounds[1]));
    match (lower, upper) {
        (Some(lo), Some(hi)) => lo != Ordering::Less && hi != Ordering::Greater,
        _ => false,
    }
}
