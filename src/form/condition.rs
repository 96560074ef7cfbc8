use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::form::form_model::FieldId;
use crate::reconcile::error::FormError;

/// Boolean structure gating a field or an option group.
///
/// The generator writes conditions in several loose shapes (`{}` vs `[]` for
/// "no condition", bare rule vs list vs `and`/`or` object). They are normalised
/// into this enum on ingestion and written back in one canonical shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    #[default]
    Empty,
    Rule(Rule),
    /// Implicitly AND-combined. Usually bare rules; an `and`/`or` object in
    /// the list is kept in place.
    RuleList(Vec<Operand>),
    Combinator(Combinator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub field: FieldId,
    pub operator: Operator,
    /// `None` when the rule had no `value` key; written back the same way.
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    And,
    Or,
}

impl CombinatorKind {
    pub fn key(self) -> &'static str {
        match self {
            CombinatorKind::And => "and",
            CombinatorKind::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    pub kind: CombinatorKind,
    /// Never empty once ingested.
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Rule(Rule),
    Combinator(Combinator),
}

/// Comparison operator, kept exactly as written (`=` and `==` stay distinct).
///
/// The generator is asked for `= != > < >= <= contains not_contains empty
/// not_empty is_selected is_not_selected`; anything else passes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Operator(String);

impl Operator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator(s.to_string())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Rule {
    pub fn new(field: impl Into<FieldId>, operator: &str, value: impl Into<Value>) -> Self {
        Rule {
            field: field.into(),
            operator: Operator::from(operator),
            value: Some(value.into()),
        }
    }
}

impl Combinator {
    pub fn and(operands: Vec<Operand>) -> Self {
        Combinator {
            kind: CombinatorKind::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Operand>) -> Self {
        Combinator {
            kind: CombinatorKind::Or,
            operands,
        }
    }
}

impl From<Rule> for Operand {
    fn from(rule: Rule) -> Self {
        Operand::Rule(rule)
    }
}

impl From<Combinator> for Operand {
    fn from(c: Combinator) -> Self {
        Operand::Combinator(c)
    }
}

// ============================================================================
// Traversal
// ============================================================================

impl Condition {
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::Empty)
    }

    /// Every rule reachable from this condition, in document order.
    pub fn rules(&self) -> Vec<&Rule> {
        let mut out = Vec::new();
        match self {
            Condition::Empty => {}
            Condition::Rule(rule) => out.push(rule),
            Condition::RuleList(operands) => collect_rules(operands, &mut out),
            Condition::Combinator(c) => collect_rules(&c.operands, &mut out),
        }
        out
    }

    /// Field ids referenced anywhere in this condition, duplicates kept.
    pub fn targets(&self) -> Vec<&FieldId> {
        self.rules().into_iter().map(|r| &r.field).collect()
    }
}

fn collect_rules<'a>(operands: &'a [Operand], out: &mut Vec<&'a Rule>) {
    for operand in operands {
        match operand {
            Operand::Rule(rule) => out.push(rule),
            Operand::Combinator(inner) => collect_rules(&inner.operands, out),
        }
    }
}

// ============================================================================
// Ingestion (loose JSON -> Condition)
// ============================================================================

impl Condition {
    /// Normalise a raw JSON condition. `path` locates it in error messages.
    pub fn from_value(value: &Value, path: &str) -> Result<Condition, FormError> {
        match value {
            Value::Null => Ok(Condition::Empty),
            Value::Object(map) if map.is_empty() => Ok(Condition::Empty),
            Value::Array(items) if items.is_empty() => Ok(Condition::Empty),
            Value::Object(_) => match parse_operand(value, path)? {
                Operand::Rule(rule) => Ok(Condition::Rule(rule)),
                Operand::Combinator(c) => Ok(Condition::Combinator(c)),
            },
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_operand(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Condition::RuleList),
            other => Err(FormError::malformed(
                path,
                format!("expected a condition object or list, found {}", json_kind(other)),
            )),
        }
    }
}

fn parse_operand(value: &Value, path: &str) -> Result<Operand, FormError> {
    let map = value.as_object().ok_or_else(|| {
        FormError::malformed(
            path,
            format!("expected a rule or and/or object, found {}", json_kind(value)),
        )
    })?;

    if let Some(target) = map.get("field") {
        return parse_rule(target, map, path).map(Operand::Rule);
    }

    let kind = match (map.get("and"), map.get("or")) {
        (Some(_), None) => CombinatorKind::And,
        (None, Some(_)) => CombinatorKind::Or,
        (Some(_), Some(_)) => {
            return Err(FormError::malformed(
                path,
                "object has both 'and' and 'or' keys",
            ));
        }
        (None, None) => {
            return Err(FormError::malformed(
                path,
                "object is neither a rule ('field') nor a combinator ('and'/'or')",
            ));
        }
    };

    let operand_path = format!("{}.{}", path, kind.key());
    let items = map[kind.key()].as_array().ok_or_else(|| {
        FormError::malformed(operand_path.clone(), "combinator operands must be a list")
    })?;
    if items.is_empty() {
        return Err(FormError::malformed(
            operand_path,
            "combinator has no operands",
        ));
    }

    let operands = items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_operand(item, &format!("{}[{}]", operand_path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Operand::Combinator(Combinator { kind, operands }))
}

fn parse_rule(
    target: &Value,
    map: &serde_json::Map<String, Value>,
    path: &str,
) -> Result<Rule, FormError> {
    let field = match target {
        Value::String(s) if !s.trim().is_empty() => FieldId::new(s.clone()),
        other => {
            return Err(FormError::malformed(
                format!("{}.field", path),
                format!("rule target must be a non-empty string, found {}", json_kind(other)),
            ));
        }
    };

    let operator = match map.get("operator") {
        Some(Value::String(s)) => Operator::from(s.as_str()),
        Some(other) => {
            return Err(FormError::malformed(
                format!("{}.operator", path),
                format!("operator must be a string, found {}", json_kind(other)),
            ));
        }
        None => {
            return Err(FormError::malformed(path, "rule has no 'operator'"));
        }
    };

    Ok(Rule {
        field,
        operator,
        value: map.get("value").cloned(),
    })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Canonical serialization
// ============================================================================

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(if self.value.is_some() { 3 } else { 2 }))?;
        map.serialize_entry("field", &self.field)?;
        map.serialize_entry("operator", &self.operator)?;
        if let Some(value) = &self.value {
            map.serialize_entry("value", value)?;
        }
        map.end()
    }
}

impl Serialize for Combinator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.kind.key(), &self.operands)?;
        map.end()
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Operand::Rule(rule) => rule.serialize(serializer),
            Operand::Combinator(c) => c.serialize(serializer),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Empty => serializer.serialize_map(Some(0))?.end(),
            Condition::Rule(rule) => rule.serialize(serializer),
            Condition::RuleList(rules) => rules.serialize(serializer),
            Condition::Combinator(c) => c.serialize(serializer),
        }
    }
}
