use crate::form::condition::{Combinator, Condition, Operand, Rule};
use crate::form::form_model::{Field, FieldSet};
use crate::reconcile::identity::IdMapping;

/// Rewrite every field reference in `condition` through `mapping`.
///
/// Targets missing from the mapping pass through unchanged; the round
/// reports them as dangling afterwards.
pub fn rewrite(condition: &Condition, mapping: &IdMapping) -> Condition {
    match condition {
        Condition::Empty => Condition::Empty,
        Condition::Rule(rule) => Condition::Rule(rewrite_rule(rule, mapping)),
        Condition::RuleList(operands) => Condition::RuleList(rewrite_operands(operands, mapping)),
        Condition::Combinator(c) => Condition::Combinator(rewrite_combinator(c, mapping)),
    }
}

fn rewrite_rule(rule: &Rule, mapping: &IdMapping) -> Rule {
    Rule {
        field: mapping.get(&rule.field).unwrap_or(&rule.field).clone(),
        operator: rule.operator.clone(),
        value: rule.value.clone(),
    }
}

fn rewrite_combinator(c: &Combinator, mapping: &IdMapping) -> Combinator {
    Combinator {
        kind: c.kind,
        operands: rewrite_operands(&c.operands, mapping),
    }
}

fn rewrite_operands(operands: &[Operand], mapping: &IdMapping) -> Vec<Operand> {
    operands
        .iter()
        .map(|operand| match operand {
            Operand::Rule(rule) => Operand::Rule(rewrite_rule(rule, mapping)),
            Operand::Combinator(inner) => Operand::Combinator(rewrite_combinator(inner, mapping)),
        })
        .collect()
}

/// Rewrite both attachment points of one field: its own condition and the
/// condition of every option group.
pub fn rewrite_field(field: &mut Field, mapping: &IdMapping) {
    field.condition = rewrite(&field.condition, mapping);

    for group in field.option_groups.iter_mut() {
        group.condition = rewrite(&group.condition, mapping);
    }
}

pub fn rewrite_field_set(fields: &mut FieldSet, mapping: &IdMapping) {
    for field in fields.fields.iter_mut() {
        rewrite_field(field, mapping);
    }
}
