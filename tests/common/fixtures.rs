use form_builder::form::condition::{Combinator, Condition, Operand, Rule};
use form_builder::form::form_model::{Field, FieldSet};

pub fn rule(target: &str, value: &str) -> Rule {
    Rule::new(target, "=", value)
}

pub fn rule_operand(target: &str, value: &str) -> Operand {
    Operand::Rule(rule(target, value))
}

pub fn text_field(id: &str, title: &str) -> Field {
    Field::new(id)
        .with_attribute("type", "text")
        .with_attribute("title", title)
        .with_attribute("required", true)
}

pub fn select_field(id: &str, title: &str, values: &[&str]) -> Field {
    Field::new(id)
        .with_attribute("type", "singleselect")
        .with_attribute("title", title)
        .with_option_group(values, Condition::Empty)
}

/// State (`state_id`) plus a District field gated per state through option groups.
pub fn state_district_form(state_id: &str, district_id: &str) -> FieldSet {
    let state = select_field(state_id, "State", &["Kerala", "Goa"]);
    let district = Field::new(district_id)
        .with_attribute("type", "singleselect")
        .with_attribute("title", "District")
        .with_option_group(
            &["Kochi", "Kannur"],
            Condition::Rule(rule(state_id, "Kerala")),
        )
        .with_option_group(&["Panaji"], Condition::Rule(rule(state_id, "Goa")));
    FieldSet::new(vec![state, district])
}

/// `{"and": [{"or": [a, a]}, b]}`
pub fn nested_condition(a: &str, b: &str) -> Condition {
    Condition::Combinator(Combinator::and(vec![
        Operand::Combinator(Combinator::or(vec![
            rule_operand(a, "yes"),
            rule_operand(a, "maybe"),
        ])),
        rule_operand(b, "customer"),
    ]))
}

/// Structure of a condition with every identifier blanked out.
pub fn shape(condition: &Condition) -> String {
    fn operand_shape(op: &Operand) -> String {
        match op {
            Operand::Rule(r) => format!("rule({})", r.operator),
            Operand::Combinator(c) => combinator_shape(c),
        }
    }
    fn combinator_shape(c: &Combinator) -> String {
        let inner: Vec<String> = c.operands.iter().map(operand_shape).collect();
        format!("{}[{}]", c.kind.key(), inner.join(","))
    }
    match condition {
        Condition::Empty => "empty".to_string(),
        Condition::Rule(r) => format!("rule({})", r.operator),
        Condition::RuleList(operands) => format!(
            "list[{}]",
            operands.iter().map(operand_shape).collect::<Vec<_>>().join(",")
        ),
        Condition::Combinator(c) => combinator_shape(c),
    }
}

/// Every condition target in the form, field-level and option-group-level, in order.
pub fn all_targets(form: &FieldSet) -> Vec<String> {
    form.iter()
        .flat_map(|f| {
            f.conditions()
                .flat_map(|(_, c)| c.targets().into_iter().map(|t| t.to_string()).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect()
}
