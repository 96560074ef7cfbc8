use serde_json::{Map, Value};

use crate::form::condition::{Condition, json_kind};
use crate::form::form_model::{Field, FieldId, FieldSet, OptionGroup};
use crate::reconcile::error::FormError;

/// Turn a parsed JSON document into a `FieldSet`.
///
/// Accepts a bare array of field objects, or an object whose only
/// array-valued entry holds them (`{"fields": [...]}`).
pub fn ingest_field_set(value: &Value) -> Result<FieldSet, FormError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut arrays = map.iter().filter_map(|(k, v)| v.as_array().map(|a| (k, a)));
            match (arrays.next(), arrays.next()) {
                (Some((_, items)), None) => items,
                _ => {
                    return Err(FormError::malformed(
                        "$",
                        "expected an array of fields, found an object without a single field list",
                    ));
                }
            }
        }
        other => {
            return Err(FormError::malformed(
                "$",
                format!("expected an array of fields, found {}", json_kind(other)),
            ));
        }
    };

    let fields = items
        .iter()
        .enumerate()
        .map(|(i, item)| ingest_field(item, &format!("fields[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FieldSet::new(fields))
}

/// Parse JSON text and ingest it. `context` names the source in parse errors.
pub fn parse_field_set(text: &str, context: &str) -> Result<FieldSet, FormError> {
    let value: Value = serde_json::from_str(text).map_err(|e| FormError::JsonParse {
        context: context.to_string(),
        source: e,
    })?;
    ingest_field_set(&value)
}

fn ingest_field(value: &Value, path: &str) -> Result<Field, FormError> {
    let map = value.as_object().ok_or_else(|| {
        FormError::malformed(path, format!("expected a field object, found {}", json_kind(value)))
    })?;

    let mut attributes: Map<String, Value> = map.clone();

    let id = match attributes.remove("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => FieldId::new(s),
        Some(other) => {
            return Err(FormError::malformed(
                format!("{}.id", path),
                format!("identifier must be a non-empty string, found {}", json_kind(&other)),
            ));
        }
        None => return Err(FormError::malformed(path, "field has no 'id'")),
    };

    let condition = match attributes.remove("conditions") {
        Some(raw) => Condition::from_value(&raw, &format!("{}.conditions", path))?,
        None => Condition::Empty,
    };

    let option_groups = match attributes.remove("options") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(groups)) => groups
            .iter()
            .enumerate()
            .map(|(i, g)| ingest_option_group(g, &format!("{}.options[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(FormError::malformed(
                format!("{}.options", path),
                format!("expected a list of option groups, found {}", json_kind(&other)),
            ));
        }
    };

    Ok(Field {
        id,
        condition,
        option_groups,
        attributes,
    })
}

fn ingest_option_group(value: &Value, path: &str) -> Result<OptionGroup, FormError> {
    let map = value.as_object().ok_or_else(|| {
        FormError::malformed(
            path,
            format!("expected an option group object, found {}", json_kind(value)),
        )
    })?;

    let mut attributes: Map<String, Value> = map.clone();

    let values = match attributes.remove("values") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(FormError::malformed(
                format!("{}.values", path),
                format!("expected a list of values, found {}", json_kind(&other)),
            ));
        }
    };

    let condition = match attributes.remove("conditions") {
        Some(raw) => Condition::from_value(&raw, &format!("{}.conditions", path))?,
        None => Condition::Empty,
    };

    Ok(OptionGroup {
        values,
        condition,
        attributes,
    })
}
