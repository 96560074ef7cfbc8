use serde_json::Value;

use crate::form::form_model::FieldSet;
use crate::form::ingest::ingest_field_set;
use crate::reconcile::error::FormError;

/// Strip markdown fences and surrounding chatter, leaving the first complete
/// JSON value that can hold fields: an array of objects or an object.
///
/// Brackets in the prose (`"the form [v2]:"`) are skipped because they do not
/// start a value of that kind.
pub fn extract_json(text: &str) -> Option<&str> {
    let body = strip_fences(text.trim());

    body.char_indices()
        .filter(|(_, c)| *c == '[' || *c == '{')
        .find_map(|(start, _)| {
            let mut values = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(value)) if holds_fields(&value) => {
                    Some(&body[start..start + values.byte_offset()])
                }
                _ => None,
            }
        })
}

fn holds_fields(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(Value::is_object),
        Value::Object(_) => true,
        _ => false,
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline.
    let body = rest.split_once('\n').map_or(rest, |(_, b)| b);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Generator output text -> candidate field-set.
pub fn parse_generated(text: &str) -> Result<FieldSet, FormError> {
    let json = match extract_json(text) {
        Some(json) => json,
        // Nothing parsed cleanly: hand the first bracket onwards to serde_json
        // so the error names what is wrong with it.
        None => {
            let body = strip_fences(text.trim());
            let start = body
                .find(['[', '{'])
                .ok_or_else(|| FormError::Generator("no JSON array found in completion".into()))?;
            &body[start..]
        }
    };

    let value: Value = serde_json::from_str(json).map_err(|e| FormError::JsonParse {
        context: "generator output".into(),
        source: e,
    })?;

    ingest_field_set(&value)
}
