use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::form::condition::Condition;
use crate::reconcile::error::FormError;

/// Opaque field identifier. Placeholders emitted by the generator and
/// minted UUIDs share this type; only the used-identifier set tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        FieldId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        FieldId(s.to_string())
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        FieldId(s)
    }
}

/// Field types whose option groups are shown to the user.
const CHOICE_TYPES: [&str; 4] = ["singleselect", "multiselect", "radio", "checkbox"];

/// A bundle of selectable values and the condition under which it is offered.
///
/// Values are kept as written (strings, numbers, ...), and so is any other
/// key on the group object.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup {
    pub values: Vec<Value>,
    pub condition: Condition,
    pub attributes: Map<String, Value>,
}

impl OptionGroup {
    pub fn new(values: &[&str], condition: Condition) -> Self {
        OptionGroup {
            values: values.iter().map(|v| Value::from(*v)).collect(),
            condition,
            attributes: Map::new(),
        }
    }
}

impl Serialize for OptionGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 2))?;
        map.serialize_entry("values", &self.values)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("conditions", &self.condition)?;
        map.end()
    }
}

/// One form input.
///
/// Only `id`, `conditions` and `options` are interpreted. Every other key the
/// generator produced (`type`, `title`, `required`, ...) is kept verbatim in
/// `attributes` and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub condition: Condition,
    pub option_groups: Vec<OptionGroup>,
    pub attributes: Map<String, Value>,
}

impl Field {
    pub fn new(id: impl Into<FieldId>) -> Self {
        Field {
            id: id.into(),
            condition: Condition::Empty,
            option_groups: Vec::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_option_group(mut self, values: &[&str], condition: Condition) -> Self {
        self.option_groups.push(OptionGroup::new(values, condition));
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The `type` attribute; fields without one render as text inputs.
    pub fn field_type(&self) -> &str {
        self.attributes
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("text")
    }

    pub fn is_choice(&self) -> bool {
        CHOICE_TYPES.contains(&self.field_type())
    }

    /// Every condition attached to this field: its own first, then one per option group.
    pub fn conditions(&self) -> impl Iterator<Item = (Attachment, &Condition)> {
        std::iter::once((Attachment::Field, &self.condition)).chain(
            self.option_groups
                .iter()
                .enumerate()
                .map(|(i, g)| (Attachment::OptionGroup(i), &g.condition)),
        )
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 3))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("options", &self.option_groups)?;
        map.serialize_entry("conditions", &self.condition)?;
        map.end()
    }
}

/// Where a condition hangs off a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Attachment {
    Field,
    OptionGroup(usize),
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Field => f.write_str("conditions"),
            Attachment::OptionGroup(i) => write!(f, "options[{}].conditions", i),
        }
    }
}

/// Ordered list of fields, serialized as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldSet {
    pub fields: Vec<Field>,
}

impl FieldSet {
    pub fn new(fields: Vec<Field>) -> Self {
        FieldSet { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &FieldId> {
        self.fields.iter().map(|f| &f.id)
    }

    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn to_pretty_json(&self) -> Result<String, FormError> {
        serde_json::to_string_pretty(self).map_err(|e| FormError::JsonSerialize {
            context: "rendering form".into(),
            source: e,
        })
    }
}

impl From<Vec<Field>> for FieldSet {
    fn from(fields: Vec<Field>) -> Self {
        FieldSet { fields }
    }
}
