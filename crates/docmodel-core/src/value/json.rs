use crate::value::{AttributeMap, Value};
use serde_json::Value as JsonValue;

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(v) => Self::Bool(v),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            JsonValue::String(s) => Self::Text(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

///
/// attributes_from_json
///
/// Normalize a JSON object into an `AttributeMap`. `null` is treated as an
/// empty mapping; any other non-object yields `None`.
///
#[must_use]
pub fn attributes_from_json(json: JsonValue) -> Option<AttributeMap> {
    match Value::from(json) {
        Value::Map(map) => Some(map),
        Value::Null => Some(AttributeMap::new()),
        _ => None,
    }
}
