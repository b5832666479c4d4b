use crate::value::{AttributeMap, Value, attributes_from_json};
use serde_json::json;
use time::macros::{date, datetime};

// ---- helpers -----------------------------------------------------------

fn v_txt(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn map(entries: &[(&str, Value)]) -> AttributeMap {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

// ---- json boundary -----------------------------------------------------

#[test]
fn json_numbers_prefer_int() {
    assert_eq!(Value::from(json!(17)), Value::Int(17));
    assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
}

#[test]
fn json_objects_become_nested_maps() {
    let value = Value::from(json!({
        "name": "Ada",
        "tags": ["a", null],
        "address": { "city": "London" }
    }));

    assert_eq!(
        value,
        Value::Map(map(&[
            ("name", v_txt("Ada")),
            ("tags", Value::List(vec![v_txt("a"), Value::Null])),
            ("address", Value::Map(map(&[("city", v_txt("London"))]))),
        ]))
    );
}

#[test]
fn attributes_from_json_accepts_objects_and_null_only() {
    assert_eq!(
        attributes_from_json(json!({ "a": 1 })),
        Some(map(&[("a", Value::Int(1))]))
    );
    assert_eq!(attributes_from_json(json!(null)), Some(AttributeMap::new()));
    assert_eq!(attributes_from_json(json!([1, 2])), None);
    assert_eq!(attributes_from_json(json!("text")), None);
}

// ---- serialize ---------------------------------------------------------

#[test]
fn serializes_temporal_values_as_strings() {
    let value = Value::Map(map(&[
        ("born", Value::Date(date!(1815 - 12 - 10))),
        ("seen", Value::Timestamp(datetime!(2024-01-02 03:04:05 UTC))),
        ("nothing", Value::Null),
    ]));

    assert_eq!(
        serde_json::to_value(&value).expect("value should serialize"),
        json!({
            "born": "1815-12-10",
            "seen": "2024-01-02T03:04:05Z",
            "nothing": null
        })
    );
}

// ---- display -----------------------------------------------------------

#[test]
fn display_quotes_text_and_renders_nil() {
    assert_eq!(v_txt("Ada").to_string(), "\"Ada\"");
    assert_eq!(Value::Null.to_string(), "nil");
    assert_eq!(
        Value::List(vec![Value::Int(1), Value::Bool(false)]).to_string(),
        "[1, false]"
    );
    assert_eq!(
        Value::Map(map(&[("b", Value::Int(2)), ("a", Value::Int(1))])).to_string(),
        "{a: 1, b: 2}"
    );
}

// ---- conversions -------------------------------------------------------

#[test]
fn option_none_converts_to_null() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some("x")), v_txt("x"));
    assert_eq!(Value::from(7_i32), Value::Int(7));
}

#[test]
fn map_equality_ignores_insertion_order() {
    let mut left = AttributeMap::new();
    left.insert("a".into(), Value::Int(1));
    left.insert("b".into(), Value::Int(2));

    let mut right = AttributeMap::new();
    right.insert("b".into(), Value::Int(2));
    right.insert("a".into(), Value::Int(1));

    assert_eq!(Value::Map(left), Value::Map(right));
}
