//! End-to-end document behaviour through the public facade.

use docmodel::{Error, core::value::attributes_from_json, prelude::*};
use proptest::prelude::*;
use serde_json::json;
use time::macros::datetime;

fn attrs(json: serde_json::Value) -> AttributeMap {
    attributes_from_json(json).expect("fixture should be an object")
}

fn person() -> Model {
    let model = Model::document("Person");
    model
        .key("name", Primitive::Text, KeyOptions::new().length(2usize..=30))
        .unwrap();
    model
        .key("age", Primitive::Int, KeyOptions::new().numeric().required())
        .unwrap();
    model
        .key("seen", Primitive::Timestamp, KeyOptions::new())
        .unwrap();
    model
}

#[test]
fn numeric_text_coerces_and_garbage_fails() {
    let model = person();
    let mut doc = Document::empty(&model);

    doc.write("age", "17").unwrap();
    assert_eq!(doc.read_value("age").unwrap(), Some(Value::Int(17)));

    let err = doc.write("age", "abc").unwrap_err();
    assert!(matches!(err, Error::Coercion(_)));
    assert_eq!(
        doc.read_before_type_cast("age").unwrap(),
        Some(&Attribute::from("abc"))
    );
}

#[test]
fn timestamps_read_back_in_utc() {
    let mut doc = Document::empty(&person());
    doc.write("seen", "2024-06-01T12:00:00+02:00").unwrap();

    assert_eq!(
        doc.read_value("seen").unwrap(),
        Some(Value::Timestamp(datetime!(2024-06-01 10:00 UTC)))
    );
}

#[test]
fn empty_document_exports_an_empty_mapping() {
    let doc = Document::new(&person(), AttributeMap::new()).unwrap();

    assert!(doc.attributes().is_empty());
    assert!(doc.flattened().is_empty());
    assert_eq!(doc.to_string(), "<Person name: nil, age: nil, seen: nil>");
}

#[test]
fn documents_compare_by_mapping() {
    let model = person();
    let a = Document::new(&model, attrs(json!({ "name": "Ada", "age": 36 }))).unwrap();
    let b = Document::new(&model, attrs(json!({ "age": 36, "name": "Ada" }))).unwrap();
    let c = Document::new(&model, attrs(json!({ "age": 36, "name": "Bea" }))).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn flattening_two_children_with_nested_collection() {
    let reply = Model::embedded("Reply");
    reply.key("text", Primitive::Text, KeyOptions::new()).unwrap();

    let item = Model::embedded("Item");
    item.key("label", Primitive::Text, KeyOptions::new()).unwrap();
    item.many("replies", &reply).unwrap();

    let root = Model::document("Root");
    root.key("title", Primitive::Text, KeyOptions::new()).unwrap();
    root.many("items", &item).unwrap();

    let b1 = Document::new(
        &item,
        attrs(json!({ "label": "B1", "replies": [{ "text": "r1" }, { "text": "r2" }] })),
    )
    .unwrap();
    let b2 = Document::new(&item, attrs(json!({ "label": "B2" }))).unwrap();

    let mut doc = Document::new(&root, attrs(json!({ "title": "A" }))).unwrap();
    doc.set_documents("items", vec![b1, b2]).unwrap();

    assert_eq!(
        doc.embedded_association_attributes(),
        attrs(json!({
            "items": [
                { "label": "B1", "replies": [{ "text": "r1" }, { "text": "r2" }] },
                { "label": "B2" }
            ]
        }))
    );
    assert_eq!(doc.flattened()["title"], Value::Text("A".into()));
}

#[test]
fn submodel_documents_see_inherited_keys() {
    let base = person();
    let employee = Model::inherit(&base, "Employee");
    employee
        .key("badge", Primitive::Int, KeyOptions::new())
        .unwrap();
    base.key("nickname", Primitive::Text, KeyOptions::new())
        .unwrap();

    let doc = Document::new(
        &employee,
        attrs(json!({ "name": "Ada", "badge": "7", "nickname": "A" })),
    )
    .unwrap();

    assert_eq!(
        doc.attributes(),
        attrs(json!({ "name": "Ada", "badge": 7, "nickname": "A" }))
    );
    assert!(matches!(
        Document::new(&base, attrs(json!({ "badge": 1 }))),
        Err(Error::UnknownAttribute { .. })
    ));
}

proptest! {
    #[test]
    fn native_read_matches_get_of_set(n in any::<i64>(), s in "[a-zA-Z ]{0,16}") {
        let model = person();
        let coercer = model.coercer();
        let mut doc = Document::empty(&model);

        doc.write("age", n.to_string()).unwrap();
        doc.write("name", s.as_str()).unwrap();

        let age = coercer.set(Primitive::Int, &Value::Text(n.to_string())).unwrap();
        prop_assert_eq!(
            doc.read_value("age").unwrap(),
            Some(coercer.get(Primitive::Int, &age))
        );
        prop_assert_eq!(doc.read_value("name").unwrap(), Some(Value::Text(s.clone())));
        prop_assert_eq!(
            doc.read_before_type_cast("name").unwrap(),
            Some(&Attribute::from(s))
        );
    }
}
