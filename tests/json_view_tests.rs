use apl_databinding::color::Color;
use apl_databinding::context::Context;
use apl_databinding::dimension::Dimension;
use apl_databinding::evaluator::{evaluate, evaluate_recursive, parse_data_binding};
use apl_databinding::json::parse_json;
use apl_databinding::object::{Object, Visitor};
use apl_databinding::objectdata::UNSERIALIZABLE;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;

const DOCUMENT: &str = r#"{
    "title": "Inventory",
    "count": 3,
    "ratio": 0.25,
    "items": [
        {"name": "bolt", "price": 1.5, "tags": ["metal"]},
        {"name": "nut", "price": 0.5, "tags": []},
        {"name": "gear", "price": 12, "tags": ["metal", "round"]}
    ],
    "flags": {"visible": true, "archived": null}
}"#;

fn document_context() -> std::rc::Rc<Context> {
    let context = Context::create_test_context();
    context.put_constant("doc", parse_json(DOCUMENT).unwrap());
    context
}

#[test]
fn test_view_matches_document_shape() {
    let doc = parse_json(DOCUMENT).unwrap();
    assert!(doc.is_map());
    assert_eq!(doc.size(), 5);
    assert_eq!(
        doc.keys(),
        vec!["count", "flags", "items", "ratio", "title"]
    );
    assert_eq!(doc.get("count"), Object::from(3));
    assert!(doc.get("items").is_array());
    assert!(doc.has("flags"));
    assert!(!doc.has("missing"));
    assert_eq!(doc.get("flags").get("archived"), Object::Null);
    assert!(doc.get("flags").has("archived"));
}

#[test]
fn test_view_compares_by_content() {
    let view = parse_json("[1, 2, [3]]").unwrap();
    let built = Object::array(vec![
        Object::from(1),
        Object::from(2),
        Object::array(vec![Object::from(3)]),
    ]);
    assert_eq!(view, built);

    let mut map = BTreeMap::new();
    map.insert("a".to_string(), Object::from(1));
    assert_eq!(parse_json(r#"{"a": 1}"#).unwrap(), Object::map(map));
    assert_ne!(parse_json(r#"{"a": 1}"#).unwrap(), parse_json(r#"{"a": 2}"#).unwrap());
    assert_ne!(parse_json("[1]").unwrap(), parse_json("[1, 1]").unwrap());
}

#[test]
fn test_expressions_over_the_view() {
    let context = document_context();
    assert_eq!(evaluate(&context, "${doc.items.length}"), Object::from(3));
    assert_eq!(
        evaluate(&context, "${doc.items[2].price * doc.count}"),
        Object::from(36)
    );
    assert_eq!(
        evaluate(&context, "${doc.title}: ${doc.items[0].name}, ${doc.items[1].name}"),
        Object::from("Inventory: bolt, nut")
    );
    assert_eq!(
        evaluate(&context, "${doc.flags.archived ?? 'active'}"),
        Object::from("active")
    );
    assert_eq!(
        evaluate(&context, "${doc.items[1].tags ? 'tagged' : 'bare'}"),
        Object::from("tagged")
    );
    assert_eq!(evaluate(&context, "${doc.ratio * 100}%"), Object::from("25%"));
}

#[test]
fn test_view_serializes_to_its_source() {
    let doc = parse_json(DOCUMENT).unwrap();
    let expected: serde_json::Value = serde_json::from_str(DOCUMENT).unwrap();
    assert_eq!(doc.serialize(), expected);
    assert_eq!(doc.get("items").at(0).serialize(), json!({"name": "bolt", "price": 1.5, "tags": ["metal"]}));
}

#[test]
fn test_serialize_each_kind() {
    assert_eq!(Object::Null.serialize(), json!(null));
    assert_eq!(Object::from(true).serialize(), json!(true));
    assert_eq!(Object::from(12).serialize(), json!(12));
    assert_eq!(Object::from(0.5).serialize(), json!(0.5));
    assert_eq!(Object::from("text").serialize(), json!("text"));
    assert_eq!(Object::from(Dimension::absolute(8.0)).serialize(), json!(8));
    assert_eq!(Object::from(Dimension::relative(50.0)).serialize(), json!("50%"));
    assert_eq!(Object::from(Dimension::auto()).serialize(), json!("auto"));
    assert_eq!(Object::from(Color(0x112233ff)).serialize(), json!("#112233ff"));
    assert_eq!(
        Object::array(vec![Object::from(1), Object::from("a")]).serialize(),
        json!([1, "a"])
    );
}

#[test]
fn test_evaluables_serialize_to_sentinel() {
    let context = Context::create_test_context();
    context.put_user_writeable("x", Object::from(1));
    let node = parse_data_binding(&context, "${x + 1}").unwrap();
    let symbol = parse_data_binding(&context, "${x}").unwrap();
    assert!(node.is_node());
    assert!(symbol.is_bound_symbol());
    assert_eq!(node.serialize(), json!(UNSERIALIZABLE));
    assert_eq!(symbol.serialize(), json!(UNSERIALIZABLE));
    // Evaluated values serialize normally
    assert_eq!(node.eval().serialize(), json!(2));
}

#[test]
fn test_evaluate_recursive_over_view() {
    let context = Context::create_test_context();
    context.put_user_writeable("user", Object::from("Sam"));
    let layout = parse_json(
        r#"{"text": "Hi ${user}", "size": "${12 * 2}", "children": [{"text": "${user.length}"}, 7]}"#,
    )
    .unwrap();
    let resolved = evaluate_recursive(&context, &layout);
    assert_eq!(
        resolved.serialize(),
        json!({"children": [{"text": null}, 7], "size": 24, "text": "Hi Sam"})
    );
}

#[test]
fn test_debug_strings() {
    assert_eq!(
        Object::array(vec![Object::from(1), Object::from(2), Object::from(3)]).to_debug_string(),
        "Array<size=3>[1.000000, 2.000000, 3.000000, ]"
    );
    let mut map = BTreeMap::new();
    map.insert("k".to_string(), Object::from("v"));
    assert_eq!(Object::map(map).to_debug_string(), "Map<size=1>[{'k': 'v'}, ]");
}

struct Counter {
    visited: usize,
    limit: usize,
}

impl Visitor for Counter {
    fn visit(&mut self, _object: &Object) {
        self.visited += 1;
    }

    fn is_aborted(&self) -> bool {
        self.visited >= self.limit
    }
}

#[test]
fn test_visitor_walks_and_aborts() {
    let doc = parse_json(r#"[1, [2, 3], {"a": 4}]"#).unwrap();
    let mut all = Counter {
        visited: 0,
        limit: usize::MAX,
    };
    doc.accept(&mut all);
    // root, 1, [2, 3], 2, 3, {a}, 4
    assert_eq!(all.visited, 7);

    let mut limited = Counter {
        visited: 0,
        limit: 3,
    };
    doc.accept(&mut limited);
    assert_eq!(limited.visited, 3);
}

#[test]
fn test_mutable_containers_share_edits() {
    let context = Context::create_test_context();
    let list = Object::mutable_array(vec![Object::from(1)]);
    context.put_user_writeable("list", list.clone());
    let length = parse_data_binding(&context, "${list.length}").unwrap();
    assert_eq!(length.eval(), Object::from(1));

    list.with_mutable_array(|items| items.push(Object::from(2)));
    assert_eq!(length.eval(), Object::from(2));
    assert_eq!(context.opt("list").at(1), Object::from(2));

    let settings = Object::mutable_map(BTreeMap::new());
    settings.with_mutable_map(|entries| entries.insert("mode".to_string(), Object::from("dark")));
    assert_eq!(settings.get("mode"), Object::from("dark"));
}

#[test]
#[should_panic(expected = "array is not mutable")]
fn test_immutable_array_rejects_edits() {
    Object::array(vec![]).with_mutable_array(|items| items.clear());
}
