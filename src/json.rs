//! Zero-copy view over a JSON document.
//!
//! A [`JsonData`] payload points at one array or object inside a shared
//! [`serde_json::Value`] tree. Children are converted to [`Object`]s on first access and
//! cached, so repeated lookups return the same payloads. The document itself is never
//! copied or modified.

use crate::Error;
use crate::object::{Object, Visitor};
use crate::objectdata::ObjectData;
use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

static JSON_NULL: Value = Value::Null;

/// Parse JSON text into an [`Object`] view
pub fn parse_json(text: &str) -> Result<Object, Error> {
    let document: Value = serde_json::from_str(text)?;
    Ok(Object::from_json(Rc::new(document)))
}

pub struct JsonData {
    document: Rc<Value>,
    /// JSON pointer (RFC 6901) of the viewed node within `document`
    pointer: String,
    fields: RefCell<HashMap<String, Object>>,
    elements: RefCell<Vec<Option<Object>>>,
}

impl JsonData {
    pub fn root(document: Rc<Value>) -> Self {
        JsonData::at_pointer(document, String::new())
    }

    fn at_pointer(document: Rc<Value>, pointer: String) -> Self {
        JsonData {
            document,
            pointer,
            fields: RefCell::new(HashMap::new()),
            elements: RefCell::new(Vec::new()),
        }
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    fn node(&self) -> &Value {
        self.document.pointer(&self.pointer).unwrap_or(&JSON_NULL)
    }

    fn child(&self, token: &str, value: &Value) -> Object {
        match value {
            Value::Array(_) | Value::Object(_) => {
                let pointer = format!("{}/{}", self.pointer, escape_token(token));
                let kind = if value.is_array() {
                    crate::ObjectType::Array
                } else {
                    crate::ObjectType::Map
                };
                Object::from_data(
                    kind,
                    Rc::new(JsonData::at_pointer(Rc::clone(&self.document), pointer)),
                )
            }
            scalar => Object::from_json(Rc::new(scalar.clone())),
        }
    }
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl ObjectData for JsonData {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(&self, key: &str) -> Object {
        if let Some(cached) = self.fields.borrow().get(key) {
            return cached.clone();
        }
        let Some(value) = self.node().as_object().and_then(|map| map.get(key)) else {
            return Object::Null;
        };
        let object = self.child(key, value);
        self.fields
            .borrow_mut()
            .insert(key.to_string(), object.clone());
        object
    }

    fn has(&self, key: &str) -> bool {
        self.node()
            .as_object()
            .is_some_and(|map| map.contains_key(key))
    }

    fn at(&self, index: usize) -> Object {
        let Some(value) = self.node().as_array().and_then(|items| items.get(index)) else {
            return Object::Null;
        };
        if let Some(Some(cached)) = self.elements.borrow().get(index) {
            return cached.clone();
        }
        let object = self.child(&index.to_string(), value);
        let mut elements = self.elements.borrow_mut();
        if elements.len() <= index {
            elements.resize(index + 1, None);
        }
        elements[index] = Some(object.clone());
        object
    }

    fn size(&self) -> usize {
        match self.node() {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn keys(&self) -> Vec<String> {
        self.node()
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn accept_children(&self, visitor: &mut dyn Visitor) {
        let children: Vec<Object> = match self.node() {
            Value::Array(items) => (0..items.len()).map(|index| self.at(index)).collect(),
            Value::Object(map) => map.keys().map(|key| self.get(key)).collect(),
            _ => Vec::new(),
        };
        for child in children {
            child.accept(visitor);
            if visitor.is_aborted() {
                break;
            }
        }
    }

    fn serialize(&self) -> Value {
        self.node().clone()
    }

    fn debug_string(&self) -> String {
        format!("JSON<size={}>{}", self.size(), self.node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_scalars() {
        assert_eq!(Object::from(json!(null)), Object::Null);
        assert_eq!(Object::from(json!(true)), Object::from(true));
        assert_eq!(Object::from(json!(4.5)), Object::from(4.5));
        assert_eq!(Object::from(json!("text")), Object::from("text"));
    }

    #[test]
    fn test_json_nested_access() {
        let object = parse_json(r#"{"a": {"b/c": [10, 20, {"d": "deep"}]}}"#).unwrap();
        assert!(object.is_map());
        let inner = object.get("a").get("b/c");
        assert!(inner.is_array());
        assert_eq!(inner.size(), 3);
        assert_eq!(inner.at(1), Object::from(20));
        assert_eq!(inner.at(2).get("d"), Object::from("deep"));
        assert_eq!(inner.at(7), Object::Null);
        assert_eq!(object.get("missing"), Object::Null);
    }

    #[test]
    fn test_json_children_are_cached() {
        let object = parse_json(r#"{"list": [[1], [2]]}"#).unwrap();
        let first = object.get("list").at(0);
        let second = object.get("list").at(0);
        assert!(Rc::ptr_eq(first.get_data(), second.get_data()));
    }

    #[test]
    fn test_parse_json_error() {
        assert!(matches!(parse_json("{not json"), Err(Error::Json(_))));
    }
}
