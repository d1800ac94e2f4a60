//! Payloads behind the complex [`Object`] kinds.
//!
//! Every payload implements [`ObjectData`]. The defaults describe an opaque value: no keys,
//! no elements, always truthy, not evaluable, not callable and not serializable. Concrete
//! payloads override only the capabilities they have.

use crate::object::{Object, ObjectType, Visitor};
use serde_json::Value;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;

/// Serialized form of payloads that have no JSON representation
pub const UNSERIALIZABLE: &str = "UNABLE TO SERIALIZE";

pub trait ObjectData: Any {
    fn as_any(&self) -> &dyn Any;

    fn get(&self, _key: &str) -> Object {
        Object::Null
    }

    fn has(&self, _key: &str) -> bool {
        false
    }

    fn at(&self, _index: usize) -> Object {
        Object::Null
    }

    fn size(&self) -> usize {
        0
    }

    fn empty(&self) -> bool {
        self.size() == 0
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn truthy(&self) -> bool {
        true
    }

    fn as_string(&self) -> String {
        String::new()
    }

    fn is_mutable(&self) -> bool {
        false
    }

    /// Only called for evaluable kinds
    fn eval(&self) -> Object {
        Object::Null
    }

    /// Only called for callable kinds
    fn call(&self, _args: &[Object]) -> Object {
        Object::Null
    }

    fn is_pure(&self) -> bool {
        true
    }

    /// Visit each child in order, stopping once the visitor aborts
    fn accept_children(&self, _visitor: &mut dyn Visitor) {}

    /// Content equality. `other` is always a payload of the same object kind.
    fn equals(&self, _other: &dyn ObjectData) -> bool {
        false
    }

    fn serialize(&self) -> Value {
        Value::String(UNSERIALIZABLE.to_string())
    }

    fn debug_string(&self) -> String;

    fn array_cell(&self) -> Option<&RefCell<Vec<Object>>> {
        None
    }

    fn map_cell(&self) -> Option<&RefCell<BTreeMap<String, Object>>> {
        None
    }
}

/// In-memory array payload
pub struct ArrayData {
    items: RefCell<Vec<Object>>,
    mutable: bool,
}

impl ArrayData {
    pub fn new(items: Vec<Object>, mutable: bool) -> Self {
        ArrayData {
            items: RefCell::new(items),
            mutable,
        }
    }

    pub fn items(&self) -> Ref<'_, Vec<Object>> {
        self.items.borrow()
    }
}

impl ObjectData for ArrayData {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn at(&self, index: usize) -> Object {
        self.items.borrow().get(index).cloned().unwrap_or_default()
    }

    fn size(&self) -> usize {
        self.items.borrow().len()
    }

    fn is_mutable(&self) -> bool {
        self.mutable
    }

    fn is_pure(&self) -> bool {
        self.items.borrow().iter().all(Object::is_pure)
    }

    fn accept_children(&self, visitor: &mut dyn Visitor) {
        for item in self.items.borrow().iter() {
            item.accept(visitor);
            if visitor.is_aborted() {
                break;
            }
        }
    }

    fn serialize(&self) -> Value {
        Value::Array(self.items.borrow().iter().map(Object::serialize).collect())
    }

    fn debug_string(&self) -> String {
        let items = self.items.borrow();
        let body: String = items
            .iter()
            .map(|item| format!("{}, ", item.to_debug_string()))
            .collect();
        format!("Array<size={}>[{}]", items.len(), body)
    }

    fn array_cell(&self) -> Option<&RefCell<Vec<Object>>> {
        self.mutable.then_some(&self.items)
    }
}

/// In-memory map payload with sorted keys
pub struct MapData {
    entries: RefCell<BTreeMap<String, Object>>,
    mutable: bool,
}

impl MapData {
    pub fn new(entries: BTreeMap<String, Object>, mutable: bool) -> Self {
        MapData {
            entries: RefCell::new(entries),
            mutable,
        }
    }

    pub fn entries(&self) -> Ref<'_, BTreeMap<String, Object>> {
        self.entries.borrow()
    }
}

impl ObjectData for MapData {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(&self, key: &str) -> Object {
        self.entries.borrow().get(key).cloned().unwrap_or_default()
    }

    fn has(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn size(&self) -> usize {
        self.entries.borrow().len()
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn is_mutable(&self) -> bool {
        self.mutable
    }

    fn is_pure(&self) -> bool {
        self.entries.borrow().values().all(Object::is_pure)
    }

    fn accept_children(&self, visitor: &mut dyn Visitor) {
        for value in self.entries.borrow().values() {
            value.accept(visitor);
            if visitor.is_aborted() {
                break;
            }
        }
    }

    fn serialize(&self) -> Value {
        Value::Object(
            self.entries
                .borrow()
                .iter()
                .map(|(key, value)| (key.clone(), value.serialize()))
                .collect(),
        )
    }

    fn debug_string(&self) -> String {
        let entries = self.entries.borrow();
        let body: String = entries
            .iter()
            .map(|(key, value)| format!("{{'{}': {}}}, ", key, value.to_debug_string()))
            .collect();
        format!("Map<size={}>[{}]", entries.len(), body)
    }

    fn map_cell(&self) -> Option<&RefCell<BTreeMap<String, Object>>> {
        self.mutable.then_some(&self.entries)
    }
}

/// Small value types stored by value inside a [`DirectData`] payload
pub trait DirectValue: PartialEq + fmt::Debug + 'static {
    const KIND: ObjectType;

    fn serialize(&self) -> Value;

    fn truthy(&self) -> bool {
        true
    }

    fn empty(&self) -> bool {
        false
    }

    fn as_string(&self) -> String {
        String::new()
    }

    fn debug_string(&self) -> String {
        format!("{:?}", self)
    }
}

/// Generic payload wrapping a [`DirectValue`]. Compares by content.
pub struct DirectData<T: DirectValue>(pub T);

impl<T: DirectValue> ObjectData for DirectData<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn empty(&self) -> bool {
        self.0.empty()
    }

    fn truthy(&self) -> bool {
        self.0.truthy()
    }

    fn as_string(&self) -> String {
        self.0.as_string()
    }

    fn equals(&self, other: &dyn ObjectData) -> bool {
        other
            .as_any()
            .downcast_ref::<DirectData<T>>()
            .is_some_and(|other| other.0 == self.0)
    }

    fn serialize(&self) -> Value {
        self.0.serialize()
    }

    fn debug_string(&self) -> String {
        self.0.debug_string()
    }
}
