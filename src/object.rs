//! The runtime value type.
//!
//! [`Object`] is a closed tagged union. Booleans, numbers, strings, dimensions and colors
//! are stored inline; every other kind holds a reference-counted [`ObjectData`] payload, so
//! cloning an `Object` is always shallow.
//!
//! Conversions (`as_string`, `as_number`, `as_int`, `truthy`, ...) are total and fall back to
//! a typed default. The `get_*` accessors are contract checks: calling one on the wrong kind
//! is a programming error and panics.

use crate::Context;
use crate::color::Color;
use crate::dimension::Dimension;
use crate::json::JsonData;
use crate::numberformat::{double_to_string, string_to_double, string_to_int, string_to_int64};
use crate::objectdata::{ArrayData, DirectData, DirectValue, MapData, ObjectData};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Every kind of value an [`Object`] can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Bool,
    Number,
    String,
    Array,
    Map,
    Node,
    Function,
    BoundSymbol,
    AbsoluteDimension,
    RelativeDimension,
    AutoDimension,
    Color,
    Gradient,
    Filter,
    MediaSource,
    Rect,
    Radii,
    StyledText,
    Transform2D,
    Transform,
    Easing,
    Graphic,
    GraphicPattern,
    Component,
    Context,
}

impl ObjectType {
    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Null => "null",
            ObjectType::Bool => "bool",
            ObjectType::Number => "number",
            ObjectType::String => "string",
            ObjectType::Array => "array",
            ObjectType::Map => "map",
            ObjectType::Node => "node",
            ObjectType::Function => "function",
            ObjectType::BoundSymbol => "bound-symbol",
            ObjectType::AbsoluteDimension => "absolute-dimension",
            ObjectType::RelativeDimension => "relative-dimension",
            ObjectType::AutoDimension => "auto-dimension",
            ObjectType::Color => "color",
            ObjectType::Gradient => "gradient",
            ObjectType::Filter => "filter",
            ObjectType::MediaSource => "media-source",
            ObjectType::Rect => "rect",
            ObjectType::Radii => "radii",
            ObjectType::StyledText => "styled-text",
            ObjectType::Transform2D => "transform-2d",
            ObjectType::Transform => "transform",
            ObjectType::Easing => "easing",
            ObjectType::Graphic => "graphic",
            ObjectType::GraphicPattern => "graphic-pattern",
            ObjectType::Component => "component",
            ObjectType::Context => "context",
        }
    }

    /// Kinds stored inline in the [`Object`] rather than behind a payload
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            ObjectType::Null
                | ObjectType::Bool
                | ObjectType::Number
                | ObjectType::String
                | ObjectType::AbsoluteDimension
                | ObjectType::RelativeDimension
                | ObjectType::AutoDimension
                | ObjectType::Color
        )
    }

    /// Payload kinds whose equality is reference identity
    pub fn compares_by_identity(self) -> bool {
        matches!(
            self,
            ObjectType::Node
                | ObjectType::Function
                | ObjectType::BoundSymbol
                | ObjectType::Transform
                | ObjectType::Easing
                | ObjectType::Graphic
                | ObjectType::GraphicPattern
                | ObjectType::Component
                | ObjectType::Context
        )
    }
}

/// Pre-order tree walk over objects. Only arrays, maps and nodes have children.
pub trait Visitor {
    fn visit(&mut self, object: &Object);

    /// Checked after every visited object
    fn is_aborted(&self) -> bool {
        false
    }
}

#[derive(Clone, Default)]
pub enum Object {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    AbsoluteDimension(f64),
    RelativeDimension(f64),
    AutoDimension,
    Color(Color),
    Data(ObjectType, Rc<dyn ObjectData>),
}

thread_local! {
    static EMPTY_ARRAY: Object = Object::from_data(
        ObjectType::Array,
        Rc::new(ArrayData::new(Vec::new(), false)),
    );
    static EMPTY_MAP: Object = Object::from_data(
        ObjectType::Map,
        Rc::new(MapData::new(BTreeMap::new(), false)),
    );
}

impl Object {
    pub fn null() -> Object {
        Object::Null
    }

    pub fn nan() -> Object {
        Object::Number(f64::NAN)
    }

    /// Wrap a payload. `kind` must be one of the payload kinds.
    pub fn from_data(kind: ObjectType, data: Rc<dyn ObjectData>) -> Object {
        assert!(
            !kind.is_inline(),
            "{} values are not stored behind a payload",
            kind.name()
        );
        Object::Data(kind, data)
    }

    pub fn from_direct<T: DirectValue>(value: T) -> Object {
        Object::from_data(T::KIND, Rc::new(DirectData(value)))
    }

    pub fn array(items: Vec<Object>) -> Object {
        Object::from_data(ObjectType::Array, Rc::new(ArrayData::new(items, false)))
    }

    pub fn mutable_array(items: Vec<Object>) -> Object {
        Object::from_data(ObjectType::Array, Rc::new(ArrayData::new(items, true)))
    }

    pub fn map(entries: BTreeMap<String, Object>) -> Object {
        Object::from_data(ObjectType::Map, Rc::new(MapData::new(entries, false)))
    }

    pub fn mutable_map(entries: BTreeMap<String, Object>) -> Object {
        Object::from_data(ObjectType::Map, Rc::new(MapData::new(entries, true)))
    }

    /// Shared immutable empty array
    pub fn empty_array() -> Object {
        EMPTY_ARRAY.with(Object::clone)
    }

    /// Shared immutable empty map
    pub fn empty_map() -> Object {
        EMPTY_MAP.with(Object::clone)
    }

    /// View over a JSON document. Scalars convert directly; arrays and objects are wrapped
    /// without copying and materialize children on first access.
    pub fn from_json(document: Rc<Value>) -> Object {
        let kind = match document.as_ref() {
            Value::Null => return Object::Null,
            Value::Bool(b) => return Object::Bool(*b),
            Value::Number(n) => return Object::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => return Object::from(s.as_str()),
            Value::Array(_) => ObjectType::Array,
            Value::Object(_) => ObjectType::Map,
        };
        Object::from_data(kind, Rc::new(JsonData::root(document)))
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Null => ObjectType::Null,
            Object::Bool(_) => ObjectType::Bool,
            Object::Number(_) => ObjectType::Number,
            Object::String(_) => ObjectType::String,
            Object::AbsoluteDimension(_) => ObjectType::AbsoluteDimension,
            Object::RelativeDimension(_) => ObjectType::RelativeDimension,
            Object::AutoDimension => ObjectType::AutoDimension,
            Object::Color(_) => ObjectType::Color,
            Object::Data(kind, _) => *kind,
        }
    }

    pub fn is(&self, kind: ObjectType) -> bool {
        self.object_type() == kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Object::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Object::Number(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Object::Number(n) if n.is_nan())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Object::String(_))
    }

    pub fn is_array(&self) -> bool {
        self.is(ObjectType::Array)
    }

    /// Maps, plus the component and context wrappers that answer keyed lookups
    pub fn is_map(&self) -> bool {
        matches!(
            self.object_type(),
            ObjectType::Map | ObjectType::Component | ObjectType::Context
        )
    }

    pub fn is_node(&self) -> bool {
        self.is(ObjectType::Node)
    }

    pub fn is_bound_symbol(&self) -> bool {
        self.is(ObjectType::BoundSymbol)
    }

    /// Kinds whose value is computed by `eval`
    pub fn is_evaluable(&self) -> bool {
        self.is_node() || self.is_bound_symbol()
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.object_type(), ObjectType::Function | ObjectType::Easing)
    }

    pub fn is_dimension(&self) -> bool {
        matches!(
            self,
            Object::AbsoluteDimension(_) | Object::RelativeDimension(_) | Object::AutoDimension
        )
    }

    pub fn is_absolute_dimension(&self) -> bool {
        matches!(self, Object::AbsoluteDimension(_))
    }

    pub fn is_relative_dimension(&self) -> bool {
        matches!(self, Object::RelativeDimension(_))
    }

    pub fn is_auto_dimension(&self) -> bool {
        matches!(self, Object::AutoDimension)
    }

    pub fn is_non_auto_dimension(&self) -> bool {
        self.is_absolute_dimension() || self.is_relative_dimension()
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Object::Color(_))
    }

    pub fn is_mutable(&self) -> bool {
        match self {
            Object::Data(_, data) => data.is_mutable(),
            _ => false,
        }
    }

    fn contract_violation(&self, expected: &str) -> ! {
        panic!(
            "expected a {} object, found {}",
            expected,
            self.object_type().name()
        )
    }

    pub fn get_boolean(&self) -> bool {
        match self {
            Object::Bool(b) => *b,
            _ => self.contract_violation("bool"),
        }
    }

    pub fn get_double(&self) -> f64 {
        match self {
            Object::Number(n) => *n,
            _ => self.contract_violation("number"),
        }
    }

    pub fn get_integer(&self) -> i64 {
        self.get_double().round() as i64
    }

    pub fn get_string(&self) -> &str {
        match self {
            Object::String(s) => s,
            _ => self.contract_violation("string"),
        }
    }

    pub fn get_absolute_dimension(&self) -> f64 {
        match self {
            Object::AbsoluteDimension(v) => *v,
            _ => self.contract_violation("absolute dimension"),
        }
    }

    pub fn get_relative_dimension(&self) -> f64 {
        match self {
            Object::RelativeDimension(v) => *v,
            _ => self.contract_violation("relative dimension"),
        }
    }

    pub fn get_color(&self) -> Color {
        match self {
            Object::Color(c) => *c,
            _ => self.contract_violation("color"),
        }
    }

    pub fn get_data(&self) -> &Rc<dyn ObjectData> {
        match self {
            Object::Data(_, data) => data,
            _ => self.contract_violation("payload"),
        }
    }

    /// The direct value stored in this object, if it holds a `T`
    pub fn get_direct<T: DirectValue>(&self) -> Option<&T> {
        match self {
            Object::Data(kind, data) if *kind == T::KIND => data
                .as_any()
                .downcast_ref::<DirectData<T>>()
                .map(|direct| &direct.0),
            _ => None,
        }
    }

    pub fn get_array(&self) -> Vec<Object> {
        if !self.is_array() {
            self.contract_violation("array");
        }
        (0..self.size()).map(|index| self.at(index)).collect()
    }

    pub fn as_string(&self) -> String {
        match self {
            Object::Null => String::new(),
            Object::Bool(b) => b.to_string(),
            Object::Number(n) => double_to_string(*n),
            Object::String(s) => s.to_string(),
            Object::AbsoluteDimension(v) => Dimension::absolute(*v).to_string(),
            Object::RelativeDimension(v) => Dimension::relative(*v).to_string(),
            Object::AutoDimension => Dimension::auto().to_string(),
            Object::Color(c) => c.to_string(),
            Object::Data(_, data) => data.as_string(),
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            Object::Bool(b) => f64::from(u8::from(*b)),
            Object::Number(n) => *n,
            Object::String(s) => string_to_double(s),
            Object::AbsoluteDimension(v) | Object::RelativeDimension(v) => *v,
            _ => f64::NAN,
        }
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Object::String(s) => string_to_int(s, 10),
            _ => self.as_number().round() as i32,
        }
    }

    pub fn as_int64(&self) -> i64 {
        self.as_int64_radix(10)
    }

    /// Strings parse in `base` (0 infers the base from the prefix); numbers round
    pub fn as_int64_radix(&self, base: u32) -> i64 {
        match self {
            Object::String(s) => string_to_int64(s, base),
            _ => self.as_number().round() as i64,
        }
    }

    pub fn as_boolean(&self) -> bool {
        self.truthy()
    }

    pub fn truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Bool(b) => *b,
            Object::Number(n) => *n != 0.0 && !n.is_nan(),
            Object::String(s) => !s.is_empty(),
            Object::AbsoluteDimension(v) | Object::RelativeDimension(v) => *v != 0.0,
            Object::AutoDimension => true,
            Object::Color(c) => c.0 != 0,
            Object::Data(_, data) => data.truthy(),
        }
    }

    /// Numbers are read as packed RGBA; strings go through the color grammar and
    /// fall back to transparent when they do not parse
    pub fn as_color(&self) -> Color {
        match self {
            Object::Color(c) => *c,
            Object::Number(n) => Color(*n as u32),
            Object::String(s) => Color::parse(s).unwrap_or_else(|err| {
                warn!("Unable to convert '{}' to a color: {}", s, err);
                Color::TRANSPARENT
            }),
            _ => Color::TRANSPARENT,
        }
    }

    /// Relative units in strings resolve against the metrics of `context`
    pub fn as_dimension(&self, context: &Context) -> Dimension {
        match self {
            Object::AbsoluteDimension(v) => Dimension::absolute(*v),
            Object::RelativeDimension(v) => Dimension::relative(*v),
            Object::AutoDimension => Dimension::auto(),
            Object::Number(n) => Dimension::absolute(*n),
            Object::String(s) => Dimension::parse(s, context.metrics()).unwrap_or_else(|err| {
                warn!("{}", err);
                Dimension::absolute(0.0)
            }),
            _ => Dimension::absolute(0.0),
        }
    }

    /// Byte length for strings, element count for containers
    pub fn size(&self) -> usize {
        match self {
            Object::String(s) => s.len(),
            Object::Data(_, data) => data.size(),
            _ => 0,
        }
    }

    pub fn empty(&self) -> bool {
        match self {
            Object::Null => true,
            Object::String(s) => s.is_empty(),
            Object::Data(_, data) => data.empty(),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Object {
        match self {
            Object::Data(_, data) => data.get(key),
            _ => Object::Null,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match self {
            Object::Data(_, data) => data.has(key),
            _ => false,
        }
    }

    /// Look up `key`, substituting `default` when it is missing
    pub fn opt(&self, key: &str, default: Object) -> Object {
        if self.has(key) {
            self.get(key)
        } else {
            default
        }
    }

    pub fn at(&self, index: usize) -> Object {
        match self {
            Object::Data(_, data) => data.at(index),
            _ => Object::Null,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match self {
            Object::Data(_, data) => data.keys(),
            _ => Vec::new(),
        }
    }

    /// Current value. Identity for everything except nodes and bound symbols.
    pub fn eval(&self) -> Object {
        match self {
            Object::Data(ObjectType::Node | ObjectType::BoundSymbol, data) => data.eval(),
            _ => self.clone(),
        }
    }

    pub fn call(&self, args: &[Object]) -> Object {
        match self {
            Object::Data(ObjectType::Function | ObjectType::Easing, data) => data.call(args),
            _ => {
                debug!("Attempted to call a non-callable {}", self.object_type().name());
                Object::Null
            }
        }
    }

    /// False for impure callables and for nodes that reach one
    pub fn is_pure(&self) -> bool {
        match self {
            Object::Data(_, data) => data.is_pure(),
            _ => true,
        }
    }

    pub fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit(self);
        if visitor.is_aborted() {
            return;
        }
        if let Object::Data(ObjectType::Array | ObjectType::Map | ObjectType::Node, data) = self {
            data.accept_children(visitor);
        }
    }

    /// Edit a mutable array in place; the change is visible through every alias
    pub fn with_mutable_array<R>(&self, edit: impl FnOnce(&mut Vec<Object>) -> R) -> R {
        match self {
            Object::Data(ObjectType::Array, data) => match data.array_cell() {
                Some(cell) => edit(&mut cell.borrow_mut()),
                None => panic!("array is not mutable"),
            },
            _ => self.contract_violation("array"),
        }
    }

    /// Edit a mutable map in place; the change is visible through every alias
    pub fn with_mutable_map<R>(
        &self,
        edit: impl FnOnce(&mut BTreeMap<String, Object>) -> R,
    ) -> R {
        match self {
            Object::Data(ObjectType::Map, data) => match data.map_cell() {
                Some(cell) => edit(&mut cell.borrow_mut()),
                None => panic!("map is not mutable"),
            },
            _ => self.contract_violation("map"),
        }
    }

    /// JSON encoding. Non-finite numbers become `null`. Non-finite dimensions, absolute or
    /// relative, become `0`.
    pub fn serialize(&self) -> Value {
        match self {
            Object::Null => Value::Null,
            Object::Bool(b) => Value::Bool(*b),
            Object::Number(n) if n.is_finite() => json_number(*n),
            Object::Number(_) => Value::Null,
            Object::String(s) => Value::String(s.to_string()),
            Object::AbsoluteDimension(v) if v.is_finite() => json_number(*v),
            Object::AbsoluteDimension(_) => Value::from(0),
            Object::RelativeDimension(v) if !v.is_finite() => Value::from(0),
            Object::RelativeDimension(_) | Object::AutoDimension | Object::Color(_) => {
                Value::String(self.as_string())
            }
            Object::Data(_, data) => data.serialize(),
        }
    }

    /// Developer-facing description; not a stable format
    pub fn to_debug_string(&self) -> String {
        match self {
            Object::Null => "null".to_string(),
            Object::Bool(b) => b.to_string(),
            Object::Number(n) => format!("{:.6}", n),
            Object::String(s) => format!("'{}'", s),
            Object::AbsoluteDimension(v) => format!("AbsDim<{}>", double_to_string(*v)),
            Object::RelativeDimension(v) => format!("RelDim<{}>", double_to_string(*v)),
            Object::AutoDimension => "AutoDim".to_string(),
            Object::Color(c) => format!("Color<{}>", c),
            Object::Data(_, data) => data.debug_string(),
        }
    }
}

/// Integral values encode as JSON integers
fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn payloads_equal(kind: ObjectType, a: &Rc<dyn ObjectData>, b: &Rc<dyn ObjectData>) -> bool {
    if kind.compares_by_identity() {
        return Rc::ptr_eq(a, b);
    }
    match kind {
        ObjectType::Array => {
            a.size() == b.size() && (0..a.size()).all(|index| a.at(index) == b.at(index))
        }
        ObjectType::Map => {
            a.size() == b.size()
                && a.keys()
                    .iter()
                    .all(|key| b.has(key) && a.get(key) == b.get(key))
        }
        _ => a.equals(b.as_ref()),
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Number(a), Object::Number(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::AbsoluteDimension(a), Object::AbsoluteDimension(b)) => a == b,
            (Object::RelativeDimension(a), Object::RelativeDimension(b)) => a == b,
            (Object::AutoDimension, Object::AutoDimension) => true,
            (Object::Color(a), Object::Color(b)) => a == b,
            (Object::Data(ka, a), Object::Data(kb, b)) => ka == kb && payloads_equal(*ka, a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_debug_string())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Number(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Number(f64::from(value))
    }
}

impl From<u32> for Object {
    fn from(value: u32) -> Self {
        Object::Number(f64::from(value))
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Number(value as f64)
    }
}

impl From<usize> for Object {
    fn from(value: usize) -> Self {
        Object::Number(value as f64)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::String(Rc::from(value))
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::String(Rc::from(value))
    }
}

impl From<Color> for Object {
    fn from(value: Color) -> Self {
        Object::Color(value)
    }
}

impl From<Dimension> for Object {
    fn from(value: Dimension) -> Self {
        use crate::dimension::DimensionType;
        match value.kind() {
            DimensionType::Absolute => Object::AbsoluteDimension(value.value()),
            DimensionType::Relative => Object::RelativeDimension(value.value()),
            DimensionType::Auto => Object::AutoDimension,
        }
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::array(value)
    }
}

impl From<BTreeMap<String, Object>> for Object {
    fn from(value: BTreeMap<String, Object>) -> Self {
        Object::map(value)
    }
}

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        Object::from_json(Rc::new(value))
    }
}
