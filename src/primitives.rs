//! Payload types produced by the styling and graphics layers.
//!
//! Most are plain values wrapped in [`DirectData`](crate::objectdata::DirectData) and
//! compare by content. Easing curves and [`OpaqueData`] handles compare by identity.

use crate::color::Color;
use crate::numberformat::double_to_string;
use crate::object::{Object, ObjectType};
use crate::objectdata::{DirectValue, ObjectData};
use serde_json::{Value, json};
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl DirectValue for Rect {
    const KIND: ObjectType = ObjectType::Rect;

    fn serialize(&self) -> Value {
        json!([self.x, self.y, self.width, self.height])
    }

    fn empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    fn debug_string(&self) -> String {
        format!(
            "Rect<{}x{}+{}+{}>",
            double_to_string(self.width),
            double_to_string(self.height),
            double_to_string(self.x),
            double_to_string(self.y)
        )
    }
}

/// Corner radii: top-left, top-right, bottom-left, bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Radii(pub [f64; 4]);

impl DirectValue for Radii {
    const KIND: ObjectType = ObjectType::Radii;

    fn serialize(&self) -> Value {
        json!(self.0)
    }

    fn empty(&self) -> bool {
        self.0.iter().all(|r| *r == 0.0)
    }
}

/// Affine matrix `[a, b, c, d, tx, ty]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D(pub [f64; 6]);

impl Transform2D {
    pub fn identity() -> Self {
        Transform2D([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Transform2D([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform2D([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform2D::identity()
    }
}

impl DirectValue for Transform2D {
    const KIND: ObjectType = ObjectType::Transform2D;

    fn serialize(&self) -> Value {
        json!(self.0)
    }

    fn truthy(&self) -> bool {
        !self.is_identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub angle: f64,
    pub color_range: Vec<Color>,
    pub input_range: Vec<f64>,
}

impl DirectValue for Gradient {
    const KIND: ObjectType = ObjectType::Gradient;

    fn serialize(&self) -> Value {
        let kind = match self.kind {
            GradientKind::Linear => "linear",
            GradientKind::Radial => "radial",
        };
        json!({
            "type": kind,
            "angle": self.angle,
            "colorRange": self.color_range.iter().map(Color::to_string).collect::<Vec<_>>(),
            "inputRange": self.input_range,
        })
    }
}

/// An image filter: its type name plus its evaluated properties
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub kind: String,
    pub properties: BTreeMap<String, Object>,
}

impl DirectValue for Filter {
    const KIND: ObjectType = ObjectType::Filter;

    fn serialize(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.serialize());
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaSource {
    pub url: String,
    pub description: String,
    pub duration: f64,
    pub repeat_count: i32,
    pub offset: f64,
}

impl DirectValue for MediaSource {
    const KIND: ObjectType = ObjectType::MediaSource;

    fn serialize(&self) -> Value {
        json!({
            "url": self.url,
            "description": self.description,
            "duration": self.duration,
            "repeatCount": self.repeat_count,
            "offset": self.offset,
        })
    }

    fn empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// Text with inline markup. Displays without the tags.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    raw: String,
    text: String,
}

impl StyledText {
    pub fn new(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut in_tag = false;
        for c in raw.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }
        StyledText {
            raw: raw.to_string(),
            text,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl DirectValue for StyledText {
    const KIND: ObjectType = ObjectType::StyledText;

    fn serialize(&self) -> Value {
        Value::String(self.raw.clone())
    }

    fn truthy(&self) -> bool {
        !self.raw.is_empty()
    }

    fn empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn as_string(&self) -> String {
        self.text.clone()
    }

    fn debug_string(&self) -> String {
        format!("StyledText<{}>", self.raw)
    }
}

/// Easing curve over `[0,1]`, callable as `curve(t)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    pub fn object(self) -> Object {
        Object::from_data(ObjectType::Easing, Rc::new(EasingData(self)))
    }

    pub fn calc(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::CubicBezier(x1, y1, x2, y2) => {
                let s = solve_bezier_parameter(x1, x2, t);
                bezier(y1, y2, s)
            }
        }
    }
}

fn bezier(p1: f64, p2: f64, s: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

/// Find `s` with `bezier(x1, x2, s) == x` by bisection
fn solve_bezier_parameter(x1: f64, x2: f64, x: f64) -> f64 {
    let (mut low, mut high) = (0.0, 1.0);
    for _ in 0..64 {
        let mid = (low + high) / 2.0;
        if bezier(x1, x2, mid) < x {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

struct EasingData(Easing);

impl ObjectData for EasingData {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call(&self, args: &[Object]) -> Object {
        match args {
            [t] => Object::from(self.0.calc(t.as_number())),
            _ => Object::nan(),
        }
    }

    fn debug_string(&self) -> String {
        format!("Easing<{:?}>", self.0)
    }
}

/// Handle to a value owned by another subsystem (graphics, transforms, components).
/// Carries only a label and compares by identity.
pub struct OpaqueData {
    label: String,
}

impl OpaqueData {
    pub fn object(kind: ObjectType, label: &str) -> Object {
        Object::from_data(
            kind,
            Rc::new(OpaqueData {
                label: label.to_string(),
            }),
        )
    }
}

impl ObjectData for OpaqueData {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_string(&self) -> String {
        format!("Opaque<{}>", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_object() {
        let rect = Object::from_direct(Rect::new(1.0, 2.0, 30.0, 40.0));
        assert_eq!(rect.object_type(), ObjectType::Rect);
        assert!(!rect.empty());
        assert_eq!(rect.serialize(), json!([1.0, 2.0, 30.0, 40.0]));
        assert_eq!(rect.to_debug_string(), "Rect<30x40+1+2>");
        assert!(Object::from_direct(Rect::default()).empty());
    }

    #[test]
    fn test_transform_2d_truthy() {
        assert!(!Object::from_direct(Transform2D::identity()).truthy());
        assert!(Object::from_direct(Transform2D::translate(5.0, 0.0)).truthy());
        assert_eq!(
            Object::from_direct(Transform2D::scale(2.0, 2.0)),
            Object::from_direct(Transform2D::scale(2.0, 2.0))
        );
    }

    #[test]
    fn test_styled_text() {
        let text = Object::from_direct(StyledText::new("Hello <b>bold</b> world"));
        assert_eq!(text.as_string(), "Hello bold world");
        assert_eq!(text.serialize(), json!("Hello <b>bold</b> world"));
        assert!(text.truthy());
        assert!(!Object::from_direct(StyledText::new("")).truthy());
    }

    #[test]
    fn test_gradient_and_filter_content_equality() {
        let gradient = || Gradient {
            kind: GradientKind::Linear,
            angle: 90.0,
            color_range: vec![Color::BLACK, Color::WHITE],
            input_range: vec![0.0, 1.0],
        };
        assert_eq!(Object::from_direct(gradient()), Object::from_direct(gradient()));
        assert_eq!(
            Object::from_direct(gradient()).serialize()["colorRange"],
            json!(["#000000ff", "#ffffffff"])
        );

        let mut properties = BTreeMap::new();
        properties.insert("radius".to_string(), Object::from(4));
        let blur = Filter {
            kind: "Blur".to_string(),
            properties,
        };
        assert_eq!(
            Object::from_direct(blur.clone()).serialize(),
            json!({"type": "Blur", "radius": 4})
        );
        assert_eq!(Object::from_direct(blur.clone()), Object::from_direct(blur));
    }

    #[test]
    fn test_easing_curves() {
        let linear = Easing::Linear.object();
        assert_eq!(linear.call(&[Object::from(0.25)]), Object::from(0.25));
        assert!(linear.call(&[]).is_nan());

        let ease = Easing::CubicBezier(0.42, 0.0, 0.58, 1.0);
        assert_eq!(ease.calc(0.0), 0.0);
        assert_eq!(ease.calc(1.0), 1.0);
        assert!((ease.calc(0.5) - 0.5).abs() < 1e-6);
        assert!(ease.calc(0.25) < 0.25);
    }

    #[test]
    fn test_identity_kinds() {
        let a = OpaqueData::object(ObjectType::Graphic, "box");
        let b = OpaqueData::object(ObjectType::Graphic, "box");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(Easing::Linear.object(), Easing::Linear.object());
        assert_eq!(a.serialize(), json!("UNABLE TO SERIALIZE"));
    }
}
