//! Operator table for the expression language.
//!
//! Every operator the grammar can emit is a static [`BuiltinOp`] carrying its precedence
//! [`Order`], its arity and its implementation. The semantics of each operator (numeric
//! and dimension arithmetic, string concatenation, comparison, field and index access,
//! calls) are defined here once and reused by constant folding and by node evaluation.
//!
//! ## Functions vs Special Forms
//!
//! - **Functions** receive operands that have already been evaluated (e.g. `+`, `<`, `.`)
//! - **Special Forms** receive raw operands and evaluate only what they need
//!   (`&&`, `||`, `??` and the ternary), which gives them short-circuit behavior
//!
//! ## Comparison
//!
//! Comparisons reduce both operands to -1, 0 or 1. Numbers and dimensions compare
//! numerically, two strings compare lexically, and matching booleans, colors, nulls or
//! `auto` dimensions compare equal. Any other pairing is "less than". A `NaN` operand makes
//! every comparison false except `!=`.

use crate::dimension::Dimension;
use crate::object::Object;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Operator precedence, tightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Order {
    FieldOrFunction = 1,
    Unary = 2,
    Term = 3,
    Expression = 4,
    Comparison = 5,
    Equality = 6,
    LogicalAnd = 7,
    LogicalOr = 8,
    /// Associates right-to-left
    Nullc = 9,
    Ternary = 10,
}

/// Represents the expected number of operands for an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    /// Exactly n operands required
    Exact(usize),
    /// Any number of operands (0 or more)
    Any,
}

impl Arity {
    pub fn validate(&self, operand_count: usize) -> bool {
        match self {
            Arity::Exact(n) => operand_count == *n,
            Arity::Any => true,
        }
    }
}

/// Represents the implementation of an operator
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Receives evaluated operands
    Function(fn(&[Object]) -> Object),
    /// Receives raw operands and evaluates them on demand
    SpecialForm(fn(&[Object]) -> Object),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of an operator
#[derive(Debug)]
pub struct BuiltinOp {
    /// Unique name, also used in debug output
    pub name: &'static str,
    pub order: Order,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl BuiltinOp {
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    /// Apply the operator to `operands`: evaluated first for functions, raw for special
    /// forms. A wrong operand count yields `null`.
    pub fn apply(&self, operands: &[Object]) -> Object {
        if !self.arity.validate(operands.len()) {
            tracing::debug!(
                "Operator '{}' received {} operands",
                self.name,
                operands.len()
            );
            return Object::Null;
        }
        match self.op_kind {
            OpKind::Function(f) => {
                let evaluated: Vec<Object> = operands.iter().map(Object::eval).collect();
                f(&evaluated)
            }
            OpKind::SpecialForm(f) => f(operands),
        }
    }
}

//
// Operator Implementations
//

fn unary_plus(args: &[Object]) -> Object {
    match args {
        [a] if a.is_number() || a.is_non_auto_dimension() => a.clone(),
        _ => Object::nan(),
    }
}

fn unary_minus(args: &[Object]) -> Object {
    match args {
        [Object::Number(n)] => Object::Number(-n),
        [Object::AbsoluteDimension(v)] => Object::AbsoluteDimension(-v),
        [Object::RelativeDimension(v)] => Object::RelativeDimension(-v),
        _ => Object::nan(),
    }
}

fn unary_not(args: &[Object]) -> Object {
    match args {
        [a] => Object::Bool(!a.truthy()),
        _ => Object::Null,
    }
}

fn absolute(value: f64) -> Object {
    Object::from(Dimension::absolute(value))
}

fn relative(value: f64) -> Object {
    Object::from(Dimension::relative(value))
}

fn calc_multiply(a: &Object, b: &Object) -> Object {
    match (a, b) {
        (Object::Number(x), Object::Number(y)) => Object::Number(x * y),
        (Object::Number(x), Object::AbsoluteDimension(y))
        | (Object::AbsoluteDimension(y), Object::Number(x)) => absolute(x * y),
        (Object::Number(x), Object::RelativeDimension(y))
        | (Object::RelativeDimension(y), Object::Number(x)) => relative(x * y),
        _ => Object::nan(),
    }
}

/// Shared shape of `/` and `%`: a number divisor scales any numeric dividend, and two
/// dimensions of the same type produce a scalar
fn divide_like(a: &Object, b: &Object, op: fn(f64, f64) -> f64) -> Object {
    match (a, b) {
        (Object::Number(x), Object::Number(y)) => Object::Number(op(*x, *y)),
        (Object::AbsoluteDimension(x), Object::Number(y)) => absolute(op(*x, *y)),
        (Object::RelativeDimension(x), Object::Number(y)) => relative(op(*x, *y)),
        (Object::AbsoluteDimension(x), Object::AbsoluteDimension(y))
        | (Object::RelativeDimension(x), Object::RelativeDimension(y)) => {
            Object::Number(op(*x, *y))
        }
        _ => Object::nan(),
    }
}

fn calc_divide(a: &Object, b: &Object) -> Object {
    divide_like(a, b, |x, y| x / y)
}

fn calc_remainder(a: &Object, b: &Object) -> Object {
    divide_like(a, b, |x, y| x % y)
}

/// Numeric combinations shared by `+` and `-`; `None` when the operands are not numeric
fn additive(a: &Object, b: &Object, op: fn(f64, f64) -> f64) -> Option<Object> {
    let result = match (a, b) {
        (Object::Number(x), Object::Number(y)) => Object::Number(op(*x, *y)),
        (Object::Number(x), Object::AbsoluteDimension(y))
        | (Object::AbsoluteDimension(x), Object::Number(y))
        | (Object::AbsoluteDimension(x), Object::AbsoluteDimension(y)) => absolute(op(*x, *y)),
        (Object::Number(x), Object::RelativeDimension(y))
        | (Object::RelativeDimension(x), Object::Number(y))
        | (Object::RelativeDimension(x), Object::RelativeDimension(y)) => relative(op(*x, *y)),
        _ => return None,
    };
    Some(result)
}

fn calc_add(a: &Object, b: &Object) -> Object {
    additive(a, b, |x, y| x + y)
        .unwrap_or_else(|| Object::from(a.as_string() + &b.as_string()))
}

fn calc_subtract(a: &Object, b: &Object) -> Object {
    additive(a, b, |x, y| x - y).unwrap_or_else(Object::nan)
}

fn compare_numbers(a: f64, b: f64) -> i32 {
    if a == b {
        0
    } else if a < b {
        -1
    } else {
        1
    }
}

/// Three-way comparison returning -1, 0 or 1
pub fn compare(a: &Object, b: &Object) -> i32 {
    match (a, b) {
        (
            Object::Number(x),
            Object::Number(y) | Object::AbsoluteDimension(y) | Object::RelativeDimension(y),
        )
        | (Object::AbsoluteDimension(x), Object::Number(y) | Object::AbsoluteDimension(y))
        | (Object::RelativeDimension(x), Object::Number(y) | Object::RelativeDimension(y)) => {
            compare_numbers(*x, *y)
        }
        (Object::String(x), Object::String(y)) => match x.cmp(y) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        },
        (Object::Bool(x), Object::Bool(y)) if x == y => 0,
        (Object::Color(x), Object::Color(y)) if x == y => 0,
        (Object::Null, Object::Null) | (Object::AutoDimension, Object::AutoDimension) => 0,
        _ => -1,
    }
}

// Macro to generate binary operators over evaluated operands
macro_rules! binary_operator {
    ($name:ident, $calc:ident) => {
        fn $name(args: &[Object]) -> Object {
            match args {
                [a, b] => $calc(a, b),
                _ => Object::Null,
            }
        }
    };
}

binary_operator!(multiply, calc_multiply);
binary_operator!(divide, calc_divide);
binary_operator!(remainder, calc_remainder);
binary_operator!(add, calc_add);
binary_operator!(subtract, calc_subtract);
binary_operator!(field_access, calc_field_access);
binary_operator!(array_access, calc_array_access);

// Macro to generate comparison operators from the accepted results of `compare`
macro_rules! comparison_operator {
    ($name:ident, $accepted:pat, $when_nan:expr) => {
        fn $name(args: &[Object]) -> Object {
            match args {
                [a, b] if a.is_nan() || b.is_nan() => Object::Bool($when_nan),
                [a, b] => Object::Bool(matches!(compare(a, b), $accepted)),
                _ => Object::Null,
            }
        }
    };
}

comparison_operator!(less_than, -1, false);
comparison_operator!(less_equal, -1 | 0, false);
comparison_operator!(greater_than, 1, false);
comparison_operator!(greater_equal, 0 | 1, false);
comparison_operator!(equal, 0, false);
comparison_operator!(not_equal, -1 | 1, true);

/// `a.b`
fn calc_field_access(a: &Object, b: &Object) -> Object {
    if a.is_map() && b.is_string() {
        return a.get(b.get_string());
    }
    if a.is_array() && b.is_string() && b.get_string() == "length" {
        return Object::from(a.size());
    }
    Object::Null
}

/// `a[b]`. Negative indices count from the end of an array.
fn calc_array_access(a: &Object, b: &Object) -> Object {
    if a.is_map() && b.is_string() {
        return a.get(b.get_string());
    }
    if a.is_array() {
        match b {
            Object::String(s) if s.as_ref() == "length" => return Object::from(a.size()),
            Object::Number(n) => {
                let len = a.size() as i64;
                let mut index = n.round() as i64;
                if index < 0 {
                    index += len;
                }
                if (0..len).contains(&index) {
                    return a.at(index as usize);
                }
            }
            _ => {}
        }
    }
    Object::Null
}

/// String merge used when literal text and expressions share one string.
/// An empty string on either side passes the other operand through untouched.
pub fn merge(a: &Object, b: &Object) -> Object {
    if a.is_string() && a.empty() {
        return b.clone();
    }
    if b.is_string() && b.empty() {
        return a.clone();
    }
    Object::from(a.as_string() + &b.as_string())
}

fn merge_all(args: &[Object]) -> Object {
    match args.split_first() {
        Some((first, rest)) => rest.iter().fold(first.clone(), |acc, next| merge(&acc, next)),
        None => Object::from(""),
    }
}

fn function_call(args: &[Object]) -> Object {
    match args {
        [callee, arguments] if arguments.is_array() => callee.call(&arguments.get_array()),
        _ => Object::Null,
    }
}

fn array_literal(args: &[Object]) -> Object {
    Object::array(args.to_vec())
}

/// Builds a map from a flattened `[key, value, key, value, ...]` array
fn map_literal(args: &[Object]) -> Object {
    match args {
        [entries] if entries.is_array() => {
            let items = entries.get_array();
            let map: BTreeMap<String, Object> = items
                .chunks(2)
                .filter_map(|pair| match pair {
                    [key, value] => Some((key.as_string(), value.clone())),
                    _ => None,
                })
                .collect();
            Object::map(map)
        }
        _ => Object::Null,
    }
}

//
// Special forms
//

fn ternary(args: &[Object]) -> Object {
    match args {
        [condition, then_branch, else_branch] => {
            if condition.eval().truthy() {
                then_branch.eval()
            } else {
                else_branch.eval()
            }
        }
        _ => Object::Null,
    }
}

/// Returns the first falsy operand, or the last one
fn logical_and(args: &[Object]) -> Object {
    match args {
        [a, b] => {
            let left = a.eval();
            if left.truthy() { b.eval() } else { left }
        }
        _ => Object::Null,
    }
}

/// Returns the first truthy operand, or the last one
fn logical_or(args: &[Object]) -> Object {
    match args {
        [a, b] => {
            let left = a.eval();
            if left.truthy() { left } else { b.eval() }
        }
        _ => Object::Null,
    }
}

fn nullc(args: &[Object]) -> Object {
    match args {
        [a, b] => {
            let left = a.eval();
            if left.is_null() { b.eval() } else { left }
        }
        _ => Object::Null,
    }
}

//
// The operator table
//

macro_rules! operator {
    ($name:expr, $order:ident, $kind:ident($func:ident), $arity:expr) => {
        BuiltinOp {
            name: $name,
            order: Order::$order,
            op_kind: OpKind::$kind($func),
            arity: $arity,
        }
    };
}

pub static MULTIPLY: BuiltinOp = operator!("*", Term, Function(multiply), Arity::Exact(2));
pub static DIVIDE: BuiltinOp = operator!("/", Term, Function(divide), Arity::Exact(2));
pub static REMAINDER: BuiltinOp = operator!("%", Term, Function(remainder), Arity::Exact(2));
pub static ADD: BuiltinOp = operator!("+", Expression, Function(add), Arity::Exact(2));
pub static SUBTRACT: BuiltinOp = operator!("-", Expression, Function(subtract), Arity::Exact(2));
pub static LESS_THAN: BuiltinOp =
    operator!("<", Comparison, Function(less_than), Arity::Exact(2));
pub static GREATER_THAN: BuiltinOp =
    operator!(">", Comparison, Function(greater_than), Arity::Exact(2));
pub static LESS_EQUAL: BuiltinOp =
    operator!("<=", Comparison, Function(less_equal), Arity::Exact(2));
pub static GREATER_EQUAL: BuiltinOp =
    operator!(">=", Comparison, Function(greater_equal), Arity::Exact(2));
pub static EQUAL: BuiltinOp = operator!("==", Equality, Function(equal), Arity::Exact(2));
pub static NOT_EQUAL: BuiltinOp = operator!("!=", Equality, Function(not_equal), Arity::Exact(2));
pub static UNARY_PLUS: BuiltinOp = operator!("u+", Unary, Function(unary_plus), Arity::Exact(1));
pub static UNARY_MINUS: BuiltinOp =
    operator!("u-", Unary, Function(unary_minus), Arity::Exact(1));
pub static UNARY_NOT: BuiltinOp = operator!("!", Unary, Function(unary_not), Arity::Exact(1));
pub static FIELD_ACCESS: BuiltinOp =
    operator!(".", FieldOrFunction, Function(field_access), Arity::Exact(2));
pub static ARRAY_ACCESS: BuiltinOp =
    operator!("[", FieldOrFunction, Function(array_access), Arity::Exact(2));
pub static FUNCTION_CALL: BuiltinOp =
    operator!("function", FieldOrFunction, Function(function_call), Arity::Exact(2));
pub static ARRAY_LITERAL: BuiltinOp =
    operator!("array", FieldOrFunction, Function(array_literal), Arity::Any);
pub static MAP_LITERAL: BuiltinOp =
    operator!("map", FieldOrFunction, Function(map_literal), Arity::Exact(1));
pub static MERGE: BuiltinOp = operator!("merge", FieldOrFunction, Function(merge_all), Arity::Any);
pub static TERNARY: BuiltinOp = operator!("?:", Ternary, SpecialForm(ternary), Arity::Exact(3));
pub static NULLC: BuiltinOp = operator!("nullc", Nullc, SpecialForm(nullc), Arity::Exact(2));
pub static AND: BuiltinOp = operator!("and", LogicalAnd, SpecialForm(logical_and), Arity::Exact(2));
pub static OR: BuiltinOp = operator!("or", LogicalOr, SpecialForm(logical_or), Arity::Exact(2));

/// Every operator, in precedence order
pub static BUILTIN_OPS: &[&BuiltinOp] = &[
    &FIELD_ACCESS,
    &ARRAY_ACCESS,
    &FUNCTION_CALL,
    &ARRAY_LITERAL,
    &MAP_LITERAL,
    &MERGE,
    &UNARY_PLUS,
    &UNARY_MINUS,
    &UNARY_NOT,
    &MULTIPLY,
    &DIVIDE,
    &REMAINDER,
    &ADD,
    &SUBTRACT,
    &LESS_THAN,
    &GREATER_THAN,
    &LESS_EQUAL,
    &GREATER_EQUAL,
    &EQUAL,
    &NOT_EQUAL,
    &AND,
    &OR,
    &NULLC,
    &TERNARY,
];

static BUILTIN_OPS_BY_NAME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, *op)).collect());

/// Find an operator by its name
pub fn find_builtin_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS_BY_NAME.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn num(n: f64) -> Object {
        Object::from(n)
    }

    fn s(text: &str) -> Object {
        Object::from(text)
    }

    #[test]
    fn test_operator_lookup() {
        assert_eq!(find_builtin_op("*"), Some(&MULTIPLY));
        assert_eq!(find_builtin_op("nullc").map(|op| op.order), Some(Order::Nullc));
        assert!(find_builtin_op("**").is_none());
        assert!(TERNARY.is_special_form());
        assert!(!ADD.is_special_form());
        assert_eq!(BUILTIN_OPS.len(), BUILTIN_OPS_BY_NAME.len());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(MULTIPLY.apply(&[num(3.0), num(4.0)]), num(12.0));
        assert_eq!(DIVIDE.apply(&[num(1.0), num(0.0)]), num(f64::INFINITY));
        assert_eq!(REMAINDER.apply(&[num(7.0), num(4.0)]), num(3.0));
        assert_eq!(REMAINDER.apply(&[num(-7.0), num(4.0)]), num(-3.0));
        assert_eq!(SUBTRACT.apply(&[num(1.0), num(3.0)]), num(-2.0));
        assert!(SUBTRACT.apply(&[s("a"), num(3.0)]).is_nan());
        assert!(MULTIPLY.apply(&[s("2"), num(3.0)]).is_nan());
    }

    #[test]
    fn test_dimension_arithmetic() {
        let dp = Object::AbsoluteDimension;
        let pct = Object::RelativeDimension;
        assert_eq!(ADD.apply(&[num(1.0), dp(2.0)]), dp(3.0));
        assert_eq!(ADD.apply(&[pct(10.0), pct(5.0)]), pct(15.0));
        assert_eq!(MULTIPLY.apply(&[dp(4.0), num(2.0)]), dp(8.0));
        assert_eq!(DIVIDE.apply(&[dp(10.0), dp(4.0)]), num(2.5));
        assert_eq!(DIVIDE.apply(&[pct(10.0), num(4.0)]), pct(2.5));
        assert!(DIVIDE.apply(&[num(10.0), dp(4.0)]).is_nan());
        assert_eq!(ADD.apply(&[dp(1.0), pct(2.0)]), s("1dp2%"));
        assert!(SUBTRACT.apply(&[dp(1.0), pct(2.0)]).is_nan());
        assert_eq!(UNARY_MINUS.apply(&[pct(5.0)]), pct(-5.0));
        assert!(UNARY_PLUS.apply(&[Object::AutoDimension]).is_nan());
    }

    #[test]
    fn test_add_concatenates_non_numbers() {
        assert_eq!(ADD.apply(&[s("a"), s("b")]), s("ab"));
        assert_eq!(ADD.apply(&[num(1.0), s("b")]), s("1b"));
        assert_eq!(ADD.apply(&[Object::Null, num(2.5)]), s("2.5"));
        assert_eq!(ADD.apply(&[Object::from(true), s("!")]), s("true!"));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&num(1.0), &num(2.0)), -1);
        assert_eq!(compare(&num(2.0), &Object::AbsoluteDimension(2.0)), 0);
        assert_eq!(compare(&s("b"), &s("a")), 1);
        assert_eq!(compare(&Object::Null, &Object::Null), 0);
        assert_eq!(compare(&Object::from(true), &Object::from(false)), -1);
        assert_eq!(
            compare(&Object::from(Color::BLACK), &Object::from(Color::BLACK)),
            0
        );
        assert_eq!(compare(&num(1.0), &s("1")), -1);
    }

    #[test]
    fn test_comparison_operators() {
        let t = Object::from(true);
        let f = Object::from(false);
        assert_eq!(LESS_THAN.apply(&[num(1.0), num(2.0)]), t);
        assert_eq!(LESS_EQUAL.apply(&[num(2.0), num(2.0)]), t);
        assert_eq!(GREATER_THAN.apply(&[num(1.0), num(2.0)]), f);
        assert_eq!(GREATER_EQUAL.apply(&[s("b"), s("a")]), t);
        assert_eq!(EQUAL.apply(&[Object::Null, Object::Null]), t);
        assert_eq!(NOT_EQUAL.apply(&[num(1.0), s("1")]), t);
        // Mismatched kinds compare as "less than"
        assert_eq!(LESS_THAN.apply(&[num(1.0), s("1")]), t);
        assert_eq!(GREATER_EQUAL.apply(&[num(1.0), s("1")]), f);
    }

    #[test]
    fn test_nan_comparisons() {
        let nan = Object::nan();
        let t = Object::from(true);
        let f = Object::from(false);
        assert_eq!(EQUAL.apply(&[nan.clone(), nan.clone()]), f);
        assert_eq!(NOT_EQUAL.apply(&[nan.clone(), nan.clone()]), t);
        assert_eq!(LESS_EQUAL.apply(&[nan.clone(), num(1.0)]), f);
        assert_eq!(GREATER_EQUAL.apply(&[num(1.0), nan]), f);
    }

    #[test]
    fn test_field_and_array_access() {
        let list = Object::array(vec![num(10.0), num(20.0), num(30.0)]);
        assert_eq!(FIELD_ACCESS.apply(&[list.clone(), s("length")]), num(3.0));
        assert_eq!(ARRAY_ACCESS.apply(&[list.clone(), num(1.0)]), num(20.0));
        assert_eq!(ARRAY_ACCESS.apply(&[list.clone(), num(-1.0)]), num(30.0));
        assert_eq!(ARRAY_ACCESS.apply(&[list.clone(), num(1.6)]), num(30.0));
        assert_eq!(ARRAY_ACCESS.apply(&[list.clone(), num(3.0)]), Object::Null);
        assert_eq!(ARRAY_ACCESS.apply(&[list.clone(), num(-4.0)]), Object::Null);
        assert_eq!(FIELD_ACCESS.apply(&[list, s("first")]), Object::Null);

        let mut entries = BTreeMap::new();
        entries.insert("name".to_string(), s("Fred"));
        let map = Object::map(entries);
        assert_eq!(FIELD_ACCESS.apply(&[map.clone(), s("name")]), s("Fred"));
        assert_eq!(ARRAY_ACCESS.apply(&[map.clone(), s("name")]), s("Fred"));
        assert_eq!(ARRAY_ACCESS.apply(&[map, num(0.0)]), Object::Null);
        assert_eq!(FIELD_ACCESS.apply(&[num(1.0), s("x")]), Object::Null);
    }

    #[test]
    fn test_merge() {
        assert_eq!(MERGE.apply(&[s(""), num(4.0)]), num(4.0));
        assert_eq!(MERGE.apply(&[num(4.0), s("")]), num(4.0));
        assert_eq!(MERGE.apply(&[s("x="), num(4.0), s("!")]), s("x=4!"));
        assert_eq!(MERGE.apply(&[num(1.0), num(2.0)]), s("12"));
        assert_eq!(MERGE.apply(&[]), s(""));
    }

    #[test]
    fn test_logical_forms_return_operands() {
        assert_eq!(AND.apply(&[num(0.0), s("x")]), num(0.0));
        assert_eq!(AND.apply(&[num(1.0), s("x")]), s("x"));
        assert_eq!(OR.apply(&[s(""), s("y")]), s("y"));
        assert_eq!(OR.apply(&[s("a"), s("y")]), s("a"));
        assert_eq!(NULLC.apply(&[Object::Null, num(5.0)]), num(5.0));
        assert_eq!(NULLC.apply(&[num(3.0), num(9.0)]), num(3.0));
        assert_eq!(NULLC.apply(&[num(0.0), num(9.0)]), num(0.0));
        assert_eq!(TERNARY.apply(&[s(""), num(1.0), num(2.0)]), num(2.0));
    }

    #[test]
    fn test_wrong_operand_count() {
        assert_eq!(ADD.apply(&[num(1.0)]), Object::Null);
        assert_eq!(TERNARY.apply(&[num(1.0), num(2.0)]), Object::Null);
    }

    #[test]
    fn test_map_literal() {
        let entries = Object::array(vec![s("a"), num(1.0), s("b"), num(2.0)]);
        let map = MAP_LITERAL.apply(&[entries]);
        assert_eq!(map.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(map.get("b"), num(2.0));
        assert_eq!(ARRAY_LITERAL.apply(&[num(1.0), num(2.0)]).size(), 2);
    }
}
