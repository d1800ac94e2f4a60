//! Builtin function library installed into every root context.
//!
//! Each library is a constant map of [`Function`] objects: `Math`, `String`, `Array`, `Map`
//! and `Time`. Functions never fail. A wrong argument count or an unusable argument yields
//! `NaN` for numeric results and `null` (or an empty container) otherwise.

use crate::context::Context;
use crate::node::Function;
use crate::numberformat::string_to_int64;
use crate::object::Object;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use tracing::debug;

/// Longest array `Array.range` will build
pub const MAX_RANGE_LENGTH: usize = 100_000;

const MS_PER_DAY: f64 = 86_400_000.0;

type Library = BTreeMap<String, Object>;

fn add(library: &mut Library, prefix: &str, name: &str, func: fn(&[Object]) -> Object) {
    library.insert(
        name.to_string(),
        Function::create(&format!("{}.{}", prefix, name), func, true),
    );
}

/// Put `Math`, `String`, `Array`, `Map` and `Time` into `context` as constants
pub fn install(context: &Context) {
    context.put_constant("Math", math_library());
    context.put_constant("String", string_library());
    context.put_constant("Array", array_library());
    context.put_constant("Map", map_library());
    context.put_constant("Time", time_library());
}

//
// Math
//

fn unary_math(library: &mut Library, name: &str, f: fn(f64) -> f64) {
    library.insert(
        name.to_string(),
        Function::create(
            &format!("Math.{}", name),
            move |args: &[Object]| match args {
                [x] => Object::from(f(x.as_number())),
                _ => Object::nan(),
            },
            true,
        ),
    );
}

fn predicate_math(library: &mut Library, name: &str, f: fn(f64) -> bool) {
    library.insert(
        name.to_string(),
        Function::create(
            &format!("Math.{}", name),
            move |args: &[Object]| match args {
                [x] => Object::from(f(x.as_number())),
                _ => Object::from(false),
            },
            true,
        ),
    );
}

fn binary_math(library: &mut Library, name: &str, f: fn(f64, f64) -> f64) {
    library.insert(
        name.to_string(),
        Function::create(
            &format!("Math.{}", name),
            move |args: &[Object]| match args {
                [x, y] => Object::from(f(x.as_number(), y.as_number())),
                _ => Object::nan(),
            },
            true,
        ),
    );
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 { x } else { x.signum() }
}

fn math_clamp(args: &[Object]) -> Object {
    let [low, value, high] = args else {
        return Object::nan();
    };
    let (low, value, high) = (low.as_number(), value.as_number(), high.as_number());
    if low.is_nan() || value.is_nan() || high.is_nan() {
        return Object::nan();
    }
    if value < low {
        Object::from(low)
    } else if value > high {
        Object::from(high)
    } else {
        Object::from(value)
    }
}

fn math_hypot(args: &[Object]) -> Object {
    let sum: f64 = args
        .iter()
        .map(|arg| {
            let x = arg.as_number();
            x * x
        })
        .sum();
    Object::from(sum.sqrt())
}

/// Fold the arguments with `pick`, returning NaN as soon as one is NaN
fn extreme(args: &[Object], initial: f64, pick: fn(f64, f64) -> f64) -> Object {
    let mut result = initial;
    for arg in args {
        let x = arg.as_number();
        if x.is_nan() {
            return Object::nan();
        }
        result = pick(result, x);
    }
    Object::from(result)
}

fn math_max(args: &[Object]) -> Object {
    extreme(args, f64::NEG_INFINITY, f64::max)
}

fn math_min(args: &[Object]) -> Object {
    extreme(args, f64::INFINITY, f64::min)
}

fn math_float(args: &[Object]) -> Object {
    match args {
        [x] => Object::from(x.as_number()),
        _ => Object::nan(),
    }
}

/// `int(value)` or `int(value, base)`. Strings parse in the base (0 infers it from the
/// prefix); everything else truncates toward zero.
fn math_int(args: &[Object]) -> Object {
    let (value, base) = match args {
        [value] => (value, 10),
        [value, base] => (value, base.as_int()),
        _ => return Object::nan(),
    };
    if base != 0 && !(2..=36).contains(&base) {
        return Object::nan();
    }
    match value {
        Object::String(s) => Object::from(string_to_int64(s, base as u32)),
        other => Object::from(other.as_number().trunc()),
    }
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(random_seed());
}

fn random_seed() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(0x9e37_79b9_7f4a_7c15);
    hasher.finish() | 1
}

/// Uniform in `[0, 1)` from a xorshift64 generator
fn next_random() -> f64 {
    RANDOM_STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    })
}

fn math_library() -> Object {
    let mut library = Library::new();
    let unary: [(&str, fn(f64) -> f64); 27] = [
        ("abs", f64::abs),
        ("acos", f64::acos),
        ("acosh", f64::acosh),
        ("asin", f64::asin),
        ("asinh", f64::asinh),
        ("atan", f64::atan),
        ("atanh", f64::atanh),
        ("cbrt", f64::cbrt),
        ("ceil", f64::ceil),
        ("cos", f64::cos),
        ("cosh", f64::cosh),
        ("exp", f64::exp),
        ("exp2", f64::exp2),
        ("expm1", f64::exp_m1),
        ("floor", f64::floor),
        ("log", f64::ln),
        ("log1p", f64::ln_1p),
        ("log10", f64::log10),
        ("log2", f64::log2),
        ("round", f64::round),
        ("sign", sign),
        ("sin", f64::sin),
        ("sinh", f64::sinh),
        ("sqrt", f64::sqrt),
        ("tan", f64::tan),
        ("tanh", f64::tanh),
        ("trunc", f64::trunc),
    ];
    for (name, f) in unary {
        unary_math(&mut library, name, f);
    }
    add(&mut library, "Math", "float", math_float);

    predicate_math(&mut library, "isFinite", f64::is_finite);
    predicate_math(&mut library, "isInf", f64::is_infinite);
    predicate_math(&mut library, "isNaN", f64::is_nan);
    binary_math(&mut library, "atan2", f64::atan2);
    binary_math(&mut library, "pow", f64::powf);

    add(&mut library, "Math", "clamp", math_clamp);
    add(&mut library, "Math", "hypot", math_hypot);
    add(&mut library, "Math", "int", math_int);
    add(&mut library, "Math", "max", math_max);
    add(&mut library, "Math", "min", math_min);
    library.insert(
        "random".to_string(),
        Function::create("Math.random", |_| Object::from(next_random()), false),
    );

    let constants = [
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("PI", std::f64::consts::PI),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
        ("SQRT2", std::f64::consts::SQRT_2),
    ];
    for (name, value) in constants {
        library.insert(name.to_string(), Object::from(value));
    }
    Object::map(library)
}

//
// String
//

/// Resolve a possibly negative index against `len`, clamped to `0..=len`
fn clamp_index(index: f64, len: usize) -> usize {
    let len_i = len as i64;
    let mut index = if index.is_nan() { 0 } else { index.trunc() as i64 };
    if index < 0 {
        index += len_i;
    }
    index.clamp(0, len_i) as usize
}

/// `(start, end)` of a slice following the `slice(start, end?)` argument convention
fn slice_bounds(args: &[Object], len: usize) -> (usize, usize) {
    let start = args.first().map_or(0, |start| clamp_index(start.as_number(), len));
    let end = args.get(1).map_or(len, |end| clamp_index(end.as_number(), len));
    (start, end.max(start))
}

fn string_to_lower_case(args: &[Object]) -> Object {
    match args {
        [s] => Object::from(s.as_string().to_lowercase()),
        _ => Object::Null,
    }
}

fn string_to_upper_case(args: &[Object]) -> Object {
    match args {
        [s] => Object::from(s.as_string().to_uppercase()),
        _ => Object::Null,
    }
}

fn string_length(args: &[Object]) -> Object {
    match args {
        [s] => Object::from(s.as_string().chars().count()),
        _ => Object::Null,
    }
}

fn string_slice(args: &[Object]) -> Object {
    let Some((s, bounds)) = args.split_first() else {
        return Object::Null;
    };
    if bounds.len() > 2 {
        return Object::Null;
    }
    let chars: Vec<char> = s.as_string().chars().collect();
    let (start, end) = slice_bounds(bounds, chars.len());
    Object::from(chars[start..end].iter().collect::<String>())
}

fn string_char_at(args: &[Object]) -> Object {
    let [s, index] = args else {
        return Object::Null;
    };
    let chars: Vec<char> = s.as_string().chars().collect();
    let len = chars.len() as i64;
    let mut index = index.as_number().trunc() as i64;
    if index < 0 {
        index += len;
    }
    if !(0..len).contains(&index) {
        return Object::from("");
    }
    Object::from(chars[index as usize].to_string())
}

fn string_library() -> Object {
    let mut library = Library::new();
    add(&mut library, "String", "toLowerCase", string_to_lower_case);
    add(&mut library, "String", "toUpperCase", string_to_upper_case);
    add(&mut library, "String", "slice", string_slice);
    add(&mut library, "String", "length", string_length);
    add(&mut library, "String", "charAt", string_char_at);
    Object::map(library)
}

//
// Array and Map
//

fn array_index_of(args: &[Object]) -> Object {
    match args {
        [array, value] if array.is_array() => {
            let position = array.get_array().iter().position(|item| item == value);
            position.map_or(Object::from(-1), Object::from)
        }
        [_, _] => Object::from(-1),
        _ => Object::Null,
    }
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`
fn array_range(args: &[Object]) -> Object {
    let (start, end, step) = match args {
        [end] => (0.0, end.as_number(), 1.0),
        [start, end] => (start.as_number(), end.as_number(), 1.0),
        [start, end, step] => (start.as_number(), end.as_number(), step.as_number()),
        _ => return Object::Null,
    };
    let count = ((end - start) / step).ceil();
    if !count.is_finite() || count <= 0.0 {
        return Object::empty_array();
    }
    if count > MAX_RANGE_LENGTH as f64 {
        debug!("Array.range of {} elements exceeds {}", count, MAX_RANGE_LENGTH);
        return Object::empty_array();
    }
    let items = (0..count as usize)
        .map(|i| Object::from(start + step * i as f64))
        .collect();
    Object::array(items)
}

fn array_slice(args: &[Object]) -> Object {
    let Some((array, bounds)) = args.split_first() else {
        return Object::Null;
    };
    if !array.is_array() || bounds.len() > 2 {
        return Object::Null;
    }
    let items = array.get_array();
    let (start, end) = slice_bounds(bounds, items.len());
    Object::array(items[start..end].to_vec())
}

fn array_library() -> Object {
    let mut library = Library::new();
    add(&mut library, "Array", "indexOf", array_index_of);
    add(&mut library, "Array", "range", array_range);
    add(&mut library, "Array", "slice", array_slice);
    Object::map(library)
}

fn map_keys(args: &[Object]) -> Object {
    match args {
        [map] if map.is_map() => Object::array(map.keys().into_iter().map(Object::from).collect()),
        [_] => Object::empty_array(),
        _ => Object::Null,
    }
}

fn map_library() -> Object {
    let mut library = Library::new();
    add(&mut library, "Map", "keys", map_keys);
    Object::map(library)
}

//
// Time
//

/// Broken-down UTC time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub year: i64,
    /// 0-based
    pub month: u32,
    /// 1-based day of the month
    pub date: u32,
    /// 0 is Sunday
    pub week_day: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
}

impl CivilTime {
    /// Split milliseconds since the Unix epoch; `None` for non-finite input
    pub fn from_epoch_ms(ms: f64) -> Option<CivilTime> {
        if !ms.is_finite() {
            return None;
        }
        let days = (ms / MS_PER_DAY).floor();
        let ms_of_day = (ms - days * MS_PER_DAY) as u64;
        let days = days as i64;
        let (year, month, date) = civil_from_days(days);
        Some(CivilTime {
            year,
            month: month - 1,
            date,
            week_day: (days + 4).rem_euclid(7) as u32,
            hours: (ms_of_day / 3_600_000) as u32,
            minutes: (ms_of_day / 60_000 % 60) as u32,
            seconds: (ms_of_day / 1000 % 60) as u32,
            milliseconds: (ms_of_day % 1000) as u32,
        })
    }
}

/// Proleptic Gregorian date for a day count relative to 1970-01-01: (year, month 1-12, day)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn time_field(library: &mut Library, name: &str, field: fn(&CivilTime) -> f64) {
    library.insert(
        name.to_string(),
        Function::create(
            &format!("Time.{}", name),
            move |args: &[Object]| match args {
                [ms] => CivilTime::from_epoch_ms(ms.as_number())
                    .map_or(Object::nan(), |time| Object::from(field(&time))),
                _ => Object::nan(),
            },
            true,
        ),
    );
}

fn time_library() -> Object {
    let mut library = Library::new();
    time_field(&mut library, "year", |t| t.year as f64);
    time_field(&mut library, "month", |t| f64::from(t.month));
    time_field(&mut library, "date", |t| f64::from(t.date));
    time_field(&mut library, "weekDay", |t| f64::from(t.week_day));
    time_field(&mut library, "hours", |t| f64::from(t.hours));
    time_field(&mut library, "minutes", |t| f64::from(t.minutes));
    time_field(&mut library, "seconds", |t| f64::from(t.seconds));
    time_field(&mut library, "milliseconds", |t| f64::from(t.milliseconds));
    Object::map(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(library: &Object, name: &str, args: &[Object]) -> Object {
        library.get(name).call(args)
    }

    fn num(n: f64) -> Object {
        Object::from(n)
    }

    #[test]
    fn test_math_functions() {
        let math = math_library();
        assert_eq!(call(&math, "abs", &[num(-3.0)]), num(3.0));
        assert_eq!(call(&math, "floor", &[Object::from("2.7")]), num(2.0));
        assert_eq!(call(&math, "round", &[num(-2.5)]), num(-3.0));
        assert_eq!(call(&math, "sign", &[num(-0.5)]), num(-1.0));
        assert_eq!(call(&math, "pow", &[num(2.0), num(10.0)]), num(1024.0));
        assert_eq!(call(&math, "hypot", &[num(3.0), num(4.0)]), num(5.0));
        assert_eq!(call(&math, "clamp", &[num(0.0), num(12.0), num(10.0)]), num(10.0));
        assert_eq!(call(&math, "clamp", &[num(0.0), num(-1.0), num(10.0)]), num(0.0));
        assert_eq!(math.get("PI"), num(std::f64::consts::PI));
    }

    #[test]
    fn test_math_argument_errors() {
        let math = math_library();
        assert!(call(&math, "abs", &[]).is_nan());
        assert!(call(&math, "pow", &[num(2.0)]).is_nan());
        assert!(call(&math, "clamp", &[num(1.0), num(2.0)]).is_nan());
        assert_eq!(call(&math, "isNaN", &[]), Object::from(false));
        assert_eq!(call(&math, "isNaN", &[Object::from("x")]), Object::from(true));
        assert_eq!(call(&math, "isInf", &[num(f64::NEG_INFINITY)]), Object::from(true));
    }

    #[test]
    fn test_math_min_max() {
        let math = math_library();
        assert_eq!(call(&math, "max", &[num(1.0), num(7.0), num(3.0)]), num(7.0));
        assert_eq!(call(&math, "min", &[num(1.0), num(-7.0)]), num(-7.0));
        assert_eq!(call(&math, "max", &[]), num(f64::NEG_INFINITY));
        assert_eq!(call(&math, "min", &[]), num(f64::INFINITY));
        assert!(call(&math, "max", &[num(1.0), Object::nan()]).is_nan());
    }

    #[test]
    fn test_math_int() {
        let math = math_library();
        assert_eq!(call(&math, "int", &[num(-2.7)]), num(-2.0));
        assert_eq!(call(&math, "int", &[Object::from("42abc")]), num(42.0));
        assert_eq!(call(&math, "int", &[Object::from("ff"), num(16.0)]), num(255.0));
        assert_eq!(call(&math, "int", &[Object::from("0x1f"), num(0.0)]), num(31.0));
        assert!(call(&math, "int", &[Object::from("1"), num(1.0)]).is_nan());
        assert!(call(&math, "int", &[Object::from("1"), num(37.0)]).is_nan());
    }

    #[test]
    fn test_math_random_is_impure() {
        let math = math_library();
        let random = math.get("random");
        assert!(!random.is_pure());
        for _ in 0..100 {
            let value = random.call(&[]).get_double();
            assert!((0.0..1.0).contains(&value));
        }
        assert!(math.get("abs").is_pure());
    }

    #[test]
    fn test_string_functions() {
        let string = string_library();
        let s = Object::from("Héllo");
        assert_eq!(call(&string, "length", &[s.clone()]), num(5.0));
        assert_eq!(call(&string, "toUpperCase", &[s.clone()]), Object::from("HÉLLO"));
        assert_eq!(call(&string, "toLowerCase", &[s.clone()]), Object::from("héllo"));
        assert_eq!(call(&string, "slice", &[s.clone(), num(1.0), num(3.0)]), Object::from("él"));
        assert_eq!(call(&string, "slice", &[s.clone(), num(-2.0)]), Object::from("lo"));
        assert_eq!(call(&string, "slice", &[s.clone(), num(3.0), num(1.0)]), Object::from(""));
        assert_eq!(call(&string, "charAt", &[s.clone(), num(1.0)]), Object::from("é"));
        assert_eq!(call(&string, "charAt", &[s.clone(), num(-1.0)]), Object::from("o"));
        assert_eq!(call(&string, "charAt", &[s, num(9.0)]), Object::from(""));
        assert_eq!(call(&string, "length", &[]), Object::Null);
    }

    #[test]
    fn test_array_functions() {
        let array = array_library();
        let items = Object::array(vec![num(1.0), Object::from("b"), num(3.0)]);
        assert_eq!(call(&array, "indexOf", &[items.clone(), Object::from("b")]), num(1.0));
        assert_eq!(call(&array, "indexOf", &[items.clone(), num(9.0)]), num(-1.0));
        assert_eq!(
            call(&array, "slice", &[items.clone(), num(1.0)]),
            Object::array(vec![Object::from("b"), num(3.0)])
        );
        assert_eq!(call(&array, "slice", &[items, num(-1.0)]).size(), 1);
        assert_eq!(
            call(&array, "range", &[num(3.0)]),
            Object::array(vec![num(0.0), num(1.0), num(2.0)])
        );
        assert_eq!(
            call(&array, "range", &[num(10.0), num(4.0), num(-3.0)]),
            Object::array(vec![num(10.0), num(7.0)])
        );
        assert_eq!(call(&array, "range", &[num(1.0), num(5.0), num(0.0)]).size(), 0);
        assert_eq!(call(&array, "range", &[num(1e12)]).size(), 0);
    }

    #[test]
    fn test_map_keys() {
        let map = map_library();
        let mut entries = BTreeMap::new();
        entries.insert("b".to_string(), num(1.0));
        entries.insert("a".to_string(), num(2.0));
        assert_eq!(
            call(&map, "keys", &[Object::map(entries)]),
            Object::array(vec![Object::from("a"), Object::from("b")])
        );
        assert_eq!(call(&map, "keys", &[num(1.0)]).size(), 0);
    }

    #[test]
    fn test_civil_time() {
        // 2021-03-14T15:09:26.535Z, a Sunday
        let time = CivilTime::from_epoch_ms(1_615_734_566_535.0).unwrap();
        assert_eq!(
            time,
            CivilTime {
                year: 2021,
                month: 2,
                date: 14,
                week_day: 0,
                hours: 15,
                minutes: 9,
                seconds: 26,
                milliseconds: 535,
            }
        );
        let epoch = CivilTime::from_epoch_ms(0.0).unwrap();
        assert_eq!((epoch.year, epoch.month, epoch.date, epoch.week_day), (1970, 0, 1, 4));
        let before = CivilTime::from_epoch_ms(-1.0).unwrap();
        assert_eq!((before.year, before.month, before.date), (1969, 11, 31));
        assert_eq!(before.milliseconds, 999);
        assert!(CivilTime::from_epoch_ms(f64::NAN).is_none());
    }

    #[test]
    fn test_time_functions() {
        let time = time_library();
        let ms = num(951_782_400_000.0); // 2000-02-29T00:00:00Z
        assert_eq!(call(&time, "year", &[ms.clone()]), num(2000.0));
        assert_eq!(call(&time, "month", &[ms.clone()]), num(1.0));
        assert_eq!(call(&time, "date", &[ms.clone()]), num(29.0));
        assert_eq!(call(&time, "weekDay", &[ms]), num(2.0));
        assert!(call(&time, "hours", &[]).is_nan());
    }
}
