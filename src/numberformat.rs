//! Locale-independent conversions between numbers and strings.
//!
//! Formatting never consults the process locale: the decimal separator is always `.`.
//! Parsing is lenient in the way document authors expect: leading whitespace is skipped,
//! a trailing `%` (optionally after whitespace) divides the value by 100, and anything else
//! after the number is ignored.

/// Digits kept after the decimal point when formatting a non-integral value
const FRACTION_DIGITS: usize = 6;
const FRACTION_MULTIPLIER: f64 = 1_000_000.0;

/// Format a double for display.
///
/// Integral values inside the `i64` range print without a decimal point. Everything else is
/// rounded to six fractional digits and trailing zeros are stripped.
pub fn double_to_string(value: f64) -> String {
    if value < i64::MAX as f64 && value > i64::MIN as f64 {
        let integral = value as i64;
        if value == integral as f64 {
            return integral.to_string();
        }
    }

    let mut s = format_fixed(value);
    if let Some(point) = s.find('.') {
        let trimmed = s.trim_end_matches('0').len();
        let end = if trimmed == point + 1 { point } else { trimmed };
        s.truncate(end);
    }
    s
}

/// Fixed six-digit formatting with manual rounding of the fractional part
fn format_fixed(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let normalized = value.abs();
    let mut integer_part = normalized.trunc();
    let mut fractional_part = ((normalized - integer_part) * FRACTION_MULTIPLIER).round() as u64;
    if fractional_part >= FRACTION_MULTIPLIER as u64 {
        // 9.9999999 rounds up into the integer part
        integer_part += 1.0;
        fractional_part -= FRACTION_MULTIPLIER as u64;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{sign}{integer_part}.{fractional_part:0width$}",
        width = FRACTION_DIGITS
    )
}

/// Parse a string into a double, returning NaN when no number is present.
///
/// `"125%"` is 1.25, `"100 /%"` is 100 (the `/` stops the percent search) and `"- 10"` is
/// NaN because the sign must touch the digits. `inf`, `infinity` and `nan` are matched
/// without regard to case.
pub fn string_to_double(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let (mut result, mut index) = parse_floating_point(bytes);

    while index < bytes.len() {
        let c = bytes[index];
        if c == b'%' {
            result *= 0.01;
            break;
        }
        if !c.is_ascii_whitespace() {
            break;
        }
        index += 1;
    }
    result
}

/// Returns the parsed value and the offset of the first unconsumed byte
fn parse_floating_point(bytes: &[u8]) -> (f64, usize) {
    let mut current = bytes
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if current >= bytes.len() {
        return (f64::NAN, bytes.len());
    }

    let sign = consume_sign(bytes, &mut current);

    if consume_token(bytes, &mut current, "infinity") || consume_token(bytes, &mut current, "inf")
    {
        return (sign * f64::INFINITY, current);
    }
    if consume_token(bytes, &mut current, "nan") {
        return (f64::NAN, current);
    }

    let base = if consume_token(bytes, &mut current, "0x") {
        16
    } else {
        10
    };

    let mut value = 0.0;
    let significand_start = current;
    let has_integer_digits = consume_digits(bytes, &mut current, base);
    if has_integer_digits {
        value = digits_value(&bytes[significand_start..current], base);
    }

    if consume_token(bytes, &mut current, ".") {
        let fraction_start = current;
        if consume_digits(bytes, &mut current, base) {
            let count = (current - fraction_start) as i32;
            let fraction = digits_value(&bytes[fraction_start..current], base);
            value += fraction / f64::from(base).powi(count);
        }
    } else if !has_integer_digits {
        return (f64::NAN, current);
    }

    // Decimal numbers use an 'e' exponent, hexadecimal ones a base-2 'p' exponent
    let (marker, radix) = if base == 10 { ("e", 10.0) } else { ("p", 2.0) };
    if consume_token(bytes, &mut current, marker) {
        let exponent_sign = consume_sign(bytes, &mut current);
        let exponent_start = current;
        if !consume_digits(bytes, &mut current, 10) {
            return (f64::NAN, current);
        }
        let exponent = digits_value(&bytes[exponent_start..current], 10);
        value *= f64::powf(radix, exponent_sign * exponent);
    }

    (sign * value, current)
}

fn consume_sign(bytes: &[u8], offset: &mut usize) -> f64 {
    match bytes.get(*offset) {
        Some(b'+') => {
            *offset += 1;
            1.0
        }
        Some(b'-') => {
            *offset += 1;
            -1.0
        }
        _ => 1.0,
    }
}

/// Case-insensitive match of a lowercase token
fn consume_token(bytes: &[u8], offset: &mut usize, token: &str) -> bool {
    let end = *offset + token.len();
    match bytes.get(*offset..end) {
        Some(candidate) if candidate.eq_ignore_ascii_case(token.as_bytes()) => {
            *offset = end;
            true
        }
        _ => false,
    }
}

fn consume_digits(bytes: &[u8], offset: &mut usize, base: u32) -> bool {
    let start = *offset;
    while let Some(c) = bytes.get(*offset) {
        if (*c as char).is_digit(base) {
            *offset += 1;
        } else {
            break;
        }
    }
    *offset > start
}

fn digits_value(digits: &[u8], base: u32) -> f64 {
    digits.iter().fold(0.0, |acc, c| {
        acc * f64::from(base) + f64::from((*c as char).to_digit(base).unwrap_or(0))
    })
}

/// Integer parsing with C `strtoll` semantics.
///
/// Leading whitespace and a sign are accepted. Base 0 infers the radix from a `0x` (16) or
/// `0` (8) prefix; base 16 also accepts an optional `0x`. Parsing stops at the first invalid
/// digit. No digits, an invalid base, or overflow yield 0.
pub fn string_to_int64(s: &str, base: u32) -> i64 {
    let bytes = s.as_bytes();
    if base == 1 || base > 36 {
        return 0;
    }

    let mut current = bytes
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let negative = match bytes.get(current) {
        Some(b'-') => {
            current += 1;
            true
        }
        Some(b'+') => {
            current += 1;
            false
        }
        _ => false,
    };

    let has_hex_prefix = |at: usize| {
        matches!(bytes.get(at), Some(b'0'))
            && matches!(bytes.get(at + 1), Some(b'x') | Some(b'X'))
            && bytes
                .get(at + 2)
                .is_some_and(|c| (*c as char).is_ascii_hexdigit())
    };

    let radix = match base {
        0 if has_hex_prefix(current) => {
            current += 2;
            16
        }
        0 if bytes.get(current) == Some(&b'0') => 8,
        0 => 10,
        16 if has_hex_prefix(current) => {
            current += 2;
            16
        }
        other => other,
    };

    let start = current;
    while bytes
        .get(current)
        .is_some_and(|c| (*c as char).is_digit(radix))
    {
        current += 1;
    }
    if current == start {
        return 0;
    }

    let mut value: i64 = 0;
    for c in &bytes[start..current] {
        let digit = i64::from((*c as char).to_digit(radix).unwrap_or(0));
        let next = value
            .checked_mul(i64::from(radix))
            .and_then(|v| if negative { v.checked_sub(digit) } else { v.checked_add(digit) });
        match next {
            Some(v) => value = v,
            None => return 0,
        }
    }
    value
}

/// `string_to_int64` restricted to the 32-bit range; out-of-range values yield 0
pub fn string_to_int(s: &str, base: u32) -> i32 {
    i32::try_from(string_to_int64(s, base)).unwrap_or(0)
}
