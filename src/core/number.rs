// Numeric conversions shared by the lexer, the evaluator and the global functions.

const TWO_32: f64 = 2_i64.pow(32) as f64; // 2^32

/// ToInt32
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc();
    let int32bit = ((int % TWO_32) + TWO_32) % TWO_32;
    if int32bit >= TWO_32 / 2.0 {
        (int32bit - TWO_32) as i32
    } else {
        int32bit as i32
    }
}

/// ToUint32
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0_u32;
    }
    let int = n.trunc();
    let u = ((int % TWO_32) + TWO_32) % TWO_32;
    u as u32
}

/// ToInteger, with NaN mapped to zero.
pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() { 0.0 } else { n.trunc() }
}

/// Accumulates digits in `radix`. The caller guarantees every char is a valid digit.
pub(crate) fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64)
}

/// Number to String conversion: shortest round-tripping digits laid out the
/// way scripts expect (`1e+21`, `0.000001`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "1.2345e3".
    let scientific = format!("{n:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exponent.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exponent.abs())
        }
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Length of the longest prefix of `s` that is a decimal literal, optionally
/// signed, including `Infinity`. Zero when there is none.
fn decimal_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return i + "Infinity".len();
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if mantissa_digits > 0 || j > frac_start {
            mantissa_digits += j - frac_start;
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return 0;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

fn parse_decimal(literal: &str) -> f64 {
    match literal.trim_start_matches('+') {
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        other => other.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// ToNumber applied to a string.
pub(crate) fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return parse_radix_digits(hex, 16);
    }
    if decimal_prefix_len(s) != s.len() {
        return f64::NAN;
    }
    parse_decimal(s)
}

/// Global `parseInt`. A radix of zero means "detect".
pub(crate) fn parse_int(s: &str, radix: i32) -> f64 {
    let s = s.trim_start_matches(is_js_whitespace);
    let (negative, mut s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut radix = radix;
    let has_hex_prefix = s.starts_with("0x") || s.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    if radix == 16 && has_hex_prefix {
        s = &s[2..];
    }
    let end = s.find(|c: char| !c.is_digit(radix as u32)).unwrap_or(s.len());
    let digits = &s[..end];
    if digits.is_empty() {
        return f64::NAN;
    }
    let magnitude = if radix == 10 {
        digits.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        parse_radix_digits(digits, radix as u32)
    };
    if negative { -magnitude } else { magnitude }
}

/// Global `parseFloat`.
pub(crate) fn parse_float(s: &str) -> f64 {
    let s = s.trim_start_matches(is_js_whitespace);
    match decimal_prefix_len(s) {
        0 => f64::NAN,
        len => parse_decimal(&s[..len]),
    }
}
