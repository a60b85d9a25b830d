//! Script values and coercion rules

use super::ast::Function;
use super::interp::Env;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::rc::Rc;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// 스크립트 값
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Array(ArrayRef),
    Closure(Rc<Closure>),
    Native(Native),
}

#[derive(Debug)]
pub struct Closure {
    pub function: Rc<Function>,
    pub env: Rc<Env>,
}

/// 내장 전역 함수 / 네임스페이스
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    Math,
    ParseInt,
    ParseFloat,
    Number,
    String,
    Boolean,
    IsNaN,
    MathFloor,
    MathCeil,
    MathRound,
    MathTrunc,
    MathAbs,
    MathMin,
    MathMax,
    MathPow,
    MathSqrt,
    MathSign,
}

impl Native {
    pub fn global(name: &str) -> Option<Native> {
        Some(match name {
            "Math" => Native::Math,
            "parseInt" => Native::ParseInt,
            "parseFloat" => Native::ParseFloat,
            "Number" => Native::Number,
            "String" => Native::String,
            "Boolean" => Native::Boolean,
            "isNaN" => Native::IsNaN,
            _ => return None,
        })
    }

    pub fn math_member(name: &str) -> Option<Native> {
        Some(match name {
            "floor" => Native::MathFloor,
            "ceil" => Native::MathCeil,
            "round" => Native::MathRound,
            "trunc" => Native::MathTrunc,
            "abs" => Native::MathAbs,
            "min" => Native::MathMin,
            "max" => Native::MathMax,
            "pow" => Native::MathPow,
            "sqrt" => Native::MathSqrt,
            "sign" => Native::MathSign,
            _ => return None,
        })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Closure(_) => "function",
            Value::Native(Native::Math) => "object",
            Value::Native(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Num(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            Value::Closure(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// JS `String(value)` (한도 없음, 인터프리터 밖에서만 사용)
    pub fn to_js_string(&self) -> String {
        let mut out = String::new();
        let _ = self.write_js_string(&mut out, &mut Vec::new(), &mut |_: usize| Ok::<(), Infallible>(()));
        out
    }

    /// `String(value)`를 `out` 뒤에 씀
    ///
    /// `check`는 배열 원소마다 현재 출력 길이로 호출되며, 에러를 돌려주면
    /// 즉시 중단합니다. 이미 방문 중인 배열(순환)은 빈 문자열로 씁니다.
    pub fn write_js_string<E>(
        &self,
        out: &mut String,
        visiting: &mut Vec<*const RefCell<Vec<Value>>>,
        check: &mut dyn FnMut(usize) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Num(n) => out.push_str(&format_number(*n)),
            Value::Str(s) => out.push_str(s),
            Value::Array(items) => return write_joined(items, ",", out, visiting, check),
            Value::Closure(_) => out.push_str("() => { ... }"),
            Value::Native(Native::Math) => out.push_str("[object Math]"),
            Value::Native(_) => out.push_str("function () { [native code] }"),
        }
        Ok(())
    }

    /// 배열/함수는 문자열로, 나머지는 그대로
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Closure(_) | Value::Native(_) => {
                Value::from(self.to_js_string())
            }
            other => other.clone(),
        }
    }

    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Num(_), Value::Str(_))
            | (Value::Str(_), Value::Num(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            (Value::Array(_), Value::Str(_) | Value::Num(_))
            | (Value::Str(_) | Value::Num(_), Value::Array(_)) => {
                self.to_primitive().loose_eq(&other.to_primitive())
            }
            _ => self.strict_eq(other),
        }
    }

    /// `<` 계열 비교, NaN이 끼면 `None`
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        let a = self.to_primitive();
        let b = other.to_primitive();
        match (&a, &b) {
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            _ => a.to_number().partial_cmp(&b.to_number()),
        }
    }
}

/// JS `Array.prototype.join` (nullish 원소와 순환 참조는 빈 문자열)
pub fn write_joined<E>(
    items: &ArrayRef,
    separator: &str,
    out: &mut String,
    visiting: &mut Vec<*const RefCell<Vec<Value>>>,
    check: &mut dyn FnMut(usize) -> Result<(), E>,
) -> Result<(), E> {
    let ptr = Rc::as_ptr(items);
    if visiting.contains(&ptr) {
        return Ok(());
    }
    visiting.push(ptr);
    let result = write_items(&items.borrow(), separator, out, visiting, check);
    visiting.pop();
    result
}

fn write_items<E>(
    items: &[Value],
    separator: &str,
    out: &mut String,
    visiting: &mut Vec<*const RefCell<Vec<Value>>>,
    check: &mut dyn FnMut(usize) -> Result<(), E>,
) -> Result<(), E> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        check(out.len())?;
        if !item.is_nullish() {
            item.write_js_string(out, visiting, check)?;
        }
    }
    Ok(())
}

/// JS `Number(string)`
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// JS `parseFloat`: 앞부분의 숫자만
pub fn parse_float_prefix(s: &str) -> f64 {
    let t = s.trim_start();
    if t.starts_with("Infinity") || t.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if t.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    let bytes = t.as_bytes();
    let mut end = 0;
    let mut best = None;
    if end < bytes.len() && matches!(bytes[end], b'+' | b'-') {
        end += 1;
    }
    let mut seen_dot = false;
    let mut seen_exp = false;
    while end < bytes.len() {
        let c = bytes[end];
        if c.is_ascii_digit() {
            end += 1;
            if t[..end].parse::<f64>().is_ok() {
                best = Some(end);
            }
        } else if c == b'.' && !seen_dot && !seen_exp {
            seen_dot = true;
            end += 1;
        } else if (c == b'e' || c == b'E') && !seen_exp && best.is_some() {
            seen_exp = true;
            end += 1;
            if end < bytes.len() && matches!(bytes[end], b'+' | b'-') {
                end += 1;
            }
        } else {
            break;
        }
    }
    best.and_then(|e| t[..e].parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// JS `parseInt`
pub fn parse_int_prefix(s: &str, radix: Option<u32>) -> f64 {
    let mut t = s.trim_start();
    let mut sign = 1.0;
    if let Some(rest) = t.strip_prefix('-') {
        sign = -1.0;
        t = rest;
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest;
    }

    let mut radix = radix.unwrap_or(0);
    if radix == 0 || radix == 16 {
        if let Some(rest) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            t = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let mut result = 0.0f64;
    let mut any = false;
    for c in t.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                result = result * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }
    if any {
        sign * result
    } else {
        f64::NAN
    }
}

/// JS `Number.prototype.toString()`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        return format!("{:.0}", n);
    }
    format!("{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-3.5), "-3.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 5 "), 5.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("5px").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(parse_int_prefix("42px", None), 42.0);
        assert_eq!(parse_int_prefix("-0x1f", None), -31.0);
        assert!(parse_int_prefix("px", None).is_nan());
        assert_eq!(parse_float_prefix("3.25abc"), 3.25);
        assert_eq!(parse_float_prefix("1e3x"), 1000.0);
        assert!(parse_float_prefix(".").is_nan());
    }

    #[test]
    fn test_equality() {
        assert!(Value::from("5").loose_eq(&Value::Num(5.0)));
        assert!(!Value::from("5").strict_eq(&Value::Num(5.0)));
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::Num(0.0)));
        assert!(!Value::Num(f64::NAN).strict_eq(&Value::Num(f64::NAN)));
    }

    #[test]
    fn test_array_string() {
        let arr = Value::array(vec![Value::Num(1.0), Value::Null, Value::from("x")]);
        assert_eq!(arr.to_js_string(), "1,,x");
    }

    #[test]
    fn test_cyclic_array_string() {
        let arr = Value::array(vec![Value::Num(1.0)]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
            items.borrow_mut().push(Value::Num(2.0));
        }
        assert_eq!(arr.to_js_string(), "1,,2");

        // 같은 배열이 두 번 나오는 건 순환이 아님
        let inner = Value::array(vec![Value::from("a")]);
        let outer = Value::array(vec![inner.clone(), inner]);
        assert_eq!(outer.to_js_string(), "a,a");

        if let Value::Array(items) = &arr {
            items.borrow_mut().clear();
        }
    }
}
