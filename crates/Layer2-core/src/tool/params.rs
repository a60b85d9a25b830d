//! Lenient parameter access for transforms
//!
//! 저장된 체인은 오래된 버전이나 손으로 쓴 JSON일 수 있으므로 읽기는
//! 관대하게 합니다. 숫자/불리언이 문자열로 와도 해석합니다.

use super::schema::CUSTOM_SUFFIX;
use crate::model::Params;
use serde_json::Value;

pub struct ParamReader<'a> {
    params: &'a Params,
}

impl<'a> ParamReader<'a> {
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.params.get(name)
    }

    /// 문자열 값 (없으면 빈 문자열, 스칼라는 문자열화)
    pub fn text(&self, name: &str) -> String {
        match self.params.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// select 값, 비어있으면 fallback
    pub fn choice(&self, name: &str, fallback: &str) -> String {
        let value = self.text(name);
        if value.is_empty() {
            fallback.to_string()
        } else {
            value
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        match self.params.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "on" | "yes"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.params.get(name) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 구분자 해석
    ///
    /// - `custom` → `<name>Custom` 값
    /// - `\n`, `\t` 이스케이프 → 실제 문자
    /// - 빈 값 → fallback
    pub fn delimiter(&self, name: &str, fallback: &str) -> String {
        let mut value = match self.params.get(name) {
            Some(_) => self.text(name),
            None => fallback.to_string(),
        };
        if value == "custom" {
            value = self.text(&format!("{}{}", name, CUSTOM_SUFFIX));
        }
        let value = unescape_delimiter(&value);
        if value.is_empty() {
            unescape_delimiter(fallback)
        } else {
            value
        }
    }
}

/// 저장 형태의 구분자(`\n` 등)를 실제 문자열로 변환
pub fn unescape_delimiter(value: &str) -> String {
    match value {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r\\n" => "\r\n".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_and_choice() {
        let p = params(json!({"a": "x", "n": 3, "b": true, "empty": ""}));
        let r = ParamReader::new(&p);
        assert_eq!(r.text("a"), "x");
        assert_eq!(r.text("n"), "3");
        assert_eq!(r.text("b"), "true");
        assert_eq!(r.text("missing"), "");
        assert_eq!(r.choice("empty", "fallback"), "fallback");
    }

    #[test]
    fn test_flag_lenient() {
        let p = params(json!({"a": true, "b": "true", "c": 0, "d": "false"}));
        let r = ParamReader::new(&p);
        assert!(r.flag("a"));
        assert!(r.flag("b"));
        assert!(!r.flag("c"));
        assert!(!r.flag("d"));
        assert!(!r.flag("missing"));
    }

    #[test]
    fn test_number() {
        let p = params(json!({"a": 2.5, "b": " 7 ", "c": "x"}));
        let r = ParamReader::new(&p);
        assert_eq!(r.number("a"), Some(2.5));
        assert_eq!(r.number("b"), Some(7.0));
        assert_eq!(r.number("c"), None);
    }

    #[test]
    fn test_delimiter_resolution() {
        let p = params(json!({
            "nl": "\\n",
            "tab": "\\t",
            "custom": "custom",
            "customCustom": " | ",
            "blank": "",
            "free": ", "
        }));
        let r = ParamReader::new(&p);
        assert_eq!(r.delimiter("nl", ","), "\n");
        assert_eq!(r.delimiter("tab", ","), "\t");
        assert_eq!(r.delimiter("custom", ","), " | ");
        assert_eq!(r.delimiter("blank", "\\n"), "\n");
        assert_eq!(r.delimiter("free", "\n"), ", ");
        assert_eq!(r.delimiter("missing", ";"), ";");
    }
}
