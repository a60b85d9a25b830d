//! Parameter schema - 도구 파라미터 선언과 검증

use crate::model::Params;
use linesmith_foundation::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// 구분자 파라미터의 기본 프리셋 (`\n`은 이스케이프된 형태로 저장)
pub const DELIMITER_PRESETS: &[&str] = &["\\n", ",", ";", " ", "custom"];

/// `custom` 구분자의 실제 값이 저장되는 키 접미사
pub const CUSTOM_SUFFIX: &str = "Custom";

/// 파라미터 타입
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Textarea,
    Checkbox,
    Select { options: Vec<String> },
    /// 프리셋 외의 자유 문자열도 허용. `custom`이면 `<name>Custom` 값을 사용
    Delimiter { presets: Vec<String> },
    Number,
}

impl ParamKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Text => "text",
            ParamKind::Textarea => "textarea",
            ParamKind::Checkbox => "checkbox",
            ParamKind::Select { .. } => "select",
            ParamKind::Delimiter { .. } => "delimiter",
            ParamKind::Number => "number",
        }
    }
}

/// 파라미터 하나의 선언
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub default: Value,
    /// 예전 체인에 남아 있는 select 값 (목록에는 노출하지 않음)
    #[serde(skip)]
    pub legacy: Vec<String>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, kind: ParamKind, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
            legacy: Vec::new(),
        }
    }

    /// 옵션 목록 밖이지만 허용할 예전 값
    pub fn accepting(mut self, legacy: &[&str]) -> Self {
        self.legacy.extend(legacy.iter().map(|s| s.to_string()));
        self
    }

    fn accepts_choice(&self, options: &[String], value: &str) -> bool {
        options.iter().chain(&self.legacy).any(|o| o == value)
    }

    fn choice_error(&self, options: &[String], value: &Value) -> Error {
        Error::Validation(format!(
            "'{}' must be one of [{}], got {}",
            self.name,
            options.join(", "),
            value
        ))
    }

    pub fn text(name: impl Into<String>, default: &str) -> Self {
        Self::new(name, ParamKind::Text, Value::from(default))
    }

    pub fn textarea(name: impl Into<String>, default: &str) -> Self {
        Self::new(name, ParamKind::Textarea, Value::from(default))
    }

    pub fn checkbox(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ParamKind::Checkbox, Value::from(default))
    }

    pub fn select(name: impl Into<String>, options: &[&str], default: &str) -> Self {
        Self::new(
            name,
            ParamKind::Select {
                options: options.iter().map(|s| s.to_string()).collect(),
            },
            Value::from(default),
        )
    }

    pub fn delimiter(name: impl Into<String>, default: &str) -> Self {
        Self::new(
            name,
            ParamKind::Delimiter {
                presets: DELIMITER_PRESETS.iter().map(|s| s.to_string()).collect(),
            },
            Value::from(default),
        )
    }

    pub fn number(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, ParamKind::Number, Value::from(default))
    }

    /// 값이 이 파라미터 타입에 맞는지 확인
    pub fn validate(&self, value: &Value) -> Result<()> {
        let ok = match &self.kind {
            ParamKind::Text | ParamKind::Textarea | ParamKind::Delimiter { .. } => {
                value.is_string()
            }
            ParamKind::Checkbox => value.is_boolean(),
            ParamKind::Number => {
                value.is_number()
                    || value
                        .as_str()
                        .is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            ParamKind::Select { options } => {
                return match value.as_str() {
                    Some(s) if self.accepts_choice(options, s) => Ok(()),
                    _ => Err(self.choice_error(options, value)),
                };
            }
        };

        if ok {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "'{}' expects a {} value, got {}",
                self.name,
                self.kind.type_name(),
                value
            )))
        }
    }
}

/// 도구 하나의 파라미터 목록 (선언 순서 유지)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamSchema(Vec<ParamSpec>);

impl ParamSchema {
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        Self(specs)
    }

    pub fn push(&mut self, spec: ParamSpec) {
        self.0.push(spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.0.iter().find(|spec| spec.name == name)
    }

    /// 모든 파라미터의 기본값
    pub fn defaults(&self) -> Params {
        self.0
            .iter()
            .map(|spec| (spec.name.clone(), spec.default.clone()))
            .collect()
    }

    /// 기본값 위에 주어진 값을 덮어쓴 실효 파라미터
    pub fn effective(&self, params: &Params) -> Params {
        let mut merged = self.defaults();
        for (name, value) in params {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// 실효 파라미터의 select 값 확인
    ///
    /// 변환 직전에 호출됩니다. 다른 타입은 읽기 쪽에서 관대하게 해석하지만
    /// select는 모르는 값이 기본 분기로 흘러가므로 여기서 막습니다.
    /// 빈 문자열과 `null`은 기본값으로 취급되어 통과합니다.
    pub fn validate_choices(&self, params: &Params) -> Result<()> {
        for spec in &self.0 {
            let ParamKind::Select { options } = &spec.kind else {
                continue;
            };
            let text = match params.get(&spec.name) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(other) => return Err(spec.choice_error(options, other)),
            };
            if !text.is_empty() && !spec.accepts_choice(options, &text) {
                return Err(spec.choice_error(options, &Value::String(text)));
            }
        }
        Ok(())
    }

    /// 파라미터 하나 검증
    ///
    /// 구분자 파라미터의 `<name>Custom` 짝 값은 문자열이면 허용됩니다.
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        if let Some(spec) = self.get(name) {
            return spec.validate(value);
        }

        let companion = name
            .strip_suffix(CUSTOM_SUFFIX)
            .and_then(|base| self.get(base))
            .filter(|spec| matches!(spec.kind, ParamKind::Delimiter { .. }));
        match companion {
            Some(_) if value.is_string() => Ok(()),
            Some(_) => Err(Error::Validation(format!(
                "'{}' expects a text value, got {}",
                name, value
            ))),
            None => Err(Error::Validation(format!("Unknown parameter '{}'", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ParamSchema {
        ParamSchema::new(vec![
            ParamSpec::select("mode", &["upper", "lower"], "lower"),
            ParamSpec::checkbox("trim", true),
            ParamSpec::delimiter("delimiter", ","),
            ParamSpec::number("count", 3.0),
        ])
    }

    #[test]
    fn test_defaults() {
        let defaults = schema().defaults();
        assert_eq!(defaults["mode"], json!("lower"));
        assert_eq!(defaults["trim"], json!(true));
        assert_eq!(defaults["delimiter"], json!(","));
        assert_eq!(defaults["count"], json!(3.0));
    }

    #[test]
    fn test_effective_overrides_defaults() {
        let mut given = Params::new();
        given.insert("mode".into(), json!("upper"));
        let effective = schema().effective(&given);
        assert_eq!(effective["mode"], json!("upper"));
        assert_eq!(effective["trim"], json!(true));
    }

    #[test]
    fn test_validate_select() {
        let s = schema();
        assert!(s.validate("mode", &json!("upper")).is_ok());
        let err = s.validate("mode", &json!("title")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_validate_choices() {
        let s = ParamSchema::new(vec![
            ParamSpec::select("operation", &["common", "onlyFirst"], "common").accepting(&["diff"]),
            ParamSpec::text("label", ""),
        ]);
        let params = |value: Value| value.as_object().cloned().unwrap();

        assert!(s.validate_choices(&params(json!({"operation": "onlyFirst"}))).is_ok());
        assert!(s.validate_choices(&params(json!({"operation": "diff"}))).is_ok());
        assert!(s.validate_choices(&params(json!({"operation": ""}))).is_ok());
        assert!(s.validate_choices(&params(json!({"label": "anything"}))).is_ok());

        let err = s
            .validate_choices(&params(json!({"operation": "bogus"})))
            .unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(s.validate_choices(&params(json!({"operation": ["common"]}))).is_err());
    }

    #[test]
    fn test_validate_types() {
        let s = schema();
        assert!(s.validate("trim", &json!(false)).is_ok());
        assert!(s.validate("trim", &json!("yes")).is_err());
        assert!(s.validate("count", &json!("12")).is_ok());
        assert!(s.validate("count", &json!("twelve")).is_err());
        assert!(s.validate("delimiter", &json!(" | ")).is_ok());
    }

    #[test]
    fn test_validate_custom_companion() {
        let s = schema();
        assert!(s.validate("delimiterCustom", &json!("::")).is_ok());
        assert!(s.validate("trimCustom", &json!("x")).is_err());
        assert!(s.validate("bogus", &json!("x")).is_err());
    }

    #[test]
    fn test_serialize_shape() {
        let spec = ParamSpec::select("mode", &["a", "b"], "a");
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], json!("select"));
        assert_eq!(value["options"], json!(["a", "b"]));
        assert_eq!(value["default"], json!("a"));
    }
}
