//! Transform results

use crate::script::SandboxLimits;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 블록 배지용 통계 (이름 → 숫자/문자열)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stats(BTreeMap<String, Value>);

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, name: &str, value: usize) -> Self {
        self.set_count(name, value);
        self
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), Value::String(value.into()));
        self
    }

    pub fn set_count(&mut self, name: &str, value: usize) {
        self.0.insert(name.to_string(), Value::from(value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_count(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// 스크립트 줄 단위 실패 (1부터 시작하는 줄 번호)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

/// 도구 하나의 출력
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub lines: Vec<String>,
    pub stats: Stats,
    pub line_errors: Vec<LineError>,
}

impl TransformOutput {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Default::default()
        }
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_line_errors(mut self, line_errors: Vec<LineError>) -> Self {
        self.line_errors = line_errors;
        self
    }
}

/// 변환 실행 환경
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    pub sandbox: SandboxLimits,
}

impl TransformContext {
    pub fn new(sandbox: SandboxLimits) -> Self {
        Self { sandbox }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_builder() {
        let stats = Stats::new().count("removed", 2).text("mode", "upper");
        assert_eq!(stats.get_count("removed"), Some(2));
        assert_eq!(stats.get("mode"), Some(&Value::from("upper")));
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"mode":"upper","removed":2}"#
        );
    }

    #[test]
    fn test_line_error_camel_case() {
        let err = LineError {
            line: 3,
            message: "boom".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"line": 3, "message": "boom"})
        );
    }
}
