//! JSON tools: json_format, json_path

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use linesmith_foundation::{Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use serde_json_path::JsonPath;

fn combined_input(lines: &[String], p: &ParamReader) -> String {
    let join = match p.raw("joinDelim").and_then(Value::as_str) {
        None | Some("\\n") => "\n",
        Some(other) => other,
    };
    lines.join(join)
}

/// 입력 전체를 JSON으로 파싱해 다시 출력 (들여쓰기 2/4/tab, 0 = 압축)
pub fn json_format(lines: &[String], p: &ParamReader) -> Result<TransformOutput> {
    let combined = combined_input(lines, p);
    if combined.trim().is_empty() {
        return Ok(TransformOutput::new(lines.to_vec()));
    }

    let parsed: Value = serde_json::from_str(&combined)
        .map_err(|e| Error::Validation(format!("Invalid JSON: {}", e)))?;

    let formatted = match p.choice("indent", "2").as_str() {
        "0" => serde_json::to_string(&parsed)?,
        "4" => pretty(&parsed, b"    ")?,
        "tab" => pretty(&parsed, b"\t")?,
        _ => pretty(&parsed, b"  ")?,
    };

    let out: Vec<String> = formatted.split('\n').map(str::to_string).collect();
    let stats = Stats::new().count("lines", out.len());
    Ok(TransformOutput::new(out).with_stats(stats))
}

fn pretty(value: &Value, indent: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| Error::Internal(e.to_string()))
}

/// JSONPath 쿼리 결과를 한 줄에 하나씩 출력
pub fn json_path(lines: &[String], p: &ParamReader) -> Result<TransformOutput> {
    let query = p.choice("query", "$.*");
    let path = JsonPath::parse(&query)
        .map_err(|e| Error::Validation(format!("Invalid JSONPath '{}': {}", query, e)))?;
    let stringify = p.flag("stringify");

    if p.choice("inputMode", "combined") == "lines" {
        let mut out = Vec::new();
        let mut parse_errors = 0;
        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<Value>(line) {
                Ok(doc) => out.extend(path.query(&doc).all().into_iter().map(|v| render(v, stringify))),
                Err(_) => parse_errors += 1,
            }
        }
        let mut stats = Stats::new().count("items", out.len());
        if parse_errors > 0 {
            stats.set_count("parse_errors", parse_errors);
        }
        return Ok(TransformOutput::new(out).with_stats(stats));
    }

    let combined = combined_input(lines, p);
    if combined.trim().is_empty() {
        return Ok(TransformOutput::new(lines.to_vec()));
    }
    let doc: Value = serde_json::from_str(&combined)
        .map_err(|e| Error::Runtime(format!("JSON parse error: {}", e)))?;

    let out: Vec<String> = path
        .query(&doc)
        .all()
        .into_iter()
        .map(|v| render(v, stringify))
        .collect();
    let stats = Stats::new().count("items", out.len());
    Ok(TransformOutput::new(out).with_stats(stats))
}

/// 문자열은 그대로, 스칼라는 JSON 텍스트, 객체/배열은 압축 JSON
fn render(value: &Value, stringify: bool) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if !stringify => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => render(other, false),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) if !stringify => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_json_path_name() {
        let p = params(json!({"query": "$.name", "stringify": true}));
        let out = json_path(&lines(&[r#"{"name":"John","age":30}"#]), &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines, ["John"]);
        assert_eq!(out.stats.get_count("items"), Some(1));
    }

    #[test]
    fn test_json_path_multiline_document() {
        let input = lines(&["{", r#"  "items": [1, {"a": true}, "x"]"#, "}"]);
        let p = params(json!({"query": "$.items[*]", "stringify": true, "joinDelim": "\\n"}));
        let out = json_path(&input, &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines, ["1", r#"{"a":true}"#, "x"]);

        let p = params(json!({"query": "$.items[*]", "stringify": false, "joinDelim": "\\n"}));
        let out = json_path(&input, &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines[1], "[object Object]");
    }

    #[test]
    fn test_json_path_lines_mode() {
        let input = lines(&[r#"{"id":1}"#, "not json", "", r#"{"id":2}"#]);
        let p = params(json!({"query": "$.id", "inputMode": "lines", "stringify": true}));
        let out = json_path(&input, &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines, ["1", "2"]);
        assert_eq!(out.stats.get_count("parse_errors"), Some(1));
    }

    #[test]
    fn test_json_path_errors() {
        let p = params(json!({"query": "$.name"}));
        let err = json_path(&lines(&["{broken"]), &ParamReader::new(&p)).unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));

        let p = params(json!({"query": "$[?"}));
        let err = json_path(&lines(&["{}"]), &ParamReader::new(&p)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_json_format_indent() {
        let input = lines(&[r#"{"b":1,"a":[1,2]}"#]);
        let p = params(json!({"indent": "2", "joinDelim": "\\n"}));
        let out = json_format(&input, &ParamReader::new(&p)).unwrap();
        assert_eq!(
            out.lines,
            ["{", "  \"b\": 1,", "  \"a\": [", "    1,", "    2", "  ]", "}"]
        );

        let p = params(json!({"indent": "0"}));
        let out = json_format(&lines(&["{ \"a\" :", " 1 }"]), &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines, [r#"{"a":1}"#]);
    }

    #[test]
    fn test_json_format_blank_and_invalid() {
        let p = params(json!({"indent": "2"}));
        let out = json_format(&lines(&["", " "]), &ParamReader::new(&p)).unwrap();
        assert_eq!(out.lines, ["", " "]);

        let err = json_format(&lines(&["{nope"]), &ParamReader::new(&p)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
