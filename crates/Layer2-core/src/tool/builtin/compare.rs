//! Set comparison against a second list

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use std::collections::HashSet;

/// 순서 유지 집합 (trim 후 빈 값 제외, 첫 등장만)
fn ordered_set<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values
        .map(str::trim)
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .collect()
}

pub fn compare(lines: &[String], p: &ParamReader) -> TransformOutput {
    let delimiter = p.delimiter("listDelimiter", "\n");
    let mut second_list = p.text("secondList");
    if second_list.is_empty() {
        second_list = p.text("list2");
    }
    let operation = match p.choice("operation", "common").as_str() {
        "diff" => "onlyFirst".to_string(),
        other => other.to_string(),
    };

    let first = ordered_set(lines.iter().map(String::as_str));
    let second = ordered_set(second_list.split(delimiter.as_str()));
    let first_set: HashSet<&str> = first.iter().copied().collect();
    let second_set: HashSet<&str> = second.iter().copied().collect();

    let out: Vec<String> = match operation.as_str() {
        "onlyFirst" => first
            .iter()
            .filter(|v| !second_set.contains(*v))
            .map(|v| v.to_string())
            .collect(),
        "onlySecond" => second
            .iter()
            .filter(|v| !first_set.contains(*v))
            .map(|v| v.to_string())
            .collect(),
        "all" => first
            .iter()
            .map(|v| {
                if second_set.contains(v) {
                    format!("[=] {}", v)
                } else {
                    format!("[-] {}", v)
                }
            })
            .chain(
                second
                    .iter()
                    .filter(|v| !first_set.contains(*v))
                    .map(|v| format!("[+] {}", v)),
            )
            .collect(),
        _ => first
            .iter()
            .filter(|v| second_set.contains(*v))
            .map(|v| v.to_string())
            .collect(),
    };

    let stats = Stats::new().count("outputLines", out.len());
    TransformOutput::new(out).with_stats(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use serde_json::json;

    fn run(input: &[&str], value: serde_json::Value) -> Vec<String> {
        let p: Params = value.as_object().cloned().unwrap();
        let input: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        compare(&input, &ParamReader::new(&p)).lines
    }

    #[test]
    fn test_common() {
        assert_eq!(
            run(
                &["A", "B", "C"],
                json!({"secondList": "A,B", "listDelimiter": ",", "operation": "common"})
            ),
            ["A", "B"]
        );
    }

    #[test]
    fn test_only_first_and_second() {
        let params = |op: &str| json!({"secondList": "b\nd\nd", "listDelimiter": "\\n", "operation": op});
        assert_eq!(run(&["a", "b", "c", "a"], params("onlyFirst")), ["a", "c"]);
        assert_eq!(run(&["a", "b", "c"], params("onlySecond")), ["d"]);
    }

    #[test]
    fn test_all_markers() {
        assert_eq!(
            run(
                &["a", " b "],
                json!({"secondList": "b;c", "listDelimiter": ";", "operation": "all"})
            ),
            ["[-] a", "[=] b", "[+] c"]
        );
    }

    #[test]
    fn test_legacy_names() {
        assert_eq!(
            run(
                &["a", "b"],
                json!({"list2": "a", "listDelimiter": "\\n", "operation": "diff"})
            ),
            ["b"]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        assert_eq!(
            run(
                &["x", "y"],
                json!({
                    "secondList": "x||z",
                    "listDelimiter": "custom",
                    "listDelimiterCustom": "||",
                    "operation": "common"
                })
            ),
            ["x"]
        );
    }
}
