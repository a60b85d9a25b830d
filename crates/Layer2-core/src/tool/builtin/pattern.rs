//! Regex search / replace

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use linesmith_foundation::{Error, Result};
use regex::RegexBuilder;

/// 줄마다 전역 치환, 또는 `onlyMatched`이면 매치만 이어붙여 출력
pub fn regex(lines: &[String], p: &ParamReader) -> Result<TransformOutput> {
    let pattern = p.text("pattern");
    if pattern.is_empty() {
        return Ok(TransformOutput::new(lines.to_vec()));
    }

    let re = RegexBuilder::new(&pattern)
        .case_insensitive(p.flag("caseInsensitive"))
        .multi_line(true)
        .build()
        .map_err(|e| Error::Validation(format!("Invalid regular expression: {}", e)))?;
    let replacement = translate_replacement(&p.text("replacement"));
    let only_matched = p.flag("onlyMatched");

    let mut matches = 0;
    let out = lines
        .iter()
        .map(|line| {
            if only_matched {
                let mut collected = String::new();
                for m in re.find_iter(line) {
                    matches += 1;
                    if replacement.is_empty() {
                        collected.push_str(m.as_str());
                    } else {
                        collected.push_str(&re.replace(m.as_str(), replacement.as_str()));
                    }
                }
                collected
            } else {
                matches += re.find_iter(line).count();
                re.replace_all(line, replacement.as_str()).into_owned()
            }
        })
        .collect();

    Ok(TransformOutput::new(out).with_stats(Stats::new().count("matches", matches)))
}

/// `$1`, `$&`, `$<name>` 형식을 regex 크레이트 형식(`${1}` 등)으로 변환
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                let mut group = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    group.push(d);
                    chars.next();
                }
                out.push_str(&format!("${{{}}}", group));
            }
            Some('<') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '>' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if closed {
                    out.push_str(&format!("${{{}}}", name));
                } else {
                    out.push_str("$$<");
                    out.push_str(&name);
                }
            }
            _ => out.push_str("$$"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use serde_json::json;

    fn run(input: &[&str], value: serde_json::Value) -> Result<TransformOutput> {
        let p: Params = value.as_object().cloned().unwrap();
        let input: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        regex(&input, &ParamReader::new(&p))
    }

    #[test]
    fn test_replace_digits() {
        let out = run(
            &["Hello 123 World"],
            json!({"pattern": "\\d+", "replacement": "NUM"}),
        )
        .unwrap();
        assert_eq!(out.lines, ["Hello NUM World"]);
        assert_eq!(out.stats.get_count("matches"), Some(1));
    }

    #[test]
    fn test_global_replacement() {
        let out = run(&["a1b2c3"], json!({"pattern": "\\d", "replacement": "#"})).unwrap();
        assert_eq!(out.lines, ["a#b#c#"]);
        assert_eq!(out.stats.get_count("matches"), Some(3));
    }

    #[test]
    fn test_groups_and_case() {
        let out = run(
            &["John Smith"],
            json!({"pattern": "(\\w+) (\\w+)", "replacement": "$2, $1"}),
        )
        .unwrap();
        assert_eq!(out.lines, ["Smith, John"]);

        let out = run(
            &["ABC abc"],
            json!({"pattern": "abc", "replacement": "[$&]", "caseInsensitive": true}),
        )
        .unwrap();
        assert_eq!(out.lines, ["[ABC] [abc]"]);
    }

    #[test]
    fn test_only_matched() {
        let out = run(
            &["a1b22", "none"],
            json!({"pattern": "\\d+", "replacement": "", "onlyMatched": true}),
        )
        .unwrap();
        assert_eq!(out.lines, ["122", ""]);

        let out = run(
            &["x=1 y=2"],
            json!({"pattern": "(\\w)=(\\d)", "replacement": "$2", "onlyMatched": true}),
        )
        .unwrap();
        assert_eq!(out.lines, ["12"]);
    }

    #[test]
    fn test_empty_pattern_passes_through() {
        let out = run(&["keep"], json!({"pattern": ""})).unwrap();
        assert_eq!(out.lines, ["keep"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = run(&["x"], json!({"pattern": "(unclosed"})).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_translate_replacement() {
        assert_eq!(translate_replacement("$1a"), "${1}a");
        assert_eq!(translate_replacement("$$"), "$$");
        assert_eq!(translate_replacement("cost $"), "cost $$");
        assert_eq!(translate_replacement("$<year>"), "${year}");
    }
}
