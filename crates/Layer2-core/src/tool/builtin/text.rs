//! Per-line text tools: case, trim, wrapper, clean_text

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use regex::Regex;

lazy_static::lazy_static! {
    /// 줄 시작 또는 문장 부호 뒤의 첫 단어 문자
    static ref SENTENCE_START: Regex = Regex::new(r"(^\s*\w|[.!?]\s*\w)").expect("valid regex");
    static ref WORD_START: Regex = Regex::new(r"\b\w").expect("valid regex");
}

pub fn case(lines: &[String], p: &ParamReader) -> TransformOutput {
    let mode = p.choice("mode", "lower");
    let out = lines
        .iter()
        .map(|line| match mode.as_str() {
            "upper" => line.to_uppercase(),
            "lower" => line.to_lowercase(),
            "cap" => SENTENCE_START
                .replace_all(line, |c: &regex::Captures| c[0].to_uppercase())
                .into_owned(),
            "word" => WORD_START
                .replace_all(line, |c: &regex::Captures| c[0].to_uppercase())
                .into_owned(),
            _ => line.clone(),
        })
        .collect();
    TransformOutput::new(out)
}

pub fn trim(lines: &[String], p: &ParamReader) -> TransformOutput {
    let mode = p.choice("mode", "both");
    let mut changed = 0;
    let out = lines
        .iter()
        .map(|line| {
            let trimmed = match mode.as_str() {
                "left" => line.trim_start(),
                "right" => line.trim_end(),
                _ => line.trim(),
            };
            if trimmed.len() != line.len() {
                changed += 1;
            }
            trimmed.to_string()
        })
        .collect();
    TransformOutput::new(out).with_stats(Stats::new().count("lines_changed", changed))
}

pub fn wrapper(lines: &[String], p: &ParamReader) -> TransformOutput {
    let prefix = p.text("prefix");
    let suffix = p.text("suffix");
    TransformOutput::new(
        lines
            .iter()
            .map(|line| format!("{}{}{}", prefix, line, suffix))
            .collect(),
    )
}

/// 타이포그래피 대시/따옴표를 ASCII로 바꾸고 나머지 특수문자를 치환
pub fn clean_text(lines: &[String], p: &ParamReader) -> TransformOutput {
    let replacement = p.text("replaceStr");
    let mut removed = 0;

    let out = lines
        .iter()
        .map(|line| {
            let mut cleaned = String::with_capacity(line.len());
            for c in line.chars() {
                match c {
                    '—' | '–' => cleaned.push('-'),
                    '«' | '»' | '„' | '“' => cleaned.push('"'),
                    c if is_plain(c) => cleaned.push(c),
                    _ => {
                        removed += 1;
                        cleaned.push_str(&replacement);
                    }
                }
            }
            cleaned
        })
        .collect();

    TransformOutput::new(out).with_stats(Stats::new().count("removed", removed))
}

fn is_plain(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c.is_whitespace() || c.is_ascii_punctuation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_modes() {
        let input = lines(&["hello world. how are you?"]);
        let run = |mode: &str| {
            let p = params(json!({ "mode": mode }));
            case(&input, &ParamReader::new(&p)).lines[0].clone()
        };
        assert_eq!(run("upper"), "HELLO WORLD. HOW ARE YOU?");
        assert_eq!(run("cap"), "Hello world. How are you?");
        assert_eq!(run("word"), "Hello World. How Are You?");
        assert_eq!(run("lower"), "hello world. how are you?");
    }

    #[test]
    fn test_case_upper_single() {
        let p = params(json!({ "mode": "upper" }));
        assert_eq!(
            case(&lines(&["hello"]), &ParamReader::new(&p)).lines,
            lines(&["HELLO"])
        );
    }

    #[test]
    fn test_trim_modes() {
        let input = lines(&["  text  ", "plain"]);
        let p = params(json!({ "mode": "both" }));
        let out = trim(&input, &ParamReader::new(&p));
        assert_eq!(out.lines, lines(&["text", "plain"]));
        assert_eq!(out.stats.get_count("lines_changed"), Some(1));

        let p = params(json!({ "mode": "left" }));
        assert_eq!(trim(&input, &ParamReader::new(&p)).lines[0], "text  ");
        let p = params(json!({ "mode": "right" }));
        assert_eq!(trim(&input, &ParamReader::new(&p)).lines[0], "  text");
    }

    #[test]
    fn test_wrapper() {
        let p = params(json!({ "prefix": "<", "suffix": ">" }));
        assert_eq!(
            wrapper(&lines(&["a", "b"]), &ParamReader::new(&p)).lines,
            lines(&["<a>", "<b>"])
        );
    }

    #[test]
    fn test_clean_text() {
        let p = params(json!({ "replaceStr": "" }));
        let out = clean_text(&lines(&["a — b «q» ★ ok"]), &ParamReader::new(&p));
        assert_eq!(out.lines, lines(&["a - b \"q\"  ok"]));
        assert_eq!(out.stats.get_count("removed"), Some(1));

        let p = params(json!({ "replaceStr": "?" }));
        let out = clean_text(&lines(&["x✓y"]), &ParamReader::new(&p));
        assert_eq!(out.lines, lines(&["x?y"]));
    }
}
