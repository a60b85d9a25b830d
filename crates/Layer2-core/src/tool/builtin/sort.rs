//! Line sorting: text, numeric, smart (natural)

use crate::tool::output::TransformOutput;
use crate::tool::params::ParamReader;
use std::cmp::Ordering;

/// 안정 정렬. 빈 줄은 버림
pub fn sort(lines: &[String], p: &ParamReader) -> TransformOutput {
    let mode = p.choice("mode", "text");
    let descending = p.choice("direction", "asc") == "desc";
    let case_insensitive = p.flag("caseInsensitive");

    let mut items: Vec<String> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .cloned()
        .collect();

    let directed = |ord: Ordering| if descending { ord.reverse() } else { ord };

    match mode.as_str() {
        "numeric" => items.sort_by(|a, b| {
            match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => directed(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                // 숫자는 방향과 무관하게 항상 앞
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => directed(collate(a, b, case_insensitive)),
            }
        }),
        "smart" => items.sort_by(|a, b| directed(natural(a, b, case_insensitive))),
        _ => items.sort_by(|a, b| directed(collate(a, b, case_insensitive))),
    }

    TransformOutput::new(items)
}

/// 줄 전체가 숫자인 경우만
fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let looks_numeric = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric {
        return None;
    }
    t.parse::<f64>().ok()
}

/// 대소문자 무시 1차 비교, 같으면 소문자 우선
fn collate(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    let primary = a.to_lowercase().cmp(&b.to_lowercase());
    if primary != Ordering::Equal || case_insensitive {
        return primary;
    }
    b.cmp(a)
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(prev) = digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

/// 숫자 구간은 수치로 비교하는 자연 정렬
fn natural(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (x, y) in left.iter().zip(right.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => {
                let xs = x.trim_start_matches('0');
                let ys = y.trim_start_matches('0');
                xs.len().cmp(&ys.len()).then_with(|| xs.cmp(ys))
            }
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Text(x), Chunk::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len()
        .cmp(&right.len())
        .then_with(|| collate(a, b, case_insensitive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use serde_json::json;

    fn run(input: &[&str], value: serde_json::Value) -> Vec<String> {
        let p: Params = value.as_object().cloned().unwrap();
        let input: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        sort(&input, &ParamReader::new(&p)).lines
    }

    #[test]
    fn test_text_asc_desc() {
        assert_eq!(run(&["C", "A", "B"], json!({"mode": "text", "direction": "asc"})), ["A", "B", "C"]);
        assert_eq!(run(&["C", "A", "B"], json!({"mode": "text", "direction": "desc"})), ["C", "B", "A"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(run(&["b", "", "  ", "a"], json!({})), ["a", "b"]);
    }

    #[test]
    fn test_numeric_numbers_first() {
        assert_eq!(
            run(&["10", "b", "9", "a", "-1.5"], json!({"mode": "numeric"})),
            ["-1.5", "9", "10", "a", "b"]
        );
        assert_eq!(
            run(&["10", "b", "9", "a"], json!({"mode": "numeric", "direction": "desc"})),
            ["10", "9", "b", "a"]
        );
    }

    #[test]
    fn test_smart() {
        assert_eq!(
            run(&["file10", "file2", "file1"], json!({"mode": "smart"})),
            ["file1", "file2", "file10"]
        );
        assert_eq!(
            run(&["file10", "file2", "file1"], json!({"mode": "text"})),
            ["file1", "file10", "file2"]
        );
    }

    #[test]
    fn test_case_handling() {
        assert_eq!(run(&["b", "B", "a"], json!({})), ["a", "b", "B"]);
        // 대소문자 무시 시 같은 값은 입력 순서 유지
        assert_eq!(run(&["B", "b", "a"], json!({"caseInsensitive": true})), ["a", "B", "b"]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("12px"), None);
    }
}
