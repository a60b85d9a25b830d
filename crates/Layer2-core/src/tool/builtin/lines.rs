//! Line-set tools: dedup, duplicates, filter, reverse, shuffle, split, add_line, join

use crate::model::Params;
use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use rand::Rng;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Remove & Filter
// ============================================================================

/// 첫 등장 순서를 유지하며 중복 제거. 빈 값은 버림
pub fn dedup(lines: &[String], p: &ParamReader) -> TransformOutput {
    let trim = p.flag("trim");
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for line in lines {
        let value = if trim { line.trim() } else { line.as_str() };
        if !value.is_empty() && seen.insert(value) {
            out.push(value.to_string());
        }
    }

    let stats = Stats::new()
        .count("original", lines.len())
        .count("unique", out.len())
        .count("removed", lines.len() - out.len());
    TransformOutput::new(out).with_stats(stats)
}

/// 두 번 이상 나온 값만 (첫 등장 순서)
pub fn duplicates(lines: &[String], p: &ParamReader) -> TransformOutput {
    let show_counts = p.flag("showCounts");
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for value in lines.iter().map(|l| l.trim()).filter(|v| !v.is_empty()) {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let out: Vec<String> = order
        .into_iter()
        .filter_map(|value| {
            let n = counts[value];
            (n > 1).then(|| {
                if show_counts {
                    format!("{} ({})", value, n)
                } else {
                    value.to_string()
                }
            })
        })
        .collect();

    let stats = Stats::new().count("duplicates", out.len());
    if out.is_empty() {
        return TransformOutput::new(vec!["(no duplicates)".to_string()]).with_stats(stats);
    }
    TransformOutput::new(out).with_stats(stats)
}

pub fn filter(lines: &[String], p: &ParamReader) -> TransformOutput {
    let case_sensitive = p.flag("caseSensitive");
    let mode = p.choice("mode", "contains");
    let fold = |s: &str| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let query = fold(&p.text("query"));

    let out: Vec<String> = lines
        .iter()
        .filter(|line| {
            let value = fold(line.as_str());
            match mode.as_str() {
                "not_contains" => !value.contains(&query),
                "starts" => value.starts_with(&query),
                "ends" => value.ends_with(&query),
                _ => value.contains(&query),
            }
        })
        .cloned()
        .collect();

    let stats = Stats::new()
        .count("matched", out.len())
        .count("removed", lines.len() - out.len());
    TransformOutput::new(out).with_stats(stats)
}

// ============================================================================
// Order
// ============================================================================

pub fn reverse(lines: &[String]) -> TransformOutput {
    TransformOutput::new(lines.iter().rev().cloned().collect())
}

/// 시드 고정 Fisher–Yates 셔플
pub fn shuffle(lines: &[String], p: &ParamReader) -> TransformOutput {
    let mut next = mulberry32(parse_seed(&p.text("seed")));
    let mut items = lines.to_vec();
    for i in (1..items.len()).rev() {
        let j = (next() * (i + 1) as f64).floor() as usize;
        items.swap(i, j.min(i));
    }
    TransformOutput::new(items)
}

/// 시드가 비어 있으면 무작위 시드를 채워 이후 평가를 결정적으로 만듦
pub fn init_shuffle_seed(params: &mut Params) {
    let empty = params
        .get("seed")
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty());
    if empty {
        let seed: u32 = rand::thread_rng().gen_range(0..1_000_000);
        params.insert("seed".to_string(), Value::from(seed.to_string()));
    }
}

/// 앞쪽 정수 부분만 해석, 실패 시 0
fn parse_seed(seed: &str) -> u32 {
    let s = seed.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: String = digits
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(18)
        .collect();
    let value: i64 = digits.parse().unwrap_or(0);
    let value = if negative { -value } else { value };
    value as u32
}

fn mulberry32(seed: u32) -> impl FnMut() -> f64 {
    let mut state = seed;
    move || {
        state = state.wrapping_add(0x6D2B_79F5);
        let mut t = state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        (t ^ (t >> 14)) as f64 / 4_294_967_296.0
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub fn split(lines: &[String], p: &ParamReader) -> TransformOutput {
    let delimiter = p.delimiter("delimiter", ",");
    let out: Vec<String> = lines
        .iter()
        .flat_map(|line| line.split(delimiter.as_str()).map(str::to_string))
        .collect();
    let stats = Stats::new().count("count", out.len());
    TransformOutput::new(out).with_stats(stats)
}

pub fn add_line(lines: &[String], p: &ParamReader) -> TransformOutput {
    let start = p.text("startLine");
    let between = p.text("betweenLines");
    let end = p.text("endLine");

    let mut out = Vec::with_capacity(lines.len() * 2 + 2);
    if !start.is_empty() {
        out.push(start);
    }
    for (i, line) in lines.iter().enumerate() {
        if i > 0 && !between.is_empty() {
            out.push(between.clone());
        }
        out.push(line.clone());
    }
    if !end.is_empty() {
        out.push(end);
    }
    TransformOutput::new(out)
}

/// 모든 줄을 한 줄로. 마지막 쌍은 `lastDelimiter`로 연결
pub fn join(lines: &[String], p: &ParamReader) -> TransformOutput {
    let prefix = p.text("prefix");
    let suffix = p.text("suffix");

    let joined = match lines {
        [] => return TransformOutput::new(Vec::new()),
        [only] => format!("{}{}{}", prefix, only, suffix),
        [head @ .., last] => {
            let delimiter = p.delimiter("delimiter", "");
            let last_delimiter = p.delimiter("lastDelimiter", "");
            format!(
                "{}{}{}{}{}",
                prefix,
                head.join(&delimiter),
                last_delimiter,
                last,
                suffix
            )
        }
    };
    TransformOutput::new(vec![joined]).with_stats(Stats::new().count("count", lines.len()))
}
