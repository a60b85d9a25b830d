//! CSV row templating

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref COLUMN_REF: Regex = Regex::new(r"\$(\d+)").expect("valid regex");
}

/// 빈 줄이 아닌 행마다 `$n` (1부터) 컬럼 참조를 치환
pub fn csv(lines: &[String], p: &ParamReader) -> TransformOutput {
    let delimiter = p.delimiter("delimiter", ";");
    let template = p.text("template");
    let skip = usize::from(p.flag("skipHeader"));

    let out: Vec<String> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .skip(skip)
        .map(|row| {
            let cells: Vec<&str> = row.split(delimiter.as_str()).collect();
            COLUMN_REF
                .replace_all(&template, |caps: &Captures| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| cells.get(i))
                        .map(|cell| cell.trim().to_string())
                        .unwrap_or_default()
                })
                .into_owned()
        })
        .collect();

    let stats = Stats::new().count("rows", out.len());
    TransformOutput::new(out).with_stats(stats)
}
