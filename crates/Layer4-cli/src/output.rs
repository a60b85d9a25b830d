//! Plain-text rendering for CLI output

use linesmith_core::{EvaluationResult, SavedChainInfo, Stats, ToolRegistry};
use serde_json::Value;
use std::fmt::Write;

/// 카테고리별 도구 목록
pub fn format_tools(registry: &ToolRegistry) -> String {
    let mut out = String::new();
    for (category, tools) in registry.by_category() {
        let _ = writeln!(out, "{}", category.title());
        for def in tools {
            let _ = write!(out, "  {:<12} {}", def.id, def.title);
            if !def.params.is_empty() {
                let names: Vec<&str> = def.params.iter().map(|p| p.name.as_str()).collect();
                let _ = write!(out, "  [{}]", names.join(", "));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// 단계별 출력 (`run --stages`)
pub fn format_stages(result: &EvaluationResult) -> String {
    let mut out = String::new();
    for (index, block) in result.blocks.iter().enumerate() {
        let _ = write!(out, "[{}] {}", index + 1, block.tool_id);
        if !block.stats.is_empty() {
            let _ = write!(out, "  ({})", format_stats(&block.stats));
        }
        out.push('\n');

        if let Some(error) = &block.error {
            let _ = writeln!(out, "  ✗ {}", error);
        }
        for line_error in &block.line_errors {
            let _ = writeln!(out, "  ✗ line {}: {}", line_error.line, line_error.message);
        }
        for line in &block.output_lines {
            let _ = writeln!(out, "    {}", line);
        }
    }

    out.push_str("=== output ===\n");
    out.push_str(&result.final_output);
    out.push('\n');
    out
}

fn format_stats(stats: &Stats) -> String {
    stats
        .iter()
        .map(|(name, value)| match value {
            Value::String(s) => format!("{}: {}", name, s),
            other => format!("{}: {}", name, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// 저장된 체인 목록
pub fn format_saved(saved: &[SavedChainInfo]) -> String {
    if saved.is_empty() {
        return "(no saved chains)\n".to_string();
    }

    let width = saved.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for info in saved {
        let _ = writeln!(
            out,
            "{:<width$}  {}",
            info.name,
            info.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
            width = width
        );
    }
    out
}
