//! js_function - 사용자 스크립트를 줄마다 실행

use crate::script::{Script, ScriptError};
use crate::tool::output::{LineError, Stats, TransformContext, TransformOutput};
use crate::tool::params::ParamReader;
use linesmith_foundation::{Error, Result};
use tracing::warn;

const FALLBACK_CODE: &str = "return line";

/// 줄마다 `line`을 바인딩해 실행
///
/// - 문법 에러: 블록 Validation 에러 (어떤 줄도 실행 안 됨)
/// - 줄 단위 예외: `[Error: msg]` 출력 + `line_errors` 기록
/// - 실행 한도 초과: 그 줄에서 블록 중단, Timeout 에러
pub fn js_function(
    lines: &[String],
    p: &ParamReader,
    ctx: &TransformContext,
) -> Result<TransformOutput> {
    let code = p.text("code");
    let code = if code.trim().is_empty() {
        FALLBACK_CODE.to_string()
    } else {
        code
    };
    let script = Script::compile(&code).map_err(|e| Error::Validation(e.to_string()))?;

    let mut out = Vec::with_capacity(lines.len());
    let mut line_errors = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let line_no = index + 1;
        match script.run_line(line, &ctx.sandbox) {
            Ok(value) => out.push(value),
            Err(ScriptError::Timeout) => {
                warn!(line = line_no, "Script exceeded its execution budget");
                return Err(Error::Timeout(format!(
                    "line {}: script exceeded its execution budget ({} ms, {} steps)",
                    line_no,
                    ctx.sandbox.timeout.as_millis(),
                    ctx.sandbox.max_steps
                )));
            }
            Err(err) => {
                let message = err.to_string();
                out.push(format!("[Error: {}]", message));
                line_errors.push(LineError {
                    line: line_no,
                    message,
                });
            }
        }
    }

    let mut stats = Stats::new().count("count", out.len());
    if !line_errors.is_empty() {
        stats.set_count("errors", line_errors.len());
    }
    Ok(TransformOutput::new(out)
        .with_stats(stats)
        .with_line_errors(line_errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Params;
    use crate::script::SandboxLimits;
    use serde_json::json;
    use std::time::Duration;

    fn run(input: &[&str], code: &str, ctx: &TransformContext) -> Result<TransformOutput> {
        let p: Params = json!({ "code": code }).as_object().cloned().unwrap();
        let input: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        js_function(&input, &ParamReader::new(&p), ctx)
    }

    #[test]
    fn test_double() {
        let out = run(&["5"], "return line * 2", &TransformContext::default()).unwrap();
        assert_eq!(out.lines, ["10"]);
        assert!(out.line_errors.is_empty());
    }

    #[test]
    fn test_per_line_exception_does_not_abort() {
        let code = "if (line === 'bad') throw 'nope'; return line + '!';";
        let out = run(&["a", "bad", "c"], code, &TransformContext::default()).unwrap();
        assert_eq!(out.lines, ["a!", "[Error: nope]", "c!"]);
        assert_eq!(
            out.line_errors,
            vec![LineError {
                line: 2,
                message: "nope".into()
            }]
        );
        assert_eq!(out.stats.get_count("errors"), Some(1));
    }

    #[test]
    fn test_syntax_error_is_validation() {
        let err = run(&["a"], "return (", &TransformContext::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_timeout_names_line() {
        let ctx = TransformContext::new(SandboxLimits {
            timeout: Duration::from_millis(20),
            max_steps: 50_000,
            max_string_len: 1_000,
        });
        let code = "if (line === 'loop') { while (true) {} } return line;";
        let err = run(&["ok", "loop", "never"], code, &ctx).unwrap_err();
        match err {
            Error::Timeout(message) => assert!(message.starts_with("line 2:")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_code_falls_back_to_identity() {
        let out = run(&["x"], "  ", &TransformContext::default()).unwrap();
        assert_eq!(out.lines, ["x"]);
    }
}
