//! Compiled per-line scripts and their execution limits

use super::ast::Stmt;
use super::interp::Interpreter;
use super::parser::parse_program;
use super::ScriptError;
use linesmith_foundation::SandboxSettings;
use std::time::Duration;

/// 줄 하나를 처리할 때의 실행 한도
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxLimits {
    pub timeout: Duration,
    pub max_steps: u64,
    pub max_string_len: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self::from(&SandboxSettings::default())
    }
}

impl From<&SandboxSettings> for SandboxLimits {
    fn from(settings: &SandboxSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            max_steps: settings.max_steps,
            max_string_len: settings.max_string_len,
        }
    }
}

/// 파싱이 끝난 사용자 함수 본문
///
/// 본문은 `line` 하나만 받는 함수처럼 실행되며, 줄마다 새 스코프에서
/// 평가되므로 이전 줄의 상태가 남지 않습니다.
#[derive(Debug, Clone)]
pub struct Script {
    program: Vec<Stmt>,
}

impl Script {
    pub fn compile(code: &str) -> Result<Self, ScriptError> {
        Ok(Self {
            program: parse_program(code)?,
        })
    }

    /// 한 줄 실행. `undefined`/`null` 반환은 빈 문자열
    pub fn run_line(&self, line: &str, limits: &SandboxLimits) -> Result<String, ScriptError> {
        Interpreter::new(limits).run(&self.program, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str, line: &str) -> Result<String, ScriptError> {
        Script::compile(code)?.run_line(line, &SandboxLimits::default())
    }

    fn ok(code: &str, line: &str) -> String {
        run(code, line).unwrap()
    }

    #[test]
    fn test_basic_return() {
        assert_eq!(ok("return line.toUpperCase();", "abc"), "ABC");
        assert_eq!(ok("return line.length;", "héllo"), "5");
        assert_eq!(ok("return `[${line}]`;", "x"), "[x]");
    }

    #[test]
    fn test_undefined_and_null_become_empty() {
        assert_eq!(ok("", "abc"), "");
        assert_eq!(ok("return null;", "abc"), "");
        assert_eq!(ok("if (line === 'x') return 1;", "y"), "");
    }

    #[test]
    fn test_value_stringification() {
        assert_eq!(ok("return line.split(',');", "a,b,c"), "a,b,c");
        assert_eq!(ok("return 0.1 + 0.2;", ""), "0.30000000000000004");
        assert_eq!(ok("return 10 / 4;", ""), "2.5");
        assert_eq!(ok("return true;", ""), "true");
        assert_eq!(ok("return [1, [2, 3], null];", ""), "1,2,3,");
    }

    #[test]
    fn test_control_flow() {
        let code = r#"
            let total = 0;
            for (let i = 0; i < 5; i++) {
                if (i === 3) continue;
                total += i;
            }
            let n = 0;
            while (true) { n++; if (n > 2) break; }
            for (const c of line) total += Number(c);
            return total + ':' + n;
        "#;
        assert_eq!(ok(code, "12"), "10:3");
    }

    #[test]
    fn test_arrows_and_array_methods() {
        let code = "return line.split(' ').map(w => w[0].toUpperCase() + w.slice(1)).join(' ');";
        assert_eq!(ok(code, "hello big world"), "Hello Big World");

        let code = "const nums = line.split(',').map(Number); return nums.filter(n => n % 2).sort((a, b) => b - a).join('|');";
        assert_eq!(ok(code, "3,8,1,5"), "5|3|1");

        let code = "const f = (a, b) => { return a * b; }; return f(6, 7);";
        assert_eq!(ok(code, ""), "42");
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(ok("return line.padStart(5, '0');", "42"), "00042");
        assert_eq!(ok("return line.replaceAll('a', 'o');", "banana"), "bonono");
        assert_eq!(ok("return line.replace('a', 'o');", "banana"), "bonana");
        assert_eq!(ok("return line.indexOf('n');", "banana"), "2");
        assert_eq!(ok("return line.slice(-3);", "banana"), "ana");
        assert_eq!(ok("return line.substring(4, 1);", "banana"), "ana");
        assert_eq!(ok("return line.trim().repeat(2);", "  ab "), "abab");
        assert_eq!(ok("return line.at(-1);", "xyz"), "z");
    }

    #[test]
    fn test_math_and_numbers() {
        assert_eq!(ok("return Math.max(1, 7, 3);", ""), "7");
        assert_eq!(ok("return Math.round(2.5);", ""), "3");
        assert_eq!(ok("return (parseFloat(line) * 2).toFixed(2);", "1.005x"), "2.01");
        assert_eq!(ok("return parseInt(line, 16);", "ff"), "255");
        assert_eq!(ok("return (255).toString(16);", ""), "ff");
        assert_eq!(ok("return isNaN(Number(line));", "abc"), "true");
    }

    #[test]
    fn test_logical_and_optional() {
        assert_eq!(ok("return line || 'empty';", ""), "empty");
        assert_eq!(ok("return null ?? 'd';", ""), "d");
        assert_eq!(ok("const a = [1]; return a[5]?.x ?? 'none';", ""), "none");
        assert_eq!(ok("return typeof nothing;", ""), "undefined");
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(
            run("return foo + 1;", "x"),
            Err(ScriptError::Thrown("foo is not defined".into()))
        );
        assert!(matches!(
            run("const a = 1; a = 2;", "x"),
            Err(ScriptError::Thrown(m)) if m.contains("constant")
        ));
        assert!(matches!(
            run("return undefined.x;", "x"),
            Err(ScriptError::Thrown(m)) if m.contains("Cannot read properties")
        ));
        assert_eq!(
            run("throw 'bad ' + line;", "x"),
            Err(ScriptError::Thrown("bad x".into()))
        );
    }

    #[test]
    fn test_syntax_error_on_compile() {
        assert!(matches!(
            Script::compile("return line +;"),
            Err(ScriptError::Syntax(_))
        ));
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let limits = SandboxLimits {
            timeout: Duration::from_millis(50),
            max_steps: u64::MAX,
            max_string_len: 1_000_000,
        };
        let script = Script::compile("while (true) {}").unwrap();
        assert_eq!(script.run_line("x", &limits), Err(ScriptError::Timeout));
    }

    #[test]
    fn test_step_budget() {
        let limits = SandboxLimits {
            max_steps: 1_000,
            ..SandboxLimits::default()
        };
        let script = Script::compile("let i = 0; while (i < 1000000) i++; return i;").unwrap();
        assert_eq!(script.run_line("x", &limits), Err(ScriptError::Timeout));
    }

    #[test]
    fn test_string_length_limit() {
        let limits = SandboxLimits {
            max_string_len: 100,
            ..SandboxLimits::default()
        };
        let script = Script::compile("return line.repeat(1000);").unwrap();
        assert!(matches!(
            script.run_line("abc", &limits),
            Err(ScriptError::Thrown(m)) if m.contains("Invalid string length")
        ));
    }

    #[test]
    fn test_self_referencing_array() {
        assert_eq!(ok("const a = [1]; a.push(a); a.push(2); return a;", ""), "1,,2");
        assert_eq!(ok("const a = []; a.push(a); return a.join('-') + '|' + a;", ""), "|");
        assert_eq!(ok("const a = ['x']; a.push(a); return `${a}`;", ""), "x,");
        assert_eq!(ok("const a = [3]; a.push(a); return a == '3,';", ""), "true");
    }

    #[test]
    fn test_shared_structure_is_budgeted() {
        let limits = SandboxLimits {
            timeout: Duration::from_millis(250),
            max_steps: 200_000,
            max_string_len: 1_000_000,
        };
        let script =
            Script::compile("let a = [1]; for (let i = 0; i < 28; i++) { a = [a, a]; } return a;")
                .unwrap();

        let started = std::time::Instant::now();
        let result = script.run_line("", &limits);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(ScriptError::Timeout) | Err(ScriptError::Thrown(_))
        ));

        let joined =
            Script::compile("let a = ['ab']; for (let i = 0; i < 28; i++) { a = [a, a]; } return a.join('') + 'x';")
                .unwrap();
        assert!(joined.run_line("", &limits).is_err());
    }

    #[test]
    fn test_recursion_limit() {
        let code = "const f = n => f(n + 1); return f(0);";
        assert!(matches!(
            run(code, ""),
            Err(ScriptError::Thrown(m)) if m.contains("call stack")
        ));
    }

    #[test]
    fn test_no_state_between_lines() {
        let script = Script::compile("let n = 0; n++; return n;").unwrap();
        let limits = SandboxLimits::default();
        assert_eq!(script.run_line("a", &limits).unwrap(), "1");
        assert_eq!(script.run_line("b", &limits).unwrap(), "1");
    }

    #[test]
    fn test_no_ambient_globals() {
        for name in ["require", "process", "globalThis", "fetch", "window"] {
            let code = format!("return typeof {};", name);
            assert_eq!(ok(&code, ""), "undefined", "{} should be unbound", name);
        }
    }
}
