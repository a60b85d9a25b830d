//! Sandboxed per-line user functions
//!
//! 사용자 코드는 작은 JavaScript 부분집합으로 해석됩니다. 스코프에는
//! `line`만 바인딩되고 파일/네트워크/프로세스 접근 수단은 존재하지 않습니다.
//!
//! ```text
//! source ─▶ lexer ─▶ parser ─▶ Vec<Stmt> ─▶ interp (per line, budgeted)
//! ```

mod ast;
mod interp;
mod lexer;
mod parser;
mod sandbox;
mod value;

pub use sandbox::{SandboxLimits, Script};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("{0}")]
    Thrown(String),

    #[error("execution budget exceeded")]
    Timeout,
}
