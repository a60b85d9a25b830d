//! Error types for Linesmith
//!
//! 모든 에러를 중앙에서 관리
//!
//! 블록 단위 에러(Validation, Runtime, Timeout)는 평가 결과에 붙고,
//! 나머지는 해당 연산의 호출자에게 전달됩니다.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Linesmith 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 블록 평가 관련
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 직렬화 / 도구 조회 관련
    // ========================================================================
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Name already exists: {0}")]
    NameCollision(String),

    // ========================================================================
    // 체인 편집 관련
    // ========================================================================
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 에러 분류 (직렬화 가능, 평가 결과에 저장)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Validation,
    Runtime,
    Timeout,
    Serialization,
    UnknownTool,
    Persistence,
    NameCollision,
    BlockNotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Validation => "validation",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Serialization => "serialization",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::Persistence => "persistence",
            ErrorKind::NameCollision => "name_collision",
            ErrorKind::BlockNotFound => "block_not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// 에러 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Serialization(_) | Error::Json(_) => ErrorKind::Serialization,
            Error::UnknownTool(_) => ErrorKind::UnknownTool,
            Error::Persistence(_) | Error::Io(_) | Error::Sqlite(_) => ErrorKind::Persistence,
            Error::NameCollision(_) => ErrorKind::NameCollision,
            Error::BlockNotFound(_) => ErrorKind::BlockNotFound,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 블록 결과에 붙는 에러인지 확인 (체인 평가를 중단시키지 않음)
    pub fn is_block_scoped(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Runtime(_) | Error::Timeout(_)
        )
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Runtime(_)
                | Error::Timeout(_)
                | Error::UnknownTool(_)
                | Error::NameCollision(_)
                | Error::BlockNotFound(_)
        )
    }

    /// 에러 메시지 (접두사 없이)
    pub fn message(&self) -> String {
        match self {
            Error::Config(m)
            | Error::Validation(m)
            | Error::Runtime(m)
            | Error::Timeout(m)
            | Error::Serialization(m)
            | Error::UnknownTool(m)
            | Error::Persistence(m)
            | Error::NameCollision(m)
            | Error::BlockNotFound(m)
            | Error::Internal(m) => m.clone(),
            other => other.to_string(),
        }
    }

    /// Validation 에러 생성 헬퍼
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Persistence 에러 생성 헬퍼
    pub fn persistence(message: impl Into<String>) -> Self {
        Error::Persistence(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(Error::persistence("gone").kind(), ErrorKind::Persistence);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json_err).kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_block_scoped() {
        assert!(Error::Timeout("slow".into()).is_block_scoped());
        assert!(Error::Runtime("boom".into()).is_block_scoped());
        assert!(!Error::UnknownTool("x".into()).is_block_scoped());
        assert!(!Error::NameCollision("x".into()).is_block_scoped());
    }

    #[test]
    fn test_message_strips_prefix() {
        let err = Error::Validation("invalid regex".into());
        assert_eq!(err.message(), "invalid regex");
        assert_eq!(err.to_string(), "Validation error: invalid regex");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ErrorKind::UnknownTool).unwrap();
        assert_eq!(json, "\"unknown_tool\"");
    }
}
