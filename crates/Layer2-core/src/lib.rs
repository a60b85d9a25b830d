//! linesmith-core: Core engine for Linesmith
//!
//! Layer2 - 체인 평가 레이어
//!
//! # 주요 모듈
//!
//! - `model`: Chain, ProcessBlock, BlockId
//! - `tool`: 도구 레지스트리 및 Builtin 변환 도구들
//! - `script`: `js_function`용 샌드박스 인터프리터
//! - `evaluator`: 체인 평가 (블록 실패 시 입력 통과)
//! - `serializer`: 체인 ↔ 페이로드 (v2, 레거시 v1 변환)
//! - `share`: 공유 링크
//! - `store`: 이름 붙은 체인 저장소
//!
//! # 사용 예시
//!
//! ```ignore
//! use linesmith_core::{Chain, Evaluator, ToolRegistry, TransformContext};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ToolRegistry::with_builtins());
//! let evaluator = Evaluator::new(registry.clone(), TransformContext::default());
//!
//! let mut chain = Chain::new().with_source("b\na\nb");
//! chain.push(registry.instantiate("dedup")?);
//! chain.push(registry.instantiate("sort")?);
//!
//! let result = evaluator.evaluate(&chain);
//! assert_eq!(result.final_output, "a\nb");
//! ```

// Core modules
pub mod evaluator;
pub mod model;
pub mod script;
pub mod serializer;
pub mod share;
pub mod store;
pub mod tool;

// Re-exports: Model
pub use model::{BlockId, Chain, ChainSettings, Params, ProcessBlock, DEFAULT_DELIMITER};

// Re-exports: Tool
pub use tool::{
    builtin_definitions, Category, LineError, ParamKind, ParamReader, ParamSchema, ParamSpec,
    Stats, ToolDefinition, ToolKind, ToolRegistry, TransformContext, TransformOutput,
};

// Re-exports: Script
pub use script::{SandboxLimits, Script, ScriptError};

// Re-exports: Evaluator
pub use evaluator::{BlockError, BlockResult, EvaluationResult, Evaluator};

// Re-exports: Serializer / Share
pub use serializer::{
    ChainPayload, ChainSerializer, DecodeOutcome, PayloadBlock, LEGACY_VERSION, PAYLOAD_VERSION,
};
pub use share::{payload_from_link, share_link};

// Re-exports: Store
pub use store::{ChainStore, SaveMode, SavedChainEntry, SavedChainInfo, CHAIN_KEY_PREFIX};

// Re-exports: Foundation (자주 쓰는 것)
pub use linesmith_foundation::{DecodePolicy, Error, ErrorKind, Result};
