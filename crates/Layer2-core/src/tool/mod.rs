//! Tool System - 줄 단위 변환 도구
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolRegistry                                                │
//! │  ├── register(def) - 도구 등록 (중복 거부)                   │
//! │  ├── lookup(id) - id/alias 조회                              │
//! │  ├── by_category() - 카탈로그 그룹                           │
//! │  └── instantiate(id) - 기본 파라미터 블록 생성               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolDefinition                                              │
//! │  ├── ParamSchema - 파라미터 선언 / 검증 / 기본값             │
//! │  └── ToolKind - transform(lines, params, ctx)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools                                               │
//! │  ├── text - case, trim, wrapper, clean_text                  │
//! │  ├── lines - dedup, duplicates, filter, shuffle, join, ...   │
//! │  ├── sort / compare / pattern(regex)                         │
//! │  ├── json / csv / codec / hex                                │
//! │  └── script - js_function (sandbox)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use linesmith_core::tool::{ToolRegistry, TransformContext};
//!
//! let registry = ToolRegistry::with_builtins();
//! let def = registry.lookup("sort")?;
//! let out = def.transform(&lines, &params, &TransformContext::default())?;
//! ```

pub mod builtin;
mod catalog;
mod definition;
mod kind;
mod output;
mod params;
mod registry;
mod schema;

pub use catalog::builtin_definitions;
pub use definition::{Category, ToolDefinition};
pub use kind::ToolKind;
pub use output::{LineError, Stats, TransformContext, TransformOutput};
pub use params::{unescape_delimiter, ParamReader};
pub use registry::ToolRegistry;
pub use schema::{ParamKind, ParamSchema, ParamSpec, CUSTOM_SUFFIX, DELIMITER_PRESETS};
