//! # linesmith-foundation
//!
//! Foundation layer for Linesmith:
//! - Error: 공통 에러 타입 (`Error`, `ErrorKind`, `Result`)
//! - Config: 통합 설정 (LinesmithConfig - sandbox, evaluation, storage, share)
//! - Storage: 키-값 저장소 계약 + SQLite / 메모리 구현
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  ChainStore (Layer2-core)                               │
//! │                     │                                   │
//! │                     ▼                                   │
//! │             KeyValueStore (trait)                       │
//! │          ┌─────────┴─────────┐                          │
//! │          ▼                   ▼                          │
//! │      SqliteKv             MemoryKv                      │
//! │   (linesmith.db)        (tests, ephemeral)              │
//! │                                                         │
//! │  LinesmithConfig ◀── ConfigLayer (global → project)     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ErrorKind, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    merge_layers, ConfigLayer, DecodePolicy, EvaluationSettings, LinesmithConfig,
    SandboxSettings, ShareSettings, StorageSettings, APP_DIR_NAME, CONFIG_FILE, PROJECT_DIR_NAME,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{
    // Contract
    KeyValueStore,
    // Implementations
    MemoryKv,
    SqliteKv,
    CURRENT_SCHEMA_VERSION,
    DATABASE_FILE,
};
