//! Storage module for Linesmith
//!
//! - `kv`: 키-값 저장소 계약 (`KeyValueStore`)
//! - `db`: SQLite - 저장된 체인 등 런타임 데이터
//! - `memory`: 인메모리 구현 (테스트, 임시 세션)

mod db;
mod kv;
mod memory;

// Key-value contract
pub use kv::KeyValueStore;

// SQLite Storage (런타임 데이터)
pub use db::{SqliteKv, CURRENT_SCHEMA_VERSION, DATABASE_FILE};

// In-memory
pub use memory::MemoryKv;
