//! Key-value persistence contract
//!
//! 저장된 체인 등 상위 레이어의 영구 데이터는 모두 이 trait을 통해 저장됩니다.
//! 구현체: [`SqliteKv`](super::SqliteKv), [`MemoryKv`](super::MemoryKv)

use crate::Result;
use std::sync::Arc;

/// 키-값 저장소
///
/// 모든 메서드는 `&self`를 받으며 구현체가 내부 동기화를 책임집니다.
pub trait KeyValueStore: Send + Sync {
    /// 값 조회 (없으면 `None`)
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// 값 저장 (있으면 덮어쓰기)
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// 값 삭제, 실제로 삭제되었으면 `true`
    fn delete(&self, key: &str) -> Result<bool>;

    /// prefix로 시작하는 모든 키 (정렬됨)
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// 키 존재 여부
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys(prefix)
    }
}
