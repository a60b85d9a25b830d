//! Chain Store - 이름 붙은 체인 저장소
//!
//! ## 저장 형식
//!
//! ```text
//! key:   chain/<name>
//! value: {"name": "...", "payload": "<base64url>", "savedAt": "2025-01-01T00:00:00Z"}
//! ```
//!
//! `KeyValueStore` 위에 얹혀 있으므로 SQLite / 메모리 어느 쪽이든 동작합니다.

use crate::model::Chain;
use crate::serializer::ChainSerializer;
use chrono::{DateTime, SecondsFormat, Utc};
use linesmith_foundation::{Error, KeyValueStore, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 저장된 체인 키 prefix
pub const CHAIN_KEY_PREFIX: &str = "chain/";

/// 저장 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// 있으면 덮어쓰기
    #[default]
    Upsert,
    /// 이미 있으면 `NameCollision`
    CreateOnly,
}

/// 저장된 체인 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChainEntry {
    pub name: String,
    pub payload: String,
    pub saved_at: DateTime<Utc>,
}

/// 목록 표시용 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChainInfo {
    pub name: String,
    pub saved_at: DateTime<Utc>,
}

// ============================================================================
// ChainStore
// ============================================================================

pub struct ChainStore {
    kv: Arc<dyn KeyValueStore>,
    serializer: ChainSerializer,
}

impl ChainStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, serializer: ChainSerializer) -> Self {
        Self { kv, serializer }
    }

    pub fn serializer(&self) -> &ChainSerializer {
        &self.serializer
    }

    /// 체인 저장
    pub fn save(&self, name: &str, chain: &Chain, mode: SaveMode) -> Result<SavedChainEntry> {
        let name = normalize_name(name)?;
        let key = chain_key(&name);

        if mode == SaveMode::CreateOnly && self.kv.contains(&key)? {
            return Err(Error::NameCollision(name));
        }

        let entry = SavedChainEntry {
            payload: self.serializer.encode(chain)?,
            name,
            saved_at: Utc::now(),
        };
        self.write(&entry)?;
        info!("Saved chain '{}' ({} blocks)", entry.name, chain.len());
        Ok(entry)
    }

    /// 최근 저장 순 (같으면 이름순)
    pub fn list(&self) -> Result<Vec<SavedChainInfo>> {
        let mut infos = Vec::new();
        for key in self.kv.keys(CHAIN_KEY_PREFIX)? {
            // 손상된 항목은 목록에서 제외 (load 시 에러로 드러남)
            if let Ok(Some(entry)) = self.read_key(&key) {
                infos.push(SavedChainInfo {
                    name: entry.name,
                    saved_at: entry.saved_at,
                });
            }
        }
        infos.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
        Ok(infos)
    }

    /// 저장된 항목 조회
    pub fn entry(&self, name: &str) -> Result<SavedChainEntry> {
        let name = normalize_name(name)?;
        self.read_key(&chain_key(&name))?
            .ok_or_else(|| Error::Persistence(format!("No saved chain named '{}'", name)))
    }

    /// 체인 불러오기 (제목은 저장 이름)
    pub fn load(&self, name: &str) -> Result<Chain> {
        let entry = self.entry(name)?;
        let outcome = self.serializer.decode(&entry.payload).map_err(|e| {
            Error::Persistence(format!("Saved chain '{}' is corrupt: {}", entry.name, e))
        })?;
        let mut chain = outcome.chain;
        chain.title = Some(entry.name);
        Ok(chain)
    }

    /// 이름 변경
    pub fn rename(&self, old: &str, new: &str) -> Result<SavedChainEntry> {
        let old = normalize_name(old)?;
        let new = normalize_name(new)?;
        let mut entry = self.entry(&old)?;
        if old == new {
            return Ok(entry);
        }
        if self.kv.contains(&chain_key(&new))? {
            return Err(Error::NameCollision(new));
        }

        entry.name = new;
        self.write(&entry)?;
        self.kv.delete(&chain_key(&old))?;
        info!("Renamed chain '{}' -> '{}'", old, entry.name);
        Ok(entry)
    }

    /// 삭제
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        if !self.kv.delete(&chain_key(&name))? {
            return Err(Error::Persistence(format!(
                "No saved chain named '{}'",
                name
            )));
        }
        info!("Deleted chain '{}'", name);
        Ok(())
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        let name = normalize_name(name)?;
        self.kv.contains(&chain_key(&name))
    }

    // ========================================================================
    // 내부
    // ========================================================================

    fn write(&self, entry: &SavedChainEntry) -> Result<()> {
        let value = serde_json::json!({
            "name": entry.name,
            "payload": entry.payload,
            "savedAt": entry.saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.kv.put(&chain_key(&entry.name), &value.to_string())
    }

    fn read_key(&self, key: &str) -> Result<Option<SavedChainEntry>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Persistence(format!("Corrupt store entry '{}': {}", key, e)))
    }
}

fn chain_key(name: &str) -> String {
    format!("{}{}", CHAIN_KEY_PREFIX, name)
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Chain name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
