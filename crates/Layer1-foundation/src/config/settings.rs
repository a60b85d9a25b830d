//! Linesmith Config - 통합 설정
//!
//! 글로벌(`~/.config/linesmith/config.json`) → 프로젝트(`.linesmith/config.json`)
//! 순서로 로드하고, 나중 것이 우선합니다.

use super::layers::{merge_layers, ConfigLayer, APP_DIR_NAME};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Linesmith Config (통합)
// ============================================================================

/// Linesmith 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinesmithConfig {
    /// 스크립트 샌드박스 예산
    #[serde(default)]
    pub sandbox: SandboxSettings,

    /// 평가 / 디코딩 동작
    #[serde(default)]
    pub evaluation: EvaluationSettings,

    /// 저장소 위치
    #[serde(default)]
    pub storage: StorageSettings,

    /// 공유 링크
    #[serde(default)]
    pub share: ShareSettings,
}

impl LinesmithConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let layers: Vec<ConfigLayer> = [ConfigLayer::global(), ConfigLayer::current_project()]
            .into_iter()
            .flatten()
            .collect();
        merge_layers(&layers)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: LinesmithConfig) {
        self.sandbox.merge(other.sandbox);
        self.evaluation.merge(other.evaluation);
        self.storage.merge(other.storage);
        self.share.merge(other.share);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(dir.into());
        self
    }

    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.evaluation.decode_policy = policy;
        self
    }
}

// ============================================================================
// Sandbox
// ============================================================================

fn default_timeout_ms() -> u64 {
    250
}

fn default_max_steps() -> u64 {
    200_000
}

fn default_max_string_len() -> usize {
    1_000_000
}

/// 스크립트 실행 예산
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxSettings {
    /// 줄 하나당 실행 시간 제한 (ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// 줄 하나당 최대 평가 스텝
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// 스크립트가 만들 수 있는 문자열 최대 길이
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_steps: default_max_steps(),
            max_string_len: default_max_string_len(),
        }
    }
}

impl SandboxSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn merge(&mut self, other: SandboxSettings) {
        if other.timeout_ms != default_timeout_ms() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.max_steps != default_max_steps() {
            self.max_steps = other.max_steps;
        }
        if other.max_string_len != default_max_string_len() {
            self.max_string_len = other.max_string_len;
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// 페이로드에 레지스트리에 없는 도구가 있을 때의 처리
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecodePolicy {
    /// 해당 블록만 건너뛰고 경고
    #[default]
    SkipUnknown,
    /// 디코딩 전체 실패
    Strict,
}

fn default_debounce_ms() -> u64 {
    150
}

/// 평가 동작 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSettings {
    /// 소스 편집 디바운스 (ms, 0이면 즉시)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub decode_policy: DecodePolicy,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            decode_policy: DecodePolicy::default(),
        }
    }
}

impl EvaluationSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn merge(&mut self, other: EvaluationSettings) {
        if other.debounce_ms != default_debounce_ms() {
            self.debounce_ms = other.debounce_ms;
        }
        if other.decode_policy != DecodePolicy::default() {
            self.decode_policy = other.decode_policy;
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// 저장소 위치
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// 데이터 디렉토리 (없으면 플랫폼 기본값)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// 실제 사용할 데이터 디렉토리
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    fn merge(&mut self, other: StorageSettings) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
    }
}

// ============================================================================
// Share
// ============================================================================

fn default_base_url() -> String {
    "https://linesmith.local/".to_string()
}

fn default_param() -> String {
    "chain".to_string()
}

/// 공유 링크 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 페이로드를 싣는 쿼리 파라미터 이름
    #[serde(default = "default_param")]
    pub param: String,
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            param: default_param(),
        }
    }
}

impl ShareSettings {
    fn merge(&mut self, other: ShareSettings) {
        if other.base_url != default_base_url() {
            self.base_url = other.base_url;
        }
        if other.param != default_param() {
            self.param = other.param;
        }
    }
}
