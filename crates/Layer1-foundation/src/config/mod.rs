//! Config - 통합 설정 관리
//!
//! - `settings.rs` - LinesmithConfig (sandbox, evaluation, storage, share)
//! - `layers.rs` - 글로벌/프로젝트 설정 파일 레이어와 병합

mod layers;
mod settings;

pub use layers::{merge_layers, ConfigLayer, APP_DIR_NAME, CONFIG_FILE, PROJECT_DIR_NAME};
pub use settings::{
    DecodePolicy, EvaluationSettings, LinesmithConfig, SandboxSettings, ShareSettings,
    StorageSettings,
};
