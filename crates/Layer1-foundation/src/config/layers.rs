//! Config file layers
//!
//! 설정은 두 레이어로 읽습니다:
//! - 글로벌: `<config_dir>/linesmith/config.json`
//! - 프로젝트: `<cwd>/.linesmith/config.json`
//!
//! 파일이 없는 레이어는 건너뛰고, 있는데 깨진 파일은 에러입니다.

use super::settings::LinesmithConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// 앱 디렉토리 이름 (설정/데이터 공통)
pub const APP_DIR_NAME: &str = "linesmith";

/// 프로젝트 설정 디렉토리 이름
pub const PROJECT_DIR_NAME: &str = ".linesmith";

/// 설정 파일명
pub const CONFIG_FILE: &str = "config.json";

/// 설정 레이어 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    path: PathBuf,
}

impl ConfigLayer {
    /// `dir` 안의 `config.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE),
        }
    }

    /// 글로벌 레이어
    pub fn global() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?;
        Ok(Self::in_dir(dir.join(APP_DIR_NAME)))
    }

    /// 프로젝트 레이어 (`root/.linesmith/`)
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::in_dir(root.as_ref().join(PROJECT_DIR_NAME))
    }

    /// 현재 디렉토리의 프로젝트 레이어
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 레이어 읽기. 파일이 없으면 `None`
    pub fn read(&self) -> Result<Option<LinesmithConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let layer = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        tracing::debug!("Loaded config from {}", self.path.display());
        Ok(Some(layer))
    }
}

/// 레이어를 순서대로 읽어 병합 (뒤의 것이 우선)
pub fn merge_layers<'a>(
    layers: impl IntoIterator<Item = &'a ConfigLayer>,
) -> Result<LinesmithConfig> {
    let mut config = LinesmithConfig::new();
    for layer in layers {
        if let Some(found) = layer.read()? {
            config.merge(found);
        }
    }
    Ok(config)
}
