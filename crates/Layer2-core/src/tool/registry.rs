//! Tool Registry - 도구 등록 및 조회
//!
//! 시작 시 한 번 채워지는 추가 전용 카탈로그입니다.
//!
//! ## 기능
//! - 도구 등록 (중복 id/alias는 거부)
//! - id 또는 alias로 조회
//! - 등록 순서 목록, 카테고리별 그룹화
//! - 새 블록 생성 (기본 파라미터 포함)

use super::catalog::builtin_definitions;
use super::definition::{Category, ToolDefinition};
use crate::model::ProcessBlock;
use linesmith_foundation::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 도구 레지스트리
///
/// ## 사용법
/// ```ignore
/// let registry = ToolRegistry::with_builtins();
///
/// let def = registry.lookup("dedup")?;
/// let block = registry.instantiate("sort")?;
/// ```
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// 등록 순서
    tools: Vec<ToolDefinition>,
    /// id/alias → tools 인덱스
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Builtin 도구들을 포함한 레지스트리 생성
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtin_definitions() {
            // builtin 카탈로그의 id는 고유함 (catalog 테스트로 보장)
            if let Err(e) = registry.register(def) {
                debug!("Skipping builtin tool: {}", e);
            }
        }
        registry
    }

    /// 도구 등록
    pub fn register(&mut self, def: ToolDefinition) -> Result<()> {
        let names: Vec<&String> = std::iter::once(&def.id).chain(def.aliases.iter()).collect();
        if let Some(taken) = names.iter().find(|n| self.index.contains_key(n.as_str())) {
            return Err(Error::Validation(format!(
                "Tool '{}' is already registered",
                taken
            )));
        }

        let position = self.tools.len();
        for name in names {
            self.index.insert(name.clone(), position);
        }
        debug!("Registered tool: {} ({})", def.id, def.category.title());
        self.tools.push(def);
        Ok(())
    }

    /// id 또는 alias로 조회
    pub fn lookup(&self, tool_id: &str) -> Result<&ToolDefinition> {
        self.get(tool_id)
            .ok_or_else(|| Error::UnknownTool(tool_id.to_string()))
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.index.get(tool_id).map(|&i| &self.tools[i])
    }

    /// alias를 정식 id로
    pub fn canonical_id(&self, tool_id: &str) -> Option<&str> {
        self.get(tool_id).map(|def| def.id.as_str())
    }

    /// 도구 존재 여부
    pub fn contains(&self, tool_id: &str) -> bool {
        self.index.contains_key(tool_id)
    }

    /// 등록 순서 목록
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 카테고리별 도구 목록 (카탈로그 순서, 빈 카테고리 제외)
    pub fn by_category(&self) -> Vec<(Category, Vec<&ToolDefinition>)> {
        Category::ALL
            .iter()
            .map(|category| {
                let tools: Vec<&ToolDefinition> = self
                    .tools
                    .iter()
                    .filter(|def| def.category == *category)
                    .collect();
                (*category, tools)
            })
            .filter(|(_, tools)| !tools.is_empty())
            .collect()
    }

    /// 기본 파라미터로 새 블록 생성
    pub fn instantiate(&self, tool_id: &str) -> Result<ProcessBlock> {
        let def = self.lookup(tool_id)?;
        Ok(ProcessBlock::new(def.id.clone(), def.default_params()))
    }

    /// 파라미터 값 검증
    pub fn validate_param(&self, tool_id: &str, name: &str, value: &Value) -> Result<()> {
        self.lookup(tool_id)?.params.validate(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::kind::ToolKind;
    use serde_json::json;

    #[test]
    fn test_registry_with_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 23);
        assert!(registry.contains("dedup"));
        assert!(registry.contains("js_function"));
        assert_eq!(registry.list()[0].id, "regex");
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = ToolRegistry::with_builtins();
        let err = registry.lookup("nunjucks").unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref id) if id == "nunjucks"));
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.lookup("deduplicate").unwrap().id, "dedup");
        assert_eq!(registry.canonical_id("ai_cleaner"), Some("clean_text"));
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("reverse", Category::OrderCompare, ToolKind::Reverse))
            .unwrap();
        let err = registry
            .register(ToolDefinition::new("reverse", Category::OrderCompare, ToolKind::Reverse))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = registry
            .register(
                ToolDefinition::new("flip", Category::OrderCompare, ToolKind::Reverse)
                    .alias("reverse"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("flip"));
    }

    #[test]
    fn test_by_category() {
        let registry = ToolRegistry::with_builtins();
        let groups = registry.by_category();
        assert_eq!(groups.len(), Category::ALL.len());
        assert_eq!(groups[0].0, Category::SearchClean);
        let ids: Vec<&str> = groups[1].1.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["dedup", "duplicates", "filter"]);
    }

    #[test]
    fn test_instantiate_uses_defaults() {
        let registry = ToolRegistry::with_builtins();
        let block = registry.instantiate("deduplicate").unwrap();
        assert_eq!(block.tool_id, "dedup");
        assert_eq!(block.params["trim"], json!(true));

        let shuffle = registry.instantiate("shuffle").unwrap();
        assert!(!shuffle.params["seed"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_validate_param() {
        let registry = ToolRegistry::with_builtins();
        assert!(registry.validate_param("sort", "direction", &json!("desc")).is_ok());
        assert!(registry.validate_param("sort", "direction", &json!("up")).is_err());
        assert!(registry
            .validate_param("compare", "listDelimiterCustom", &json!("|"))
            .is_ok());
    }
}
