//! Chain - 소스 텍스트 + 순서 있는 처리 블록 목록
//!
//! 블록의 순서가 곧 평가 순서입니다. 위치는 저장되지 않으며,
//! 블록은 항상 `BlockId`로 식별됩니다.

use super::BlockId;
use linesmith_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 블록 파라미터 (이름 → 값)
pub type Params = serde_json::Map<String, Value>;

/// 기본 구분자
pub const DEFAULT_DELIMITER: &str = "\n";

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

// ============================================================================
// ProcessBlock
// ============================================================================

/// 체인의 처리 블록 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBlock {
    pub id: BlockId,
    pub tool_id: String,
    #[serde(default)]
    pub params: Params,
}

impl ProcessBlock {
    pub fn new(tool_id: impl Into<String>, params: Params) -> Self {
        Self {
            id: BlockId::new(),
            tool_id: tool_id.into(),
            params,
        }
    }
}

// ============================================================================
// ChainSettings
// ============================================================================

/// 소스 분할 / 최종 결합 구분자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSettings {
    #[serde(default = "default_delimiter")]
    pub source_delimiter: String,

    #[serde(default = "default_delimiter")]
    pub final_delimiter: String,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            source_delimiter: default_delimiter(),
            final_delimiter: default_delimiter(),
        }
    }
}

impl ChainSettings {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Chain
// ============================================================================

/// 변환 체인
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub title: Option<String>,
    pub source_text: String,
    pub settings: ChainSettings,
    blocks: Vec<ProcessBlock>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source_text = text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 블록 추가 (builder)
    pub fn with_block(mut self, block: ProcessBlock) -> Self {
        self.blocks.push(block);
        self
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn blocks(&self) -> &[ProcessBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &BlockId) -> Option<&ProcessBlock> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// 현재 위치 (0부터)
    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// (toolId, params) 순서열이 같은지 비교 (블록 ID 제외)
    pub fn same_pipeline(&self, other: &Chain) -> bool {
        self.source_text == other.source_text
            && self.blocks.len() == other.blocks.len()
            && self
                .blocks
                .iter()
                .zip(other.blocks.iter())
                .all(|(a, b)| a.tool_id == b.tool_id && a.params == b.params)
    }

    // ========================================================================
    // 편집
    // ========================================================================

    pub fn set_source(&mut self, text: impl Into<String>) {
        self.source_text = text.into();
    }

    /// 맨 뒤에 추가, 새 위치 반환
    pub fn push(&mut self, block: ProcessBlock) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// `after` 위치 다음에 삽입 (`None`이면 맨 뒤), 새 위치 반환
    pub fn insert_after(&mut self, block: ProcessBlock, after: Option<usize>) -> usize {
        let index = match after {
            Some(pos) => pos.saturating_add(1).min(self.blocks.len()),
            None => self.blocks.len(),
        };
        self.blocks.insert(index, block);
        index
    }

    /// 블록 삭제 - 다른 블록의 ID와 파라미터는 그대로 유지
    pub fn remove(&mut self, id: &BlockId) -> Result<ProcessBlock> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))?;
        Ok(self.blocks.remove(index))
    }

    /// 블록 이동, 실제 위치 반환 (범위를 넘으면 맨 뒤)
    pub fn move_block(&mut self, id: &BlockId, new_position: usize) -> Result<usize> {
        let from = self
            .position(id)
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))?;
        let block = self.blocks.remove(from);
        let to = new_position.min(self.blocks.len());
        self.blocks.insert(to, block);
        Ok(to)
    }

    /// 파라미터 값 설정 (스키마 검증은 ToolRegistry에서)
    pub fn set_param(&mut self, id: &BlockId, name: &str, value: Value) -> Result<()> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))?;
        block.params.insert(name.to_string(), value);
        Ok(())
    }

    // ========================================================================
    // 줄 분할 / 결합
    // ========================================================================

    /// 소스 텍스트를 줄 목록으로 분할 (빈 텍스트는 줄 없음)
    pub fn source_lines(&self) -> Vec<String> {
        if self.source_text.is_empty() {
            return Vec::new();
        }
        let delimiter = non_empty_or_default(&self.settings.source_delimiter);
        self.source_text
            .split(delimiter)
            .map(str::to_string)
            .collect()
    }

    /// 최종 출력 결합
    pub fn join_output(&self, lines: &[String]) -> String {
        lines.join(non_empty_or_default(&self.settings.final_delimiter))
    }
}

fn non_empty_or_default(delimiter: &str) -> &str {
    if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(tool: &str) -> ProcessBlock {
        ProcessBlock::new(tool, Params::new())
    }

    #[test]
    fn test_insert_after() {
        let mut chain = Chain::new();
        chain.push(block("trim"));
        chain.push(block("sort"));

        let pos = chain.insert_after(block("case"), Some(0));
        assert_eq!(pos, 1);
        let tools: Vec<_> = chain.blocks().iter().map(|b| b.tool_id.as_str()).collect();
        assert_eq!(tools, vec!["trim", "case", "sort"]);

        let pos = chain.insert_after(block("dedup"), Some(99));
        assert_eq!(pos, 3);
        let pos = chain.insert_after(block("join"), None);
        assert_eq!(pos, 4);
        let pos = chain.insert_after(block("wrapper"), Some(usize::MAX));
        assert_eq!(pos, 5);
        assert_eq!(chain.blocks()[5].tool_id, "wrapper");
    }

    #[test]
    fn test_remove_preserves_others() {
        let mut chain = Chain::new();
        let a = block("trim");
        let b = block("sort");
        let a_id = a.id.clone();
        let b_id = b.id.clone();
        chain.push(a);
        chain.push(b);
        chain
            .set_param(&b_id, "direction", Value::from("desc"))
            .unwrap();

        chain.remove(&a_id).unwrap();
        assert_eq!(chain.len(), 1);
        let remaining = chain.block(&b_id).unwrap();
        assert_eq!(remaining.params["direction"], "desc");

        assert!(matches!(chain.remove(&a_id), Err(Error::BlockNotFound(_))));
    }

    #[test]
    fn test_move_block() {
        let mut chain = Chain::new();
        let ids: Vec<BlockId> = ["a", "b", "c"]
            .iter()
            .map(|t| {
                let b = block(t);
                let id = b.id.clone();
                chain.push(b);
                id
            })
            .collect();

        assert_eq!(chain.move_block(&ids[0], 2).unwrap(), 2);
        assert_eq!(chain.position(&ids[0]), Some(2));
        assert_eq!(chain.position(&ids[1]), Some(0));

        assert_eq!(chain.move_block(&ids[1], 50).unwrap(), 2);
    }

    #[test]
    fn test_source_lines() {
        let chain = Chain::new();
        assert!(chain.source_lines().is_empty());

        let chain = Chain::new().with_source("a\nb\n");
        assert_eq!(chain.source_lines(), vec!["a", "b", ""]);

        let mut chain = Chain::new().with_source("a,b");
        chain.settings.source_delimiter = ",".into();
        chain.settings.final_delimiter = " | ".into();
        let lines = chain.source_lines();
        assert_eq!(chain.join_output(&lines), "a | b");
    }

    #[test]
    fn test_same_pipeline_ignores_ids() {
        let a = Chain::new().with_source("x").with_block(block("trim"));
        let b = Chain::new().with_source("x").with_block(block("trim"));
        assert_ne!(a, b);
        assert!(a.same_pipeline(&b));
    }
}
