//! Evaluator - 체인을 왼쪽에서 오른쪽으로 평가
//!
//! ## 평가 규칙
//!
//! ```text
//! sourceText ──split──▶ lines ──▶ block[0] ──▶ block[1] ──▶ ... ──join──▶ finalOutput
//!                                    │
//!                                    └─ 실패 시: 에러 기록 + 입력 그대로 통과
//! ```
//!
//! - 블록 k의 입력 = 블록 k-1의 출력 (k=0이면 소스 줄)
//! - 실패한 블록(알 수 없는 도구 포함)의 출력은 입력과 같음
//! - 같은 체인은 항상 같은 결과 (순수 함수)

use crate::model::{BlockId, Chain};
use crate::tool::{LineError, Stats, ToolRegistry, TransformContext};
use linesmith_foundation::{Error, ErrorKind};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Results
// ============================================================================

/// 블록에 붙은 에러 (표시용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for BlockError {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for BlockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// 블록 하나의 평가 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
    pub block_id: BlockId,
    pub tool_id: String,
    pub output_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BlockError>,
    #[serde(skip_serializing_if = "Stats::is_empty")]
    pub stats: Stats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_errors: Vec<LineError>,
}

impl BlockResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 체인 전체 평가 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub blocks: Vec<BlockResult>,
    pub final_lines: Vec<String>,
    pub final_output: String,
}

impl EvaluationResult {
    pub fn block(&self, id: &BlockId) -> Option<&BlockResult> {
        self.blocks.iter().find(|b| &b.block_id == id)
    }

    /// 에러가 있는 블록들
    pub fn errors(&self) -> impl Iterator<Item = &BlockResult> {
        self.blocks.iter().filter(|b| b.error.is_some())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// 체인 평가기
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<ToolRegistry>,
    ctx: TransformContext,
}

impl Evaluator {
    pub fn new(registry: Arc<ToolRegistry>, ctx: TransformContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &TransformContext {
        &self.ctx
    }

    /// 체인 평가
    pub fn evaluate(&self, chain: &Chain) -> EvaluationResult {
        let mut lines = chain.source_lines();
        let mut blocks = Vec::with_capacity(chain.len());

        for block in chain.blocks() {
            let outcome = self
                .registry
                .lookup(&block.tool_id)
                .and_then(|def| def.transform(&lines, &block.params, &self.ctx));

            let result = match outcome {
                Ok(output) => {
                    lines = output.lines;
                    BlockResult {
                        block_id: block.id.clone(),
                        tool_id: block.tool_id.clone(),
                        output_lines: lines.clone(),
                        error: None,
                        stats: output.stats,
                        line_errors: output.line_errors,
                    }
                }
                Err(e) => {
                    debug!("Block {} ({}) failed: {}", block.id, block.tool_id, e);
                    BlockResult {
                        block_id: block.id.clone(),
                        tool_id: block.tool_id.clone(),
                        output_lines: lines.clone(),
                        error: Some(BlockError::from(&e)),
                        stats: Stats::new(),
                        line_errors: Vec::new(),
                    }
                }
            };
            blocks.push(result);
        }

        let final_output = chain.join_output(&lines);
        EvaluationResult {
            blocks,
            final_lines: lines,
            final_output,
        }
    }
}
