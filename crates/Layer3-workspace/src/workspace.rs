//! Workspace - 편집 중인 체인 하나와 그 평가 결과
//!
//! ## 이벤트 처리
//!
//! ```text
//! SourceChanged ──▶ Debouncer ──(deadline)──▶ apply + evaluate ──▶ listeners
//!
//! BlockAdded / Removed / Moved / ParamChanged / Reset / Loaded
//!        │
//!        ├─ 1. 대기 중인 편집 flush (apply + evaluate)
//!        └─ 2. 변경 적용 + 즉시 evaluate
//! ```
//!
//! 모든 변경은 `&mut self`에서 끝까지 처리된 뒤에 다음 변경을 받습니다.
//! 실패한 변경(알 수 없는 도구, 손상된 페이로드 등)은 상태를 건드리지 않습니다.

use crate::debounce::Debouncer;
use crate::event::{LoadSource, WorkspaceEvent};
use crate::listener::{EvaluationListener, ListenerManager};
use linesmith_core::{
    payload_from_link, share_link, BlockId, Chain, ChainSerializer, ChainStore, DecodeOutcome,
    EvaluationResult, Evaluator, SandboxLimits, SaveMode, ToolRegistry, TransformContext,
};
use linesmith_foundation::{Error, LinesmithConfig, Result, ShareSettings};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 편집 세션
pub struct Workspace {
    chain: Chain,
    registry: Arc<ToolRegistry>,
    evaluator: Evaluator,
    store: ChainStore,
    share: ShareSettings,
    result: EvaluationResult,
    /// 저장소에 연결된 현재 체인 이름
    active_name: Option<String>,
    listeners: ListenerManager,
    debouncer: Debouncer<String>,
}

impl Workspace {
    /// 새 워크스페이스 (빈 체인)
    ///
    /// `store`의 직렬화기가 디코딩 정책을 결정합니다.
    pub fn new(registry: Arc<ToolRegistry>, store: ChainStore, config: &LinesmithConfig) -> Self {
        let ctx = TransformContext::new(SandboxLimits::from(&config.sandbox));
        let evaluator = Evaluator::new(registry.clone(), ctx);
        let chain = Chain::new();
        let result = evaluator.evaluate(&chain);

        Self {
            chain,
            registry,
            evaluator,
            store,
            share: config.share.clone(),
            result,
            active_name: None,
            listeners: ListenerManager::new(),
            debouncer: Debouncer::new(config.evaluation.debounce()),
        }
    }

    /// 리스너 추가 (builder)
    pub fn with_listener<L: EvaluationListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.add(listener);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn EvaluationListener>) {
        self.listeners.add_arc(listener);
    }

    /// 시작 시 초기화
    ///
    /// 링크에 체인 페이로드가 있으면 그것으로 먼저 채우고, 없거나 실패하면
    /// 빈 체인으로 시작합니다. 실패 시 에러를 돌려주지만 워크스페이스는 사용 가능합니다.
    pub fn initialize(&mut self, link: Option<&str>) -> Result<()> {
        if let Some(payload) = link.and_then(|l| payload_from_link(l, &self.share.param)) {
            match self.load_payload(&payload) {
                Ok(_) => {
                    info!("Workspace hydrated from shared link");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Shared link could not be loaded: {}", e);
                    self.replace_chain(Chain::new(), None);
                    return Err(e);
                }
            }
        }
        self.replace_chain(Chain::new(), None);
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// 최신 평가 결과 (대기 중인 편집은 반영되지 않음)
    pub fn result(&self) -> &EvaluationResult {
        &self.result
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_name.as_deref()
    }

    /// 표시용 제목
    pub fn title(&self) -> Option<&str> {
        self.chain.title.as_deref()
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn has_pending_edit(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// 대기 중인 편집의 평가 예정 시각
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    // ========================================================================
    // 이벤트
    // ========================================================================

    pub fn dispatch(&mut self, event: WorkspaceEvent) -> Result<()> {
        self.dispatch_at(event, Instant::now())
    }

    /// 이벤트 처리 (시각 지정)
    pub fn dispatch_at(&mut self, event: WorkspaceEvent, now: Instant) -> Result<()> {
        debug!("Workspace event: {}", event.name());
        match event {
            WorkspaceEvent::SourceChanged { text } => {
                self.edit_source_at(text, now);
                Ok(())
            }
            WorkspaceEvent::BlockAdded {
                tool_id,
                after_position,
            } => self.add_block(&tool_id, after_position).map(|_| ()),
            WorkspaceEvent::BlockRemoved { block_id } => self.remove_block(&block_id),
            WorkspaceEvent::BlockMoved {
                block_id,
                new_position,
            } => self.move_block(&block_id, new_position).map(|_| ()),
            WorkspaceEvent::ParamChanged {
                block_id,
                name,
                value,
            } => self.set_param(&block_id, &name, value),
            WorkspaceEvent::Reset => {
                self.reset();
                Ok(())
            }
            WorkspaceEvent::Loaded { source } => match source {
                LoadSource::Saved(name) => self.load_saved(&name),
                LoadSource::Payload(payload) => self.load_payload(&payload).map(|_| ()),
            },
        }
    }

    /// 소스 편집 (디바운스)
    pub fn edit_source_at(&mut self, text: impl Into<String>, now: Instant) {
        self.debouncer.push(text.into(), now);
        if self.debouncer.is_immediate() {
            self.flush();
        }
    }

    /// deadline이 지난 편집 반영, 평가했으면 `true`
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(text) => {
                self.apply_source(text);
                true
            }
            None => false,
        }
    }

    /// 대기 중인 편집 즉시 반영, 평가했으면 `true`
    pub fn flush(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(text) => {
                self.apply_source(text);
                true
            }
            None => false,
        }
    }

    fn apply_source(&mut self, text: String) {
        self.chain.set_source(text);
        self.evaluate();
    }

    // ========================================================================
    // 블록 편집
    // ========================================================================

    /// 도구 추가 (`after` 위치 다음, `None`이면 맨 뒤)
    pub fn add_block(&mut self, tool_id: &str, after: Option<usize>) -> Result<BlockId> {
        let block = self.registry.instantiate(tool_id)?;
        let id = block.id.clone();
        self.flush();
        self.chain.insert_after(block, after);
        self.evaluate();
        Ok(id)
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<()> {
        self.ensure_block(id)?;
        self.flush();
        self.chain.remove(id)?;
        self.evaluate();
        Ok(())
    }

    /// 블록 이동, 실제 위치 반환
    pub fn move_block(&mut self, id: &BlockId, new_position: usize) -> Result<usize> {
        self.ensure_block(id)?;
        self.flush();
        let position = self.chain.move_block(id, new_position)?;
        self.evaluate();
        Ok(position)
    }

    /// 파라미터 변경 (스키마 검증 후 적용)
    pub fn set_param(&mut self, id: &BlockId, name: &str, value: Value) -> Result<()> {
        let tool_id = self.ensure_block(id)?;
        self.registry.validate_param(&tool_id, name, &value)?;
        self.flush();
        self.chain.set_param(id, name, value)?;
        self.evaluate();
        Ok(())
    }

    fn ensure_block(&self, id: &BlockId) -> Result<String> {
        self.chain
            .block(id)
            .map(|b| b.tool_id.clone())
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))
    }

    /// 새 체인
    pub fn reset(&mut self) {
        self.flush();
        self.replace_chain(Chain::new(), None);
    }

    // ========================================================================
    // 불러오기 / 저장
    // ========================================================================

    /// 페이로드(공유 링크 / 내보내기 JSON)에서 불러오기
    ///
    /// 레거시 페이로드에는 소스 텍스트가 없으므로 현재 소스를 유지합니다.
    pub fn load_payload(&mut self, payload: &str) -> Result<DecodeOutcome> {
        let outcome = self.serializer().decode(payload)?;
        self.flush();

        let mut chain = outcome.chain.clone();
        if !outcome.source_included {
            chain.set_source(self.chain.source_text.clone());
        }
        self.replace_chain(chain, None);
        Ok(outcome)
    }

    /// 저장된 체인 불러오기
    pub fn load_saved(&mut self, name: &str) -> Result<()> {
        let chain = self.store.load(name)?;
        let name = chain.title.clone();
        self.flush();
        self.replace_chain(chain, name);
        Ok(())
    }

    /// 현재 체인 저장. 이후 이 이름이 활성 이름이 됨
    pub fn save(&mut self, name: &str, mode: SaveMode) -> Result<()> {
        self.flush();
        let mut chain = self.chain.clone();
        chain.title = Some(name.trim().to_string());
        let entry = self.store.save(name, &chain, mode)?;
        self.chain.title = Some(entry.name.clone());
        self.active_name = Some(entry.name);
        Ok(())
    }

    /// 저장된 체인 이름 변경 (활성 체인이면 제목도 변경)
    pub fn rename_saved(&mut self, old: &str, new: &str) -> Result<()> {
        let entry = self.store.rename(old, new)?;
        if self.active_name.as_deref() == Some(old.trim()) {
            self.chain.title = Some(entry.name.clone());
            self.active_name = Some(entry.name);
        }
        Ok(())
    }

    /// 저장된 체인 삭제 (활성 체인이면 저장 안 된 상태로)
    pub fn delete_saved(&mut self, name: &str) -> Result<()> {
        self.store.delete(name)?;
        if self.active_name.as_deref() == Some(name.trim()) {
            self.active_name = None;
        }
        Ok(())
    }

    /// 현재 체인의 공유 링크
    pub fn share_link(&mut self) -> Result<String> {
        self.flush();
        let payload = self.serializer().encode(&self.chain)?;
        share_link(&self.share, &payload)
    }

    fn serializer(&self) -> &ChainSerializer {
        self.store.serializer()
    }

    // ========================================================================
    // 평가
    // ========================================================================

    fn replace_chain(&mut self, chain: Chain, active_name: Option<String>) {
        self.chain = chain;
        self.active_name = active_name;
        self.evaluate();
    }

    fn evaluate(&mut self) {
        let result = self.evaluator.evaluate(&self.chain);
        if result != self.result {
            self.result = result;
            self.listeners.notify(&self.result);
        }
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("chain", &self.chain)
            .field("active_name", &self.active_name)
            .field("listeners", &self.listeners)
            .field("pending_edit", &self.debouncer.is_pending())
            .finish()
    }
}
