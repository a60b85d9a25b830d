//! Evaluation listeners
//!
//! 평가 결과가 바뀔 때마다 호출됩니다. UI, CLI 출력, 로깅 등이 여기에 붙습니다.

use linesmith_core::EvaluationResult;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// EvaluationListener Trait
// ============================================================================

/// 평가 결과 수신자
pub trait EvaluationListener: Send + Sync {
    /// 리스너 이름 (디버깅/로깅용)
    fn name(&self) -> &str {
        "unnamed-listener"
    }

    /// 새 평가 결과
    fn on_evaluation(&self, result: &EvaluationResult);
}

// ============================================================================
// ListenerManager
// ============================================================================

/// 등록된 리스너들에게 순서대로 결과를 전달
#[derive(Default, Clone)]
pub struct ListenerManager {
    listeners: Vec<Arc<dyn EvaluationListener>>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 리스너 추가
    pub fn add<L: EvaluationListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    /// Arc로 감싼 리스너 추가
    pub fn add_arc(&mut self, listener: Arc<dyn EvaluationListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// 모든 리스너에 전달
    pub fn notify(&self, result: &EvaluationResult) {
        for listener in &self.listeners {
            listener.on_evaluation(result);
        }
    }
}

impl std::fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|l| l.name()).collect();
        f.debug_struct("ListenerManager")
            .field("listeners", &names)
            .finish()
    }
}

// ============================================================================
// Builtin Listeners
// ============================================================================

/// 평가 요약을 debug 로그로 남김
pub struct LoggingListener;

impl EvaluationListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_evaluation(&self, result: &EvaluationResult) {
        let failed = result.errors().count();
        debug!(
            blocks = result.blocks.len(),
            failed,
            lines = result.final_lines.len(),
            "Chain evaluated"
        );
    }
}
