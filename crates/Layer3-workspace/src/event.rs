//! Workspace events (UI에서 들어오는 입력)

use linesmith_core::BlockId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 불러올 체인의 출처
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", content = "value", rename_all = "camelCase")]
pub enum LoadSource {
    /// 저장소의 이름
    Saved(String),
    /// 공유 링크 / 내보내기 페이로드
    Payload(String),
}

/// 워크스페이스 입력 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkspaceEvent {
    SourceChanged {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    BlockAdded {
        tool_id: String,
        after_position: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    BlockRemoved {
        block_id: BlockId,
    },
    #[serde(rename_all = "camelCase")]
    BlockMoved {
        block_id: BlockId,
        new_position: usize,
    },
    #[serde(rename_all = "camelCase")]
    ParamChanged {
        block_id: BlockId,
        name: String,
        value: Value,
    },
    Reset,
    Loaded {
        source: LoadSource,
    },
}

impl WorkspaceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceEvent::SourceChanged { .. } => "source_changed",
            WorkspaceEvent::BlockAdded { .. } => "block_added",
            WorkspaceEvent::BlockRemoved { .. } => "block_removed",
            WorkspaceEvent::BlockMoved { .. } => "block_moved",
            WorkspaceEvent::ParamChanged { .. } => "param_changed",
            WorkspaceEvent::Reset => "reset",
            WorkspaceEvent::Loaded { .. } => "loaded",
        }
    }

    /// 디바운스 대상이 아닌 이벤트 (대기 중인 편집을 먼저 반영)
    pub fn is_structural(&self) -> bool {
        !matches!(self, WorkspaceEvent::SourceChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_json_shape() {
        let event: WorkspaceEvent = serde_json::from_value(json!({
            "type": "blockAdded",
            "toolId": "sort",
            "afterPosition": 0
        }))
        .unwrap();
        assert_eq!(
            event,
            WorkspaceEvent::BlockAdded {
                tool_id: "sort".into(),
                after_position: Some(0)
            }
        );
        assert!(event.is_structural());

        let loaded = WorkspaceEvent::Loaded {
            source: LoadSource::Saved("daily".into()),
        };
        let value = serde_json::to_value(&loaded).unwrap();
        assert_eq!(value, json!({"type": "loaded", "source": {"from": "saved", "value": "daily"}}));
    }

    #[test]
    fn test_source_change_is_not_structural() {
        let event = WorkspaceEvent::SourceChanged { text: "x".into() };
        assert!(!event.is_structural());
        assert_eq!(event.name(), "source_changed");
    }
}
