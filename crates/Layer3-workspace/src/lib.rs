//! # linesmith-workspace
//!
//! 편집 세션 레이어 - UI 이벤트를 받아 체인을 변경하고 평가 결과를 알립니다.
//!
//! ## 핵심 컴포넌트
//!
//! - **Workspace**: 활성 체인 하나, 마지막 평가 결과, 활성 저장 이름
//! - **WorkspaceEvent**: 소스 편집, 블록 추가/삭제/이동, 파라미터 변경, 리셋, 불러오기
//! - **Debouncer**: 소스 편집만 지연시켜 합침 (구조 변경은 즉시)
//! - **EvaluationListener**: 평가 결과가 바뀔 때 호출
//!
//! ## 사용 예
//!
//! ```ignore
//! use linesmith_workspace::{Workspace, WorkspaceEvent, LoggingListener};
//!
//! let mut ws = Workspace::new(registry, store, &config).with_listener(LoggingListener);
//! ws.initialize(Some("https://linesmith.local/?chain=eyJ2ZXJzaW9uIjoy..."))?;
//!
//! ws.dispatch(WorkspaceEvent::BlockAdded { tool_id: "sort".into(), after_position: None })?;
//! println!("{}", ws.result().final_output);
//! ```

pub mod debounce;
pub mod event;
pub mod listener;
pub mod workspace;

pub use debounce::Debouncer;
pub use event::{LoadSource, WorkspaceEvent};
pub use listener::{EvaluationListener, ListenerManager, LoggingListener};
pub use workspace::Workspace;
