//! Debouncer - 연속된 편집을 한 번의 평가로 합침
//!
//! 마지막 값만 남기고 deadline을 뒤로 미룹니다. 값은 절대 버려지지 않으며
//! `poll`에서 deadline이 지나거나 `flush`로 즉시 꺼낼 수 있습니다.
//! 시간은 호출자가 넘겨줍니다 (테스트에서 시계를 고정하기 위해).

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 지연 없음 (매 값마다 즉시 처리)
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }

    /// 새 값 (이전 대기 값은 교체, deadline은 now + delay)
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// deadline이 지났으면 값 반환
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// 대기 중인 값을 즉시 반환
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}
