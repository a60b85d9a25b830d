//! Builtin tools - 변환 함수 구현
//!
//! 모든 함수는 순수 함수입니다: 같은 입력과 파라미터면 항상 같은 출력.

pub mod codec;
pub mod compare;
pub mod csv;
pub mod hex;
pub mod json;
pub mod lines;
pub mod pattern;
pub mod script;
pub mod sort;
pub mod text;
