//! Tool kinds - 변환 함수 디스패치
//!
//! 도구 하나 = variant 하나. 새 도구는 variant 추가 + 카탈로그 등록으로 확장합니다.

use super::builtin::{codec, compare, csv, hex, json, lines, pattern, script, sort, text};
use super::output::{TransformContext, TransformOutput};
use super::params::ParamReader;
use crate::model::Params;
use linesmith_foundation::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    // Search & Clean
    Regex,
    CleanText,

    // Remove & Filter
    Dedup,
    Duplicates,
    Filter,

    // Order & Compare
    Sort,
    Reverse,
    Shuffle,
    Compare,

    // Text Transform
    Case,
    Trim,
    Wrapper,

    // Formats
    Csv,
    JsonFormat,
    JsonPath,
    Split,
    Encode,
    Hash,
    ToHex,
    FromHex,

    // Assembly
    Join,
    AddLine,
    JsFunction,
}

impl ToolKind {
    /// 변환 실행. `Err`는 블록 에러가 됩니다
    pub fn transform(
        &self,
        input: &[String],
        params: &Params,
        ctx: &TransformContext,
    ) -> Result<TransformOutput> {
        let p = ParamReader::new(params);
        match self {
            ToolKind::Regex => pattern::regex(input, &p),
            ToolKind::CleanText => Ok(text::clean_text(input, &p)),
            ToolKind::Dedup => Ok(lines::dedup(input, &p)),
            ToolKind::Duplicates => Ok(lines::duplicates(input, &p)),
            ToolKind::Filter => Ok(lines::filter(input, &p)),
            ToolKind::Sort => Ok(sort::sort(input, &p)),
            ToolKind::Reverse => Ok(lines::reverse(input)),
            ToolKind::Shuffle => Ok(lines::shuffle(input, &p)),
            ToolKind::Compare => Ok(compare::compare(input, &p)),
            ToolKind::Case => Ok(text::case(input, &p)),
            ToolKind::Trim => Ok(text::trim(input, &p)),
            ToolKind::Wrapper => Ok(text::wrapper(input, &p)),
            ToolKind::Csv => Ok(csv::csv(input, &p)),
            ToolKind::JsonFormat => json::json_format(input, &p),
            ToolKind::JsonPath => json::json_path(input, &p),
            ToolKind::Split => Ok(lines::split(input, &p)),
            ToolKind::Encode => Ok(codec::encode(input, &p)),
            ToolKind::Hash => codec::hash(input, &p),
            ToolKind::ToHex => Ok(hex::to_hex(input, &p)),
            ToolKind::FromHex => hex::from_hex(input, &p),
            ToolKind::Join => Ok(lines::join(input, &p)),
            ToolKind::AddLine => Ok(lines::add_line(input, &p)),
            ToolKind::JsFunction => script::js_function(input, &p, ctx),
        }
    }

    /// 새 블록 생성 시 파라미터 초기화 (셔플 시드 등)
    pub fn init_params(&self, params: &mut Params) {
        if let ToolKind::Shuffle = self {
            lines::init_shuffle_seed(params);
        }
    }
}
