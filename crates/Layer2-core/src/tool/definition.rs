//! Tool definitions and catalog categories

use super::kind::ToolKind;
use super::output::{TransformContext, TransformOutput};
use super::schema::{ParamSchema, ParamSpec};
use crate::model::Params;
use linesmith_foundation::Result;
use serde::Serialize;

/// 카탈로그 그룹 (표시 순서대로)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SearchClean,
    RemoveFilter,
    OrderCompare,
    TextTransform,
    Formats,
    Assembly,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::SearchClean,
        Category::RemoveFilter,
        Category::OrderCompare,
        Category::TextTransform,
        Category::Formats,
        Category::Assembly,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::SearchClean => "Search & Clean",
            Category::RemoveFilter => "Remove & Filter",
            Category::OrderCompare => "Order & Compare",
            Category::TextTransform => "Text Transform",
            Category::Formats => "Formats & Encoding",
            Category::Assembly => "Assembly",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// 도구 정의 (불변)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub params: ParamSchema,
    #[serde(skip)]
    pub kind: ToolKind,
}

impl ToolDefinition {
    pub fn new(id: impl Into<String>, category: Category, kind: ToolKind) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: String::new(),
            category,
            help: None,
            aliases: Vec::new(),
            params: ParamSchema::default(),
            kind,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn help(mut self, url: impl Into<String>) -> Self {
        self.help = Some(url.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// 새 블록에 들어갈 기본 파라미터
    pub fn default_params(&self) -> Params {
        let mut params = self.params.defaults();
        self.kind.init_params(&mut params);
        params
    }

    /// 변환 실행. 누락된 파라미터는 기본값으로 채우고 select 값은 검증
    pub fn transform(
        &self,
        lines: &[String],
        params: &Params,
        ctx: &TransformContext,
    ) -> Result<TransformOutput> {
        let effective = self.params.effective(params);
        self.params.validate_choices(&effective)?;
        self.kind.transform(lines, &effective, ctx)
    }
}
