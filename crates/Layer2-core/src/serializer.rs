//! Chain Serializer - 체인 ↔ 페이로드 변환
//!
//! ## 페이로드 형식 (v2)
//!
//! ```json
//! {
//!   "version": 2,
//!   "sourceText": "a\nb",
//!   "blocks": [{ "toolId": "sort", "params": { "direction": "desc" } }],
//!   "title": "optional",
//!   "settings": { "sourceDelimiter": "\n", "finalDelimiter": "\n" }
//! }
//! ```
//!
//! 링크용 인코딩은 JSON → base64url (패딩 없음).
//! 디코딩은 표준/URL-safe base64 (패딩 유무 무관)와 원본 JSON을 모두 받습니다.
//!
//! ## 레거시 (v1)
//!
//! 버전 필드가 없는 `{blocks: [{type: "source", params}, {type, params}...], settings}`
//! 또는 블록 배열. 소스 텍스트는 들어있지 않으며 디코딩 시 v2로 변환됩니다.

use crate::model::{Chain, ChainSettings, Params, ProcessBlock, DEFAULT_DELIMITER};
use crate::tool::{unescape_delimiter, ToolRegistry, CUSTOM_SUFFIX};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use linesmith_foundation::{DecodePolicy, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// 현재 페이로드 버전
pub const PAYLOAD_VERSION: u32 = 2;

/// 레거시 페이로드 버전 (버전 필드 없음)
pub const LEGACY_VERSION: u32 = 1;

// ============================================================================
// Payload types
// ============================================================================

/// 직렬화된 체인
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainPayload {
    pub version: u32,

    #[serde(default)]
    pub source_text: String,

    #[serde(default)]
    pub blocks: Vec<PayloadBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ChainSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadBlock {
    pub tool_id: String,

    #[serde(default)]
    pub params: Params,
}

impl From<&Chain> for ChainPayload {
    fn from(chain: &Chain) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            source_text: chain.source_text.clone(),
            blocks: chain
                .blocks()
                .iter()
                .map(|b| PayloadBlock {
                    tool_id: b.tool_id.clone(),
                    params: b.params.clone(),
                })
                .collect(),
            title: chain.title.clone(),
            settings: (!chain.settings.is_default()).then(|| chain.settings.clone()),
        }
    }
}

/// 디코딩 결과
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub chain: Chain,
    /// 레지스트리에 없어 건너뛴 도구 id (등장 순서)
    pub skipped: Vec<String>,
    /// 레거시 형식에서 변환되었으면 원래 버전
    pub upgraded_from: Option<u32>,
    /// 페이로드에 소스 텍스트가 들어있었는지 (v1은 없음)
    pub source_included: bool,
}

// ============================================================================
// ChainSerializer
// ============================================================================

/// 체인 직렬화기
///
/// ## 사용법
/// ```ignore
/// let serializer = ChainSerializer::new(registry.clone());
///
/// let payload = serializer.encode(&chain)?;
/// let outcome = serializer.decode(&payload)?;
/// assert!(outcome.chain.same_pipeline(&chain));
/// ```
#[derive(Debug, Clone)]
pub struct ChainSerializer {
    registry: Arc<ToolRegistry>,
    policy: DecodePolicy,
}

impl ChainSerializer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            policy: DecodePolicy::default(),
        }
    }

    /// 알 수 없는 도구 처리 정책 설정
    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    // ========================================================================
    // Encode
    // ========================================================================

    /// 링크용 압축 텍스트 (JSON → base64url)
    pub fn encode(&self, chain: &Chain) -> Result<String> {
        let json = serde_json::to_string(&ChainPayload::from(chain))?;
        Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
    }

    /// 내보내기용 JSON (사람이 읽을 수 있는 형태)
    pub fn to_json(&self, chain: &Chain) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ChainPayload::from(chain))?)
    }

    // ========================================================================
    // Decode
    // ========================================================================

    /// base64 (양쪽 알파벳) 또는 JSON 텍스트를 체인으로
    pub fn decode(&self, payload: &str) -> Result<DecodeOutcome> {
        let json = payload_json(payload)?;
        let value: Value = serde_json::from_str(&json)
            .map_err(|e| Error::Serialization(format!("Payload is not valid JSON: {}", e)))?;
        self.decode_value(value)
    }

    /// 이미 파싱된 JSON 값을 체인으로
    pub fn decode_value(&self, value: Value) -> Result<DecodeOutcome> {
        let payload = match payload_version(&value)? {
            PAYLOAD_VERSION => serde_json::from_value::<ChainPayload>(value)
                .map_err(|e| Error::Serialization(format!("Malformed chain payload: {}", e)))?,
            LEGACY_VERSION => {
                let payload = upgrade_legacy(&value)?;
                info!(
                    "Upgraded chain payload v{} -> v{} ({} blocks)",
                    LEGACY_VERSION,
                    PAYLOAD_VERSION,
                    payload.blocks.len()
                );
                return self.build(payload, Some(LEGACY_VERSION), false);
            }
            other => {
                return Err(Error::Serialization(format!(
                    "Unsupported payload version {} (expected {})",
                    other, PAYLOAD_VERSION
                )))
            }
        };
        self.build(payload, None, true)
    }

    fn build(
        &self,
        payload: ChainPayload,
        upgraded_from: Option<u32>,
        source_included: bool,
    ) -> Result<DecodeOutcome> {
        let mut chain = Chain::new()
            .with_source(payload.source_text)
            .with_settings(payload.settings.unwrap_or_default());
        chain.title = payload.title;

        let mut skipped = Vec::new();
        for block in payload.blocks {
            if !self.registry.contains(&block.tool_id) {
                match self.policy {
                    DecodePolicy::Strict => return Err(Error::UnknownTool(block.tool_id)),
                    DecodePolicy::SkipUnknown => {
                        warn!("Skipping unknown tool in payload: {}", block.tool_id);
                        skipped.push(block.tool_id);
                        continue;
                    }
                }
            }
            chain.push(ProcessBlock::new(block.tool_id, block.params));
        }

        Ok(DecodeOutcome {
            chain,
            skipped,
            upgraded_from,
            source_included,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// 입력 텍스트에서 JSON 문자열 추출
fn payload_json(payload: &str) -> Result<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(Error::Serialization("Empty payload".to_string()));
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed.to_string());
    }

    // 표준 알파벳을 URL-safe로 맞추고 패딩 제거
    let normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| Error::Serialization(format!("Payload is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| Error::Serialization("Payload is not valid UTF-8".to_string()))
}

/// 페이로드 버전 판별
fn payload_version(value: &Value) -> Result<u32> {
    match value {
        Value::Array(_) => Ok(LEGACY_VERSION),
        Value::Object(map) => match map.get("version") {
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| Error::Serialization(format!("Invalid payload version: {}", v))),
            None if map.contains_key("blocks") => Ok(LEGACY_VERSION),
            None => Err(Error::Serialization(
                "Unrecognized chain payload".to_string(),
            )),
        },
        _ => Err(Error::Serialization(
            "Chain payload must be an object or array".to_string(),
        )),
    }
}

/// v1 → v2 변환
fn upgrade_legacy(value: &Value) -> Result<ChainPayload> {
    let (blocks, settings) = match value {
        Value::Array(blocks) => (blocks.as_slice(), None),
        Value::Object(map) => match map.get("blocks") {
            Some(Value::Array(blocks)) => (blocks.as_slice(), map.get("settings")),
            _ => {
                return Err(Error::Serialization(
                    "Legacy payload has no block list".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::Serialization(
                "Chain payload must be an object or array".to_string(),
            ))
        }
    };

    let is_source = |b: &Value| b.get("type").and_then(Value::as_str) == Some("source");
    let Some(source) = blocks.first().filter(|b| is_source(*b)) else {
        return Err(Error::Serialization(
            "Legacy payload must start with a source block".to_string(),
        ));
    };

    let empty = Params::new();
    let source_params = source
        .get("params")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let mut chain_settings = ChainSettings {
        source_delimiter: legacy_delimiter(source_params, "delimiter", "customDelimiter"),
        ..ChainSettings::default()
    };
    if let Some(Value::Object(s)) = settings {
        chain_settings.final_delimiter =
            legacy_delimiter(s, "finalDelimiter", "finalCustomDelimiter");
    }

    let mut out = Vec::new();
    for block in &blocks[1..] {
        if is_source(block) {
            continue;
        }
        let tool_id = block
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Serialization("Legacy block without a type".to_string()))?;
        let params = block
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let (tool_id, params) = upgrade_legacy_block(tool_id, params);
        out.push(PayloadBlock { tool_id, params });
    }

    Ok(ChainPayload {
        version: PAYLOAD_VERSION,
        source_text: String::new(),
        blocks: out,
        title: None,
        settings: (!chain_settings.is_default()).then_some(chain_settings),
    })
}

/// 레거시 도구 id / 파라미터 이름 변환
fn upgrade_legacy_block(tool_id: &str, mut params: Params) -> (String, Params) {
    match tool_id {
        "deduplicate" => ("dedup".to_string(), params),
        "compare" => {
            rename_key(&mut params, "list2", "secondList");
            rename_key(&mut params, "delimiter", "listDelimiter");
            rename_key(
                &mut params,
                &format!("delimiter{}", CUSTOM_SUFFIX),
                &format!("listDelimiter{}", CUSTOM_SUFFIX),
            );
            if params.get("operation").and_then(Value::as_str) == Some("diff") {
                params.insert("operation".to_string(), Value::from("onlyFirst"));
            }
            ("compare".to_string(), params)
        }
        other => (other.to_string(), params),
    }
}

fn rename_key(params: &mut Params, from: &str, to: &str) {
    if let Some(value) = params.remove(from) {
        params.entry(to.to_string()).or_insert(value);
    }
}

/// 레거시 구분자 (`custom` + 별도 값, `\n` 이스케이프)
fn legacy_delimiter(params: &Params, key: &str, custom_key: &str) -> String {
    let mut value = params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("\\n")
        .to_string();
    if value == "custom" {
        value = params
            .get(custom_key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }
    let value = unescape_delimiter(&value);
    if value.is_empty() {
        DEFAULT_DELIMITER.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn serializer() -> ChainSerializer {
        ChainSerializer::new(Arc::new(ToolRegistry::with_builtins()))
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    fn sample() -> Chain {
        Chain::new()
            .with_source("b\na\nb")
            .with_title("Sample")
            .with_block(ProcessBlock::new("dedup", params(json!({"trim": false}))))
            .with_block(ProcessBlock::new("sort", params(json!({"direction": "desc"}))))
    }

    // ========================================================================
    // Round trip
    // ========================================================================

    #[test]
    fn test_round_trip() {
        let s = serializer();
        let chain = sample();
        let encoded = s.encode(&chain).unwrap();
        assert!(!encoded.contains('=') && !encoded.contains('+') && !encoded.contains('/'));

        let outcome = s.decode(&encoded).unwrap();
        assert!(outcome.chain.same_pipeline(&chain));
        assert_eq!(outcome.chain.title.as_deref(), Some("Sample"));
        assert!(outcome.skipped.is_empty());
        assert!(outcome.source_included);
        assert_ne!(outcome.chain.blocks()[0].id, chain.blocks()[0].id);
    }

    #[test]
    fn test_default_settings_omitted() {
        let json = serializer().to_json(&Chain::new().with_source("x")).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 2);
        assert!(value.get("settings").is_none());
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_decode_accepts_standard_base64_and_json() {
        let s = serializer();
        let chain = sample();
        let json = serde_json::to_string(&ChainPayload::from(&chain)).unwrap();

        let padded = STANDARD.encode(json.as_bytes());
        assert!(s.decode(&padded).unwrap().chain.same_pipeline(&chain));
        assert!(s.decode(&json).unwrap().chain.same_pipeline(&chain));
    }

    #[test]
    fn test_settings_survive() {
        let s = serializer();
        let mut chain = sample();
        chain.settings.final_delimiter = ", ".into();
        let outcome = s.decode(&s.encode(&chain).unwrap()).unwrap();
        assert_eq!(outcome.chain.settings.final_delimiter, ", ");
    }

    // ========================================================================
    // Errors / policies
    // ========================================================================

    #[test]
    fn test_version_too_new() {
        let err = serializer()
            .decode(r#"{"version": 3, "sourceText": "", "blocks": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_garbage_payload() {
        assert!(matches!(
            serializer().decode("!!not base64!!"),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            serializer().decode("   "),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_tool_skipped() {
        let payload = json!({
            "version": 2,
            "sourceText": "a",
            "blocks": [
                {"toolId": "trim", "params": {}},
                {"toolId": "template", "params": {"tpl": "x"}},
                {"toolId": "case", "params": {"mode": "upper"}}
            ]
        });
        let outcome = serializer().decode_value(payload.clone()).unwrap();
        assert_eq!(outcome.chain.len(), 2);
        assert_eq!(outcome.skipped, vec!["template"]);

        let strict = serializer().with_policy(DecodePolicy::Strict);
        assert!(matches!(
            strict.decode_value(payload),
            Err(Error::UnknownTool(id)) if id == "template"
        ));
    }

    #[test]
    fn test_params_kept_as_given() {
        let payload = json!({
            "version": 2,
            "blocks": [{"toolId": "sort", "params": {"direction": "desc", "extra": 1}}]
        });
        let outcome = serializer().decode_value(payload).unwrap();
        let block = &outcome.chain.blocks()[0];
        assert_eq!(block.params.len(), 2);
        assert!(block.params.get("mode").is_none());
    }

    // ========================================================================
    // Legacy
    // ========================================================================

    #[test]
    fn test_legacy_upgrade() {
        let legacy = json!({
            "blocks": [
                {"type": "source", "params": {"delimiter": "custom", "customDelimiter": "|"}},
                {"type": "deduplicate", "params": {"trim": true}},
                {"type": "compare", "params": {"list2": "a", "delimiter": ";", "operation": "diff"}}
            ],
            "settings": {"finalDelimiter": ",", "finalCustomDelimiter": ""}
        });
        let outcome = serializer().decode_value(legacy).unwrap();
        assert_eq!(outcome.upgraded_from, Some(LEGACY_VERSION));
        assert!(!outcome.source_included);

        let chain = &outcome.chain;
        assert_eq!(chain.settings.source_delimiter, "|");
        assert_eq!(chain.settings.final_delimiter, ",");
        assert_eq!(chain.blocks()[0].tool_id, "dedup");

        let compare = &chain.blocks()[1].params;
        assert_eq!(compare["secondList"], "a");
        assert_eq!(compare["listDelimiter"], ";");
        assert_eq!(compare["operation"], "onlyFirst");
    }

    #[test]
    fn test_legacy_bare_array_base64() {
        let legacy = json!([
            {"type": "source", "params": {"delimiter": "\\n"}},
            {"type": "reverse", "params": {}}
        ]);
        let encoded = STANDARD.encode(legacy.to_string().as_bytes());
        let outcome = serializer().decode(&encoded).unwrap();
        assert_eq!(outcome.chain.len(), 1);
        assert!(outcome.chain.settings.is_default());
    }

    #[test]
    fn test_legacy_requires_source_block() {
        let legacy = json!([{"type": "reverse", "params": {}}]);
        assert!(matches!(
            serializer().decode_value(legacy),
            Err(Error::Serialization(_))
        ));
    }
}
