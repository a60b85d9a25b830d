//! 체인 평가 / 직렬화 / 저장소 통합 테스트
//!
//! 도구 예제, 왕복, 멱등성, 재정렬 국소성, 에러 정책을 end-to-end로 검증

use linesmith_core::{
    Chain, ChainSerializer, ChainStore, DecodePolicy, Error, ErrorKind, Evaluator, Params,
    ProcessBlock, SandboxLimits, SaveMode, ToolRegistry, TransformContext,
};
use linesmith_foundation::SqliteKv;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Helpers
// ============================================================================

fn registry() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::with_builtins())
}

fn evaluator() -> Evaluator {
    Evaluator::new(registry(), TransformContext::default())
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

fn block(tool: &str, p: Value) -> ProcessBlock {
    ProcessBlock::new(tool, params(p))
}

/// 블록 하나짜리 체인의 최종 줄
fn run_one(source: &str, tool: &str, p: Value) -> Vec<String> {
    let chain = Chain::new().with_source(source).with_block(block(tool, p));
    let result = evaluator().evaluate(&chain);
    assert!(
        !result.has_errors(),
        "unexpected error: {:?}",
        result.blocks[0].error
    );
    result.final_lines
}

// ============================================================================
// 도구 예제
// ============================================================================

#[test]
fn test_tool_examples() {
    assert_eq!(run_one("A\nB\nA\nC", "dedup", json!({})), vec!["A", "B", "C"]);
    assert_eq!(
        run_one("C\nA\nB", "sort", json!({"direction": "asc"})),
        vec!["A", "B", "C"]
    );
    assert_eq!(
        run_one("C\nA\nB", "sort", json!({"direction": "desc"})),
        vec!["C", "B", "A"]
    );
    assert_eq!(
        run_one("Apple\nBanana\nCherry", "filter", json!({"query": "an"})),
        vec!["Banana"]
    );
    assert_eq!(run_one("hello", "case", json!({"mode": "upper"})), vec!["HELLO"]);
    assert_eq!(run_one("  text  ", "trim", json!({})), vec!["text"]);
    assert_eq!(
        run_one(r#"{"name":"John","age":30}"#, "json_path", json!({"query": "$.name"})),
        vec!["John"]
    );
    assert_eq!(
        run_one("A\nB", "join", json!({"delimiter": "-", "lastDelimiter": "&"})),
        vec!["A&B"]
    );
    assert_eq!(
        run_one(
            "A\nB\nC",
            "compare",
            json!({"secondList": "A,B", "listDelimiter": ",", "operation": "common"})
        ),
        vec!["A", "B"]
    );
    assert_eq!(
        run_one("5", "js_function", json!({"code": "return line * 2"})),
        vec!["10"]
    );
    assert_eq!(
        run_one(
            "Hello 123 World",
            "regex",
            json!({"pattern": r"\d+", "replacement": "NUM"})
        ),
        vec!["Hello NUM World"]
    );
}

// ============================================================================
// 평가 속성
// ============================================================================

#[test]
fn test_empty_chain_output_is_source() {
    let source = "line one\n\nline three";
    let chain = Chain::new().with_source(source);
    assert_eq!(evaluator().evaluate(&chain).final_output, source);
}

#[test]
fn test_idempotent_evaluation() {
    let reg = registry();
    let mut chain = Chain::new().with_source("b 2\na 10\nc 1\nb 2");
    for tool in ["shuffle", "dedup", "sort", "hash"] {
        chain.push(reg.instantiate(tool).unwrap());
    }
    let ev = Evaluator::new(reg, TransformContext::default());

    let first = ev.evaluate(&chain);
    let second = ev.evaluate(&chain);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_reorder_locality() {
    let mut chain = Chain::new()
        .with_source(" ab1 \n cd22 ")
        .with_block(block("trim", json!({})))
        .with_block(block("case", json!({"mode": "upper"})))
        .with_block(block("regex", json!({"pattern": r"\d+", "replacement": "#"})))
        .with_block(block("reverse", json!({})))
        .with_block(block("wrapper", json!({"prefix": "<", "suffix": ">"})));
    let ev = evaluator();
    let before = ev.evaluate(&chain);

    let moved = chain.blocks()[1].id.clone();
    assert_eq!(chain.move_block(&moved, 3).unwrap(), 3);
    let after = ev.evaluate(&chain);

    assert_eq!(before.blocks[0], after.blocks[0]);
    assert_eq!(before.blocks[4], after.blocks[4]);
    assert_ne!(before.blocks[1], after.blocks[1]);
    assert_eq!(after.final_output, "<CD#>\n<AB#>");
}

#[test]
fn test_pass_through_on_error() {
    let chain = Chain::new()
        .with_source("x\ny")
        .with_block(block("json_format", json!({})))
        .with_block(block("case", json!({"mode": "upper"})));
    let result = evaluator().evaluate(&chain);

    let err = result.blocks[0].error.as_ref().unwrap();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(result.blocks[0].output_lines, vec!["x", "y"]);
    assert_eq!(result.final_output, "X\nY");
}

#[test]
fn test_runaway_script_times_out() {
    let ctx = TransformContext::new(SandboxLimits {
        timeout: Duration::from_millis(50),
        max_steps: u64::MAX,
        max_string_len: 1_000_000,
    });
    let ev = Evaluator::new(registry(), ctx);
    let chain = Chain::new()
        .with_source("a\nb\nc")
        .with_block(block("js_function", json!({"code": "while (true) {}"})));

    let started = Instant::now();
    let result = ev.evaluate(&chain);
    assert!(started.elapsed() < Duration::from_secs(5));

    let err = result.blocks[0].error.as_ref().unwrap();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.message.contains("line 1"));
    assert_eq!(result.final_output, "a\nb\nc");
}

#[test]
fn test_script_line_errors_do_not_abort() {
    let chain = Chain::new()
        .with_source("1\nboom\n3")
        .with_block(block(
            "js_function",
            json!({"code": "if (line === 'boom') throw 'bad'; return line + '!';"}),
        ));
    let result = evaluator().evaluate(&chain);
    let b = &result.blocks[0];
    assert!(b.error.is_none());
    assert_eq!(b.output_lines, vec!["1!", "[Error: bad]", "3!"]);
    assert_eq!(b.line_errors.len(), 1);
    assert_eq!(b.line_errors[0].line, 2);
}

// ============================================================================
// 직렬화
// ============================================================================

#[test]
fn test_serializer_round_trip() {
    let reg = registry();
    let serializer = ChainSerializer::new(reg.clone());
    let mut chain = Chain::new().with_source("β\nα\n\nγ");
    for tool in reg.list().iter().map(|d| d.id.clone()) {
        chain.push(reg.instantiate(&tool).unwrap());
    }

    let decoded = serializer
        .decode(&serializer.encode(&chain).unwrap())
        .unwrap();
    assert!(decoded.chain.same_pipeline(&chain));

    let from_json = serializer
        .decode(&serializer.to_json(&chain).unwrap())
        .unwrap();
    assert!(from_json.chain.same_pipeline(&chain));
}

#[test]
fn test_unknown_tool_policies() {
    let payload = json!({
        "version": 2,
        "sourceText": "x",
        "blocks": [{"toolId": "debug_view"}, {"toolId": "reverse"}]
    })
    .to_string();

    let lenient = ChainSerializer::new(registry());
    let outcome = lenient.decode(&payload).unwrap();
    assert_eq!(outcome.skipped, vec!["debug_view"]);
    assert_eq!(outcome.chain.len(), 1);

    let strict = ChainSerializer::new(registry()).with_policy(DecodePolicy::Strict);
    assert!(matches!(strict.decode(&payload), Err(Error::UnknownTool(_))));
}

#[test]
fn test_legacy_payload_evaluates() {
    let legacy = json!({
        "blocks": [
            {"type": "source", "params": {"delimiter": ","}},
            {"type": "deduplicate", "params": {"trim": true}},
            {"type": "sort", "params": {"mode": "text", "direction": "asc"}}
        ],
        "settings": {"finalDelimiter": "custom", "finalCustomDelimiter": " | "}
    });
    let outcome = ChainSerializer::new(registry())
        .decode_value(legacy)
        .unwrap();
    let mut chain = outcome.chain;
    chain.set_source("b, a ,b");

    assert_eq!(evaluator().evaluate(&chain).final_output, "a | b");
}

#[test]
fn test_decoded_select_values_are_checked() {
    let payload = json!({
        "version": 2,
        "sourceText": "a\nb",
        "blocks": [
            {"toolId": "compare", "params": {"secondList": "b", "operation": "bogus"}},
            {"toolId": "compare", "params": {"secondList": "b", "operation": "diff"}},
            {"toolId": "hash", "params": {"algorithm": "md5"}}
        ]
    });
    let chain = ChainSerializer::new(registry())
        .decode_value(payload)
        .unwrap()
        .chain;
    let result = evaluator().evaluate(&chain);

    let err = result.blocks[0].error.as_ref().unwrap();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(result.blocks[0].output_lines, vec!["a", "b"]);
    assert!(result.blocks[1].error.is_none());
    assert_eq!(result.blocks[1].output_lines, vec!["a"]);
    assert_eq!(
        result.final_output,
        "0cc175b9c0f1b6a831c399e269772661"
    );
}

#[test]
fn test_version_too_new() {
    let payload = json!({"version": 99, "blocks": []}).to_string();
    assert!(matches!(
        ChainSerializer::new(registry()).decode(&payload),
        Err(Error::Serialization(_))
    ));
}

// ============================================================================
// 저장소
// ============================================================================

#[test]
fn test_store_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Chain::new()
        .with_source("q")
        .with_block(block("case", json!({"mode": "upper"})));

    {
        let kv = Arc::new(SqliteKv::new(dir.path()).unwrap());
        let store = ChainStore::new(kv, ChainSerializer::new(registry()));
        store.save("first", &chain, SaveMode::CreateOnly).unwrap();
        assert!(matches!(
            store.save("first", &chain, SaveMode::CreateOnly),
            Err(Error::NameCollision(_))
        ));
    }

    let kv = Arc::new(SqliteKv::new(dir.path()).unwrap());
    let store = ChainStore::new(kv, ChainSerializer::new(registry()));
    let loaded = store.load("first").unwrap();
    assert!(loaded.same_pipeline(&chain));
    assert_eq!(evaluator().evaluate(&loaded).final_output, "Q");
}
