use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use augur_agent::pipeline::{timeout_message, EMPTY_RESPONSE};
use augur_agent::{DocumentGrader, Pipeline, Stage, Verdict};
use augur_core::config::AppConfig;
use augur_core::error::AugurError;
use augur_core::traits::Retriever;
use augur_core::types::{Role, StreamEvent};
use augur_test_utils::{sample_config, FailingRetriever, MockLlm, StaticRetriever};
use augur_tools::ToolKind;

const FALLBACK: &str = "暂无相关文档，请直接回答用户问题。";

struct AlwaysRefine;

impl DocumentGrader for AlwaysRefine {
    fn name(&self) -> &str {
        "always_refine"
    }

    fn grade(&self, _question: &str, _documents: &[String]) -> Verdict {
        Verdict::Refine
    }
}

fn build(config: &AppConfig, llm: MockLlm, retriever: impl Retriever) -> (Pipeline, Arc<MockLlm>) {
    let llm = Arc::new(llm);
    let pipeline = Pipeline::new(config, llm.clone(), Arc::new(retriever));
    (pipeline, llm)
}

#[tokio::test]
async fn test_pass_through_reaches_generate_once() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::new(["天地", "玄黄"]),
        StaticRetriever::new(["千字文开篇"]),
    );
    let result = pipeline.run("你好", &Default::default()).await.unwrap();

    assert_eq!(
        result.trace,
        vec![Stage::Router, Stage::Retrieve, Stage::GradeDocuments, Stage::Generate]
    );
    assert_eq!(result.state.generation, "天地玄黄");
    assert_eq!(result.state.refinements, 0);
    assert_eq!(result.state.question, "你好");

    let messages = &result.state.messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].text(), "天地玄黄");
}

#[tokio::test]
async fn test_refine_loop_is_bounded() {
    let (pipeline, llm) = build(
        &sample_config(),
        MockLlm::new(["答"]),
        StaticRetriever::new(["无关"]),
    );
    let pipeline = pipeline.with_grader(Arc::new(AlwaysRefine));
    let result = pipeline.run("你好", &Default::default()).await.unwrap();

    assert_eq!(result.state.question, "你好 (refined) (refined)");
    assert_eq!(result.state.refinements, 2);
    let transforms = result
        .trace
        .iter()
        .filter(|s| **s == Stage::TransformQuery)
        .count();
    assert_eq!(transforms, 2);
    assert_eq!(result.trace.last(), Some(&Stage::Generate));

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0][1].text().starts_with("Question: 你好 (refined) (refined)\n"));
}

#[tokio::test]
async fn test_visit_cap_stops_runaway_loop() {
    let mut config = sample_config();
    config.pipeline.max_refinements = 100;
    config.pipeline.max_stage_visits = 3;
    let (pipeline, _) = build(&config, MockLlm::new(["答"]), StaticRetriever::new(["无关"]));
    let pipeline = pipeline.with_grader(Arc::new(AlwaysRefine));

    let err = pipeline.invoke("你好").await.unwrap_err();
    assert!(matches!(err, AugurError::Pipeline(_)));
}

#[tokio::test]
async fn test_prompt_carries_question_and_context() {
    let (pipeline, llm) = build(
        &sample_config(),
        MockLlm::new(["好"]),
        StaticRetriever::new(["甲", "乙"]),
    );
    pipeline.invoke("你好").await.unwrap();

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].role, Role::System);
    assert!(calls[0][0].text().contains("Chinese Classics"));
    assert_eq!(calls[0][1].text(), "Question: 你好\nContext: 甲\n乙");
}

#[tokio::test]
async fn test_failing_llm_yields_apology() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::failing("connection refused"),
        StaticRetriever::new(["甲"]),
    );
    let state = pipeline.invoke("你好").await.unwrap();
    assert!(state.generation.starts_with("抱歉，生成回答时出现错误: "));
    assert!(state.generation.contains("connection refused"));
}

#[tokio::test]
async fn test_stream_error_keeps_partial_answer() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::new(["部分"]).with_stream_error("reset"),
        StaticRetriever::new(["甲"]),
    );
    let state = pipeline.invoke("你好").await.unwrap();
    assert!(state.generation.starts_with("部分抱歉，生成回答时出现错误: "));
    assert!(state.generation.contains("reset"));
}

#[tokio::test]
async fn test_retrieval_failure_uses_fallback_context() {
    let (pipeline, llm) = build(&sample_config(), MockLlm::new(["答"]), FailingRetriever);
    let state = pipeline.invoke("你好").await.unwrap();
    assert_eq!(state.documents, vec![FALLBACK.to_string()]);
    assert_eq!(state.generation, "答");
    assert!(llm.calls()[0][1].text().ends_with(FALLBACK));
}

#[tokio::test]
async fn test_empty_retrieval_uses_fallback_context() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::new(["答"]),
        StaticRetriever::new(Vec::<String>::new()),
    );
    let state = pipeline.invoke("介绍一下论语").await.unwrap();
    assert_eq!(state.documents, vec![FALLBACK.to_string()]);
}

#[tokio::test]
async fn test_iching_action_skips_llm() {
    let (pipeline, llm) = build(&sample_config(), MockLlm::new(["x"]), StaticRetriever::new(["甲"]));
    let result = pipeline.run("帮我占卜一下事业", &Default::default()).await.unwrap();

    assert_eq!(result.trace, vec![Stage::Router, Stage::Action(ToolKind::IChing)]);
    assert!(llm.calls().is_empty());

    let reading: serde_json::Value = serde_json::from_str(&result.state.generation).unwrap();
    assert_eq!(reading["question"], "帮我占卜一下事业");
    assert!(reading["original_hexagram"]["number"].is_u64());
    assert_eq!(reading["lines"].as_array().map(Vec::len), Some(6));
}

#[tokio::test]
async fn test_horoscope_action_reads_date_from_question() {
    let (pipeline, _) = build(&sample_config(), MockLlm::new(["x"]), StaticRetriever::new(["甲"]));
    let state = pipeline.invoke("我1990-05-20出生，星座是什么").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&state.generation).unwrap();
    assert_eq!(value["sign"], "金牛座");
    assert_eq!(value["date"], "1990-05-20");
}

#[tokio::test]
async fn test_action_without_input_returns_inline_error() {
    let (pipeline, _) = build(&sample_config(), MockLlm::new(["x"]), StaticRetriever::new(["甲"]));
    let state = pipeline.invoke("我的星座运势").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&state.generation).unwrap();
    assert!(value["error"].as_str().unwrap().contains("出生日期"));
}

#[tokio::test]
async fn test_legacy_topology_ignores_keywords() {
    let mut config = sample_config();
    config.pipeline.routing = false;
    let (pipeline, llm) = build(&config, MockLlm::new(["答"]), StaticRetriever::new(["甲"]));
    let result = pipeline.run("帮我占卜", &Default::default()).await.unwrap();

    assert_eq!(result.trace.first(), Some(&Stage::Retrieve));
    assert_eq!(result.trace.last(), Some(&Stage::Generate));
    assert_eq!(llm.calls().len(), 1);
}

#[tokio::test]
async fn test_stream_ends_with_single_done() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::new(["天地", "玄黄"]),
        StaticRetriever::new(["甲"]),
    );
    let events: Vec<StreamEvent> = pipeline.stream("你好").collect().await;

    assert_eq!(events.first(), Some(&StreamEvent::status("正在分析问题...")));
    assert_eq!(events.last(), Some(&StreamEvent::Done));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Token { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "天地玄黄");
}

#[tokio::test]
async fn test_stream_action_status_names_tool() {
    let (pipeline, _) = build(&sample_config(), MockLlm::new(["x"]), StaticRetriever::new(["甲"]));
    let events: Vec<StreamEvent> = pipeline.stream("1990年出生属什么生肖").collect().await;
    assert!(events.contains(&StreamEvent::status("Using tool: zodiac_calculator...")));
    assert_eq!(events.last(), Some(&StreamEvent::Done));
}

#[tokio::test(start_paused = true)]
async fn test_stream_timeout_is_terminal_error() {
    let mut config = sample_config();
    config.pipeline.request_timeout_secs = 1;
    let (pipeline, _) = build(
        &config,
        MockLlm::new(["迟"]).with_delay(Duration::from_secs(5)),
        StaticRetriever::new(["甲"]),
    );
    let events: Vec<StreamEvent> = pipeline.stream("你好").collect().await;

    assert_eq!(
        events.last(),
        Some(&StreamEvent::error("Request timed out after 1s"))
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(!events.iter().any(|e| matches!(e, StreamEvent::Token { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_respond_turns_timeout_into_message() {
    let mut config = sample_config();
    config.pipeline.request_timeout_secs = 1;
    let (pipeline, _) = build(
        &config,
        MockLlm::new(["迟"]).with_delay(Duration::from_secs(5)),
        StaticRetriever::new(["甲"]),
    );
    assert_eq!(pipeline.respond("你好").await.unwrap(), timeout_message(1));
}

#[tokio::test]
async fn test_respond_with_empty_generation() {
    let (pipeline, _) = build(
        &sample_config(),
        MockLlm::new(Vec::<String>::new()),
        StaticRetriever::new(["甲"]),
    );
    assert_eq!(pipeline.respond("你好").await.unwrap(), EMPTY_RESPONSE);
}
